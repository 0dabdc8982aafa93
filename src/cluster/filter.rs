//! Case/control subtraction and the iterated coverage filter.

use crate::{
    aln::{ReadAln, TypeSet},
    cluster::{
        classify::junction_kind,
        oracle::{OracleParams, adjacent_shared, for_each_shared},
        overlap::{case_control_part_pairs, overlapping_part_pairs},
    },
};
use foldhash::{HashMap, HashSet};
use log::debug;

/// Drops every case query that shares a rearrangement with any control
/// query. With `own_type_only`, only the case's own type letter counts;
/// otherwise any enabled type does.
pub(crate) fn subtract_controls(
    cases: &[ReadAln], keep: &mut Vec<usize>, controls: &[ReadAln], enabled: TypeSet, own_type_only: bool,
    p: &OracleParams,
) {
    if controls.is_empty() {
        return;
    }
    let map = case_control_part_pairs(cases, keep, controls);

    keep.retain(|&q| {
        let allowed = match (own_type_only, cases[q].kind) {
            (true, Some(kind)) => TypeSet::only(kind),
            _ => enabled,
        };
        for c in 0..controls.len() {
            let Some(seeds) = map.get(&(q, c)) else { continue };
            let mut shared = false;
            for_each_shared(&cases[q], &controls[c], seeds, p, |s| {
                shared = allowed.contains(s.kind);
                !shared
            });
            if shared {
                return false;
            }
        }
        true
    });
}

/// Iteratively removes queries whose rearranged junctions are not supported
/// by at least `min_cov` other queries.
///
/// Support is collected with the restricted oracle variant over overlapping
/// sub-alignment pairs: each witnessed junction records the peer query.
/// Removing a query can strip support from others, so this repeats until no
/// query is removed.
pub(crate) fn coverage_filter(
    cases: &[ReadAln], keep: &mut Vec<usize>, enabled: TypeSet, p: &OracleParams, min_cov: usize,
) {
    if min_cov == 0 {
        return;
    }

    loop {
        let map = overlapping_part_pairs(cases, keep);
        let mut supporters: HashMap<(usize, usize), HashSet<usize>> = HashMap::default();

        for (&(qa, qb), seeds) in &map {
            for &(pa, pb) in seeds {
                if let Some((_, down_b)) = adjacent_shared(&cases[qa], pa, &cases[qb], pb, p) {
                    supporters.entry((qa, pa)).or_default().insert(qb);
                    supporters.entry((qb, down_b)).or_default().insert(qa);
                }
                if let Some((_, down_a)) = adjacent_shared(&cases[qb], pb, &cases[qa], pa, p) {
                    supporters.entry((qb, pb)).or_default().insert(qa);
                    supporters.entry((qa, down_a)).or_default().insert(qb);
                }
            }
        }

        let before = keep.len();
        keep.retain(|&q| {
            let parts = &cases[q].parts;
            (1..parts.len()).all(|j| {
                if junction_kind(&parts[j - 1], &parts[j], enabled, p.min_gap, p.min_rev).is_none() {
                    return true;
                }
                supporters.get(&(q, j)).is_some_and(|s| s.len() >= min_cov)
            })
        });

        if keep.len() == before {
            return;
        }
        debug!("coverage filter: {} of {before} queries kept", keep.len());
    }
}
