//! Grouping queries that share rearrangements into clumps with a consistent
//! strand choice per query, then merging clumps that share alignments.

use crate::{
    aln::{ReadAln, Span, Strand, SubAln, TypeSet},
    cluster::{
        oracle::{OracleParams, for_each_shared},
        overlap::{PartPairMap, overlapping_part_pairs},
    },
};
use foldhash::{HashMap, HashSet};
use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One witnessed shared rearrangement between two queries.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Link {
    pub a: usize,
    pub b: usize,
    /// The two queries match on opposite strands.
    pub opposed: bool,
}

/// A connected component of the link graph: queries with their chosen strand
/// flip.
#[derive(Clone, Debug)]
pub(crate) struct Clump {
    pub members: Vec<(usize, bool)>,
}

/// A final output unit: one clump, or several merged because their
/// alignments overlap.
#[derive(Clone, Debug)]
pub(crate) struct OutUnit {
    pub name: String,
    pub members: Vec<(usize, bool)>,
}

/// Builds the link graph: one link per witnessed shared rearrangement of an
/// enabled type. The overlap map is also returned for second-level merging.
pub(crate) fn build_links(
    cases: &[ReadAln], keep: &[usize], enabled: TypeSet, p: &OracleParams,
) -> (Vec<Link>, PartPairMap) {
    let map = overlapping_part_pairs(cases, keep);
    let mut links = Vec::new();

    for (&(qa, qb), seeds) in &map {
        for_each_shared(&cases[qa], &cases[qb], seeds, p, |s| {
            if enabled.contains(s.kind) {
                links.push(Link {
                    a: qa,
                    b: qb,
                    opposed: s.opposed,
                });
            }
            true
        });
    }
    // map iteration order is not deterministic; the traversal below is
    links.sort_by_key(|l| (l.a, l.b, l.opposed));
    debug!("{} links over {} queries", links.len(), keep.len());
    (links, map)
}

/// Priority-first component extraction over an adjacency list.
///
/// Nodes are visited best-first from an explicit heap keyed on
/// `(degree, quality, lowest index)`; each discovered neighbour inherits
/// `flip = parentFlip XOR edgeOpposed`, and the first discovery wins. Roots
/// get their flip from `root_flip`.
fn priority_components(
    nodes: &[usize], adj: &HashMap<usize, Vec<(usize, bool)>>, quality: impl Fn(usize) -> i64,
    root_flip: impl Fn(usize) -> bool,
) -> Vec<Vec<(usize, bool)>> {
    let empty: Vec<(usize, bool)> = Vec::new();
    let degree = |n: usize| adj.get(&n).unwrap_or(&empty).len();

    let mut roots: Vec<usize> = nodes.to_vec();
    roots.sort_by_key(|&n| (Reverse(degree(n)), Reverse(quality(n)), n));

    let mut visited: HashSet<usize> = HashSet::default();
    let mut flips: HashMap<usize, bool> = HashMap::default();
    let mut out = Vec::new();

    for &root in &roots {
        if visited.contains(&root) {
            continue;
        }
        flips.insert(root, root_flip(root));

        let mut members = Vec::new();
        let mut heap = BinaryHeap::new();
        heap.push((degree(root), quality(root), Reverse(root)));

        while let Some((_, _, Reverse(n))) = heap.pop() {
            if !visited.insert(n) {
                continue;
            }
            let flip = flips[&n];
            members.push((n, flip));

            for &(peer, opposed) in adj.get(&n).unwrap_or(&empty) {
                if visited.contains(&peer) {
                    continue;
                }
                flips.entry(peer).or_insert(flip ^ opposed);
                heap.push((degree(peer), quality(peer), Reverse(peer)));
            }
        }
        out.push(members);
    }
    out
}

/// Whether a query's first and last sub-alignments both lie on the reverse
/// relative strand, the default flip for traversal roots (keeping the
/// dominant strand positive).
fn default_root_flip(r: &ReadAln) -> bool {
    match (r.parts.first(), r.parts.last()) {
        (Some(f), Some(l)) => f.rel_strand() == Strand::Rev && l.rel_strand() == Strand::Rev,
        _ => false,
    }
}

/// Extracts clumps: connected components of the link graph, including
/// singleton components for unlinked queries.
pub(crate) fn clumps(cases: &[ReadAln], keep: &[usize], links: &[Link]) -> Vec<Clump> {
    let mut adj: HashMap<usize, Vec<(usize, bool)>> = HashMap::default();
    for l in links {
        adj.entry(l.a).or_default().push((l.b, l.opposed));
        adj.entry(l.b).or_default().push((l.a, l.opposed));
    }

    priority_components(keep, &adj, |q| cases[q].aligned_len(), |q| default_root_flip(&cases[q]))
        .into_iter()
        .map(|members| Clump { members })
        .collect()
}

/// A sub-alignment as it will be emitted, with the query's flip applied.
pub(crate) fn emitted_part(p: &SubAln, length: i64, flip: bool) -> SubAln {
    if !flip {
        return p.clone();
    }
    SubAln {
        id: p.id,
        qry: Span::new(length - p.qry.end, length - p.qry.beg),
        ref_name: p.ref_name.clone(),
        rf: p.rf.flipped(),
    }
}

pub(crate) fn emitted_parts(r: &ReadAln, flip: bool) -> Vec<SubAln> {
    if flip {
        r.parts.iter().rev().map(|p| emitted_part(p, r.length, true)).collect()
    } else {
        r.parts.clone()
    }
}

/// The embedded group number of a query named by a previous run, e.g.
/// `group12-3` or `merged7-...`.
fn embedded_group_number(name: &str) -> Option<u64> {
    let stem = ["group", "merged", "merge"].iter().find_map(|p| name.strip_prefix(p))?;
    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() || !stem[digits.len()..].starts_with('-') {
        return None;
    }
    digits.parse().ok()
}

/// The smallest `(refName, refBeg, refEnd)` over a clump's emitted
/// sub-alignments.
fn min_query_sort_key(cases: &[ReadAln], clump: &Clump) -> (String, i64, i64) {
    clump
        .members
        .iter()
        .flat_map(|&(q, flip)| emitted_parts(&cases[q], flip))
        .map(|p| (p.ref_name, p.rf.beg, p.rf.end))
        .min()
        .unwrap_or_default()
}

/// Sorts clumps for output: by minimum embedded group number when every
/// query was named by a previous run, else biggest first with the smallest
/// reference position as tiebreak.
pub(crate) fn sort_clumps(cases: &[ReadAln], clumps: &mut [Clump]) {
    let renumbered = clumps
        .iter()
        .flat_map(|c| &c.members)
        .all(|&(q, _)| embedded_group_number(&cases[q].name).is_some());

    if renumbered {
        clumps.sort_by_key(|c| {
            c.members
                .iter()
                .filter_map(|&(q, _)| embedded_group_number(&cases[q].name))
                .min()
        });
    } else {
        clumps.sort_by(|a, b| {
            (Reverse(a.members.len()), min_query_sort_key(cases, a))
                .cmp(&(Reverse(b.members.len()), min_query_sort_key(cases, b)))
        });
    }
}

/// Merges clumps whose queries have overlapping alignments. Returns the
/// merged units as `(clumpIndex, clumpFlip)` lists; a unit keeps the
/// position of its smallest member, so group numbering follows first-level
/// order.
pub(crate) fn merge_clumps(
    cases: &[ReadAln], clumps: &[Clump], overlaps: &PartPairMap,
) -> Vec<Vec<(usize, bool)>> {
    let mut clump_of: HashMap<usize, usize> = HashMap::default();
    for (i, c) in clumps.iter().enumerate() {
        for &(q, _) in &c.members {
            clump_of.insert(q, i);
        }
    }
    let flip_of: HashMap<usize, bool> = clumps
        .iter()
        .flat_map(|c| c.members.iter().copied())
        .collect();

    let mut cross: Vec<(usize, usize, bool)> = Vec::new();
    for (&(qa, qb), seeds) in overlaps {
        let (Some(&ca), Some(&cb)) = (clump_of.get(&qa), clump_of.get(&qb)) else {
            continue;
        };
        if ca == cb {
            continue;
        }
        let Some(&(pa, pb)) = seeds.first() else { continue };
        let sa = cases[qa].parts[pa].rel_strand().is_forward() ^ flip_of[&qa];
        let sb = cases[qb].parts[pb].rel_strand().is_forward() ^ flip_of[&qb];
        cross.push((ca.min(cb), ca.max(cb), sa != sb));
    }
    cross.sort_unstable();

    let mut adj: HashMap<usize, Vec<(usize, bool)>> = HashMap::default();
    for &(ca, cb, opposed) in &cross {
        adj.entry(ca).or_default().push((cb, opposed));
        adj.entry(cb).or_default().push((ca, opposed));
    }

    let nodes: Vec<usize> = (0..clumps.len()).collect();
    let quality = |c: usize| {
        clumps[c]
            .members
            .iter()
            .map(|&(q, _)| cases[q].aligned_len())
            .sum::<i64>()
    };
    let root_flip = |c: usize| {
        clumps[c]
            .members
            .first()
            .is_some_and(|&(q, _)| default_root_flip(&cases[q]))
    };

    let mut units: Vec<Vec<(usize, bool)>> = priority_components(&nodes, &adj, quality, root_flip);
    // keep first-level order: a unit sits where its smallest member sat, and
    // its members are listed in first-level order too
    for ms in &mut units {
        ms.sort_by_key(|&(c, _)| c);
    }
    units.sort_by_key(|ms| ms.first().map(|&(c, _)| c));
    units
}

/// Composes the final output units: clump members with flips composed
/// through the merge level, named `groupK-size` or `mergeK1_K2_...` from the
/// members' first-level group numbers, keeping only units whose queries
/// cover every case file.
pub(crate) fn named_units(
    cases: &[ReadAln], clumps: &[Clump], merged: &[Vec<(usize, bool)>], num_case_files: usize,
) -> Vec<OutUnit> {
    let mut units = Vec::new();

    for unit in merged {
        let mut members = Vec::new();
        let mut group_ids = Vec::new();
        for &(c, cflip) in unit {
            group_ids.push(c + 1);
            for &(q, f) in &clumps[c].members {
                members.push((q, f ^ cflip));
            }
        }

        let covered: HashSet<usize> = members.iter().map(|&(q, _)| cases[q].file_index).collect();
        if !(1..=num_case_files).all(|f| covered.contains(&f)) {
            continue;
        }

        let name = if group_ids.len() == 1 {
            format!("group{}-{}", group_ids[0], members.len())
        } else {
            let ids: Vec<String> = group_ids.iter().map(|g| g.to_string()).collect();
            format!("merge{}", ids.join("_"))
        };
        units.push(OutUnit { name, members });
    }
    units
}
