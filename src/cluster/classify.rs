//! Per-query rearrangement classification.

use crate::aln::{RearrType, SubAln, TypeSet, canonical_chrom, is_circular_chrom, is_known_chrom};
use itertools::Itertools;

/// Labels a query by the first enabled rearrangement type that triggers, in
/// fixed priority `C > S > N > G`. Parts must be query-forward oriented and
/// sorted by query position. `None` means the query is linear and discarded.
pub(crate) fn classify(parts: &[SubAln], enabled: TypeSet, min_gap: i64, min_rev: i64) -> Option<RearrType> {
    if enabled.contains(RearrType::InterChrom) && is_inter_chrom(parts) {
        return Some(RearrType::InterChrom);
    }
    if enabled.contains(RearrType::InterStrand) && is_inter_strand(parts) {
        return Some(RearrType::InterStrand);
    }
    if enabled.contains(RearrType::NonColinear) && is_non_colinear(parts, min_rev) {
        return Some(RearrType::NonColinear);
    }
    if enabled.contains(RearrType::BigGap) && has_big_gap(parts, min_gap) {
        return Some(RearrType::BigGap);
    }
    None
}

/// Two sub-alignments on different known chromosomes.
fn is_inter_chrom(parts: &[SubAln]) -> bool {
    let mut first: Option<&str> = None;
    for p in parts {
        if !is_known_chrom(&p.ref_name) {
            continue;
        }
        let chrom = canonical_chrom(&p.ref_name);
        match first {
            None => first = Some(chrom),
            Some(c) if c != chrom => return true,
            _ => {}
        }
    }
    false
}

/// Two sub-alignments on the same reference sequence, opposite strands.
fn is_inter_strand(parts: &[SubAln]) -> bool {
    parts
        .iter()
        .tuple_combinations()
        .any(|(a, b)| a.ref_name == b.ref_name && a.rel_strand() != b.rel_strand())
}

/// A later-in-query sub-alignment starting at least `min_rev` bases before
/// the end of an earlier one in the reference. Circular chromosomes are
/// exempt: a read crossing their origin looks like a reverse jump.
fn is_non_colinear(parts: &[SubAln], min_rev: i64) -> bool {
    parts.iter().tuple_combinations().any(|(x, y)| {
        x.ref_name == y.ref_name
            && x.rel_strand() == y.rel_strand()
            && !is_circular_chrom(&x.ref_name)
            && y.rf.beg <= x.rf.end - min_rev
    })
}

/// Two adjacent-in-query sub-alignments separated by a reference gap of at
/// least `min_gap`.
fn has_big_gap(parts: &[SubAln], min_gap: i64) -> bool {
    parts.iter().tuple_windows().any(|(x, y)| {
        x.ref_name == y.ref_name && x.rel_strand() == y.rel_strand() && y.rf.beg - x.rf.end >= min_gap
    })
}

/// The rearrangement type witnessed by one adjacent pair of sub-alignments,
/// if any. This is the junction test used by the coverage filter.
pub(crate) fn junction_kind(
    x: &SubAln, y: &SubAln, enabled: TypeSet, min_gap: i64, min_rev: i64,
) -> Option<RearrType> {
    if x.ref_name != y.ref_name {
        let inter = is_known_chrom(&x.ref_name)
            && is_known_chrom(&y.ref_name)
            && canonical_chrom(&x.ref_name) != canonical_chrom(&y.ref_name);
        return (inter && enabled.contains(RearrType::InterChrom)).then_some(RearrType::InterChrom);
    }
    if x.rel_strand() != y.rel_strand() {
        return enabled.contains(RearrType::InterStrand).then_some(RearrType::InterStrand);
    }
    let gap = y.rf.beg - x.rf.end;
    if gap <= -min_rev && !is_circular_chrom(&x.ref_name) {
        return enabled.contains(RearrType::NonColinear).then_some(RearrType::NonColinear);
    }
    if gap >= min_gap {
        return enabled.contains(RearrType::BigGap).then_some(RearrType::BigGap);
    }
    None
}
