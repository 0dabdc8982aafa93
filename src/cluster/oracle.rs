//! Deciding whether two queries witness the same rearrangement.
//!
//! Two sub-alignment pairs, one per query, witness the same rearrangement
//! when their facing edges agree geometrically within `max_diff`, under one
//! consistent orientation choice for the second query, and the junction
//! passes the per-type windows below.

use crate::aln::{ReadAln, RearrType, SubAln};

pub(crate) struct OracleParams {
    pub min_gap: i64,
    pub min_rev: i64,
    pub max_diff: i64,
}

/// One witnessed shared rearrangement between two queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SharedRearr {
    /// The second query matches on the opposite strand.
    pub opposed: bool,
    pub kind: RearrType,
}

/// Both gaps within a factor of two of each other, by magnitude.
fn within_factor_of_two(a: i64, b: i64) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a <= 2 * b && b <= 2 * a
}

fn oriented(p: &SubAln, opposed: bool) -> SubAln {
    if opposed { p.flipped() } else { p.clone() }
}

/// The junction type shared by `(ax, ay)` of query A and `(bx, by)` of query
/// B (B already in the chosen orientation), or `None`.
///
/// `b_adjacent` is whether `bx` and `by` are adjacent in B's query order,
/// which the big-gap window requires.
fn shared_kind(
    ax: &SubAln, ay: &SubAln, bx: &SubAln, by: &SubAln, b_adjacent: bool, p: &OracleParams,
) -> Option<RearrType> {
    // The paired edges must sit on the same sequence and strand.
    if ax.ref_name != bx.ref_name
        || ay.ref_name != by.ref_name
        || ax.rf.strand() != bx.rf.strand()
        || ay.rf.strand() != by.rf.strand()
    {
        return None;
    }

    // Signed distance across the breakpoint, per query, plus the reference
    // offsets between the paired facing edges, must cancel out.
    let qry_dist_a = ay.qry.beg - ax.qry.end;
    let qry_dist_b = by.qry.beg - bx.qry.end;
    let beg_diff = bx.rf.end - ax.rf.end;
    let end_diff = by.rf.beg - ay.rf.beg;
    if ((qry_dist_b - qry_dist_a) + beg_diff - end_diff).abs() > p.max_diff {
        return None;
    }

    if ax.ref_name != ay.ref_name {
        return Some(RearrType::InterChrom);
    }
    if ax.rf.strand() != ay.rf.strand() {
        return Some(RearrType::InterStrand);
    }

    let gap_a = ay.rf.beg - ax.rf.end;
    let gap_b = by.rf.beg - bx.rf.end;
    let cross_ab = by.rf.beg - ax.rf.end;
    let cross_ba = ay.rf.beg - bx.rf.end;

    if gap_a < 0 {
        (gap_b <= -p.min_rev && within_factor_of_two(gap_a, gap_b) && cross_ab < 0 && cross_ba < 0)
            .then_some(RearrType::NonColinear)
    } else {
        (gap_b >= p.min_gap
            && b_adjacent
            && within_factor_of_two(gap_a, gap_b)
            && cross_ab > 0
            && cross_ba > 0)
            .then_some(RearrType::BigGap)
    }
}

/// Searches all `(Ax, Ay) x (Bx, By)` combinations over the overlap seed
/// pairs of two queries, calling `visit` once per witnessed shared
/// rearrangement. `visit` returns whether to keep searching.
///
/// Each seed anchors one side of the breakpoint: both its parts overlap on
/// the reference, and the relative strands of the two parts fix the
/// orientation choice for B. Two seeds with the same choice, ordered by A's
/// query order and consistent with B's, form a candidate combination.
pub(crate) fn for_each_shared(
    a: &ReadAln, b: &ReadAln, seeds: &[(usize, usize)], p: &OracleParams,
    mut visit: impl FnMut(SharedRearr) -> bool,
) {
    for (i, &(pa1, pb1)) in seeds.iter().enumerate() {
        for &(pa2, pb2) in &seeds[i + 1..] {
            if pa1 == pa2 || pb1 == pb2 {
                continue;
            }
            let opposed = a.parts[pa1].rel_strand() != b.parts[pb1].rel_strand();
            if opposed != (a.parts[pa2].rel_strand() != b.parts[pb2].rel_strand()) {
                continue;
            }

            let ((pax, pbx), (pay, pby)) = if pa1 < pa2 {
                ((pa1, pb1), (pa2, pb2))
            } else {
                ((pa2, pb2), (pa1, pb1))
            };
            // B's query order must agree under the orientation choice.
            if (pbx < pby) == opposed {
                continue;
            }

            let bx = oriented(&b.parts[pbx], opposed);
            let by = oriented(&b.parts[pby], opposed);
            let b_adjacent = pbx.abs_diff(pby) == 1;

            if let Some(kind) = shared_kind(&a.parts[pax], &a.parts[pay], &bx, &by, b_adjacent, p)
                && !visit(SharedRearr { opposed, kind })
            {
                return;
            }
        }
    }
}

/// The coverage filter's restricted variant: given one overlapping seed pair
/// `(pa, pb)`, tests only A's junction with its previous-in-query neighbour
/// against B's corresponding junction (previous for matched strands, next
/// for opposed).
///
/// Returns the shared junction type and the index of B's downstream junction
/// part, so support can be recorded on both queries.
pub(crate) fn adjacent_shared(
    a: &ReadAln, pa: usize, b: &ReadAln, pb: usize, p: &OracleParams,
) -> Option<(RearrType, usize)> {
    if pa == 0 {
        return None;
    }
    let opposed = a.parts[pa].rel_strand() != b.parts[pb].rel_strand();
    let (pbx, b_down) = if opposed {
        if pb + 1 >= b.parts.len() {
            return None;
        }
        (pb + 1, pb + 1)
    } else {
        if pb == 0 {
            return None;
        }
        (pb - 1, pb)
    };

    let bx = oriented(&b.parts[pbx], opposed);
    let by = oriented(&b.parts[pb], opposed);

    shared_kind(&a.parts[pa - 1], &a.parts[pa], &bx, &by, true, p).map(|kind| (kind, b_down))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aln::Span;

    fn params() -> OracleParams {
        OracleParams {
            min_gap: 10_000,
            min_rev: 1000,
            max_diff: 500,
        }
    }

    fn query(parts: Vec<((i64, i64), &str, (i64, i64))>) -> ReadAln {
        let parts = parts
            .into_iter()
            .enumerate()
            .map(|(i, (qry, name, rf))| SubAln {
                id: i,
                qry: Span::new(qry.0, qry.1),
                ref_name: name.to_string(),
                rf: Span::new(rf.0, rf.1),
            })
            .collect();
        ReadAln {
            file_index: 1,
            name: String::new(),
            length: 0,
            parts,
            kind: None,
            blocks: Vec::new(),
        }
    }

    fn all_shared(a: &ReadAln, b: &ReadAln, seeds: &[(usize, usize)]) -> Vec<SharedRearr> {
        let mut out = Vec::new();
        for_each_shared(a, b, seeds, &params(), |s| {
            out.push(s);
            true
        });
        out
    }

    #[test]
    fn matching_translocations_are_shared() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr7", (8000, 9000))]);
        let b = query(vec![((100, 1100), "chr1", (5100, 6100)), ((1100, 2100), "chr7", (8100, 9100))]);

        let got = all_shared(&a, &b, &[(0, 0), (1, 1)]);
        assert_eq!(
            got,
            vec![SharedRearr {
                opposed: false,
                kind: RearrType::InterChrom
            }]
        );
    }

    #[test]
    fn breakpoint_offsets_beyond_max_diff_are_rejected() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr7", (8000, 9000))]);
        // same edges, but B spans 2000 extra query bases across the junction
        let b = query(vec![((0, 1000), "chr1", (5000, 6000)), ((3000, 4000), "chr7", (8000, 9000))]);

        assert!(all_shared(&a, &b, &[(0, 0), (1, 1)]).is_empty());
    }

    #[test]
    fn opposite_strand_witnesses_match_with_opposed_flag() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr7", (8000, 9000))]);
        // the same rearrangement read from the other end of the molecule
        let b = query(vec![
            ((0, 1000), "chr7", (-9000, -8000)),
            ((1000, 2000), "chr1", (-6000, -5000)),
        ]);

        let got = all_shared(&a, &b, &[(0, 1), (1, 0)]);
        assert_eq!(
            got,
            vec![SharedRearr {
                opposed: true,
                kind: RearrType::InterChrom
            }]
        );
    }

    #[test]
    fn big_gap_needs_adjacency_and_similar_size() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr1", (26_000, 27_000))]);
        let b = query(vec![((0, 1000), "chr1", (5100, 6100)), ((1000, 2000), "chr1", (26_100, 27_100))]);
        let got = all_shared(&a, &b, &[(0, 0), (1, 1)]);
        assert_eq!(
            got,
            vec![SharedRearr {
                opposed: false,
                kind: RearrType::BigGap
            }]
        );

        // a gap more than twice as large is a different event
        let c = query(vec![((0, 1000), "chr1", (5100, 6100)), ((1000, 2000), "chr1", (48_000, 49_000))]);
        assert!(all_shared(&a, &c, &[(0, 0), (1, 1)]).is_empty());
    }

    #[test]
    fn reverse_jumps_share_as_non_colinear() {
        let a = query(vec![((0, 1000), "chr1", (50_000, 51_000)), ((1000, 2000), "chr1", (45_000, 46_000))]);
        let b = query(vec![((0, 1000), "chr1", (50_100, 51_100)), ((1000, 2000), "chr1", (45_100, 46_100))]);
        let got = all_shared(&a, &b, &[(0, 0), (1, 1)]);
        assert_eq!(
            got,
            vec![SharedRearr {
                opposed: false,
                kind: RearrType::NonColinear
            }]
        );
    }

    #[test]
    fn adjacent_variant_mirrors_the_full_search() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr7", (8000, 9000))]);
        let b = query(vec![((100, 1100), "chr1", (5100, 6100)), ((1100, 2100), "chr7", (8100, 9100))]);

        assert_eq!(adjacent_shared(&a, 1, &b, 1, &params()), Some((RearrType::InterChrom, 1)));
        assert_eq!(adjacent_shared(&a, 0, &b, 0, &params()), None);
    }

    #[test]
    fn adjacent_variant_handles_opposed_strands() {
        let a = query(vec![((0, 1000), "chr1", (5000, 6000)), ((1000, 2000), "chr7", (8000, 9000))]);
        let b = query(vec![
            ((0, 1000), "chr7", (-9000, -8000)),
            ((1000, 2000), "chr1", (-6000, -5000)),
        ]);

        // A's part 1 (chr7) overlaps B's part 0 (chr7, other strand)
        assert_eq!(adjacent_shared(&a, 1, &b, 0, &params()), Some((RearrType::InterChrom, 1)));
    }
}
