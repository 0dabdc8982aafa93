//! Matching rearrangement ends along each chromosome.
//!
//! Every rearrangement contributes two endpoint nodes: the facing edge of
//! its first segment (end side 0) and of its last (end side 1), positioned
//! at the segment's midpoint. A node is a *lower end* when its segment runs
//! into the rearrangement from below, so the intact chromosome attaches on
//! the lower side; an *upper end* attaches on the upper side. Scanning left
//! to right, each lower end may pair with one earlier, still-open upper end;
//! the pair spans the intact sequence joining the two rearrangements.

use crate::derive::Rearrangement;
use std::collections::BTreeMap;

/// One rearrangement end, `(rearrangementIndex, endSide)`.
pub(crate) type End = (usize, u8);

/// A matched pair of ends.
pub(crate) type Edge = (End, End);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EndNode {
    pub pos: i64,
    pub is_lower: bool,
    pub rearr: usize,
    pub side: u8,
}

impl EndNode {
    fn end(&self) -> End {
        (self.rearr, self.side)
    }
}

/// Endpoint nodes per chromosome, position-sorted. At equal positions upper
/// ends sort first, so ends meeting at a shared breakpoint can match.
pub(crate) fn endpoint_nodes(rearrs: &[Rearrangement]) -> BTreeMap<String, Vec<EndNode>> {
    let mut per_chrom: BTreeMap<String, Vec<EndNode>> = BTreeMap::new();

    for (i, r) in rearrs.iter().enumerate() {
        let (Some(first), Some(last)) = (r.segments.first(), r.segments.last()) else {
            continue;
        };
        per_chrom.entry(first.chrom.clone()).or_default().push(EndNode {
            pos: first.midpoint(),
            is_lower: first.is_forward(),
            rearr: i,
            side: 0,
        });
        per_chrom.entry(last.chrom.clone()).or_default().push(EndNode {
            pos: last.midpoint(),
            is_lower: !last.is_forward(),
            rearr: i,
            side: 1,
        });
    }

    for nodes in per_chrom.values_mut() {
        nodes.sort_by_key(|n| (n.pos, n.is_lower, n.rearr, n.side));
    }
    per_chrom
}

/// The number of maximum matchings of one chromosome's nodes: scanning left
/// to right with `k` open upper ends, each lower end must take one of the
/// `k` when any is open.
pub(crate) fn matching_count(nodes: &[EndNode]) -> u64 {
    let mut open = 0u64;
    let mut count = 1u64;
    for n in nodes {
        if n.is_lower {
            if open > 0 {
                count = count.saturating_mul(open);
                open -= 1;
            }
        } else {
            open += 1;
        }
    }
    count
}

/// The greedy last-in-first-out pairing, which is always a maximum matching
/// on this node sequence.
pub(crate) fn lifo_matching(nodes: &[EndNode]) -> Vec<Edge> {
    let mut stack: Vec<End> = Vec::new();
    let mut edges = Vec::new();
    for n in nodes {
        if n.is_lower {
            if let Some(upper) = stack.pop() {
                edges.push((upper, n.end()));
            }
        } else {
            stack.push(n.end());
        }
    }
    edges
}

/// Every maximum matching, by backtracking over which open upper end each
/// lower end takes.
pub(crate) fn all_matchings(nodes: &[EndNode]) -> Vec<Vec<Edge>> {
    fn rec(nodes: &[EndNode], i: usize, open: &mut Vec<End>, cur: &mut Vec<Edge>, out: &mut Vec<Vec<Edge>>) {
        let Some(n) = nodes.get(i) else {
            out.push(cur.clone());
            return;
        };
        if !n.is_lower {
            open.push(n.end());
            rec(nodes, i + 1, open, cur, out);
            open.pop();
        } else if open.is_empty() {
            rec(nodes, i + 1, open, cur, out);
        } else {
            for j in 0..open.len() {
                let upper = open.remove(j);
                cur.push((upper, n.end()));
                rec(nodes, i + 1, open, cur, out);
                cur.pop();
                open.insert(j, upper);
            }
        }
    }

    let mut out = Vec::new();
    rec(nodes, 0, &mut Vec::new(), &mut Vec::new(), &mut out);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::derive::Segment;

    fn rearr(name: &str, segments: Vec<Segment>) -> Rearrangement {
        Rearrangement {
            name: name.to_string(),
            segments,
        }
    }

    #[test]
    fn facing_edges_become_nodes() {
        // forward first segment: the chromosome below attaches; forward last
        // segment: the chromosome above attaches
        let rearrs = vec![rearr(
            "group1-2",
            vec![Segment::new("chr1", 1000, 2000), Segment::new("chr7", 5000, 6000)],
        )];
        let nodes = endpoint_nodes(&rearrs);

        assert_eq!(
            nodes["chr1"],
            vec![EndNode {
                pos: 1500,
                is_lower: true,
                rearr: 0,
                side: 0
            }]
        );
        assert_eq!(
            nodes["chr7"],
            vec![EndNode {
                pos: 5500,
                is_lower: false,
                rearr: 0,
                side: 1
            }]
        );
    }

    #[test]
    fn upper_then_lower_pairs_up() {
        let rearrs = vec![
            // ends with chr7 forward: upper end at 10_050
            rearr("g1", vec![Segment::new("chr1", 0, 100), Segment::new("chr7", 10_000, 10_100)]),
            // begins with chr7 forward: lower end at 11_950
            rearr("g2", vec![Segment::new("chr7", 11_900, 12_000), Segment::new("chr3", 0, 100)]),
        ];
        let nodes = endpoint_nodes(&rearrs);
        let chr7 = &nodes["chr7"];

        assert_eq!(matching_count(chr7), 1);
        assert_eq!(lifo_matching(chr7), vec![((0, 1), (1, 0))]);
        assert_eq!(all_matchings(chr7), vec![vec![((0, 1), (1, 0))]]);
    }

    #[test]
    fn equal_midpoints_still_match() {
        let rearrs = vec![
            rearr("g1", vec![Segment::new("chr2", 0, 100), Segment::new("chr1", 900, 1100)]),
            rearr("g2", vec![Segment::new("chr1", 900, 1100), Segment::new("chr2", 5000, 5100)]),
        ];
        let chr1 = &endpoint_nodes(&rearrs)["chr1"];
        assert_eq!(matching_count(chr1), 1);
        assert_eq!(lifo_matching(chr1).len(), 1);
    }

    #[test]
    fn count_equals_enumeration_length() {
        // two upper ends open when each lower end arrives: 2 * 1 = 2
        let rearrs = vec![
            rearr("g1", vec![Segment::new("chr9", 0, 100), Segment::new("chr1", 1000, 1100)]),
            rearr("g2", vec![Segment::new("chr9", 500, 600), Segment::new("chr1", 1200, 1300)]),
            rearr("g3", vec![Segment::new("chr1", 2000, 2100), Segment::new("chr9", 900, 999)]),
            rearr("g4", vec![Segment::new("chr1", 2200, 2300), Segment::new("chr9", 1400, 1500)]),
        ];
        for (_, nodes) in endpoint_nodes(&rearrs) {
            assert_eq!(matching_count(nodes.as_slice()) as usize, all_matchings(&nodes).len());
        }
    }

    #[test]
    fn unmatched_lower_ends_are_allowed() {
        let rearrs = vec![rearr("g1", vec![Segment::new("chr1", 900, 1100), Segment::new("chr2", 0, 100)])];
        let chr1 = &endpoint_nodes(&rearrs)["chr1"];
        assert_eq!(matching_count(chr1), 1);
        assert!(lifo_matching(chr1).is_empty());
    }
}
