//! Walking matched rearrangement ends into chains and concatenating their
//! segments into derived chromosomes.

use crate::derive::{Rearrangement, Segment, matching::{Edge, End}};
use foldhash::HashMap;

/// A chain of rearrangements with per-element orientation. Circular chains
/// reconnect to their own start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Chain {
    pub links: Vec<(usize, bool)>,
    pub circular: bool,
}

/// A rearrangement's segments in the chosen orientation.
fn oriented_segments(r: &Rearrangement, flipped: bool) -> Vec<Segment> {
    if flipped {
        r.segments.iter().rev().map(Segment::reversed).collect()
    } else {
        r.segments.clone()
    }
}

/// Walks every rearrangement into a chain: backward from end 0, then
/// forward from end 1. Each matched edge joins one rearrangement's exit end
/// to the next one's entry end; arriving through the "wrong" side flips the
/// neighbour.
pub(crate) fn chains_from_edges(n: usize, edges: &[Edge]) -> Vec<Chain> {
    let mut map: HashMap<End, End> = HashMap::default();
    for &(a, b) in edges {
        map.insert(a, b);
        map.insert(b, a);
    }

    let mut used = vec![false; n];
    let mut out = Vec::new();

    for r0 in 0..n {
        if used[r0] {
            continue;
        }
        used[r0] = true;
        let mut links = vec![(r0, false)];
        let mut circular = false;

        // backward from end 0: a predecessor reached through its end 0 is
        // flipped, because its exit must face us
        let mut cur: End = (r0, 0);
        while let Some(&(r2, s2)) = map.get(&cur) {
            if r2 == r0 {
                circular = true;
                break;
            }
            let flipped = s2 == 0;
            used[r2] = true;
            links.insert(0, (r2, flipped));
            cur = (r2, if flipped { 1 } else { 0 });
        }

        if !circular {
            // forward from end 1: a successor reached through its end 1 is
            // flipped
            let mut cur: End = (links[links.len() - 1].0, 1);
            while let Some(&(r2, s2)) = map.get(&cur) {
                if r2 == links[0].0 {
                    circular = true;
                    break;
                }
                let flipped = s2 == 1;
                used[r2] = true;
                links.push((r2, flipped));
                cur = (r2, if flipped { 0 } else { 1 });
            }
        }

        out.push(Chain { links, circular });
    }
    out
}

/// Reverses a chain in place, flipping every element. Involutive.
pub(crate) fn reverse_chain(chain: &mut Chain) {
    chain.links.reverse();
    for l in &mut chain.links {
        l.1 = !l.1;
    }
}

/// Normalizes orientation: a chain whose two outermost segments both run on
/// the reverse strand reads better the other way around.
pub(crate) fn normalize_orientation(chain: &mut Chain, rearrs: &[Rearrangement]) {
    let Some(&(first, f_flip)) = chain.links.first() else { return };
    let Some(&(last, l_flip)) = chain.links.last() else { return };

    let start_rev = oriented_segments(&rearrs[first], f_flip)
        .first()
        .is_some_and(|s| !s.is_forward());
    let end_rev = oriented_segments(&rearrs[last], l_flip)
        .last()
        .is_some_and(|s| !s.is_forward());

    if start_rev && end_rev {
        reverse_chain(chain);
    }
}

/// Concatenates a chain's oriented segments. Across each junction the two
/// facing segments merge into one, keeping the outer endpoints (they span
/// the same intact stretch of chromosome, seen from both sides); a circular
/// chain also merges across the wrap.
pub(crate) fn derived_segments(chain: &Chain, rearrs: &[Rearrangement]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();

    for &(r, flipped) in &chain.links {
        let segs = oriented_segments(&rearrs[r], flipped);
        let mut iter = segs.into_iter();
        match (out.pop(), iter.next()) {
            (Some(prev_last), Some(first)) => {
                debug_assert_eq!(prev_last.chrom, first.chrom);
                out.push(Segment::new(prev_last.chrom, prev_last.beg, first.end));
            }
            (prev, first) => {
                out.extend(prev);
                out.extend(first);
            }
        }
        out.extend(iter);
    }

    if chain.circular && out.len() > 1 {
        let last = out.pop().unwrap();
        out[0] = Segment::new(last.chrom, last.beg, out[0].end);
    }
    out
}
