//! Finding all pairs of sub-alignments that overlap on the reference.
//!
//! The sweep works on absolute (forward-strand) reference intervals; strand
//! agreement is judged later, by the shared-rearrangement oracle, under its
//! per-pair orientation choice. Results are pure mappings so each consumer
//! gets its own copy and nothing mutates shared state.

use crate::aln::ReadAln;
use foldhash::HashMap;

/// For each pair of queries, the part pairs that overlap on the reference.
///
/// Keyed by `(queryA, queryB)` with `queryA < queryB`; values are
/// `(partInA, partInB)` index pairs.
pub(crate) type PartPairMap = HashMap<(usize, usize), Vec<(usize, usize)>>;

struct Entry<'a> {
    ref_name: &'a str,
    beg: i64,
    end: i64,
    query: usize,
    part: usize,
}

fn entries<'a>(queries: &'a [ReadAln], sel: &[usize]) -> Vec<Entry<'a>> {
    let mut out = Vec::new();
    for &q in sel {
        for (i, p) in queries[q].parts.iter().enumerate() {
            let (beg, end) = p.rf.forward();
            out.push(Entry {
                ref_name: &p.ref_name,
                beg,
                end,
                query: q,
                part: i,
            });
        }
    }
    out.sort_by_key(|e| (e.ref_name, e.beg, e.end, e.query, e.part));
    out
}

/// Every unordered pair of sub-alignments from *different* queries in `sel`
/// that overlap on the reference. `O(n + overlapCount)` by sweeping with an
/// active set pruned at each new entry.
pub(crate) fn overlapping_part_pairs(queries: &[ReadAln], sel: &[usize]) -> PartPairMap {
    let entries = entries(queries, sel);
    let mut map = PartPairMap::default();
    let mut active: Vec<&Entry> = Vec::new();

    for e in &entries {
        active.retain(|a| a.ref_name == e.ref_name && a.end > e.beg);
        for a in &active {
            if a.query == e.query {
                continue;
            }
            let (key, pair) = if a.query < e.query {
                ((a.query, e.query), (a.part, e.part))
            } else {
                ((e.query, a.query), (e.part, a.part))
            };
            map.entry(key).or_default().push(pair);
        }
        active.push(e);
    }
    map
}

/// For each case query, the overlapping control sub-alignments, as a
/// two-finger merge over the two sorted entry lists.
///
/// Keyed by `(caseQuery, controlQuery)`; values are `(casePart,
/// controlPart)` pairs.
pub(crate) fn case_control_part_pairs(
    cases: &[ReadAln], sel: &[usize], controls: &[ReadAln],
) -> PartPairMap {
    let case_entries = entries(cases, sel);
    let all_controls: Vec<usize> = (0..controls.len()).collect();
    let ctrl_entries = entries(controls, &all_controls);

    let mut map = PartPairMap::default();
    let mut active: Vec<&Entry> = Vec::new();
    let mut i = 0;

    for e in &case_entries {
        while i < ctrl_entries.len() {
            let c = &ctrl_entries[i];
            if (c.ref_name, c.beg) < (e.ref_name, e.end) {
                active.push(c);
                i += 1;
            } else {
                break;
            }
        }
        active.retain(|c| c.ref_name == e.ref_name && c.end > e.beg);
        for c in &active {
            map.entry((e.query, c.query)).or_default().push((e.part, c.part));
        }
    }
    map
}
