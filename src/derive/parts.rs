//! Long-segment splitting, proximity grouping, and Stage B output.

use crate::derive::Segment;
use std::io::{self, Write};

/// One derived-chromosome part ready for output.
#[derive(Clone, Debug)]
pub(crate) struct DerPart {
    pub name: String,
    pub circular: bool,
    pub segments: Vec<Segment>,
}

/// Splits a derived sequence at segments longer than `max_len`: the long
/// segment is replaced by two stubs of `max_len / 3`, breaking the sequence
/// where an adjacency edge used to be. A circular sequence with one cut
/// becomes a single linear part starting after the cut; more cuts, or a
/// linear sequence, yield suffixed parts `a`, `b`, ...
pub(crate) fn split_long_segments(
    base: &str, circular: bool, segments: Vec<Segment>, max_len: i64,
) -> Vec<DerPart> {
    let stub = max_len / 3;
    let mut pieces: Vec<Vec<Segment>> = Vec::new();
    let mut cur: Vec<Segment> = Vec::new();

    for s in segments {
        if s.span_len() <= max_len {
            cur.push(s);
            continue;
        }
        let dir = if s.is_forward() { 1 } else { -1 };
        cur.push(Segment::new(s.chrom.clone(), s.beg, s.beg + dir * stub));
        pieces.push(std::mem::take(&mut cur));
        cur.push(Segment::new(s.chrom.clone(), s.end - dir * stub, s.end));
    }

    let cut = !pieces.is_empty();
    if circular && cut {
        // the trailing piece wraps around onto the first
        let mut head = std::mem::take(&mut pieces[0]);
        cur.append(&mut head);
        pieces[0] = cur;
    } else {
        pieces.push(cur);
    }

    let suffixed = pieces.len() > 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, segments)| DerPart {
            name: if suffixed {
                format!("{base}{}", (b'a' + (i % 26) as u8) as char)
            } else {
                base.to_string()
            },
            circular: circular && !cut,
            segments,
        })
        .collect()
}

/// Groups parts into connected components: two parts are connected when any
/// of their segments lie within `max_len` of each other on the same
/// chromosome. Components are listed by their smallest part index.
pub(crate) fn proximity_components(parts: &[DerPart], max_len: i64) -> Vec<Vec<usize>> {
    let mut comp: Vec<usize> = (0..parts.len()).collect();

    // union-find with path halving
    fn find(comp: &mut [usize], mut i: usize) -> usize {
        while comp[i] != i {
            comp[i] = comp[comp[i]];
            i = comp[i];
        }
        i
    }

    let near = |a: &Segment, b: &Segment| {
        if a.chrom != b.chrom {
            return false;
        }
        let (alo, ahi) = a.bounds();
        let (blo, bhi) = b.bounds();
        alo.max(blo) - ahi.min(bhi) <= max_len
    };

    for i in 0..parts.len() {
        for j in i + 1..parts.len() {
            let linked = parts[i]
                .segments
                .iter()
                .any(|a| parts[j].segments.iter().any(|b| near(a, b)));
            if linked {
                let (ri, rj) = (find(&mut comp, i), find(&mut comp, j));
                if ri != rj {
                    comp[rj.max(ri)] = rj.min(ri);
                }
            }
        }
    }

    let mut out: Vec<Vec<usize>> = vec![Vec::new(); parts.len()];
    for i in 0..parts.len() {
        let root = find(&mut comp, i);
        out[root].push(i);
    }
    out.retain(|c| !c.is_empty());
    out
}

/// Writes the parts of one derivation, grouped by proximity, with section
/// labels from `label` (the component number, optionally prefixed by the
/// matching-combination number).
pub(crate) fn write_grouped_parts<W: Write>(
    out: &mut W, parts: &[DerPart], max_len: i64, label: impl Fn(usize) -> String,
) -> io::Result<()> {
    for (k, members) in proximity_components(parts, max_len).into_iter().enumerate() {
        writeln!(out, "# PART {}", label(k + 1))?;
        for &i in &members {
            let p = &parts[i];
            if p.circular {
                writeln!(out, "{}:CIRCULAR", p.name)?;
            } else {
                writeln!(out, "{}", p.name)?;
            }
            for s in &p.segments {
                let dir = if s.is_forward() { '>' } else { '<' };
                writeln!(out, "{}\t{}\t{}\t{}", s.chrom, s.beg, dir, s.end)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_segments_stay_whole() {
        let segs = vec![Segment::new("chr1", 0, 1000), Segment::new("chr2", 5000, 4000)];
        let parts = split_long_segments("der1", false, segs.clone(), 1_000_000);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "der1");
        assert_eq!(parts[0].segments, segs);
    }

    #[test]
    fn long_segments_split_into_stubs() {
        let segs = vec![
            Segment::new("chr1", 0, 1000),
            Segment::new("chr2", 0, 9_000_000),
            Segment::new("chr3", 0, 1000),
        ];
        let parts = split_long_segments("der2", false, segs, 300_000);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "der2a");
        assert_eq!(parts[1].name, "der2b");
        assert_eq!(
            parts[0].segments,
            vec![Segment::new("chr1", 0, 1000), Segment::new("chr2", 0, 100_000)]
        );
        assert_eq!(
            parts[1].segments,
            vec![Segment::new("chr2", 8_900_000, 9_000_000), Segment::new("chr3", 0, 1000)]
        );
    }

    #[test]
    fn reverse_long_segments_split_downhill() {
        let segs = vec![Segment::new("chr2", 9_000_000, 0)];
        let parts = split_long_segments("der1", false, segs, 300_000);
        assert_eq!(parts[0].segments, vec![Segment::new("chr2", 9_000_000, 8_900_000)]);
        assert_eq!(parts[1].segments, vec![Segment::new("chr2", 100_000, 0)]);
    }

    #[test]
    fn one_cut_linearizes_a_circle() {
        let segs = vec![Segment::new("chr1", 0, 1000), Segment::new("chr2", 0, 9_000_000)];
        let parts = split_long_segments("der1", true, segs, 300_000);

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "der1");
        assert!(!parts[0].circular);
        // the wrap puts the tail stub first
        assert_eq!(
            parts[0].segments,
            vec![
                Segment::new("chr2", 8_900_000, 9_000_000),
                Segment::new("chr1", 0, 1000),
                Segment::new("chr2", 0, 100_000),
            ]
        );
    }

    #[test]
    fn nearby_parts_group_together() {
        let parts = vec![
            DerPart {
                name: "der1".into(),
                circular: false,
                segments: vec![Segment::new("chr1", 0, 1000)],
            },
            DerPart {
                name: "der2".into(),
                circular: false,
                segments: vec![Segment::new("chr1", 500_000, 501_000)],
            },
            DerPart {
                name: "der3".into(),
                circular: false,
                segments: vec![Segment::new("chr9", 0, 1000)],
            },
        ];
        let comps = proximity_components(&parts, 1_000_000);
        assert_eq!(comps, vec![vec![0, 1], vec![2]]);

        let far = proximity_components(&parts, 100_000);
        assert_eq!(far, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn grouped_output_format() {
        let parts = vec![DerPart {
            name: "der1".into(),
            circular: true,
            segments: vec![Segment::new("chr1", 100, 2000), Segment::new("chr7", 9000, 8000)],
        }];
        let mut buf = Vec::new();
        write_grouped_parts(&mut buf, &parts, 1_000_000, |k| k.to_string()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "# PART 1\nder1:CIRCULAR\nchr1\t100\t>\t2000\nchr7\t9000\t<\t8000\n");
    }
}
