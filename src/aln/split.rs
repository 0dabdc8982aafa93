//! Splitting alignments at large indels, so that downstream non-colinearity
//! tests operate on gap-free pieces.

use crate::aln::Span;

/// Splits a pairwise alignment at every reference insertion of `min_gap` or
/// more bases, returning `(refSpan, qrySpan)` pieces in alignment order.
///
/// A split seed is a run of `-` in the query row covering at least `min_gap`
/// reference bases; the seed is extended greedily through adjacent gap
/// columns of either row on both sides. Pieces are trimmed to aligned
/// columns at their edges, so none starts or ends in a gap.
pub(crate) fn split_gapped_rows(
    rf_beg: i64, rf_row: &[u8], qry_beg: i64, qry_row: &[u8], min_gap: i64,
) -> Vec<(Span, Span)> {
    let n = rf_row.len().min(qry_row.len());

    // Maximal split regions, as half-open column ranges.
    let mut regions: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < n {
        if qry_row[i] == b'-' {
            let mut j = i;
            let mut ref_bases = 0i64;
            while j < n && qry_row[j] == b'-' {
                if rf_row[j] != b'-' {
                    ref_bases += 1;
                }
                j += 1;
            }
            if ref_bases >= min_gap {
                let mut s = i;
                let mut e = j;
                while s > 0 && (rf_row[s - 1] == b'-' || qry_row[s - 1] == b'-') {
                    s -= 1;
                }
                while e < n && (rf_row[e] == b'-' || qry_row[e] == b'-') {
                    e += 1;
                }
                match regions.last_mut() {
                    Some(last) if last.1 >= s => last.1 = e,
                    _ => regions.push((s, e)),
                }
            }
            i = j;
        } else {
            i += 1;
        }
    }

    // Per-column prefix counts of real bases, to map columns to coordinates.
    let mut rf_pre = Vec::with_capacity(n + 1);
    let mut qry_pre = Vec::with_capacity(n + 1);
    rf_pre.push(0i64);
    qry_pre.push(0i64);
    for k in 0..n {
        rf_pre.push(rf_pre[k] + i64::from(rf_row[k] != b'-'));
        qry_pre.push(qry_pre[k] + i64::from(qry_row[k] != b'-'));
    }

    let mut bounds = Vec::with_capacity(regions.len() + 1);
    let mut start = 0;
    for &(s, e) in &regions {
        if s > start {
            bounds.push((start, s));
        }
        start = e;
    }
    if start < n {
        bounds.push((start, n));
    }

    let mut out = Vec::with_capacity(bounds.len());
    for (mut s, mut e) in bounds {
        while s < e && (rf_row[s] == b'-' || qry_row[s] == b'-') {
            s += 1;
        }
        while e > s && (rf_row[e - 1] == b'-' || qry_row[e - 1] == b'-') {
            e -= 1;
        }
        if s >= e {
            continue;
        }
        out.push((
            Span::new(rf_beg + rf_pre[s], rf_beg + rf_pre[e]),
            Span::new(qry_beg + qry_pre[s], qry_beg + qry_pre[e]),
        ));
    }
    out
}

/// Splits a tabular alignment using its gap descriptor `N[,R:Q]*`, where `N`
/// is a gapless block size and `R:Q` counts unaligned reference and query
/// bases. Every `R:Q` element with `R >= min_gap` induces a split.
///
/// Returns the pieces, or the offending token on a malformed descriptor.
pub(crate) fn split_tab_blocks(
    rf_beg: i64, qry_beg: i64, gaps: &str, min_gap: i64,
) -> Result<Vec<(Span, Span)>, String> {
    let mut out = Vec::new();
    let (mut r, mut q) = (rf_beg, qry_beg);
    let (mut rs, mut qs) = (r, q);
    let mut have = false;

    for el in gaps.split(',') {
        if let Some((a, b)) = el.split_once(':') {
            let ri: i64 = a.parse().map_err(|_| el.to_string())?;
            let qi: i64 = b.parse().map_err(|_| el.to_string())?;
            if ri >= min_gap {
                if have {
                    out.push((Span::new(rs, r), Span::new(qs, q)));
                    have = false;
                }
            }
            r += ri;
            q += qi;
        } else {
            let block: i64 = el.parse().map_err(|_| el.to_string())?;
            if block > 0 {
                if !have {
                    rs = r;
                    qs = q;
                    have = true;
                }
                r += block;
                q += block;
            }
        }
    }
    if have {
        out.push((Span::new(rs, r), Span::new(qs, q)));
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_split_below_threshold() {
        let rf = b"ACGTACGTAC";
        let qy = b"ACGT--GTAC";
        let got = split_gapped_rows(100, rf, 0, qy, 10);
        assert_eq!(got, vec![(Span::new(100, 110), Span::new(0, 8))]);
    }

    #[test]
    fn split_at_big_query_gap() {
        // 5 ref bases deleted from the query, min_gap 5.
        let rf = b"ACGTACGTACGTAC";
        let qy = b"ACGTA-----GTAC";
        let got = split_gapped_rows(0, rf, 1000, qy, 5);
        assert_eq!(
            got,
            vec![
                (Span::new(0, 5), Span::new(1000, 1005)),
                (Span::new(10, 14), Span::new(1005, 1009)),
            ]
        );
    }

    #[test]
    fn split_extends_through_adjacent_gaps() {
        // A query insertion right next to the big deletion is swallowed by
        // the split, so neither piece retains a dangling gap.
        let rf = b"ACG--TACGTACGT";
        let qy = b"ACGGG-----GTAC";
        let got = split_gapped_rows(0, rf, 0, qy, 5);
        assert_eq!(
            got,
            vec![(Span::new(0, 3), Span::new(0, 3)), (Span::new(8, 12), Span::new(5, 9)),]
        );
    }

    #[test]
    fn reverse_strand_coordinates_pass_through() {
        let rf = b"ACGTACGT";
        let qy = b"ACGTACGT";
        let got = split_gapped_rows(-50, rf, -8, qy, 10);
        assert_eq!(got, vec![(Span::new(-50, -42), Span::new(-8, 0))]);
    }

    #[test]
    fn tab_blocks_split_on_big_ref_gap() {
        let got = split_tab_blocks(0, 0, "10,12000:0,5", 10_000).unwrap();
        assert_eq!(
            got,
            vec![
                (Span::new(0, 10), Span::new(0, 10)),
                (Span::new(12010, 12015), Span::new(10, 15)),
            ]
        );
    }

    #[test]
    fn tab_blocks_keep_small_gaps() {
        let got = split_tab_blocks(0, 0, "10,50:3,5", 10_000).unwrap();
        assert_eq!(got, vec![(Span::new(0, 65), Span::new(0, 18))]);
    }

    #[test]
    fn tab_blocks_reject_junk() {
        assert_eq!(split_tab_blocks(0, 0, "10,x:3,5", 100), Err("x:3".to_string()));
    }
}
