//! The compact delta row format: one row per sub-alignment, as differences
//! from the previous row of the same query.
//!
//! A row is `qryInc qryLen refInc refLenDiff` when the reference name is
//! inherited from the previous row, or `qryInc qryLen refBeg refLenDiff
//! refName` when it changes (the reference begin is then absolute). All
//! values are signed; encoding and parsing are exact inverses.

use crate::aln::{Span, SubAln};

/// Decoder state carried between consecutive rows of one query.
#[derive(Default)]
pub(crate) struct ShrunkState {
    qry_end: i64,
    ref_end: i64,
    ref_name: Option<String>,
}

impl ShrunkState {
    pub(crate) fn reset(&mut self) {
        *self = ShrunkState::default();
    }
}

/// Encodes sub-alignments (in query order) as delta rows.
pub(crate) fn encode_rows(parts: &[SubAln]) -> Vec<String> {
    let mut out = Vec::with_capacity(parts.len());
    let mut qry_end = 0i64;
    let mut ref_end = 0i64;
    let mut ref_name: Option<&str> = None;

    for p in parts {
        let qry_inc = p.qry.beg - qry_end;
        let qry_len = p.qry.len();
        let ref_len_diff = p.rf.len() - qry_len;

        let row = if ref_name == Some(p.ref_name.as_str()) {
            format!("{qry_inc}\t{qry_len}\t{}\t{ref_len_diff}", p.rf.beg - ref_end)
        } else {
            format!("{qry_inc}\t{qry_len}\t{}\t{ref_len_diff}\t{}", p.rf.beg, p.ref_name)
        };
        out.push(row);

        qry_end = p.qry.end;
        ref_end = p.rf.end;
        ref_name = Some(p.ref_name.as_str());
    }
    out
}

/// Parses one delta row, advancing the decoder state.
///
/// Returns `(qrySpan, refSpan, refName)`, or the offending token.
pub(crate) fn parse_row(line: &str, st: &mut ShrunkState) -> Result<(Span, Span, String), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 && fields.len() != 5 {
        return Err(line.to_string());
    }

    let num = |i: usize| -> Result<i64, String> { fields[i].parse().map_err(|_| fields[i].to_string()) };

    let qry_inc = num(0)?;
    let qry_len = num(1)?;
    let third = num(2)?;
    let ref_len_diff = num(3)?;

    let qry_beg = st.qry_end + qry_inc;
    let qry_end = qry_beg + qry_len;

    let (ref_beg, ref_name) = if let Some(name) = fields.get(4) {
        (third, name.to_string())
    } else {
        match &st.ref_name {
            Some(name) => (st.ref_end + third, name.clone()),
            None => return Err(fields[2].to_string()),
        }
    };
    let ref_end = ref_beg + qry_len + ref_len_diff;
    if qry_beg >= qry_end || ref_beg >= ref_end {
        return Err(line.to_string());
    }

    st.qry_end = qry_end;
    st.ref_end = ref_end;
    st.ref_name = Some(ref_name.clone());

    Ok((Span::new(qry_beg, qry_end), Span::new(ref_beg, ref_end), ref_name))
}

#[cfg(test)]
mod test {
    use super::*;

    fn part(id: usize, qry: (i64, i64), name: &str, rf: (i64, i64)) -> SubAln {
        SubAln {
            id,
            qry: Span::new(qry.0, qry.1),
            ref_name: name.to_string(),
            rf: Span::new(rf.0, rf.1),
        }
    }

    #[test]
    fn round_trip_preserves_coordinates() {
        let parts = vec![
            part(0, (100, 200), "chr1", (5000, 5100)),
            part(1, (250, 400), "chr1", (9000, 9160)),
            part(2, (400, 500), "chr7", (-8100, -8000)),
        ];

        let rows = encode_rows(&parts);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "100\t100\t5000\t0\tchr1");
        assert_eq!(rows[1], "50\t150\t3900\t10");
        assert_eq!(rows[2], "0\t100\t-8100\t0\tchr7");

        let mut st = ShrunkState::default();
        for (row, want) in rows.iter().zip(&parts) {
            let (qry, rf, name) = parse_row(row, &mut st).unwrap();
            assert_eq!(qry, want.qry);
            assert_eq!(rf, want.rf);
            assert_eq!(name, want.ref_name);
        }
    }

    #[test]
    fn inherited_name_needs_a_predecessor() {
        let mut st = ShrunkState::default();
        assert!(parse_row("10\t20\t100\t0", &mut st).is_err());
        assert!(parse_row("10\t20\t100\t0\tchr2", &mut st).is_ok());
        assert!(parse_row("5\t20\t100\t0", &mut st).is_ok());
    }

    #[test]
    fn zero_length_rows_are_rejected() {
        let mut st = ShrunkState::default();
        assert!(parse_row("10\t0\t100\t0\tchr1", &mut st).is_err());
    }
}
