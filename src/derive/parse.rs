//! Scanning the clump stage's output for rearrangement groups.
//!
//! Only `#` lines matter: a one-token line opens a group, a multi-token line
//! inside an open group supplies the representative read's ranges (with
//! `#  `-prefixed continuations from column wrapping), and `# PART` closes
//! the group. Alignment bodies and the command echo are passed over.

use crate::{
    derive::{Rearrangement, Segment},
    err::ScanError,
};
use std::io::{BufRead, BufReader, Read};

/// Parses one range token, `chrom:beg>end` or `chrom:hi<lo`.
fn parse_range(tok: &str) -> Result<Segment, ScanError> {
    let (chrom, rest) = tok.rsplit_once(':').ok_or_else(|| ScanError::BadRange(tok.to_string()))?;
    let dir = rest
        .find(['>', '<'])
        .ok_or_else(|| ScanError::BadRange(tok.to_string()))?;
    let (a, b) = (&rest[..dir], &rest[dir + 1..]);
    let beg: i64 = a.parse().map_err(|_| ScanError::BadRange(tok.to_string()))?;
    let end: i64 = b.parse().map_err(|_| ScanError::BadRange(tok.to_string()))?;

    if beg == end {
        return Err(ScanError::EmptySegment(tok.to_string()));
    }
    let forward = rest.as_bytes()[dir] == b'>';
    if forward != (beg < end) {
        return Err(ScanError::BadRange(tok.to_string()));
    }
    Ok(Segment::new(chrom, beg, end))
}

/// Whether a group id filter selects this group name. Ids are matched
/// against the integers embedded in the name's stem (before the trailing
/// `-size`), so `group3-7` answers to 3 and `merge3_7` to 3 and 7.
fn selected(name: &str, ids: Option<&[String]>) -> bool {
    let Some(ids) = ids else { return true };
    let stem = name.rsplit_once('-').map_or(name, |(s, _)| s);
    let mut digits = String::new();
    let mut numbers = Vec::new();
    for c in stem.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            numbers.push(std::mem::take(&mut digits));
        }
    }
    numbers.iter().any(|n| ids.iter().any(|id| id == n))
}

/// Reads every selected rearrangement group from clump-stage output.
pub(crate) fn parse_rearrangements<R: Read>(
    input: R, ids: Option<&[String]>,
) -> Result<Vec<Rearrangement>, ScanError> {
    let mut out: Vec<Rearrangement> = Vec::new();
    let mut open: Option<(String, bool, Option<Vec<Segment>>)> = None;
    let mut capturing = false;

    let mut close = |open: &mut Option<(String, bool, Option<Vec<Segment>>)>, out: &mut Vec<Rearrangement>| {
        if let Some((name, keep, Some(segments))) = open.take()
            && keep
            && !segments.is_empty()
        {
            out.push(Rearrangement { name, segments });
        }
    };

    for line in BufReader::new(input).lines() {
        let line = line?;
        let Some(rest) = line.strip_prefix('#') else {
            capturing = false;
            continue;
        };

        if rest.trim_start().starts_with("PART") {
            close(&mut open, &mut out);
            capturing = false;
            continue;
        }

        // a wrapped continuation of the line being captured
        if let Some(cont) = rest.strip_prefix("  ") {
            if capturing && let Some((_, true, Some(segments))) = &mut open {
                for tok in cont.split_whitespace() {
                    segments.push(parse_range(tok)?);
                }
            }
            continue;
        }

        let tokens: Vec<&str> = rest.split_whitespace().collect();
        match tokens.as_slice() {
            [] => capturing = false,
            [name] => {
                close(&mut open, &mut out);
                open = Some((name.to_string(), selected(name, ids), None));
                capturing = false;
            }
            [_, ranges @ ..] => {
                capturing = false;
                if let Some((_, keep, captured @ None)) = &mut open {
                    if !*keep {
                        continue;
                    }
                    let mut segments = Vec::with_capacity(ranges.len());
                    for tok in ranges {
                        segments.push(parse_range(tok)?);
                    }
                    *captured = Some(segments);
                    capturing = true;
                }
            }
        }
    }
    close(&mut open, &mut out);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use indoc::indoc;

    #[test]
    fn groups_take_their_first_reads_ranges() {
        let text = indoc! {"
            # rearrange-core clump -s2 reads.maf
            # group1-2
            # read1 chr1:1000>2000 chr7:9000<8000
            # read2 chr1:1010>2010 chr7:9010<8010
            # PART read1
            a score=10
            s chr1 1000 8 + 248956422 ACGTACGT
            s read1 0 8 + 5000 ACGTACGT
            # group2-2
            # read3 chr2:500>900
            # PART read3
        "};

        let got = parse_rearrangements(text.as_bytes(), None).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].name, "group1-2");
        assert_eq!(
            got[0].segments,
            vec![Segment::new("chr1", 1000, 2000), Segment::new("chr7", 9000, 8000)]
        );
        assert_eq!(got[1].name, "group2-2");
        assert_eq!(got[1].segments, vec![Segment::new("chr2", 500, 900)]);
    }

    #[test]
    fn wrapped_continuations_extend_the_first_read() {
        let text = indoc! {"
            # group1-2
            # read1 chr1:1000>2000
            #  chr7:9000<8000
            # read2 chr3:1>2
            # PART read1
        "};

        let got = parse_rearrangements(text.as_bytes(), None).unwrap();
        assert_eq!(got[0].segments.len(), 2);
        assert_eq!(got[0].segments[1], Segment::new("chr7", 9000, 8000));
    }

    #[test]
    fn group_filter_selects_by_embedded_id() {
        let text = indoc! {"
            # group1-2
            # read1 chr1:1000>2000
            # PART read1
            # group2-2
            # read3 chr2:500>900
            # PART read3
        "};

        let ids = vec!["2".to_string()];
        let got = parse_rearrangements(text.as_bytes(), Some(&ids)).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "group2-2");
    }

    #[test]
    fn zero_length_segments_abort() {
        let text = "# group1-1\n# read1 chr1:100>100\n# PART read1\n";
        let err = parse_rearrangements(text.as_bytes(), None).unwrap_err();
        assert!(matches!(err, ScanError::EmptySegment(_)));
    }

    #[test]
    fn malformed_ranges_abort() {
        let text = "# group1-1\n# read1 chr1=100-200\n# PART read1\n";
        let err = parse_rearrangements(text.as_bytes(), None).unwrap_err();
        assert!(matches!(err, ScanError::BadRange(_)));
    }
}
