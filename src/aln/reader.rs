//! Reading query-to-reference alignments in three interchangeable formats:
//! pairwise (MAF) blocks, tabular rows, and shrunk delta rows.
//!
//! Consecutive alignments with the same `(queryName, queryLen)` are grouped
//! into one [`ReadAln`]; a blank or comment line closes the group. Alignments
//! whose mismap probability exceeds the threshold are dropped silently.

use crate::{
    aln::{AlnBlock, ReadAln, Span, SubAln, shrink, shrink::ShrunkState, split},
    err::ScanError,
};
use std::io::Read;

pub(crate) struct ReadParams {
    pub min_gap: i64,
    pub max_mismap: f64,
}

/// One parsed `s` row of a pairwise block.
struct SRow {
    name: String,
    span: Span,
    seq_size: i64,
    seq: String,
}

fn parse_s_row(line: &str) -> Result<SRow, ScanError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 {
        return Err(ScanError::BadLine(line.to_string()));
    }
    let num = |i: usize| -> Result<i64, ScanError> {
        fields[i].parse().map_err(|_| ScanError::bad_field(fields[i], line))
    };

    let start = num(2)?;
    let span_len = num(3)?;
    let seq_size = num(5)?;
    let beg = match fields[4] {
        "+" => start,
        "-" => start - seq_size,
        other => return Err(ScanError::bad_field(other, line)),
    };

    Ok(SRow {
        name: fields[1].to_string(),
        span: Span::new(beg, beg + span_len),
        seq_size,
        seq: fields[6].to_string(),
    })
}

/// The value of a trailing `key=value` token, if present.
fn keyword_value(fields: &[&str], key: &str) -> Option<f64> {
    fields.iter().rev().find_map(|f| {
        let (k, v) = f.split_once('=')?;
        (k == key).then(|| v.parse().ok())?
    })
}

fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Reads every query record from one input stream.
///
/// `file_index` tags the records (1-based case file number, 0 for controls);
/// `next_id` numbers sub-alignments globally in input order.
pub(crate) fn read_queries<R: Read>(
    mut input: R, file_index: usize, next_id: &mut usize, params: &ReadParams,
) -> Result<Vec<ReadAln>, ScanError> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;

    let mut out: Vec<ReadAln> = Vec::new();
    let mut cur: Option<ReadAln> = None;
    let mut part_name: Option<String> = None;
    let mut shrunk = ShrunkState::default();

    let mut lines = text.lines().peekable();
    while let Some(raw) = lines.next() {
        let line = raw.trim_end();

        if line.is_empty() {
            close_record(&mut cur, &mut out);
            shrunk.reset();
            continue;
        }

        if let Some(rest) = line.strip_prefix('#') {
            close_record(&mut cur, &mut out);
            shrunk.reset();
            if let Some(name) = rest.trim_start().strip_prefix("PART")
                && name.starts_with(char::is_whitespace)
            {
                part_name = Some(name.trim().to_string());
            }
            continue;
        }

        match first_token(line) {
            Some("a") => {
                let a_fields: Vec<&str> = line.split_whitespace().collect();
                let mismap = keyword_value(&a_fields, "mismap").unwrap_or(0.0);

                let mut block = vec![line.to_string()];
                while let Some(&next) = lines.peek() {
                    match first_token(next) {
                        Some("s" | "q" | "p" | "i" | "e") => block.push(lines.next().unwrap().trim_end().to_string()),
                        _ => break,
                    }
                }
                // the blank separator belongs to the block
                if lines.peek().is_some_and(|l| l.trim().is_empty()) {
                    lines.next();
                }

                if mismap > params.max_mismap {
                    continue;
                }

                let mut rows = block.iter().filter(|l| first_token(l) == Some("s"));
                let (Some(rf_line), Some(qry_line)) = (rows.next(), rows.next()) else {
                    return Err(ScanError::BadLine(line.to_string()));
                };
                let rf = parse_s_row(rf_line)?;
                let qry = parse_s_row(qry_line)?;
                if rf.seq.len() != qry.seq.len() {
                    return Err(ScanError::bad_field(&qry.seq, qry_line));
                }

                let pieces = split::split_gapped_rows(
                    rf.span.beg,
                    rf.seq.as_bytes(),
                    qry.span.beg,
                    qry.seq.as_bytes(),
                    params.min_gap,
                );
                append_alignment(
                    &mut cur,
                    &mut out,
                    file_index,
                    (qry.name, qry.seq_size),
                    &rf.name,
                    pieces,
                    AlnBlock::Pairwise(block),
                    next_id,
                );
            }
            Some(tok) if tok.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                let fields: Vec<&str> = line.split_whitespace().collect();
                match fields.len() {
                    4 | 5 => {
                        let Some(name) = part_name.clone() else {
                            return Err(ScanError::UnnamedRow(line.to_string()));
                        };
                        let (qry, rf, ref_name) = shrink::parse_row(line, &mut shrunk)
                            .map_err(|field| ScanError::bad_field(field, line))?;
                        append_alignment(
                            &mut cur,
                            &mut out,
                            file_index,
                            (name, 0),
                            &ref_name,
                            vec![(rf, qry)],
                            AlnBlock::Shrunk,
                            next_id,
                        );
                    }
                    n if n >= 12 => {
                        let num = |i: usize| -> Result<i64, ScanError> {
                            fields[i].parse().map_err(|_| ScanError::bad_field(fields[i], line))
                        };
                        let signed = |start: i64, strand: &str, size: i64| -> Result<i64, ScanError> {
                            match strand {
                                "+" => Ok(start),
                                "-" => Ok(start - size),
                                other => Err(ScanError::bad_field(other, line)),
                            }
                        };

                        if keyword_value(&fields, "mismap").unwrap_or(0.0) > params.max_mismap {
                            continue;
                        }

                        let rf_size = num(5)?;
                        let rf_beg = signed(num(2)?, fields[4], rf_size)?;
                        let qry_size = num(10)?;
                        let qry_beg = signed(num(7)?, fields[9], qry_size)?;

                        let pieces = split::split_tab_blocks(rf_beg, qry_beg, fields[11], params.min_gap)
                            .map_err(|field| ScanError::bad_field(field, line))?;
                        append_alignment(
                            &mut cur,
                            &mut out,
                            file_index,
                            (fields[6].to_string(), qry_size),
                            fields[1],
                            pieces,
                            AlnBlock::Tabular(line.to_string()),
                            next_id,
                        );
                    }
                    _ => return Err(ScanError::BadLine(line.to_string())),
                }
            }
            _ => return Err(ScanError::BadLine(line.to_string())),
        }
    }
    close_record(&mut cur, &mut out);
    Ok(out)
}

/// Adds one alignment's pieces to the current record, opening a new record
/// when the `(queryName, queryLen)` key changes.
#[allow(clippy::too_many_arguments)]
fn append_alignment(
    cur: &mut Option<ReadAln>, out: &mut Vec<ReadAln>, file_index: usize, key: (String, i64), ref_name: &str,
    pieces: Vec<(Span, Span)>, block: AlnBlock, next_id: &mut usize,
) {
    if cur.as_ref().is_none_or(|r| (r.name.as_str(), r.length) != (key.0.as_str(), key.1)) {
        close_record(cur, out);
        *cur = Some(ReadAln {
            file_index,
            name: key.0,
            length: key.1,
            parts: Vec::new(),
            kind: None,
            blocks: Vec::new(),
        });
    }

    let rec = cur.as_mut().unwrap();
    for (rf, qry) in pieces {
        let id = *next_id;
        *next_id += 1;
        let part = if qry.strand().is_forward() {
            SubAln {
                id,
                qry,
                ref_name: ref_name.to_string(),
                rf,
            }
        } else {
            SubAln {
                id,
                qry: qry.flipped(),
                ref_name: ref_name.to_string(),
                rf: rf.flipped(),
            }
        };
        rec.parts.push(part);
    }
    rec.blocks.push(block);
}

fn close_record(cur: &mut Option<ReadAln>, out: &mut Vec<ReadAln>) {
    if let Some(mut rec) = cur.take() {
        rec.parts.sort_by_key(|p| (p.qry.beg, p.qry.end));
        out.push(rec);
    }
}
