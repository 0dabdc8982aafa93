//! Strand-flipping alignment text without rewriting it.
//!
//! A flip renames the query by toggling its trailing `+`/`-` tag (appending
//! one on first flip) and toggles the query strand letter; under the renaming
//! convention the flipped text describes the same alignment on the reverse
//! complement of the read, so no coordinate changes. Other rows are padded
//! when the name grows, to keep the sequence columns aligned.

/// The query name after a strand flip.
pub(crate) fn flipped_name(name: &str) -> String {
    match name.strip_suffix('+') {
        Some(stem) => format!("{stem}-"),
        None => match name.strip_suffix('-') {
            Some(stem) => format!("{stem}+"),
            None => format!("{name}-"),
        },
    }
}

/// Byte ranges of the whitespace-separated tokens of a line.
fn token_ranges(line: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, line.len()));
    }
    out
}

fn splice(line: &str, (beg, end): (usize, usize), replacement: &str) -> String {
    let mut out = String::with_capacity(line.len() + replacement.len());
    out.push_str(&line[..beg]);
    out.push_str(replacement);
    out.push_str(&line[end..]);
    out
}

fn toggled_strand(tok: &str) -> &'static str {
    match tok {
        "+" => "-",
        "-" => "+",
        _ => "?",
    }
}

fn pad_after(line: &str, end: usize, delta: usize) -> String {
    let mut out = String::with_capacity(line.len() + delta);
    out.push_str(&line[..end]);
    for _ in 0..delta {
        out.push(' ');
    }
    out.push_str(&line[end..]);
    out
}

/// Flips the query strand of one pairwise block.
///
/// The second `s` row is the query row: its strand letter is toggled and the
/// query renamed. `q` rows name the query too and are renamed alongside;
/// other rows gain padding when the name grew by a character.
pub(crate) fn flip_pairwise_block(lines: &[String]) -> Vec<String> {
    let qry_row = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.split_whitespace().next() == Some("s"))
        .map(|(i, _)| i)
        .nth(1);
    let Some(qry_row) = qry_row else {
        return lines.to_vec();
    };

    let old_name = lines[qry_row].split_whitespace().nth(1).unwrap_or_default().to_string();
    let new_name = flipped_name(&old_name);
    let delta = new_name.len().saturating_sub(old_name.len());

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let toks = token_ranges(line);
            let first = toks.first().map(|&(s, e)| &line[s..e]);

            if i == qry_row {
                let mut out = line.clone();
                if let Some(&strand) = toks.get(4) {
                    let tok = &line[strand.0..strand.1];
                    out = splice(&out, strand, toggled_strand(tok));
                }
                if let Some(&name) = toks.get(1) {
                    out = splice(&out, name, &new_name);
                }
                return out;
            }

            match first {
                Some("s") | Some("i") | Some("e") if delta > 0 => match toks.get(1) {
                    Some(&(_, end)) => pad_after(line, end, delta),
                    None => line.clone(),
                },
                Some("q") => match toks.get(1) {
                    Some(&name) if &line[name.0..name.1] == old_name => splice(line, name, &new_name),
                    _ => line.clone(),
                },
                Some("p") if delta > 0 => match toks.first() {
                    Some(&(_, end)) => pad_after(line, end, delta),
                    None => line.clone(),
                },
                _ => line.clone(),
            }
        })
        .collect()
}

/// Flips the query strand of one tabular row: field 9 is the query strand,
/// field 6 the query name.
pub(crate) fn flip_tabular_row(line: &str) -> String {
    let toks = token_ranges(line);
    let mut out = line.to_string();

    if let Some(&strand) = toks.get(9) {
        let tok = &line[strand.0..strand.1];
        out = splice(&out, strand, toggled_strand(tok));
    }
    if let Some(&name) = toks.get(6) {
        out = splice(&out, name, &flipped_name(&line[name.0..name.1]));
    }
    out
}
