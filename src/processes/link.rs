// Description:     Read clumped rearrangement groups, match their breakpoint
//                  ends per chromosome, and emit derived-chromosome parts.

use crate::{
    derive::{
        Rearrangement,
        chains::{chains_from_edges, derived_segments, normalize_orientation},
        matching::{Edge, all_matchings, endpoint_nodes, lifo_matching, matching_count},
        parse::parse_rearrangements,
        parts::{DerPart, split_long_segments, write_grouped_parts},
    },
    err::ScanError,
    io::AlnInput,
    utils::init_logging,
};
use clap::Args;
use either::Either;
use itertools::Itertools;
use log::{debug, warn};
use std::io::{BufWriter, Write, stdout};

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Rearrangement groups from the clump stage (`-` = stdin)
    pub rearrangements_file: String,

    #[arg(short, long)]
    /// Enumerate every maximum matching of breakpoint ends, not just the
    /// innermost-first one
    pub all: bool,

    #[arg(short, long, value_delimiter = ',')]
    /// Only use groups with these ids
    pub groups: Option<Vec<String>>,

    #[arg(short = 'l', long, default_value_t = 1_000_000)]
    /// Maximum length of intact reference sequence carried into a derived
    /// chromosome; longer stretches are cut back to stubs
    pub maxlen: i64,

    #[arg(short = 'v', long)]
    /// Report progress on standard error
    pub verbose: bool,
}

/// Sub-program for linking rearrangement groups into derived chromosomes.
pub fn link_process(args: &LinkArgs) -> Result<(), ScanError> {
    init_logging(args.verbose);

    let input = AlnInput::open(&args.rearrangements_file)?;
    let rearrs = parse_rearrangements(input, args.groups.as_deref())?;
    debug!("{} rearrangement groups", rearrs.len());

    let mut out = BufWriter::new(stdout().lock());
    run_link(args, &rearrs, &mut out)?;
    out.flush()?;
    Ok(())
}

/// All derived parts for one edge set.
fn derive_parts(rearrs: &[Rearrangement], edges: &[Edge], max_len: i64) -> Vec<DerPart> {
    let mut chains = chains_from_edges(rearrs.len(), edges);
    for c in &mut chains {
        normalize_orientation(c, rearrs);
    }

    let mut derived: Vec<_> = chains
        .iter()
        .map(|c| (derived_segments(c, rearrs), c.circular))
        .collect();
    // a stable order: by the sorted segment list itself
    derived.sort_by_key(|(segs, _)| {
        let mut key = segs.clone();
        key.sort();
        key
    });

    derived
        .into_iter()
        .enumerate()
        .flat_map(|(i, (segs, circular))| split_long_segments(&format!("der{}", i + 1), circular, segs, max_len))
        .collect()
}

pub(crate) fn run_link<W: Write>(args: &LinkArgs, rearrs: &[Rearrangement], out: &mut W) -> Result<(), ScanError> {
    if rearrs.is_empty() {
        return Ok(());
    }
    let per_chrom = endpoint_nodes(rearrs);

    let combos = if args.all {
        let choices: Vec<Vec<Vec<Edge>>> = per_chrom.values().map(|nodes| all_matchings(nodes)).collect();
        if choices.is_empty() {
            Either::Left(std::iter::once(Vec::new()))
        } else {
            Either::Right(
                choices
                    .into_iter()
                    .multi_cartesian_product()
                    .map(|combo| combo.into_iter().flatten().collect::<Vec<Edge>>()),
            )
        }
    } else {
        let mut edges = Vec::new();
        for (chrom, nodes) in &per_chrom {
            let count = matching_count(nodes);
            if count > 1 {
                warn!("{count} ways of pairing the rearrangement ends in {chrom}");
            }
            edges.extend(lifo_matching(nodes));
        }
        Either::Left(std::iter::once(edges))
    };

    for (v, edges) in combos.enumerate() {
        let parts = derive_parts(rearrs, &edges, args.maxlen);
        let label = |k: usize| {
            if args.all {
                format!("{}-{k}", v + 1)
            } else {
                k.to_string()
            }
        };
        write_grouped_parts(out, &parts, args.maxlen, label)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::derive::Segment;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: LinkArgs,
    }

    fn args(extra: &[&str]) -> LinkArgs {
        let mut argv = vec!["link"];
        argv.extend_from_slice(extra);
        argv.push("groups.txt");
        TestCli::parse_from(argv).args
    }

    fn rearr(name: &str, segments: Vec<Segment>) -> Rearrangement {
        Rearrangement {
            name: name.to_string(),
            segments,
        }
    }

    fn run(args: &LinkArgs, rearrs: &[Rearrangement]) -> String {
        let mut out = Vec::new();
        run_link(args, rearrs, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn shared_breakpoints_chain_into_one_derivation() {
        // both groups break at chr1:1000; the derived chromosome walks
        // through the shared locus
        let rearrs = vec![
            rearr("group1-2", vec![Segment::new("chr2", 5000, 5100), Segment::new("chr1", 900, 1100)]),
            rearr("group2-2", vec![Segment::new("chr1", 900, 1100), Segment::new("chr3", 200, 300)]),
        ];

        let got = run(&args(&[]), &rearrs);
        assert!(got.starts_with("# PART 1\n"));
        assert!(got.contains("der1\n"));
        assert!(got.contains("chr2\t5000\t>\t5100\n"));
        assert!(got.contains("chr1\t900\t>\t1100\n"));
        assert!(got.contains("chr3\t200\t>\t300\n"));
        // the two chr1 halves merged into one segment
        assert_eq!(got.matches("chr1").count(), 1);
    }

    #[test]
    fn a_closing_group_makes_the_chain_circular() {
        let rearrs = vec![
            rearr("group1-2", vec![Segment::new("chr2", 5000, 5100), Segment::new("chr1", 900, 1100)]),
            rearr("group2-2", vec![Segment::new("chr1", 900, 1100), Segment::new("chr3", 200, 300)]),
            rearr("group3-2", vec![Segment::new("chr3", 250, 350), Segment::new("chr2", 4950, 5050)]),
        ];

        let got = run(&args(&[]), &rearrs);
        assert!(got.contains("der1:CIRCULAR\n"), "{got}");
    }

    #[test]
    fn ambiguous_matchings_enumerate_under_all() {
        // two upper ends compete for one lower end on chr1
        let rearrs = vec![
            rearr("g1", vec![Segment::new("chr5", 0, 100), Segment::new("chr1", 1000, 1100)]),
            rearr("g2", vec![Segment::new("chr6", 0, 100), Segment::new("chr1", 1200, 1300)]),
            rearr("g3", vec![Segment::new("chr1", 2000, 2100), Segment::new("chr7", 0, 100)]),
        ];

        let got = run(&args(&["--all"]), &rearrs);
        assert!(got.contains("# PART 1-1\n"));
        assert!(got.contains("# PART 2-1\n"));

        let plain = run(&args(&[]), &rearrs);
        assert!(plain.contains("# PART 1\n"));
        assert!(!plain.contains("# PART 1-1\n"));
    }

    #[test]
    fn empty_input_writes_nothing() {
        assert_eq!(run(&args(&[]), &[]), "");
    }
}
