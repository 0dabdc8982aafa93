// Description:     Read long-read alignments, find rearranged queries, and
//                  group the ones sharing a rearrangement into clumps.

use crate::{
    aln::{ReadAln, TypeSet, reader::{ReadParams, read_queries}},
    cluster::{
        classify::classify,
        clump::{build_links, clumps, merge_clumps, named_units, sort_clumps},
        filter::{coverage_filter, subtract_controls},
        oracle::OracleParams,
        writer::{WriteOpts, write_groups},
    },
    err::ScanError,
    io::AlnInput,
    utils::init_logging,
};
use clap::Args;
use log::debug;
use std::io::{BufWriter, Write, stdout};

#[derive(Args, Debug)]
pub struct ClumpArgs {
    /// Case alignment files, then a literal `:`, then control files. Use `-`
    /// for standard input; `.gz` files are decompressed transparently
    #[arg(required = true)]
    pub files: Vec<String>,

    #[arg(short = 's', long, default_value_t = 2)]
    /// Minimum number of queries per group
    pub min_seqs: usize,

    #[arg(short = 'c', long)]
    /// Minimum number of other queries that must share each rearranged
    /// junction [default: 1 if --min-seqs > 1, else 0]
    pub min_cov: Option<usize>,

    #[arg(short = 't', long, default_value = "CSNG")]
    /// Rearrangement types to detect: any subset of C (inter-chromosome),
    /// S (inter-strand), N (non-colinear), G (big gap)
    pub types: String,

    #[arg(short = 'g', long, default_value_t = 10_000)]
    /// Minimum forward jump in the reference counted as a big gap, and the
    /// indel size that splits an alignment
    pub min_gap: i64,

    #[arg(short = 'r', long, default_value_t = 1_000)]
    /// Minimum backward jump in the reference counted as non-colinear
    pub min_rev: i64,

    #[arg(short = 'f', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    /// When subtracting controls: 1 = a control must share the case's own
    /// rearrangement type, 0 = any enabled type counts
    pub filter: u8,

    #[arg(short = 'd', long, default_value_t = 500)]
    /// Maximum breakpoint-position difference between queries sharing a
    /// rearrangement
    pub max_diff: i64,

    #[arg(short = 'm', long, default_value_t = 1.0)]
    /// Discard alignments with mismap probability above this value
    pub max_mismap: f64,

    #[arg(long)]
    /// Write alignments in the compact delta row format
    pub shrink: bool,

    #[arg(short = 'v', long)]
    /// Report progress on standard error
    pub verbose: bool,
}

/// Sub-program for detecting and clumping rearranged queries.
pub fn clump_process(args: &ClumpArgs) -> Result<(), ScanError> {
    init_logging(args.verbose);

    let echo: Vec<String> = std::env::args().collect();
    let (cases, controls) = load_inputs(args)?;

    let mut out = BufWriter::new(stdout().lock());
    run_clump(args, &echo.join(" "), cases, controls, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Reads case and control files, splitting the file list at the literal `:`.
pub(crate) fn load_inputs(args: &ClumpArgs) -> Result<(Vec<ReadAln>, Vec<ReadAln>), ScanError> {
    let split = args.files.iter().position(|f| f == ":").unwrap_or(args.files.len());
    let (case_files, rest) = args.files.split_at(split);
    let control_files = rest.get(1..).unwrap_or_default();
    if case_files.is_empty() {
        return Err(ScanError::NoCaseFiles);
    }

    let params = ReadParams {
        min_gap: args.min_gap,
        max_mismap: args.max_mismap,
    };
    let mut next_id = 0;

    let mut cases = Vec::new();
    for (i, f) in case_files.iter().enumerate() {
        let batch = read_queries(AlnInput::open(f)?, i + 1, &mut next_id, &params)?;
        debug!("{f}: {} queries", batch.len());
        cases.extend(batch);
    }

    let mut controls = Vec::new();
    for f in control_files {
        let batch = read_queries(AlnInput::open(f)?, 0, &mut next_id, &params)?;
        debug!("{f}: {} control queries", batch.len());
        controls.extend(batch);
    }

    Ok((cases, controls))
}

/// The whole clump pipeline, from parsed queries to written groups.
pub(crate) fn run_clump<W: Write>(
    args: &ClumpArgs, echo: &str, mut cases: Vec<ReadAln>, controls: Vec<ReadAln>, out: &mut W,
) -> Result<(), ScanError> {
    let enabled = TypeSet::from_letters(&args.types).ok_or_else(|| ScanError::BadTypes(args.types.clone()))?;
    let oracle = OracleParams {
        min_gap: args.min_gap,
        min_rev: args.min_rev,
        max_diff: args.max_diff,
    };
    let num_case_files = cases.iter().map(|r| r.file_index).max().unwrap_or(0);

    for r in &mut cases {
        r.kind = classify(&r.parts, enabled, args.min_gap, args.min_rev);
    }
    let mut keep: Vec<usize> = (0..cases.len()).filter(|&q| cases[q].kind.is_some()).collect();
    debug!("{} of {} queries look rearranged", keep.len(), cases.len());

    subtract_controls(&cases, &mut keep, &controls, enabled, args.filter == 1, &oracle);
    debug!("{} queries after control subtraction", keep.len());

    let min_cov = args.min_cov.unwrap_or(usize::from(args.min_seqs > 1));
    coverage_filter(&cases, &mut keep, enabled, &oracle, min_cov);
    debug!("{} queries after coverage filtering", keep.len());

    let (links, overlaps) = build_links(&cases, &keep, enabled, &oracle);
    let mut all_clumps = clumps(&cases, &keep, &links);
    all_clumps.retain(|c| c.members.len() >= args.min_seqs);
    sort_clumps(&cases, &mut all_clumps);
    debug!("{} clumps of at least {} queries", all_clumps.len(), args.min_seqs);

    let merged = merge_clumps(&cases, &all_clumps, &overlaps);
    let units = named_units(&cases, &all_clumps, &merged, num_case_files);
    debug!("{} groups cover all case files", units.len());

    write_groups(
        out,
        echo,
        &units,
        &cases,
        &WriteOpts {
            min_gap: args.min_gap,
            min_rev: args.min_rev,
            shrink: args.shrink,
        },
    )?;
    Ok(())
}
