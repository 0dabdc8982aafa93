use log::LevelFilter;
use std::io::Write;

pub(crate) mod whichever;

/// The program name, prefixed to every diagnostic and log line.
pub const PROG_NAME: &str = "rearrange-core";

/// Initializes stderr logging with the program name as prefix on every line.
///
/// `verbose` enables debug-level progress reporting; otherwise only warnings
/// and errors are shown. Repeated calls are harmless (later calls are no-ops),
/// which keeps in-process tests happy.
pub(crate) fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{PROG_NAME}: {}", record.args()))
        .try_init();
}
