use clap::{Parser, Subcommand};
use rearrange_core::{ClumpArgs, LinkArgs, PROG_NAME, clump_process, link_process};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find rearranged queries and group the ones sharing a rearrangement
    Clump(ClumpArgs),
    /// Link rearrangement groups into derived chromosomes
    Link(LinkArgs),
}

/// Restores default SIGPIPE behavior, so a closed downstream pipe ends the
/// process silently instead of panicking on write errors.
fn restore_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

fn main() {
    restore_sigpipe();
    let args = Cli::parse();

    let result = match args.command {
        Commands::Clump(cmd_args) => clump_process(&cmd_args),
        Commands::Link(cmd_args) => link_process(&cmd_args),
    };

    if let Err(e) = result {
        eprintln!("{PROG_NAME}: {e}");
        std::process::exit(1);
    }
}
