//! `mkc` - command-line entry point.

use clap::Parser;
use mkc_drv::{run, DriverError, Mode, Options};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Manaknight compiler: compiles `.mk` sources to an executable program
/// for the host runtime, with optional OpenAPI output.
#[derive(Parser, Debug)]
#[command(name = "mkc", version, about)]
struct Cli {
    /// Input source file (.mk)
    input: PathBuf,

    /// Output file (default: input with extension replaced by .js)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generate an OpenAPI 3.0.0 spec to this file
    #[arg(short = 'a', long = "openapi")]
    openapi: Option<PathBuf>,

    /// Format the source to stdout instead of compiling
    #[arg(short, long, conflicts_with = "check")]
    format: bool,

    /// Type check only; produce no output
    #[arg(short, long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.format {
        Mode::Format
    } else if cli.check {
        Mode::Check
    } else {
        Mode::Compile
    };

    let options = Options {
        input: cli.input,
        output: cli.output,
        openapi: cli.openapi,
        mode,
        verbose: cli.verbose,
    };

    match run(&options) {
        Ok(()) => {}
        Err(error) => {
            // Pipeline diagnostics were already rendered; only I/O level
            // failures need a message here.
            if !matches!(error, DriverError::Failed { .. }) {
                eprintln!("error: {error}");
            }
            std::process::exit(1);
        }
    }
}
