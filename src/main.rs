//! Sylva: Random Forest Training CLI
//!
//! Generates a synthetic classification dataset, trains a random forest on it
//! and writes the model, scaler and evaluation metrics to disk.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sylva::cli::Cli;
use sylva::pipeline::run_pipeline;
use sylva::report::TrainingSummary;
use sylva::utils::{print_banner, print_completion, print_config, Reporter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let reporter = if cli.quiet {
        Reporter::quiet()
    } else {
        Reporter::new()
    };

    let config = cli.resolve_config()?;

    if reporter.is_enabled() {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_config(&config);
    }

    let outcome = run_pipeline(&config, &reporter)?;

    if reporter.is_enabled() {
        TrainingSummary::new(&outcome).display();
        print_completion();
    }

    Ok(())
}

/// Install the stderr subscriber: `warn` by default, `debug` with --verbose.
/// RUST_LOG takes precedence over both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
