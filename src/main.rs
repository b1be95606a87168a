use clap::Parser;
use policysim::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    // RUST_LOG=policysim=debug shows every trade.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("policysim=warn")),
        )
        .init();

    run(Cli::parse())
}
