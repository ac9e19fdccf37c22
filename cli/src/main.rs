mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{fetch, grid, region};
use tracing_subscriber::EnvFilter;

/// `-v` count to a default filter; `RUST_LOG` takes precedence.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("builtup={level},{level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Fetch(args) => fetch::run(&cli, args),
        Commands::Grid(args) => grid::run(&cli, args),
        Commands::Region(args) => region::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
