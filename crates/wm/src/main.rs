//! wikimark CLI - wiki page renderer.
//!
//! Provides commands for:
//! - `render`: Render a wiki page to HTML on stdout
//! - `formats`: List the configured page formats

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{FormatsArgs, RenderArgs};
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// wikimark - wiki page renderer.
#[derive(Parser)]
#[command(name = "wm", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a wiki page to HTML.
    Render(RenderArgs),
    /// List configured page formats.
    Formats(FormatsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(VERSION),
        Commands::Formats(args) => args.execute(),
    };

    if let Err(err) = result {
        output.failure(&err);
        std::process::exit(1);
    }
}
