//! classgraph CLI - class hierarchy diagrams for API documentation.
//!
//! Provides commands for:
//! - `build`: Generate diagrams for every class and interface of a project
//! - `markup`: Print the PlantUML markup for a single class or interface

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, MarkupArgs};
use error::CliError;
use output::Output;

/// classgraph - UML class hierarchy diagrams.
#[derive(Parser)]
#[command(name = "classgraph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate diagrams for a reflection project.
    Build(BuildArgs),
    /// Print the diagram markup for one class or interface.
    Markup(MarkupArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);
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
        Commands::Build(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Markup(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
