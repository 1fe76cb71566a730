//! tabq CLI - train and inspect tabular Q-learning agents
//!
//! This CLI provides:
//! - Training an agent against a scripted world
//! - Inspecting stored Q-tables

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabq")]
#[command(version, about = "Tabular Q-learning decision core for reactive agents", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent in the scripted world
    Simulate(Box<tabq::cli::commands::simulate::SimulateArgs>),

    /// Print a stored Q-table
    Inspect(tabq::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate(args) => tabq::cli::commands::simulate::execute(*args),
        Commands::Inspect(args) => tabq::cli::commands::inspect::execute(args),
    }
}
