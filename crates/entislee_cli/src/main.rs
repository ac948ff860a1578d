//! EntiSLEE CLI
//!
//! Command-line tools that drive the entity lifecycle manager over an
//! in-memory store.
//!
//! # Commands
//!
//! - `scenario` - Create, look up and remove a root and a child entity
//! - `tree` - Build an entity tree, print it, and optionally remove it
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// EntiSLEE entity lifecycle tools.
#[derive(Parser)]
#[command(name = "entislee")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(global = true, short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, look up and remove a root and a child entity
    Scenario {
        /// Service the entities belong to
        #[arg(short, long, default_value = "Svc1")]
        service: String,

        /// Convergence name given to both entities
        #[arg(short, long, default_value = "conv1")]
        convergence: String,
    },

    /// Build an entity tree and print it
    Tree {
        /// Levels below the root
        #[arg(short, long, default_value = "2")]
        depth: usize,

        /// Children per entity
        #[arg(long, default_value = "2")]
        fanout: usize,

        /// Remove the root (cascading) after printing
        #[arg(short, long)]
        remove: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scenario {
            service,
            convergence,
        } => {
            commands::scenario::run(&service, &convergence, &cli.format)?;
        }
        Commands::Tree {
            depth,
            fanout,
            remove,
        } => {
            commands::tree::run(depth, fanout, remove, &cli.format)?;
        }
        Commands::Version => {
            println!("EntiSLEE CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
