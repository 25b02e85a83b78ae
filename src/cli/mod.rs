//! CLI interface for listing-sniper
//!
//! Provides subcommands for:
//! - `run`: live listing detection and trading
//! - `recon`: market data sampling only (no trading)
//! - `resolve`: one-off symbol address resolution
//! - `config`: show current configuration

mod recon;
mod resolve;
mod run;

pub use recon::ReconArgs;
pub use resolve::ResolveArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "listing-sniper")]
#[command(about = "New coin listing detection and trading bot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect listings and trade them
    Run(RunArgs),
    /// Sample post-listing market data (no trading)
    Recon(ReconArgs),
    /// Resolve a symbol to its contract address
    Resolve(ResolveArgs),
    /// Show current configuration
    Config,
}
