//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fabula - monthly usage quotas for the writing assistant
#[derive(Parser, Debug)]
#[command(name = "fabula")]
#[command(about = "Monthly usage quotas and subscription tier gating", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to bundled + ~/.config/fabula + ./fabula.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Counter file, overriding [persistence].path
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask whether a user may invoke a feature now
    Check {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Feature key (e.g. story_generation)
        #[arg(long)]
        feature: String,

        /// Subscription tier; unknown names get the most restrictive tier
        #[arg(long)]
        tier: String,
    },

    /// Record one use without checking the limit
    Track {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Feature key
        #[arg(long)]
        feature: String,
    },

    /// Check and record one use atomically
    Acquire {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Feature key
        #[arg(long)]
        feature: String,

        /// Subscription tier
        #[arg(long)]
        tier: String,
    },

    /// Give back one acquired use
    Refund {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Feature key
        #[arg(long)]
        feature: String,
    },

    /// Show a user's usage for the current month
    Status {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Subscription tier
        #[arg(long)]
        tier: String,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Reset one counter, or every counter of the user
    Reset {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Feature key; omit to forget all of the user's counters
        #[arg(long)]
        feature: Option<String>,
    },

    /// Print the effective allowance table
    Tiers,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
