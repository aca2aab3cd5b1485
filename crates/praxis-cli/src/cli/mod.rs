//! CLI command definitions and dispatch for the `praxis` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod config;
pub mod display;
pub mod insight;
pub mod practice;
pub mod records;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Turn what you read, heard and decided into deliberate practice.
#[derive(Parser)]
#[command(name = "praxis", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the configured generation provider (openai, doubao, kimi, deepseek).
    #[arg(long, global = true, env = "PRAXIS_PROVIDER")]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a learning input from a file, classify it and start practice if needed.
    Add {
        /// Text or markdown file to read.
        file: PathBuf,

        /// Type hint for classification (report, interview, reflection, idea).
        #[arg(long = "type", short = 't')]
        input_type: Option<String>,

        /// Reprocess content that was already added.
        #[arg(long)]
        force: bool,
    },

    /// Start a practice session for an input, even if classification skipped it.
    Practice {
        /// Input ID.
        input_id: String,
    },

    /// Answer the current round of a practice scenario.
    Answer {
        /// Scenario ID shown when the session paused.
        scenario_id: String,

        /// Compose the answer in $EDITOR.
        #[arg(long, conflicts_with = "file")]
        editor: bool,

        /// Read the answer from a file.
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Re-run a thread whose last step failed.
    Retry {
        /// Thread ID reported by the failed command.
        thread_id: String,
    },

    /// List insight cards.
    #[command(alias = "insights")]
    Insight {
        /// Only cards for this input.
        input_id: Option<String>,

        /// Filter by insight type (e.g. failure_mode_gap).
        #[arg(long = "type", short = 't')]
        insight_type: Option<String>,

        /// Minimum intensity (1-5).
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        min_intensity: Option<u8>,
    },

    /// Show an input (or the input behind a scenario) with everything derived from it.
    Show {
        /// Input ID or scenario ID.
        id: String,
    },

    /// Export all insight cards.
    Export {
        /// Output format: md or json.
        #[arg(long, default_value = "md")]
        format: String,

        /// Write to a file instead of stdout.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List added inputs, newest first.
    #[command(alias = "ls")]
    List {
        /// Filter by classified input type.
        #[arg(long = "type", short = 't')]
        input_type: Option<String>,

        /// Maximum number of inputs to show.
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Inspect or change configuration.
    Config {
        #[command(subcommand)]
        action: config::ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Commands {
    /// Whether the command calls a generation backend.
    pub fn needs_generation(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. }
                | Commands::Practice { .. }
                | Commands::Answer { .. }
                | Commands::Retry { .. }
        )
    }
}
