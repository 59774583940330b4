mod help_text;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use crate::store::DEFAULT_BASELINE_FILENAME;

/// Baseline a directory tree and check it for changes
#[derive(Parser, Debug)]
#[command(
    name = "fimcheck",
    version,
    about,
    long_about = help_text::ROOT_LONG_ABOUT
)]
pub struct Cli {
    /// Change to directory before operating
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Where the baseline is kept
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_BASELINE_FILENAME,
        global = true
    )]
    pub baseline_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LevelFilter>,

    /// Without a command, an interactive menu is shown
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or replace the baseline for a directory
    #[command(long_about = help_text::BASELINE_LONG_ABOUT)]
    Baseline {
        /// Directory to baseline
        #[arg(long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Only replace the baseline if the changes match this fingerprint from check
        #[arg(long, value_name = "FINGERPRINT")]
        fingerprint: Option<String>,

        /// Build the baseline without writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Check the baseline's directory for modified, added and removed files
    #[command(long_about = help_text::CHECK_LONG_ABOUT)]
    Check {
        /// Check this directory instead of the one recorded in the baseline
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Show old and new checksums of changed files
        #[arg(long)]
        diff: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
