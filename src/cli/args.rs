//! Command-line argument definitions for the weather collector
//!
//! Global flags select the configuration file and log verbosity; the
//! subcommand selects what to do, defaulting to a collection run.

use crate::error::{CollectorError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the weather collector
///
/// Fetches observations and forecasts for the configured locations from the
/// FMI open data service and stores them in ClickHouse.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wcollect",
    version,
    about = "Collect FMI weather observations and forecasts into ClickHouse",
    long_about = "Fetches the last week of observations and the next week of forecasts for every \
                  configured location from the FMI open data WFS service, and loads them into the \
                  observations and forecasts tables of a ClickHouse database. Intended to be run \
                  periodically, e.g. from cron."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    ///
    /// JSON file with the ClickHouse connection and the locations to collect.
    /// If not specified, /etc/wcollect/config.json is used when it exists,
    /// otherwise wcollect/config.json under the user config directory.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Log detail on stderr
    ///
    /// Warnings only by default. `-v` adds one line per location and batch,
    /// `-vv` adds request URLs and normalization counts. `RUST_LOG`, when
    /// set, takes precedence.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Errors only, for cron
    ///
    /// Hides the progress bar and logs nothing below error level. The run
    /// summary is still printed on stdout.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Only log errors and hide the progress bar",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// Fetch and store weather for every configured location (default command)
    Collect(CollectArgs),
    /// Print the CREATE TABLE statements for both tables
    Schema,
    /// Create both tables in the configured database
    InitDb,
}

/// Arguments for the collect command
#[derive(Debug, Clone, Default, PartialEq, Parser)]
pub struct CollectArgs {
    /// Perform a dry run without writing to the database
    ///
    /// Fetches and normalizes as usual but only counts the rows that would
    /// be inserted. No database connection is opened.
    #[arg(
        long = "dry-run",
        help = "Fetch and count rows without writing to the database"
    )]
    pub dry_run: bool,
}

impl Args {
    /// The selected command, `collect` when none was given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Collect(CollectArgs::default()))
    }

    /// Validate argument combinations that clap cannot express
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(CollectorError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
