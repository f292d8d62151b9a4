//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::Format;

/// Post-alert summaries for earthquake early-warning events.
#[derive(Parser, Debug)]
#[command(name = "shakesummary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the summary for one event record
    Summarize(SummarizeArgs),

    /// Rank nearby cities for an arbitrary epicenter
    Cities(CitiesArgs),
}

/// Event record source; exactly one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputSource {
    /// Path to the event JSON file
    #[arg(long, short = 'i')]
    pub input_file: Option<PathBuf>,

    /// Event JSON passed inline
    #[arg(long)]
    pub input_str: Option<String>,
}

/// Arguments for the `summarize` command.
#[derive(Parser, Debug)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub input: InputSource,

    /// Configuration file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `cities` command.
#[derive(Parser, Debug)]
pub struct CitiesArgs {
    /// Epicenter latitude (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Epicenter longitude (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Hypocenter depth in km
    #[arg(long, default_value = "8.0")]
    pub depth: f64,

    /// Seconds from origin to the alert
    #[arg(long, default_value = "0.0", conflicts_with = "alert_time")]
    pub elapsed: f64,

    /// Alert sent time; with `--origin-time` replaces `--elapsed`
    #[arg(long, requires = "origin_time")]
    pub alert_time: Option<String>,

    /// Origin time of the event
    #[arg(long, requires = "alert_time")]
    pub origin_time: Option<String>,

    /// Configuration file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
