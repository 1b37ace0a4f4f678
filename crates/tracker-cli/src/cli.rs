//! CLI argument definitions for the tracker populator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tracker-populate",
    version,
    about = "Replay CSV patient records against a tracker API",
    long_about = "Replay CSV patient records against a tracker API.\n\n\
                  Each row registers (or updates) a tracked entity, enrolls it in a\n\
                  program, and records an event. Processed files are moved to the\n\
                  done or fail directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include row values and request payloads in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay every file in the input directory.
    Import(ImportArgs),

    /// Split a CSV file into one file per data row.
    Split(SplitArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Tracker server base URL.
    #[arg(value_name = "URL")]
    pub url: String,

    /// Directory of input files.
    #[arg(short = 'c', long = "csv", value_name = "DIR", default_value = "csv")]
    pub csv: PathBuf,

    /// Directory completed files are moved to.
    #[arg(short = 'd', long = "done", value_name = "DIR", default_value = "csvdone")]
    pub done: PathBuf,

    /// Directory failed files are moved to.
    #[arg(short = 'f', long = "fail", value_name = "DIR", default_value = "csvfail")]
    pub fail: PathBuf,

    /// API version segment (`<url>/api/<version>/`).
    #[arg(long = "api-version", value_name = "VERSION")]
    pub api_version: Option<String>,

    #[arg(long, env = "TRACKER_USERNAME", requires = "password")]
    pub username: Option<String>,

    #[arg(long, env = "TRACKER_PASSWORD", hide_env_values = true, requires = "username")]
    pub password: Option<String>,

    /// Tracked entity type for every file. Without it, identifiers come from
    /// file names (`program.stage.trackedEntity.csv`).
    #[arg(long = "tracked-entity", value_name = "ID")]
    pub tracked_entity: Option<String>,

    /// Program to enroll into (with --tracked-entity).
    #[arg(long, value_name = "ID", requires = "tracked_entity")]
    pub program: Option<String>,

    /// Program stage events are recorded on (with --tracked-entity and --program).
    #[arg(long, value_name = "ID", requires = "program")]
    pub stage: Option<String>,

    /// Treat events within this many days before the event date as duplicates.
    #[arg(long = "duplicate-threshold", value_name = "DAYS")]
    pub duplicate_threshold: Option<u32>,

    /// Treat events already recording the same value for this data element as
    /// duplicates. Takes precedence over --duplicate-threshold.
    #[arg(long = "unique-data-element", value_name = "ID")]
    pub unique_data_element: Option<String>,

    /// Record threshold duplicates on this stage instead of failing the row.
    #[arg(long = "duplicate-stage", value_name = "ID")]
    pub duplicate_stage: Option<String>,

    /// Attribute used to find existing entities after a non-unique conflict.
    #[arg(long = "unique-attribute", value_name = "ID")]
    pub unique_attribute: Option<String>,

    /// Append a JSON line per remote call to this file.
    #[arg(long = "trace-file", value_name = "PATH")]
    pub trace_file: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,
}

#[derive(Parser)]
pub struct SplitArgs {
    /// CSV file to split.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output directory (default: the file name without extension, next to it).
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
