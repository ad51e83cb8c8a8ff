//! CLI arguments for herakles-procinfo.
//!
//! This module defines the command-line interface structure using the clap library.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::InspectError;
use crate::source::SourceKind;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parses a config file value; case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-procinfo",
    about = "Show identity, I/O counters and open file handles of a process",
    long_about = "Show identity, I/O counters and open file handles of a process.\n\n\
                  Takes one snapshot of the given PID and prints three blocks: process \
                  information, I/O statistics and the open descriptor table. Exits with \
                  status 1 as soon as one of the lookups fails.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    after_help = "More info: https://www.herakles.now — Support: exporter@herakles.now"
)]
pub struct Args {
    /// Process ID to inspect
    #[arg(value_name = "PID", value_parser = parse_pid, required_unless_present = "show_config")]
    pub pid: Option<u32>,

    /// Log level (logs go to stderr)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Read process data from this procfs tree instead of the system default
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Process data source
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,
}

/// Parses a PID argument. Accepts decimal values in the `pid_t` range.
pub fn parse_pid(value: &str) -> Result<u32, InspectError> {
    let trimmed = value.trim();
    match trimmed.parse::<u32>() {
        Ok(pid) if pid <= i32::MAX as u32 => Ok(pid),
        Ok(pid) => Err(InspectError::InvalidInput(format!(
            "PID {pid} is out of range"
        ))),
        Err(_) => Err(InspectError::InvalidInput(format!(
            "PID must be a non-negative integer, got '{value}'"
        ))),
    }
}
