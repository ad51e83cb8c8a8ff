//! Configuration management for herakles-procinfo.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Locations probed when no config file is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/herakles/procinfo.yaml",
    "/etc/herakles/procinfo.yml",
    "/etc/herakles/procinfo.toml",
    "./herakles-procinfo.yaml",
    "./herakles-procinfo.yml",
    "./herakles-procinfo.json",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("{0}")]
    Invalid(String),

    #[error("cannot serialize config: {0}")]
    Serialize(String),
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Data source
    /// Root of the procfs tree to read (procfs source only)
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    pub source: Option<SourceKind>,

    /// File the values were read from; logged once logging is up
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            proc_root: None,
            source: Some(SourceKind::Auto),
            loaded_from: None,
        }
    }
}

impl Config {
    /// Effective log level; unknown names fall back to the default.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::from_name)
            .unwrap_or(LogLevel::Warn)
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.unwrap_or(SourceKind::Auto)
    }
}

/// Validate effective config (used by --show-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_name(level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level '{}', expected one of off/error/warn/info/debug/trace",
                level
            )));
        }
    }

    if cfg.source == Some(SourceKind::Libproc) && !cfg!(target_os = "macos") {
        return Err(ConfigError::Invalid(
            "source 'libproc' is only available on macOS".into(),
        ));
    }

    if let Some(root) = &cfg.proc_root {
        if cfg.source == Some(SourceKind::Libproc) {
            return Err(ConfigError::Invalid(
                "proc_root is set but source is 'libproc'".into(),
            ));
        }
        if !root.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "proc_root is not a directory: {}",
                root.display()
            )));
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(source) = args.source {
        config.source = Some(source);
    }

    Ok(config)
}

/// Loads the given config file, or the first existing default location.
/// An explicitly named file must exist; without one, defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let parse_err = |detail: String| ConfigError::Parse {
        path: path.clone(),
        detail,
    };

    let mut config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };

    config.loaded_from = Some(path);
    Ok(config)
}

/// Renders configuration in the requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    let output = match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
    };
    Ok(output)
}
