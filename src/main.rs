//! herakles-procinfo - version 0.1.0
//!
//! Single-shot process inspector with tracing logging.
//! This is the main entry point that resolves configuration and runs the report.

use std::io;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use nix::unistd::geteuid;
use tracing::{debug, info, Level};

use herakles_procinfo::cli::{Args, LogLevel};
use herakles_procinfo::config::{resolve_config, show_config, validate_effective_config, Config};
use herakles_procinfo::{open_source, write_report, InspectError, ProcessInspector};

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr; stdout carries only the report.
fn setup_logging(config: &Config) {
    let log_level = match config.log_level() {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", config.log_level());
}

/// Prints a diagnostic for a failed inspection, with a privilege hint when
/// the failure looks like missing permissions.
fn report_failure(err: &InspectError) {
    debug!("Inspection failed: {:?}", err);
    eprintln!("❌ {}", err);

    if err.is_permission_denied() && !geteuid().is_root() {
        eprintln!("   Not running as root - processes of other users cannot be inspected");
        eprintln!("   Recommendation: re-run with sudo");
    }
}

/// Main application entry point.
fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            // Wrong argument count or malformed PID
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        return ExitCode::FAILURE;
    }

    if args.show_config {
        return match show_config(&config, args.config_format) {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        };
    }

    setup_logging(&config);
    if let Some(path) = &config.loaded_from {
        info!("Loaded configuration from: {}", path.display());
    }

    let Some(pid) = args.pid else {
        report_failure(&InspectError::InvalidInput("missing PID".into()));
        return ExitCode::FAILURE;
    };

    let source = match open_source(config.source_kind(), config.proc_root.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            report_failure(&InspectError::query("data source setup", e));
            return ExitCode::FAILURE;
        }
    };

    let inspector = ProcessInspector::new(source);
    let mut stdout = io::stdout().lock();

    match write_report(&inspector, pid, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}
