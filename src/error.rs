//! Error types for process inspection.
//!
//! `SourceError` describes why a data source query failed; `InspectError` is
//! what the inspector and the CLI driver surface to the user.

use std::io;
use std::path::PathBuf;

/// Failure of a single data source query.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{call} failed: {}", io::Error::from_raw_os_error(*errno))]
    Os { call: &'static str, errno: i32 },

    #[error("malformed {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        SourceError::Parse {
            what,
            detail: detail.into(),
        }
    }

    /// Captures `errno` right after a failed libc call.
    pub fn last_os_error(call: &'static str) -> Self {
        SourceError::Os {
            call,
            errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
        }
    }

    /// True when the failure looks like missing privileges rather than a
    /// vanished process or a broken source.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            SourceError::Io { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            SourceError::Os { errno, .. } => *errno == libc::EPERM || *errno == libc::EACCES,
            _ => false,
        }
    }
}

/// Terminal failure of one inspection step.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("No process with PID {pid}")]
    NotFound { pid: u32 },

    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

impl InspectError {
    pub fn query(operation: &'static str, source: SourceError) -> Self {
        InspectError::Query { operation, source }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, InspectError::Query { source, .. } if source.is_permission_denied())
    }
}
