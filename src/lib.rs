//! Herakles Process Inspector Library
//!
//! Takes a single snapshot of one process and renders it as a plain-text
//! report: identity, I/O counters and the open descriptor table.
//!
//! # Layers
//!
//! - **Data sources** ([`source`]): raw kernel facts from procfs or libproc
//! - **Inspector** ([`inspector`]): turns raw facts into report records
//! - **Presentation** ([`format`], [`report`]): byte scaling, flag decoding,
//!   descriptor labels and the fixed report layout
//!
//! # Usage
//!
//! ```no_run
//! use herakles_procinfo::{write_report, ProcessInspector, ProcfsSource};
//!
//! let inspector = ProcessInspector::new(ProcfsSource::default());
//! let mut stdout = std::io::stdout();
//!
//! if let Err(e) = write_report(&inspector, std::process::id(), &mut stdout) {
//!     eprintln!("{e}");
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod inspector;
pub mod report;
pub mod source;

// Re-export main types for convenience
pub use error::{InspectError, SourceError};
pub use inspector::{DescriptorEntry, IoStatistics, ProcessInfo, ProcessInspector, VnodeDetail};
pub use report::{render_report, write_report};
pub use source::{open_source, ProcessDataSource, ProcfsSource, SourceKind};
