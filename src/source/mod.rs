//! Process data sources.
//!
//! A data source answers the raw kernel-level questions the inspector asks:
//! identity of a PID, its task counters, its descriptor table and the path
//! details of file-backed descriptors. Two implementations exist:
//! - `procfs`: Linux `/proc` (or any procfs-shaped tree)
//! - `libproc`: macOS `proc_pidinfo`/`proc_pidfdinfo` (macOS builds only)

pub mod procfs;

#[cfg(target_os = "macos")]
pub mod libproc;

use std::mem;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;

pub use procfs::{ProcfsSource, DEFAULT_PROC_ROOT};

#[cfg(target_os = "macos")]
pub use self::libproc::LibprocSource;

/// Identity fields for one PID. A source that finds no such process
/// returns the zero-filled default rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub uid: u32,
    pub comm: String,
}

/// Task-level counters as reported by the source.
///
/// `total_user` and `total_system` are the two aggregate counters the report
/// labels "Bytes Read" and "Bytes Written". Their meaning depends on the
/// source: libproc fills them with `pti_total_user`/`pti_total_system`
/// (CPU time in nanoseconds), procfs with `rchar`/`wchar` (bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawTaskCounters {
    pub total_user: u64,
    pub total_system: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub syscalls_mach: u64,
    pub syscalls_unix: u64,
    pub pageins: u64,
    pub faults: u64,
}

/// One slot of the descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDescriptor {
    pub fd: i32,
    /// `PROX_FDTYPE_*` code, see `format::fdtype`.
    pub fdtype: i64,
}

/// Path, offset and open flags of a file-backed descriptor.
/// `open_flags` uses the FREAD/FWRITE access bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVnodeDetail {
    pub open_flags: u32,
    pub offset: u64,
    pub path: String,
}

/// Read-only view of the kernel's process tables.
pub trait ProcessDataSource {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn process_record(&self, pid: u32) -> Result<RawProcessRecord, SourceError>;

    fn task_counters(&self, pid: u32) -> Result<RawTaskCounters, SourceError>;

    /// Descriptor table in kernel order.
    fn list_descriptors(&self, pid: u32) -> Result<Vec<RawDescriptor>, SourceError>;

    fn vnode_detail(&self, pid: u32, fd: i32) -> Result<RawVnodeDetail, SourceError>;
}

impl<S: ProcessDataSource + ?Sized> ProcessDataSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process_record(&self, pid: u32) -> Result<RawProcessRecord, SourceError> {
        (**self).process_record(pid)
    }

    fn task_counters(&self, pid: u32) -> Result<RawTaskCounters, SourceError> {
        (**self).task_counters(pid)
    }

    fn list_descriptors(&self, pid: u32) -> Result<Vec<RawDescriptor>, SourceError> {
        (**self).list_descriptors(pid)
    }

    fn vnode_detail(&self, pid: u32, fd: i32) -> Result<RawVnodeDetail, SourceError> {
        (**self).vnode_detail(pid, fd)
    }
}

/// Which data source implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// libproc on macOS, procfs everywhere else or when a proc root is set
    Auto,
    Procfs,
    Libproc,
}

/// Builds the data source for `kind`.
pub fn open_source(
    kind: SourceKind,
    proc_root: Option<&Path>,
) -> Result<Box<dyn ProcessDataSource>, SourceError> {
    let procfs = |root: Option<&Path>| -> Box<dyn ProcessDataSource> {
        let source = ProcfsSource::new(
            root.map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
        );
        debug!("Reading procfs tree at {}", source.root().display());
        Box::new(source)
    };

    let source = match kind {
        SourceKind::Procfs => procfs(proc_root),
        SourceKind::Libproc => open_libproc()?,
        SourceKind::Auto if proc_root.is_some() || !cfg!(target_os = "macos") => {
            procfs(proc_root)
        }
        SourceKind::Auto => open_libproc()?,
    };

    debug!("Using {} data source", source.name());
    Ok(source)
}

#[cfg(target_os = "macos")]
fn open_libproc() -> Result<Box<dyn ProcessDataSource>, SourceError> {
    Ok(Box::new(LibprocSource::new()))
}

#[cfg(not(target_os = "macos"))]
fn open_libproc() -> Result<Box<dyn ProcessDataSource>, SourceError> {
    Err(SourceError::Unsupported("libproc"))
}

/// Runs a size-probe-then-fetch query for a table of fixed-size records.
///
/// `probe` returns the byte size the kernel wants; `fetch` fills a buffer of
/// exactly that many bytes and returns how many it wrote. Either call
/// returning a non-positive size fails, as does a fetch that claims more
/// bytes than the buffer holds. The result holds only whole records.
///
/// `errno` is cleared before each call, so a failure without `errno` is
/// reported with the returned size instead of a stale OS error.
pub fn fetch_sized_table<T, P, F>(
    call: &'static str,
    probe: P,
    fetch: F,
) -> Result<Vec<T>, SourceError>
where
    T: Copy + Default,
    P: FnOnce() -> i32,
    F: FnOnce(&mut [T], usize) -> i32,
{
    let record_size = mem::size_of::<T>().max(1);

    Errno::clear();
    let wanted = probe();
    if wanted <= 0 {
        return Err(size_failure(call, "size probe", wanted));
    }
    let wanted = wanted as usize;

    let mut table = vec![T::default(); wanted.div_ceil(record_size)];
    Errno::clear();
    let written = fetch(&mut table, wanted);
    if written <= 0 {
        return Err(size_failure(call, "fetch", written));
    }

    let written = written as usize;
    if written > wanted {
        return Err(SourceError::parse(
            "descriptor table",
            format!("{call} wrote {written} bytes into a {wanted} byte buffer"),
        ));
    }

    table.truncate(written / record_size);
    Ok(table)
}

fn size_failure(call: &'static str, stage: &str, size: i32) -> SourceError {
    match SourceError::last_os_error(call) {
        SourceError::Os { errno: 0, .. } => SourceError::parse(
            "table size",
            format!("{call} {stage} returned {size} bytes without an OS error"),
        ),
        err => err,
    }
}
