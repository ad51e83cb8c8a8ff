//! Translation from raw data source facts into report records.
//!
//! Each lookup is independent and fails on its own; the caller decides
//! whether to continue after a failure.

use tracing::debug;

use crate::error::InspectError;
use crate::format::DescriptorKind;
use crate::source::{ProcessDataSource, RawDescriptor, RawTaskCounters};

/// Kernel limit for process names (`MAXCOMLEN`).
pub const MAX_NAME_BYTES: usize = 16;

/// Identity of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub parent_pid: u32,
    pub owner_uid: u32,
}

/// Resource and I/O counters of one process at one point in time.
///
/// `bytes_read`/`bytes_written` are named after the report labels. What they
/// count depends on the data source: task CPU time (user/system, in
/// nanoseconds) under libproc, `rchar`/`wchar` bytes under procfs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStatistics {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub mach_syscalls: u64,
    pub unix_syscalls: u64,
    pub page_ins: u64,
    pub page_faults: u64,
}

impl From<RawTaskCounters> for IoStatistics {
    fn from(raw: RawTaskCounters) -> Self {
        Self {
            bytes_read: raw.total_user,
            bytes_written: raw.total_system,
            messages_sent: raw.messages_sent,
            messages_received: raw.messages_received,
            mach_syscalls: raw.syscalls_mach,
            unix_syscalls: raw.syscalls_unix,
            page_ins: raw.pageins,
            page_faults: raw.faults,
        }
    }
}

/// Path details of a file-backed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VnodeDetail {
    pub open_flags: u32,
    pub offset: u64,
    pub path: String,
}

/// One open descriptor. `vnode` is only ever set for `DescriptorKind::Vnode`
/// and stays empty when the detail query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEntry {
    pub number: i32,
    pub kind: DescriptorKind,
    pub vnode: Option<VnodeDetail>,
}

/// Runs the three inspection queries against a data source.
pub struct ProcessInspector<S> {
    source: S,
}

impl<S: ProcessDataSource> ProcessInspector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Looks up identity fields. A zero-filled record (pid 0) means the
    /// process does not exist.
    pub fn lookup_process(&self, pid: u32) -> Result<ProcessInfo, InspectError> {
        debug!("Looking up process {} via {}", pid, self.source.name());

        let record = self
            .source
            .process_record(pid)
            .map_err(|e| InspectError::query("process lookup", e))?;

        if record.pid == 0 {
            return Err(InspectError::NotFound { pid });
        }

        Ok(ProcessInfo {
            pid: record.pid,
            name: truncate_name(record.comm),
            parent_pid: record.ppid,
            owner_uid: record.uid,
        })
    }

    pub fn lookup_io_statistics(&self, pid: u32) -> Result<IoStatistics, InspectError> {
        debug!("Reading task counters of {}", pid);

        self.source
            .task_counters(pid)
            .map(IoStatistics::from)
            .map_err(|e| InspectError::query("task counter lookup", e))
    }

    /// Lists open descriptors in data source order. VNODE entries whose
    /// detail query fails are kept without detail.
    pub fn list_open_descriptors(&self, pid: u32) -> Result<Vec<DescriptorEntry>, InspectError> {
        let table = self
            .source
            .list_descriptors(pid)
            .map_err(|e| InspectError::query("descriptor listing", e))?;

        debug!("Process {} has {} open descriptors", pid, table.len());

        Ok(table
            .into_iter()
            .map(|raw| self.describe(pid, raw))
            .collect())
    }

    fn describe(&self, pid: u32, raw: RawDescriptor) -> DescriptorEntry {
        let kind = DescriptorKind::from_code(raw.fdtype);
        if let DescriptorKind::Unknown(code) = kind {
            debug!("fd {} of {} has unknown type code {}", raw.fd, pid, code);
        }

        let vnode = if kind.is_vnode() {
            match self.source.vnode_detail(pid, raw.fd) {
                Ok(detail) => Some(VnodeDetail {
                    open_flags: detail.open_flags,
                    offset: detail.offset,
                    path: detail.path,
                }),
                Err(e) => {
                    debug!("No path details for fd {} of {}: {}", raw.fd, pid, e);
                    None
                }
            }
        } else {
            None
        };

        DescriptorEntry {
            number: raw.fd,
            kind,
            vnode,
        }
    }
}

/// Cuts a name to at most `MAX_NAME_BYTES` bytes on a char boundary.
fn truncate_name(mut name: String) -> String {
    if name.len() > MAX_NAME_BYTES {
        let mut cut = MAX_NAME_BYTES;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}
