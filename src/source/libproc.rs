//! libproc-backed data source for macOS.

use std::mem;
use std::ptr;

use libc::{c_char, c_int, c_void, proc_bsdinfo, proc_taskinfo, PROC_PIDTASKINFO, PROC_PIDTBSDINFO};
use tracing::trace;

use super::{
    fetch_sized_table, ProcessDataSource, RawDescriptor, RawProcessRecord, RawTaskCounters,
    RawVnodeDetail,
};
use crate::error::SourceError;

// <sys/proc_info.h>
const PROC_PIDLISTFDS: c_int = 1;
const PROC_PIDFDVNODEPATHINFO: c_int = 2;
const MAXPATHLEN: usize = 1024;
const VNODE_INFO_SIZE: usize = 152;

extern "C" {
    fn proc_pidfdinfo(
        pid: c_int,
        fd: c_int,
        flavor: c_int,
        buffer: *mut c_void,
        buffersize: c_int,
    ) -> c_int;
}

/// `struct proc_fdinfo`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct ProcFdInfo {
    proc_fd: i32,
    proc_fdtype: u32,
}

/// `struct proc_fileinfo`
#[repr(C)]
#[allow(dead_code)]
#[derive(Clone, Copy)]
struct ProcFileInfo {
    fi_openflags: u32,
    fi_status: u32,
    fi_offset: i64,
    fi_type: i32,
    fi_guardflags: u32,
}

/// `struct vnode_fdinfowithpath`; the `vnode_info` stat block is not read.
#[repr(C)]
#[allow(dead_code)]
struct VnodeFdInfoWithPath {
    pfi: ProcFileInfo,
    vip_vi: [u8; VNODE_INFO_SIZE],
    vip_path: [c_char; MAXPATHLEN],
}

/// Data source using `proc_pidinfo` and `proc_pidfdinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibprocSource;

impl LibprocSource {
    pub fn new() -> Self {
        Self
    }
}

/// Fills `T` with a single `proc_pidinfo` call; short reads fail.
fn pidinfo<T>(pid: u32, flavor: c_int, call: &'static str) -> Result<T, SourceError> {
    let size = mem::size_of::<T>() as c_int;
    // SAFETY: T is a plain C struct for which all-zero bytes are valid
    let mut info: T = unsafe { mem::zeroed() };

    // SAFETY: buffer points to `size` writable bytes owned by `info`
    let ret = unsafe {
        libc::proc_pidinfo(
            pid as c_int,
            flavor,
            0,
            &mut info as *mut T as *mut c_void,
            size,
        )
    };

    if ret <= 0 {
        return Err(SourceError::last_os_error(call));
    }
    if ret < size {
        return Err(SourceError::parse(
            "proc_pidinfo reply",
            format!("{call} returned {ret} of {size} bytes"),
        ));
    }
    Ok(info)
}

fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl ProcessDataSource for LibprocSource {
    fn name(&self) -> &'static str {
        "libproc"
    }

    fn process_record(&self, pid: u32) -> Result<RawProcessRecord, SourceError> {
        match pidinfo::<proc_bsdinfo>(pid, PROC_PIDTBSDINFO, "proc_pidinfo(PROC_PIDTBSDINFO)") {
            Ok(info) => Ok(RawProcessRecord {
                pid: info.pbi_pid,
                ppid: info.pbi_ppid,
                uid: info.pbi_uid,
                comm: c_chars_to_string(&info.pbi_comm),
            }),
            // No such process: zero-filled record
            Err(SourceError::Os { errno, .. }) if errno == libc::ESRCH => {
                trace!("proc_pidinfo: no process {}", pid);
                Ok(RawProcessRecord::default())
            }
            Err(e) => Err(e),
        }
    }

    fn task_counters(&self, pid: u32) -> Result<RawTaskCounters, SourceError> {
        let info: proc_taskinfo =
            pidinfo(pid, PROC_PIDTASKINFO, "proc_pidinfo(PROC_PIDTASKINFO)")?;

        // 32-bit kernel counters wrap; read them as unsigned
        Ok(RawTaskCounters {
            total_user: info.pti_total_user,
            total_system: info.pti_total_system,
            messages_sent: info.pti_messages_sent as u32 as u64,
            messages_received: info.pti_messages_received as u32 as u64,
            syscalls_mach: info.pti_syscalls_mach as u32 as u64,
            syscalls_unix: info.pti_syscalls_unix as u32 as u64,
            pageins: info.pti_pageins as u32 as u64,
            faults: info.pti_faults as u32 as u64,
        })
    }

    fn list_descriptors(&self, pid: u32) -> Result<Vec<RawDescriptor>, SourceError> {
        let pid = pid as c_int;

        let table: Vec<ProcFdInfo> = fetch_sized_table(
            "proc_pidinfo(PROC_PIDLISTFDS)",
            // SAFETY: a null buffer asks only for the required size
            || unsafe { libc::proc_pidinfo(pid, PROC_PIDLISTFDS, 0, ptr::null_mut(), 0) },
            // SAFETY: `bytes` never exceeds the byte length of `buf`
            |buf, bytes| unsafe {
                libc::proc_pidinfo(
                    pid,
                    PROC_PIDLISTFDS,
                    0,
                    buf.as_mut_ptr() as *mut c_void,
                    bytes as c_int,
                )
            },
        )?;

        Ok(table
            .into_iter()
            .map(|slot| RawDescriptor {
                fd: slot.proc_fd,
                fdtype: i64::from(slot.proc_fdtype),
            })
            .collect())
    }

    fn vnode_detail(&self, pid: u32, fd: i32) -> Result<RawVnodeDetail, SourceError> {
        let size = mem::size_of::<VnodeFdInfoWithPath>() as c_int;
        // SAFETY: plain C struct, all-zero bytes are valid
        let mut info: VnodeFdInfoWithPath = unsafe { mem::zeroed() };

        // SAFETY: buffer points to `size` writable bytes owned by `info`
        let ret = unsafe {
            proc_pidfdinfo(
                pid as c_int,
                fd,
                PROC_PIDFDVNODEPATHINFO,
                &mut info as *mut VnodeFdInfoWithPath as *mut c_void,
                size,
            )
        };

        if ret <= 0 {
            return Err(SourceError::last_os_error(
                "proc_pidfdinfo(PROC_PIDFDVNODEPATHINFO)",
            ));
        }

        Ok(RawVnodeDetail {
            open_flags: info.pfi.fi_openflags,
            offset: info.pfi.fi_offset.max(0) as u64,
            path: c_chars_to_string(&info.vip_path),
        })
    }
}
