//! procfs-backed data source.
//!
//! Reads `/proc/<pid>/{stat,status,io,fd,fdinfo}` and maps Linux facts onto
//! the libproc-shaped raw records:
//! - `rchar`/`wchar` feed the two aggregate counters
//! - `syscr + syscw` count as unix system calls; Linux has no Mach calls or
//!   messages, so those stay 0
//! - `majflt` counts as page-ins, `minflt + majflt` as page faults
//! - descriptor kinds are derived from the `fd/<n>` link target

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, trace};

use super::{
    ProcessDataSource, RawDescriptor, RawProcessRecord, RawTaskCounters, RawVnodeDetail,
};
use crate::error::SourceError;
use crate::format::fdtype::{
    FDTYPE_FSEVENTS, FDTYPE_KQUEUE, FDTYPE_PIPE, FDTYPE_PSEM, FDTYPE_PSHM, FDTYPE_SOCKET,
    FDTYPE_VNODE,
};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Type code for link targets that match no known kind.
const FDTYPE_UNCLASSIFIED: i64 = -1;

const O_ACCMODE: u32 = 0o3;

/// Fields of `/proc/<pid>/stat` the inspector needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub pid: u32,
    pub comm: String,
    pub ppid: u32,
    pub minflt: u64,
    pub majflt: u64,
}

/// Fields of `/proc/<pid>/io`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoFields {
    pub rchar: u64,
    pub wchar: u64,
    pub syscr: u64,
    pub syscw: u64,
}

/// Data source reading a procfs tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn read(&self, path: PathBuf) -> Result<String, SourceError> {
        fs::read_to_string(&path).map_err(|e| SourceError::io(path, e))
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcessDataSource for ProcfsSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn process_record(&self, pid: u32) -> Result<RawProcessRecord, SourceError> {
        let dir = self.pid_dir(pid);
        let stat_path = dir.join("stat");

        let stat = match fs::read_to_string(&stat_path) {
            Ok(content) => parse_stat(&content)?,
            // Missing process: zero-filled record, like sysctl on a miss
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No procfs entry at {}", dir.display());
                return Ok(RawProcessRecord::default());
            }
            Err(e) => return Err(SourceError::io(stat_path, e)),
        };

        let status = self.read(dir.join("status"))?;
        let uid = parse_status_uid(&status)
            .ok_or_else(|| SourceError::parse("status", "no Uid line"))?;

        Ok(RawProcessRecord {
            pid: stat.pid,
            ppid: stat.ppid,
            uid,
            comm: stat.comm,
        })
    }

    fn task_counters(&self, pid: u32) -> Result<RawTaskCounters, SourceError> {
        let dir = self.pid_dir(pid);

        // /proc/<pid>/io needs ptrace access to the target
        let io = parse_io(&self.read(dir.join("io"))?);
        let stat = parse_stat(&self.read(dir.join("stat"))?)?;

        Ok(RawTaskCounters {
            total_user: io.rchar,
            total_system: io.wchar,
            messages_sent: 0,
            messages_received: 0,
            syscalls_mach: 0,
            syscalls_unix: io.syscr.saturating_add(io.syscw),
            pageins: stat.majflt,
            faults: stat.minflt.saturating_add(stat.majflt),
        })
    }

    fn list_descriptors(&self, pid: u32) -> Result<Vec<RawDescriptor>, SourceError> {
        let fd_dir = self.pid_dir(pid).join("fd");
        let entries = fs::read_dir(&fd_dir).map_err(|e| SourceError::io(&fd_dir, e))?;

        let mut table = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SourceError::io(&fd_dir, e))?;
            let fd: i32 = match entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => continue,
            };

            let fdtype = match fs::read_link(entry.path()) {
                Ok(target) => classify_link_target(&target.to_string_lossy()),
                // Closed between readdir and readlink
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!("fd {} of pid {} vanished during listing", fd, pid);
                    continue;
                }
                Err(e) => {
                    debug!("Cannot resolve fd {} of pid {}: {}", fd, pid, e);
                    FDTYPE_UNCLASSIFIED
                }
            };

            table.push(RawDescriptor { fd, fdtype });
        }

        // The kernel lists fds ascending; read_dir on other trees may not
        table.sort_by_key(|d| d.fd);
        Ok(table)
    }

    fn vnode_detail(&self, pid: u32, fd: i32) -> Result<RawVnodeDetail, SourceError> {
        let dir = self.pid_dir(pid);
        let link = dir.join("fd").join(fd.to_string());
        let target = fs::read_link(&link).map_err(|e| SourceError::io(&link, e))?;

        let (offset, flags) = parse_fdinfo(&self.read(dir.join("fdinfo").join(fd.to_string()))?)?;

        Ok(RawVnodeDetail {
            open_flags: translate_open_flags(flags),
            offset,
            path: target.to_string_lossy().into_owned(),
        })
    }
}

/// Parses `/proc/<pid>/stat`. The command name sits between the first `(`
/// and the last `)` and may itself contain spaces or parentheses.
pub fn parse_stat(content: &str) -> Result<StatFields, SourceError> {
    let open = content
        .find('(')
        .ok_or_else(|| SourceError::parse("stat", "missing '('"))?;
    let close = content
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| SourceError::parse("stat", "missing ')'"))?;

    let pid = content[..open]
        .trim()
        .parse()
        .map_err(|_| SourceError::parse("stat", "bad pid field"))?;
    let comm = content[open + 1..close].to_string();

    // Fields after the name, starting with state (field 3)
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() < 10 {
        return Err(SourceError::parse(
            "stat",
            format!("expected at least 12 fields, got {}", rest.len() + 2),
        ));
    }

    Ok(StatFields {
        pid,
        comm,
        ppid: stat_field(&rest, 1, "ppid")?,
        minflt: stat_field(&rest, 7, "minflt")?,
        majflt: stat_field(&rest, 9, "majflt")?,
    })
}

fn stat_field<T: FromStr>(rest: &[&str], idx: usize, name: &str) -> Result<T, SourceError> {
    rest[idx]
        .parse()
        .map_err(|_| SourceError::parse("stat", format!("bad {name} field '{}'", rest[idx])))
}

/// Real UID from the `Uid:` line of `/proc/<pid>/status`.
pub fn parse_status_uid(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|l| l.strip_prefix("Uid:"))
        .and_then(|v| v.split_whitespace().next())
        .and_then(|v| v.parse().ok())
}

/// Parses `/proc/<pid>/io`. Missing keys read as 0.
pub fn parse_io(content: &str) -> IoFields {
    let mut io = IoFields::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().parse().unwrap_or(0);
        match key.trim() {
            "rchar" => io.rchar = value,
            "wchar" => io.wchar = value,
            "syscr" => io.syscr = value,
            "syscw" => io.syscw = value,
            _ => {}
        }
    }

    io
}

/// Returns `(pos, flags)` from `/proc/<pid>/fdinfo/<fd>`; flags are octal.
pub fn parse_fdinfo(content: &str) -> Result<(u64, u32), SourceError> {
    let mut pos = None;
    let mut flags = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("pos:") {
            pos = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("flags:") {
            flags = u32::from_str_radix(v.trim(), 8).ok();
        }
    }

    match (pos, flags) {
        (Some(pos), Some(flags)) => Ok((pos, flags)),
        _ => Err(SourceError::parse("fdinfo", "missing pos or flags")),
    }
}

/// Maps an `fd/<n>` link target onto a `PROX_FDTYPE_*` code.
pub fn classify_link_target(target: &str) -> i64 {
    if let Some(shm) = target.strip_prefix("/dev/shm/") {
        if shm.starts_with("sem.") {
            FDTYPE_PSEM
        } else {
            FDTYPE_PSHM
        }
    } else if target.starts_with('/') {
        FDTYPE_VNODE
    } else if target.starts_with("socket:") {
        FDTYPE_SOCKET
    } else if target.starts_with("pipe:") {
        FDTYPE_PIPE
    } else if target == "anon_inode:[eventpoll]" {
        FDTYPE_KQUEUE
    } else if target == "anon_inode:inotify" || target == "anon_inode:[fanotify]" {
        FDTYPE_FSEVENTS
    } else {
        FDTYPE_UNCLASSIFIED
    }
}

/// Converts Linux `O_ACCMODE` bits to FREAD/FWRITE bits, keeping the rest.
/// O_RDONLY -> FREAD, O_WRONLY -> FWRITE, O_RDWR -> both.
pub fn translate_open_flags(flags: u32) -> u32 {
    let access = ((flags & O_ACCMODE) + 1) & O_ACCMODE;
    (flags & !O_ACCMODE) | access
}
