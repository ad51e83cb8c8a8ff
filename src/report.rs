//! Plain-text report rendering.
//!
//! The report consists of three blocks in fixed order (identity, I/O
//! statistics, open descriptors), separated by one blank line. Every
//! rendered block ends with a newline.

use std::fmt::Write as _;
use std::io::Write;

use tracing::info;

use crate::error::InspectError;
use crate::format::{format_open_flags, format_size};
use crate::inspector::{DescriptorEntry, IoStatistics, ProcessInfo, ProcessInspector};
use crate::source::ProcessDataSource;

/// Renders the identity block.
pub fn render_process(info: &ProcessInfo) -> String {
    format!(
        "Process information for PID {pid}:\n\
         \x20 Process Name: {name}\n\
         \x20 Process ID: {pid}\n\
         \x20 Parent Process ID: {ppid}\n\
         \x20 User ID: {uid}\n",
        pid = info.pid,
        name = info.name,
        ppid = info.parent_pid,
        uid = info.owner_uid,
    )
}

/// Renders the I/O statistics block.
pub fn render_io(pid: u32, io: &IoStatistics) -> String {
    format!(
        "I/O statistics for PID {pid}:\n\
         \x20 Bytes Read: {} ({})\n\
         \x20 Bytes Written: {} ({})\n\
         \x20 Messages Sent: {}\n\
         \x20 Messages Received: {}\n\
         \x20 Mach System Calls: {}\n\
         \x20 Unix System Calls: {}\n\
         \x20 Page-ins: {}\n\
         \x20 Page-faults: {}\n",
        io.bytes_read,
        format_size(io.bytes_read),
        io.bytes_written,
        format_size(io.bytes_written),
        io.messages_sent,
        io.messages_received,
        io.mach_syscalls,
        io.unix_syscalls,
        io.page_ins,
        io.page_faults,
    )
}

/// Renders one descriptor line (without trailing newline).
pub fn render_descriptor(entry: &DescriptorEntry) -> String {
    let mut line = format!("  {}\t {}", entry.number, entry.kind);

    if let Some(vnode) = &entry.vnode {
        let _ = write!(
            line,
            " {} {} ({})\t\t {}",
            format_open_flags(vnode.open_flags),
            vnode.offset,
            format_size(vnode.offset),
            vnode.path
        );
    }

    line
}

/// Renders the open descriptor block.
pub fn render_descriptors(pid: u32, entries: &[DescriptorEntry]) -> String {
    let mut out = format!("Open file handles for PID {pid}:\n");
    for entry in entries {
        out.push_str(&render_descriptor(entry));
        out.push('\n');
    }
    out
}

/// Renders all three blocks at once.
pub fn render_report(
    info: &ProcessInfo,
    io: &IoStatistics,
    descriptors: &[DescriptorEntry],
) -> String {
    [
        render_process(info),
        render_io(info.pid, io),
        render_descriptors(info.pid, descriptors),
    ]
    .join("\n")
}

/// Runs the inspection queries in order and writes each block as soon as
/// its query succeeds. Stops at the first failure; blocks already written
/// stay written.
pub fn write_report<S, W>(
    inspector: &ProcessInspector<S>,
    pid: u32,
    out: &mut W,
) -> Result<(), InspectError>
where
    S: ProcessDataSource,
    W: Write,
{
    let info = inspector.lookup_process(pid)?;
    out.write_all(render_process(&info).as_bytes())?;
    out.flush()?;

    let io = inspector.lookup_io_statistics(pid)?;
    writeln!(out)?;
    out.write_all(render_io(pid, &io).as_bytes())?;
    out.flush()?;

    let descriptors = inspector.list_open_descriptors(pid)?;
    writeln!(out)?;
    out.write_all(render_descriptors(pid, &descriptors).as_bytes())?;
    out.flush()?;

    info!(
        "Report for {} ({}) complete: {} descriptors",
        pid,
        info.name,
        descriptors.len()
    );
    Ok(())
}
