//! End-to-end tests for the procfs data source against a fake proc tree.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use herakles_procinfo::format::DescriptorKind;
use herakles_procinfo::{write_report, InspectError, ProcessInspector, ProcfsSource};
use tempfile::{tempdir, TempDir};

const PID: u32 = 4242;

/// Builds `<root>/4242` with stat, status, io and a small descriptor table.
fn fake_proc_tree() -> TempDir {
    let root = tempdir().expect("Failed to create temp dir");
    let pid_dir = root.path().join(PID.to_string());
    fs::create_dir_all(pid_dir.join("fd")).unwrap();
    fs::create_dir_all(pid_dir.join("fdinfo")).unwrap();

    fs::write(
        pid_dir.join("stat"),
        "4242 (fake (daemon)) S 1 4242 4242 0 -1 4194560 120 0 7 0 5 3 0 0 20 0 1 0 100 0 0\n",
    )
    .unwrap();
    fs::write(
        pid_dir.join("status"),
        "Name:\tfake\nState:\tS (sleeping)\nPPid:\t1\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n",
    )
    .unwrap();
    fs::write(
        pid_dir.join("io"),
        "rchar: 2048\nwchar: 1536000\nsyscr: 10\nsyscw: 5\nread_bytes: 0\nwrite_bytes: 4096\ncancelled_write_bytes: 0\n",
    )
    .unwrap();

    let fd = |n: i32, target: &str| symlink(target, pid_dir.join("fd").join(n.to_string())).unwrap();
    let fdinfo = |n: i32, pos: u64, flags: &str| {
        fs::write(
            pid_dir.join("fdinfo").join(n.to_string()),
            format!("pos:\t{pos}\nflags:\t{flags}\nmnt_id:\t25\nino:\t1234\n"),
        )
        .unwrap()
    };

    // Read-only file without fdinfo: detail lookup fails
    fd(0, "/dev/null");
    fd(3, "/tmp/input.txt");
    fdinfo(3, 0, "0100000");
    fd(5, "/var/log/app.log");
    fdinfo(5, 100, "0102001");
    fd(6, "socket:[12345]");
    fd(7, "pipe:[999]");
    fd(8, "anon_inode:[eventpoll]");
    fd(9, "anon_inode:[eventfd]");
    fd(10, "/dev/shm/sem.lock");
    fd(11, "/dev/shm/buffer");
    fd(12, "/tmp/rw.db");
    fdinfo(12, 1048576, "02");

    root
}

fn inspector(root: &Path) -> ProcessInspector<ProcfsSource> {
    ProcessInspector::new(ProcfsSource::new(root))
}

#[test]
fn test_process_lookup_from_tree() {
    let root = fake_proc_tree();
    let info = inspector(root.path()).lookup_process(PID).unwrap();

    assert_eq!(info.pid, PID);
    assert_eq!(info.name, "fake (daemon)");
    assert_eq!(info.parent_pid, 1);
    assert_eq!(info.owner_uid, 1000);
}

#[test]
fn test_io_statistics_from_tree() {
    let root = fake_proc_tree();
    let io = inspector(root.path()).lookup_io_statistics(PID).unwrap();

    assert_eq!(io.bytes_read, 2048);
    assert_eq!(io.bytes_written, 1536000);
    assert_eq!(io.messages_sent, 0);
    assert_eq!(io.messages_received, 0);
    assert_eq!(io.mach_syscalls, 0);
    assert_eq!(io.unix_syscalls, 15);
    assert_eq!(io.page_ins, 7);
    assert_eq!(io.page_faults, 127);
}

#[test]
fn test_descriptor_table_from_tree() {
    let root = fake_proc_tree();
    let entries = inspector(root.path()).list_open_descriptors(PID).unwrap();

    let numbers: Vec<i32> = entries.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![0, 3, 5, 6, 7, 8, 9, 10, 11, 12]);

    let kinds: Vec<DescriptorKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DescriptorKind::Vnode,
            DescriptorKind::Vnode,
            DescriptorKind::Vnode,
            DescriptorKind::Socket,
            DescriptorKind::Pipe,
            DescriptorKind::Kqueue,
            DescriptorKind::Unknown(-1),
            DescriptorKind::Psem,
            DescriptorKind::Pshm,
            DescriptorKind::Vnode,
        ]
    );

    // fd 0 has no fdinfo entry
    assert!(entries[0].vnode.is_none());

    let input = entries[1].vnode.as_ref().unwrap();
    assert_eq!(input.path, "/tmp/input.txt");
    assert_eq!(input.offset, 0);
    assert_eq!(input.open_flags, 0o100001);

    let log = entries[2].vnode.as_ref().unwrap();
    assert_eq!(log.offset, 100);
    assert_eq!(log.open_flags, 0o102002);

    let db = entries[9].vnode.as_ref().unwrap();
    assert_eq!(db.open_flags, 3);
}

#[test]
fn test_report_from_tree() {
    let root = fake_proc_tree();
    let mut out = Vec::new();
    write_report(&inspector(root.path()), PID, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.starts_with("Process information for PID 4242:\n  Process Name: fake (daemon)\n"));
    assert!(out.contains("  Bytes Read: 2048 (2.0K)\n"));
    assert!(out.contains("  Bytes Written: 1536000 (1.5M)\n"));
    assert!(out.contains("\nOpen file handles for PID 4242:\n"));

    assert!(out.contains("  0\t VNODE   \n"));
    assert!(out.contains("  3\t VNODE    RD 0x008001 0 (0.0)\t\t /tmp/input.txt\n"));
    assert!(out.contains("  5\t VNODE    WR 0x008402 100 (100.0)\t\t /var/log/app.log\n"));
    assert!(out.contains("  6\t SOCKET  \n"));
    assert!(out.contains("  9\t UNKNOWN \n"));
    assert!(out.contains("  12\t VNODE    RW          1048576 (1.0M)\t\t /tmp/rw.db\n"));
}

#[test]
fn test_missing_pid_is_not_found() {
    let root = fake_proc_tree();
    let mut out = Vec::new();
    let result = write_report(&inspector(root.path()), 31337, &mut out);

    assert!(matches!(result, Err(InspectError::NotFound { pid: 31337 })));
    assert!(out.is_empty());
}

#[test]
fn test_unreadable_io_stops_after_identity() {
    let root = fake_proc_tree();
    fs::remove_file(root.path().join(PID.to_string()).join("io")).unwrap();

    let mut out = Vec::new();
    let result = write_report(&inspector(root.path()), PID, &mut out);
    let out = String::from_utf8(out).unwrap();

    assert!(matches!(result, Err(InspectError::Query { .. })));
    assert!(out.contains("  User ID: 1000\n"));
    assert!(!out.contains("I/O statistics"));
    assert!(!out.contains("Open file handles"));
}

#[test]
fn test_missing_fd_dir_fails_listing() {
    let root = fake_proc_tree();
    fs::remove_dir_all(root.path().join(PID.to_string()).join("fd")).unwrap();

    let result = inspector(root.path()).list_open_descriptors(PID);
    assert!(matches!(result, Err(InspectError::Query { .. })));
}
