//! Descriptor type codes and their display labels.
//!
//! Codes follow the `PROX_FDTYPE_*` numbering used by the macOS kernel; the
//! procfs source maps Linux descriptors onto the same codes.

use std::fmt;

pub const FDTYPE_ATALK: i64 = 0;
pub const FDTYPE_VNODE: i64 = 1;
pub const FDTYPE_SOCKET: i64 = 2;
pub const FDTYPE_PSHM: i64 = 3;
pub const FDTYPE_PSEM: i64 = 4;
pub const FDTYPE_KQUEUE: i64 = 5;
pub const FDTYPE_PIPE: i64 = 6;
pub const FDTYPE_FSEVENTS: i64 = 7;

/// Kind of an open descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Atalk,
    Vnode,
    Socket,
    Pshm,
    Psem,
    Kqueue,
    Pipe,
    Fsevents,
    /// Any code outside the known table, kept for diagnostics.
    Unknown(i64),
}

impl DescriptorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            FDTYPE_ATALK => DescriptorKind::Atalk,
            FDTYPE_VNODE => DescriptorKind::Vnode,
            FDTYPE_SOCKET => DescriptorKind::Socket,
            FDTYPE_PSHM => DescriptorKind::Pshm,
            FDTYPE_PSEM => DescriptorKind::Psem,
            FDTYPE_KQUEUE => DescriptorKind::Kqueue,
            FDTYPE_PIPE => DescriptorKind::Pipe,
            FDTYPE_FSEVENTS => DescriptorKind::Fsevents,
            other => DescriptorKind::Unknown(other),
        }
    }

    /// Eight-character, space-padded label.
    pub fn label(self) -> &'static str {
        match self {
            DescriptorKind::Atalk => "ATALK   ",
            DescriptorKind::Vnode => "VNODE   ",
            DescriptorKind::Socket => "SOCKET  ",
            DescriptorKind::Pshm => "PSHM    ",
            DescriptorKind::Psem => "PSEM    ",
            DescriptorKind::Kqueue => "KQUEUE  ",
            DescriptorKind::Pipe => "PIPE    ",
            DescriptorKind::Fsevents => "FSEVENTS",
            DescriptorKind::Unknown(_) => "UNKNOWN ",
        }
    }

    pub fn is_vnode(self) -> bool {
        self == DescriptorKind::Vnode
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a raw type code. Total: unknown codes yield `"UNKNOWN "`.
pub fn type_label(code: i64) -> &'static str {
    DescriptorKind::from_code(code).label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(type_label(FDTYPE_ATALK), "ATALK   ");
        assert_eq!(type_label(FDTYPE_VNODE), "VNODE   ");
        assert_eq!(type_label(FDTYPE_SOCKET), "SOCKET  ");
        assert_eq!(type_label(FDTYPE_PSHM), "PSHM    ");
        assert_eq!(type_label(FDTYPE_PSEM), "PSEM    ");
        assert_eq!(type_label(FDTYPE_KQUEUE), "KQUEUE  ");
        assert_eq!(type_label(FDTYPE_PIPE), "PIPE    ");
        assert_eq!(type_label(FDTYPE_FSEVENTS), "FSEVENTS");
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        for code in [-1, -4096, 8, 9, 255, i64::MIN, i64::MAX] {
            assert_eq!(type_label(code), "UNKNOWN ", "code {code}");
        }
        assert_eq!(DescriptorKind::from_code(42), DescriptorKind::Unknown(42));
    }

    #[test]
    fn test_labels_are_eight_chars() {
        for code in -16..32 {
            assert_eq!(type_label(code).len(), 8, "code {code}");
        }
    }

    #[test]
    fn test_display_matches_label() {
        assert_eq!(DescriptorKind::Socket.to_string(), "SOCKET  ");
        assert_eq!(DescriptorKind::Unknown(-1).to_string(), "UNKNOWN ");
        assert_eq!(format!("[{}]", DescriptorKind::Fsevents), "[FSEVENTS]");
    }

    #[test]
    fn test_only_vnode_is_vnode() {
        assert!(DescriptorKind::Vnode.is_vnode());
        for code in (0..8).filter(|c| *c != FDTYPE_VNODE) {
            assert!(!DescriptorKind::from_code(code).is_vnode());
        }
    }
}
