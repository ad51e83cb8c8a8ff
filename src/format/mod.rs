//! Presentation helpers shared by the report renderer.
//!
//! This module provides:
//! - `bytes`: scaled byte sizes ("1.5K", "2048.0T")
//! - `fdtype`: descriptor type codes and their fixed-width labels
//! - `openflags`: access-mode decoding for open file flags

pub mod bytes;
pub mod fdtype;
pub mod openflags;

pub use bytes::format_size;
pub use fdtype::{type_label, DescriptorKind};
pub use openflags::{format_open_flags, FREAD, FWRITE};
