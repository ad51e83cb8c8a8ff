//! Access-mode decoding for open file flags.

/// Descriptor opened for reading.
pub const FREAD: u32 = 0x0001;
/// Descriptor opened for writing.
pub const FWRITE: u32 = 0x0002;

/// Decodes open flags into `RW`/`RD`/`WR`/`??`.
///
/// Values above 3 carry bits beyond plain read/write and get the raw value
/// appended as `0x%06x`; otherwise the hex column is blank-padded so every
/// result has the same width.
pub fn format_open_flags(flags: u32) -> String {
    let prefix = match (flags & FREAD != 0, flags & FWRITE != 0) {
        (true, true) => "RW",
        (true, false) => "RD",
        (false, true) => "WR",
        (false, false) => "??",
    };

    if flags > (FREAD | FWRITE) {
        format!("{} 0x{:06x}", prefix, flags)
    } else {
        format!("{}         ", prefix)
    }
}
