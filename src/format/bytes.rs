//! Human-readable byte sizes.

const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];

/// Formats a byte count with binary scaling and one fractional digit.
///
/// Scaling stops at terabytes, so very large values keep growing in front of
/// the "T" suffix (`2048.0T`). Zero renders as `0.0`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.1}{}", size, UNITS[unit_idx])
}
