//! Line Decoder
//!
//! Turns one raw serial line into a voltage reading, or rejects it.
//! Malformed telemetry is expected noise on a shared serial link, so
//! rejection is silent and carries no error.

/// Decode a raw line (without its newline) into a sample value.
///
/// The line is interpreted as UTF-8, trimmed, and parsed as a decimal
/// number. Empty lines, invalid UTF-8, unparseable text, and non-finite
/// values all yield `None`.
pub fn decode_line(raw: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
