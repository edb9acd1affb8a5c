//! Captured-at timestamps encoded in recording filenames
//!
//! The capture app names files `YYYY-MM-DD_HH-MM-SS.<ext>`. Anything else is
//! shown verbatim.

use std::path::Path;

use chrono::NaiveDateTime;

/// strftime pattern of the filename stem
pub const CAPTURE_PATTERN: &str = "%Y-%m-%d_%H-%M-%S";

/// Human-readable rendering, e.g. `05 Mar 2024 at 02:30:00 PM`
pub const DISPLAY_FORMAT: &str = "%d %b %Y at %I:%M:%S %p";

/// `d` is any ASCII digit, every other byte must match literally
const STEM_SHAPE: &[u8] = b"dddd-dd-dd_dd-dd-dd";

/// Parse the capture time out of `filename`'s stem.
///
/// Returns `None` unless the stem is exactly `YYYY-MM-DD_HH-MM-SS` and
/// names a real calendar date and time.
pub fn parse_captured_at(filename: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    if !matches_shape(stem) {
        return None;
    }
    NaiveDateTime::parse_from_str(stem, CAPTURE_PATTERN).ok()
}

fn matches_shape(stem: &str) -> bool {
    stem.len() == STEM_SHAPE.len()
        && stem
            .bytes()
            .zip(STEM_SHAPE)
            .all(|(c, &shape)| match shape {
                b'd' => c.is_ascii_digit(),
                literal => c == literal,
            })
}

/// Label shown for a file: the formatted capture time, or the raw filename.
pub fn display_label(filename: &str, captured_at: Option<&NaiveDateTime>) -> String {
    match captured_at {
        Some(ts) => ts.format(DISPLAY_FORMAT).to_string(),
        None => filename.to_string(),
    }
}
