//! Parsing and rendering of `hh:mm:ss` / `mm:ss` timecodes.
//!
//! Model output is messy: timecodes arrive with surrounding whitespace,
//! fractional seconds, or as ranges ("05:10 - 05:40"). Parsing here is
//! deliberately forgiving and never fails the pipeline over a bad string.

// "->" is covered by the bare hyphen.
const RANGE_SEPARATORS: [&str; 4] = ["-", "\u{2013}", "\u{2014}", "\u{2192}"];

/// Byte index of a case-insensitive ` to ` range separator, if any.
fn find_word_to(input: &str) -> Option<usize> {
    input.as_bytes().windows(4).position(|w| {
        w[0] == b' '
            && w[1].eq_ignore_ascii_case(&b't')
            && w[2].eq_ignore_ascii_case(&b'o')
            && w[3] == b' '
    })
}

/// Cut a range like "05:10 - 05:40" down to its opening timecode.
fn range_prefix(input: &str) -> &str {
    let mut cut = input.len();
    for sep in RANGE_SEPARATORS {
        if let Some(idx) = input.find(sep) {
            cut = cut.min(idx);
        }
    }
    if let Some(idx) = find_word_to(input) {
        cut = cut.min(idx);
    }
    &input[..cut]
}

/// Strict parse of a timecode into whole seconds.
///
/// Accepts `hh:mm:ss` and `mm:ss`, with optional fractional components
/// (truncated) and surrounding whitespace. For a range, the opening
/// timecode is parsed. Anything else, including components too large for
/// the seconds count to hold, is `None`.
pub fn parse_seconds(input: &str) -> Option<u64> {
    let head = range_prefix(input).trim();
    let parts: Vec<&str> = head.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let mut total = 0u64;
    for part in parts {
        let value: f64 = part.trim().parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value.trunc() as u64)?;
    }
    Some(total)
}

/// Lenient parse: unparsable input maps to zero seconds.
pub fn to_seconds(input: &str) -> u64 {
    parse_seconds(input).unwrap_or(0)
}

/// Render seconds as zero-padded `hh:mm:ss`. Negative input clamps to zero.
pub fn to_timecode(total_seconds: i64) -> String {
    let clamped = total_seconds.max(0);
    let hours = clamped / 3600;
    let minutes = (clamped % 3600) / 60;
    let seconds = clamped % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Shift a chunk-relative timecode by the chunk's start offset, producing
/// an absolute `hh:mm:ss` position in the source video. Saturates rather
/// than overflow on degenerate input.
pub fn rebase(timecode: &str, chunk_start_offset_seconds: u64) -> String {
    let absolute = to_seconds(timecode).saturating_add(chunk_start_offset_seconds);
    to_timecode(i64::try_from(absolute).unwrap_or(i64::MAX))
}

/// Filesystem-safe rendering of a timecode, for use in image file names.
pub fn sanitize(timecode: &str) -> String {
    timecode
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
