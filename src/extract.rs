//! Bracket-scan extraction of script payloads embedded in page text.
//!
//! The remote page assigns its data to script variables:
//! - `window.getAreaStat = [{...}, ...]` for the area statistics
//! - `window.timeStamp=1580000000000</script>` for the capture time in ms
//!
//! The array is captured by depth counting over `[` and `]` only. Braces are
//! not tracked, so the result is a balanced bracket span, not validated JSON.

use crate::error::ExtractError;

/// Marker preceding the area statistics array.
pub const AREA_STAT_MARKER: &str = "window.getAreaStat";

/// Marker preceding the millisecond epoch timestamp.
pub const TIMESTAMP_MARKER: &str = "window.timeStamp=";

/// Token ending the timestamp literal.
pub const TIMESTAMP_TERMINATOR: &str = "</script>";

/// Returns the first balanced `[...]` span after `marker`.
pub fn extract_balanced_array<'a>(text: &'a str, marker: &str) -> Result<&'a str, ExtractError> {
    let from = find_marker(text, marker)?;
    let open = text[from..]
        .find('[')
        .map(|i| from + i)
        .ok_or_else(|| ExtractError::Malformed {
            marker: marker.to_string(),
            reason: "no opening bracket".to_string(),
        })?;
    scan_balanced(text, open, marker)
}

/// Like [`extract_balanced_array`], but the span must open with `[{`.
pub fn extract_object_array<'a>(text: &'a str, marker: &str) -> Result<&'a str, ExtractError> {
    let from = find_marker(text, marker)?;
    let open = text[from..]
        .find("[{")
        .map(|i| from + i)
        .ok_or_else(|| ExtractError::Malformed {
            marker: marker.to_string(),
            reason: "no array of objects".to_string(),
        })?;
    scan_balanced(text, open, marker)
}

/// Parses the millisecond literal after `marker` up to `terminator` and
/// returns it as seconds.
pub fn extract_timestamp(text: &str, marker: &str, terminator: &str) -> Result<f64, ExtractError> {
    let start = find_marker(text, marker)? + marker.len();
    let rest = &text[start..];
    let literal = match rest.find(terminator) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let literal = literal.trim().trim_end_matches(';').trim_end();

    let millis: f64 = literal.parse().map_err(|e| ExtractError::Parse {
        marker: marker.to_string(),
        reason: format!("{literal:?} is not numeric: {e}"),
    })?;

    if !millis.is_finite() {
        return Err(ExtractError::Parse {
            marker: marker.to_string(),
            reason: format!("{literal:?} is not a finite number"),
        });
    }

    Ok(millis / 1000.0)
}

fn find_marker(text: &str, marker: &str) -> Result<usize, ExtractError> {
    text.find(marker).ok_or_else(|| ExtractError::NotFound {
        marker: marker.to_string(),
    })
}

// `open` must index a '['. Brackets are ASCII so byte offsets stay on char
// boundaries.
fn scan_balanced<'a>(text: &'a str, open: usize, marker: &str) -> Result<&'a str, ExtractError> {
    let mut depth: i64 = 0;

    for (offset, byte) in text.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'[' => depth += 1,
            b']' => depth -= 1,
            _ => continue,
        }
        if depth == 0 {
            return Ok(&text[open..=open + offset]);
        }
    }

    Err(ExtractError::Malformed {
        marker: marker.to_string(),
        reason: format!("unbalanced brackets, depth {depth} at end of input"),
    })
}
