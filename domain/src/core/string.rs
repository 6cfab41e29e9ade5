//! String utilities for the domain layer.

/// Collapse a multi-line text into one line and cap it at `max_len` bytes.
///
/// Used for log fields and event payloads where a full prompt or tool
/// output would be noise. Truncation respects UTF-8 boundaries and appends
/// an ellipsis.
pub fn single_line_preview(s: &str, max_len: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_len {
        return flat;
    }
    let mut end = max_len.saturating_sub(3).min(flat.len());
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &flat[..end])
}
