//! Anchor-based line insertion, the primitive every table-driven edit goes through.

use crate::models::{EditOutcome, EditSpec, InsertionPolicy};

/// Byte offset of the first occurrence of `anchor`, or `None` when absent or empty.
pub fn find_anchor(text: &str, anchor: &str) -> Option<usize> {
    if anchor.is_empty() {
        return None;
    }
    text.find(anchor)
}

/// Offset just past the line break ending the line that contains `pos`.
///
/// Returns `text.len()` when that line is the unterminated last line.
fn end_of_line(text: &str, pos: usize) -> usize {
    text[pos..]
        .find('\n')
        .map(|i| pos + i + 1)
        .unwrap_or(text.len())
}

/// Insert `payload` on the line after the first line containing `anchor`.
///
/// `payload` is expected to be newline-terminated. Absent anchor leaves the
/// text byte-identical and reports [`EditOutcome::NotFound`].
pub fn insert_after_anchor(text: &str, anchor: &str, payload: &str) -> (String, EditOutcome) {
    let Some(start) = find_anchor(text, anchor) else {
        return (text.to_string(), EditOutcome::NotFound);
    };

    let insert_at = end_of_line(text, start);
    let mut out = String::with_capacity(text.len() + payload.len() + 1);
    out.push_str(&text[..insert_at]);
    // Anchor on an unterminated last line: start the payload on its own line.
    if insert_at == text.len() && !text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(payload);
    out.push_str(&text[insert_at..]);

    (out, EditOutcome::Applied { count: 1 })
}

/// Apply one declarative edit.
pub fn apply_edit(text: &str, edit: &EditSpec) -> (String, EditOutcome) {
    match edit.policy {
        InsertionPolicy::AfterAnchorLine => insert_after_anchor(text, &edit.anchor, &edit.payload),
    }
}
