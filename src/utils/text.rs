//! Text processing utilities.

/// Check if content has any non-whitespace text.
pub fn has_text(content: &str) -> bool {
    content.chars().any(|c| !c.is_whitespace())
}

/// Length in Unicode scalar values; every size limit is measured this way.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
