use crate::error::ResequenceError;

/// A planned splice over a document: replace `length` bytes at `position`
/// with `replacement`.
///
/// `original` is the text the planner saw at that range. It is checked again
/// right before the splice so a bad offset never reaches the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub position: usize,
    pub length: usize,
    pub replacement: String,
    pub original: String,
}

impl Edit {
    pub fn new(position: usize, original: &str, replacement: impl Into<String>) -> Self {
        Edit {
            position,
            length: original.len(),
            replacement: replacement.into(),
            original: original.to_string(),
        }
    }

    pub fn end(&self) -> usize {
        self.position + self.length
    }

    /// True when applying this edit would not change anything.
    pub fn is_noop(&self) -> bool {
        self.original == self.replacement
    }
}

/// Apply a batch of non-overlapping edits to `text`.
///
/// Edits are applied rightmost first, so every offset recorded against the
/// original text is still valid when its turn comes. The whole batch is
/// validated before the first splice; on error nothing is returned.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<String, ResequenceError> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));

    let mut right_bound = text.len();
    let mut right_start: Option<usize> = None;
    for edit in &ordered {
        let end = edit.end();
        if end > text.len()
            || !text.is_char_boundary(edit.position)
            || !text.is_char_boundary(end)
        {
            return Err(ResequenceError::EditOutOfBounds {
                position: edit.position,
                length: edit.length,
                text_len: text.len(),
            });
        }
        if end > right_bound {
            return Err(ResequenceError::OverlappingEdits {
                first: edit.position,
                second: right_start.unwrap_or(right_bound),
            });
        }
        let found = &text[edit.position..end];
        if found != edit.original || edit.original.len() != edit.length {
            return Err(ResequenceError::EditMismatch {
                position: edit.position,
                expected: edit.original.clone(),
                found: found.to_string(),
            });
        }
        right_bound = edit.position;
        right_start = Some(edit.position);
    }

    let mut out = text.to_string();
    for edit in ordered {
        out.replace_range(edit.position..edit.end(), &edit.replacement);
    }
    Ok(out)
}
