// Seam between the resequencer and whatever editor owns the document.
// The core only ever sees a text snapshot and hands back new text; writing
// it and putting the cursor back is the host's job.

use tracing::info;

use crate::error::ResequenceError;
use crate::resequence::{Resequenced, resequence};

/// A caret position as editors report it: zero-based line and character
/// column within that line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub ch: usize,
}

impl Cursor {
    pub fn new(line: usize, ch: usize) -> Self {
        Cursor { line, ch }
    }

    /// Clamp to the last line of `text`, then to the end of that line.
    pub fn clamp_to(self, text: &str) -> Cursor {
        let lines: Vec<&str> = text.split('\n').collect();
        let line = self.line.min(lines.len().saturating_sub(1));
        let width = lines
            .get(line)
            .copied()
            .map(|l| l.strip_suffix('\r').unwrap_or(l).chars().count())
            .unwrap_or(0);
        Cursor {
            line,
            ch: self.ch.min(width),
        }
    }
}

/// Provides read access to the current textual content as Markdown.
pub trait ContentProvider {
    fn get_content(&self) -> String;
}

/// Replaces the whole content of an editor with new Markdown.
pub trait ContentLoader {
    fn set_content_from_markdown(&mut self, markdown: &str);
}

/// An editor that can hand out its text and cursor and take both back.
pub trait DocumentHost: ContentProvider + ContentLoader {
    fn cursor(&self) -> Cursor;
    fn set_cursor(&mut self, cursor: Cursor);
}

/// Resequence the host's document in place.
///
/// Returns whether the document was rewritten. On error the host is left
/// untouched.
pub fn recheck<H: DocumentHost + ?Sized>(host: &mut H) -> Result<bool, ResequenceError> {
    recheck_with(host, resequence)
}

/// [`recheck`] with the rewrite step supplied by the caller.
pub fn recheck_with<H, F>(host: &mut H, rewrite: F) -> Result<bool, ResequenceError>
where
    H: DocumentHost + ?Sized,
    F: FnOnce(&str) -> Result<Resequenced, ResequenceError>,
{
    let snapshot = host.get_content();
    let cursor = host.cursor();

    match rewrite(&snapshot)? {
        Resequenced::Unchanged => Ok(false),
        Resequenced::Changed { text, edits } => {
            info!(edits = edits.len(), "renumbered footnotes");
            host.set_content_from_markdown(&text);
            host.set_cursor(cursor.clamp_to(&text));
            Ok(true)
        }
    }
}

/// Plain in-memory document with a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferHost {
    pub text: String,
    pub cursor: Cursor,
}

impl BufferHost {
    pub fn new(text: impl Into<String>) -> Self {
        BufferHost {
            text: text.into(),
            cursor: Cursor::default(),
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }
}

impl ContentProvider for BufferHost {
    fn get_content(&self) -> String {
        self.text.clone()
    }
}

impl ContentLoader for BufferHost {
    fn set_content_from_markdown(&mut self, markdown: &str) {
        self.text = markdown.to_string();
    }
}

impl DocumentHost for BufferHost {
    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}
