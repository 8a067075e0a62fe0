use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::DocumentError;
use crate::host::{ContentLoader, ContentProvider, Cursor, DocumentHost};
use crate::resequence::{Resequenced, resequence};

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
    pub modified_time: Option<SystemTime>,
}

impl Document {
    /// Read a markdown file from disk.
    pub fn open(path: &Path) -> Result<Document, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let modified_time = fs::metadata(path).ok().and_then(|m| m.modified().ok());
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Document {
            name,
            path: path.to_path_buf(),
            content,
            modified_time,
        })
    }

    /// Renumber this document's footnotes in memory. Returns whether the
    /// content changed.
    pub fn resequence(&mut self) -> Result<bool, DocumentError> {
        match resequence(&self.content) {
            Ok(Resequenced::Unchanged) => Ok(false),
            Ok(Resequenced::Changed { text, edits }) => {
                debug!(document = %self.name, edits = edits.len(), "resequenced");
                self.content = text;
                Ok(true)
            }
            Err(source) => Err(DocumentError::Resequence {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Write a document back to its path, creating parent directories.
pub fn save_document(doc: &Document) -> Result<(), DocumentError> {
    if let Some(parent) = doc.path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
            path: doc.path.clone(),
            source,
        })?;
    }

    fs::write(&doc.path, &doc.content).map_err(|source| DocumentError::Write {
        path: doc.path.clone(),
        source,
    })
}

pub fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("md" | "markdown")
    )
}

/// Expand a list of files and directories into the markdown files they name.
/// Directories are walked recursively; explicit files are kept as given.
pub fn collect_markdown_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, DocumentError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|source| DocumentError::Walk {
                path: path.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_markdown(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// A document on disk acting as an editor host. Changes stay in memory
/// until [`FileHost::flush`].
#[derive(Debug)]
pub struct FileHost {
    pub document: Document,
    cursor: Cursor,
    dirty: bool,
}

impl FileHost {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        Ok(FileHost {
            document: Document::open(path)?,
            cursor: Cursor::default(),
            dirty: false,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reload from disk, dropping unsaved changes but keeping the cursor.
    pub fn reload(&mut self) -> Result<(), DocumentError> {
        self.document = Document::open(&self.document.path)?;
        self.dirty = false;
        Ok(())
    }

    /// Write pending changes back to disk.
    pub fn flush(&mut self) -> Result<bool, DocumentError> {
        if !self.dirty {
            return Ok(false);
        }
        save_document(&self.document)?;
        self.document.modified_time = fs::metadata(&self.document.path)
            .ok()
            .and_then(|m| m.modified().ok());
        self.dirty = false;
        Ok(true)
    }
}

impl ContentProvider for FileHost {
    fn get_content(&self) -> String {
        self.document.content.clone()
    }
}

impl ContentLoader for FileHost {
    fn set_content_from_markdown(&mut self, markdown: &str) {
        if self.document.content != markdown {
            self.document.content = markdown.to_string();
            self.dirty = true;
        }
    }
}

impl DocumentHost for FileHost {
    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}
