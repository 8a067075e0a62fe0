use std::path::PathBuf;

use thiserror::Error;

/// Raised when a planned edit does not line up with the text it was planned
/// against. Any of these means the scanner produced bad offsets, so the
/// document must not be written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResequenceError {
    #[error("edit at {position} expected {expected:?} but found {found:?}")]
    EditMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("edits at {first} and {second} overlap")]
    OverlappingEdits { first: usize, second: usize },

    #[error("edit at {position} (length {length}) is outside a text of {text_len} bytes")]
    EditOutOfBounds {
        position: usize,
        length: usize,
        text_len: usize,
    },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("refusing to rewrite '{}': {source}", .path.display())]
    Resequence {
        path: PathBuf,
        #[source]
        source: ResequenceError,
    },
}
