// Library exports for footseq

pub mod classify;
pub mod config;
pub mod debounce;
pub mod document;
pub mod edit;
pub mod error;
pub mod host;
pub mod links;
pub mod resequence;

pub use error::{DocumentError, ResequenceError};
pub use resequence::{Resequenced, resequence};
