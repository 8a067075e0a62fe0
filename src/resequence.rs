//! Footnote resequencing.
//!
//! Renumbers every footnote reference (`[^label]`) and every referenced
//! footnote definition (`[^label]: body`) so identifiers read `1`, `2`, `3`, ...
//! in order of first reference. Offsets are byte offsets into the input.
//!
//! ```
//! use footseq::resequence::{resequence, Resequenced};
//!
//! let out = resequence("Text[^note].\n\n[^note]: Body.").unwrap();
//! assert_eq!(out.text(), Some("Text[^1].\n\n[^1]: Body."));
//!
//! let again = resequence("Text[^1].\n\n[^1]: Body.").unwrap();
//! assert_eq!(again, Resequenced::Unchanged);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::edit::{Edit, apply_edits};
use crate::error::ResequenceError;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^([^\]]+)\]").expect("valid footnote marker regex"));

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\[\^([^\]]+)\]:[ \t]*)").expect("valid footnote definition regex")
});

/// An inline footnote marker, e.g. the `[^a]` in `see[^a]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteReference {
    pub identifier: String,
    pub position: usize,
    /// The full marker as written, brackets included.
    pub token: String,
    pub assigned_number: usize,
}

/// The prefix of a footnote definition line. `matched_text` covers the
/// marker, the colon and any spaces or tabs after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteDefinition {
    pub identifier: String,
    pub position: usize,
    pub matched_text: String,
}

/// Identifier -> number, numbered by first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteMapping {
    order: Vec<String>,
    numbers: HashMap<String, usize>,
}

impl FootnoteMapping {
    /// Return the number for `identifier`, assigning the next one if unseen.
    pub fn assign(&mut self, identifier: &str) -> usize {
        if let Some(&n) = self.numbers.get(identifier) {
            return n;
        }
        self.order.push(identifier.to_string());
        let n = self.order.len();
        self.numbers.insert(identifier.to_string(), n);
        n
    }

    pub fn get(&self, identifier: &str) -> Option<usize> {
        self.numbers.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.numbers.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers with their numbers, in numbering order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order.iter().enumerate().map(|(i, id)| (id.as_str(), i + 1))
    }
}

/// Every footnote reference in `text`, in text order, numbered by first
/// appearance.
pub fn scan_references(text: &str) -> Vec<FootnoteReference> {
    let mut mapping = FootnoteMapping::default();
    let mut references = Vec::new();

    for caps in MARKER_RE.captures_iter(text) {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // `[^x]:` is a definition marker, not a reference
        if text.as_bytes().get(whole.end()) == Some(&b':') {
            continue;
        }
        let identifier = label.as_str();
        references.push(FootnoteReference {
            identifier: identifier.to_string(),
            position: whole.start(),
            token: whole.as_str().to_string(),
            assigned_number: mapping.assign(identifier),
        });
    }

    references
}

/// Build the identifier mapping from a reference list in text order.
pub fn build_mapping(references: &[FootnoteReference]) -> FootnoteMapping {
    let mut mapping = FootnoteMapping::default();
    for reference in references {
        mapping.assign(&reference.identifier);
    }
    mapping
}

/// Every footnote definition prefix in `text`, in text order, whether or not
/// anything references it.
pub fn scan_definitions(text: &str) -> Vec<FootnoteDefinition> {
    DEFINITION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let prefix = caps.get(1)?;
            let label = caps.get(2)?;
            Some(FootnoteDefinition {
                identifier: label.as_str().to_string(),
                position: prefix.start(),
                matched_text: prefix.as_str().to_string(),
            })
        })
        .collect()
}

/// One read-only pass over a document.
#[derive(Debug, Clone)]
pub struct FootnoteScan {
    pub references: Vec<FootnoteReference>,
    pub mapping: FootnoteMapping,
    /// Definitions whose identifier is referenced somewhere.
    pub definitions: Vec<FootnoteDefinition>,
    /// Definitions nobody references. These are never rewritten.
    pub orphans: Vec<FootnoteDefinition>,
}

impl FootnoteScan {
    pub fn new(text: &str) -> Self {
        let references = scan_references(text);
        let mapping = build_mapping(&references);
        let (definitions, orphans): (Vec<_>, Vec<_>) = scan_definitions(text)
            .into_iter()
            .partition(|def| mapping.contains(&def.identifier));

        FootnoteScan {
            references,
            mapping,
            definitions,
            orphans,
        }
    }

    /// Whether the identifiers differ from canonical numbering.
    ///
    /// References must already read "1", "2", ... by first appearance, and
    /// the referenced definitions, in the order found, must read exactly
    /// "1" through "N". A document without references never needs it.
    pub fn needs_resequencing(&self) -> bool {
        if self.references.is_empty() {
            return false;
        }

        let references_canonical = self
            .references
            .iter()
            .all(|r| r.identifier == r.assigned_number.to_string());
        if !references_canonical {
            return true;
        }

        if self.definitions.len() != self.mapping.len() {
            return true;
        }
        !self
            .definitions
            .iter()
            .enumerate()
            .all(|(i, def)| def.identifier == (i + 1).to_string())
    }

    /// One edit per reference and per referenced definition.
    ///
    /// A definition prefix is rewritten to `[^N]: ` only when its label
    /// changes. One that already carries its number keeps its spacing, so a
    /// second pass over the output never finds anything to do.
    pub fn plan_edits(&self) -> Vec<Edit> {
        let mut edits = Vec::with_capacity(self.references.len() + self.definitions.len());

        for reference in &self.references {
            edits.push(Edit::new(
                reference.position,
                &reference.token,
                format!("[^{}]", reference.assigned_number),
            ));
        }

        for def in &self.definitions {
            // Partitioned on `contains`, so the lookup always succeeds.
            let Some(n) = self.mapping.get(&def.identifier) else {
                continue;
            };
            let replacement = if def.identifier == n.to_string() {
                def.matched_text.clone()
            } else {
                format!("[^{}]: ", n)
            };
            edits.push(Edit::new(def.position, &def.matched_text, replacement));
        }

        edits
    }
}

/// Outcome of one resequencing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resequenced {
    Unchanged,
    Changed { text: String, edits: Vec<Edit> },
}

impl Resequenced {
    pub fn changed(&self) -> bool {
        matches!(self, Resequenced::Changed { .. })
    }

    /// The rewritten document, if anything changed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Resequenced::Unchanged => None,
            Resequenced::Changed { text, .. } => Some(text),
        }
    }
}

/// Renumber the footnotes of `text`.
///
/// Returns [`Resequenced::Unchanged`] when the document is already canonical,
/// including when a rewrite would reproduce the input byte for byte. Errors
/// only if the planned edits do not match the text they were planned on.
pub fn resequence(text: &str) -> Result<Resequenced, ResequenceError> {
    let scan = FootnoteScan::new(text);
    debug!(
        references = scan.references.len(),
        identifiers = scan.mapping.len(),
        definitions = scan.definitions.len(),
        orphans = scan.orphans.len(),
        "scanned footnotes"
    );

    if !scan.needs_resequencing() {
        return Ok(Resequenced::Unchanged);
    }

    let edits = scan.plan_edits();
    let rewritten = apply_edits(text, &edits)?;
    if rewritten == text {
        debug!("footnotes already numbered, only definition order differs");
        return Ok(Resequenced::Unchanged);
    }

    let edits: Vec<Edit> = edits.into_iter().filter(|e| !e.is_noop()).collect();
    debug!(edits = edits.len(), "resequenced footnotes");
    Ok(Resequenced::Changed {
        text: rewritten,
        edits,
    })
}
