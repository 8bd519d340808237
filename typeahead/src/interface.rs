//! Typeahead Interface Definition
//!
//! Shared value types and the error enum exposed to callers of the session.
//! It acts as the source of truth for what crosses the library boundary.

use thiserror::Error;

use crate::pair::Pair;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the pattern was found inside a single corpus entry.
///
/// `offset` counts characters before the match in the lower-cased entry. A lower
/// offset is a stronger match; `0` means the entry starts with the query and
/// nothing can beat it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchDetails {
    pub offset: usize,
    /// Matched text, as it appears in the lower-cased entry
    pub matched: String,
}

impl MatchDetails {
    pub fn new(offset: usize, matched: impl Into<String>) -> Self {
        Self {
            offset,
            matched: matched.into(),
        }
    }
}

/// Best match of a scan: corpus index paired with its match details.
pub type MatchResult = Pair<usize, MatchDetails>;

impl MatchResult {
    /// Create a match result for a corpus index
    pub fn matched(index: usize, details: MatchDetails) -> Self {
        Pair::new(Some(index), Some(details))
    }

    /// Physical corpus index of the match
    pub fn index(&self) -> Option<usize> {
        self.key().copied()
    }

    /// Offset of the match inside its entry; `usize::MAX` when no details are attached
    pub fn offset(&self) -> usize {
        self.value().map_or(usize::MAX, |details| details.offset)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error type for typeahead operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeAheadError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Conversion failed for element {index}: {message}")]
    Conversion { index: usize, message: String },
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<regex::Error> for TypeAheadError {
    fn from(e: regex::Error) -> Self {
        TypeAheadError::InvalidPattern(e.to_string())
    }
}
