//! Error types for embedding lookup and affinity scoring.

use thiserror::Error;

/// Which embedding table an identifier was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Track,
    Album,
    Artist,
}

impl TableKind {
    /// Lowercase name used in messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Track => "track",
            TableKind::Album => "album",
            TableKind::Artist => "artist",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building tables or scoring candidates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// An identifier is not below its table's vocabulary size.
    #[error("{table} id {id} out of range (vocabulary size {vocab_size})")]
    OutOfBoundsId {
        table: TableKind,
        id: u32,
        vocab_size: usize,
    },

    /// The context holds no items, so there is nothing to take a maximum over.
    #[error("context must contain at least one item")]
    EmptyContext,

    /// Weight buffer, table widths or id columns do not line up.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An item triple could not be parsed from text.
    #[error("invalid item triple '{0}': expected TRACK:ALBUM:ARTIST")]
    InvalidTriple(String),
}

/// Result alias for scoring operations.
pub type ScoreResult<T> = std::result::Result<T, ScoreError>;
