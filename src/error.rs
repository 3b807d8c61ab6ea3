//! Error taxonomy for structural resolution.
//!
//! Two conditions the spec of the algorithm names are deliberately not
//! errors: hitting the top of the document resolves to the whole-document
//! root, and a stale cache is invalidated in place. Only conditions the
//! caller can act on surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The initial leaf query found nothing under the selection. The only
    /// user-visible failure in normal operation.
    #[error("no syntax node at the current selection")]
    NoNodeAtSelection,

    /// The backend returned a node missing a field the algorithm assumed
    /// present. Indicates a backend inconsistency; the resolution request
    /// is aborted rather than coerced.
    #[error("malformed syntax node from backend: {0}")]
    MalformedNode(String),

    /// The backing analysis service failed outright.
    #[error("syntax query failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
