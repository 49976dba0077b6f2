//! Error taxonomy for the grouping engine
//!
//! There are no fatal conditions in this subsystem: ambiguous patterns fall
//! through to the next pipeline stage and an empty scope yields an empty
//! result. The two enums here cover the only real failure surfaces, and
//! [`MetadataError`] never crosses the engine boundary - it degrades to a
//! note on the scope result.

use thiserror::Error;

/// Orchestration-level error. Cancellation is the only way a grouping call
/// returns anything other than a complete partition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupingError {
    /// The caller's cancel flag was raised; in-flight partial results for
    /// the scope were discarded.
    #[error("grouping cancelled before scope '{0}' completed")]
    Cancelled(String),
}

/// Failure reported by a [`MetadataProvider`](crate::category::MetadataProvider).
///
/// The resolver catches these, records a note, and falls through to the
/// inference stages; callers of the engine never see one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("category combo '{0}' not found")]
    NotFound(String),
    #[error("metadata source unavailable: {0}")]
    Unavailable(String),
    #[error("metadata fetch for '{0}' timed out")]
    Timeout(String),
}
