//! Error types for stronghold registry operations.

use thiserror::Error;

use crate::claim::ClaimId;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, ClaimError>;

/// Failures of registry operations. Not-found lookups are `None`, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// The requested area intersects a registered stronghold.
    #[error("that area overlaps an existing stronghold ({existing})")]
    Overlap { existing: ClaimId },

    /// An id-addressed operation named a claim that is not registered.
    #[error("no registered stronghold with id {0}")]
    UnknownClaim(ClaimId),
}
