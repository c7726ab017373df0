//! Error types for sigstore-bundle

use thiserror::Error;

/// Ways a bundle can be structurally incomplete
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// No transparency log entries at all
    #[error("bundle has no transparency log entries")]
    MissingTlogEntries,

    /// Entry lacks a signed entry timestamp
    #[error("tlog entry {index} has no inclusion promise")]
    MissingInclusionPromise { index: usize },

    /// Entry lacks an inclusion proof
    #[error("tlog entry {index} has no inclusion proof")]
    MissingInclusionProof { index: usize },

    /// Inclusion proof without a checkpoint
    #[error("tlog entry {index} inclusion proof has no checkpoint")]
    MissingCheckpoint { index: usize },

    /// Anything else missing or malformed
    #[error("invalid bundle: {0}")]
    Invalid(String),
}

/// Result type for bundle validation
pub type Result<T> = std::result::Result<T, Error>;
