//! Error types for sigstore-merkle

use thiserror::Error;

/// Errors from Merkle proof verification
#[derive(Error, Debug)]
pub enum Error {
    /// Leaf index is not inside the tree
    #[error("leaf index {index} out of range for tree of size {tree_size}")]
    IndexOutOfRange { index: u64, tree_size: u64 },

    /// Proof has the wrong number of hashes for the index and size
    #[error("wrong proof length: expected {expected} hashes, got {actual}")]
    WrongProofLength { expected: usize, actual: usize },

    /// A hash is not 32 bytes
    #[error("invalid hash length: {0} bytes")]
    InvalidHashLength(usize),

    /// Recomputed root differs from the expected one
    #[error("root hash mismatch: computed {computed}, expected {expected}")]
    RootMismatch { computed: String, expected: String },

    /// Base64 decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for Merkle operations
pub type Result<T> = std::result::Result<T, Error>;
