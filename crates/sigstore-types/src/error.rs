//! Error types for sigstore-types

use thiserror::Error;

/// Errors that can occur when constructing core types
#[derive(Error, Debug)]
pub enum Error {
    /// Hash with the wrong length or encoding
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// Hex decoding error
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Unrecognized bundle media type
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Unrecognized hash algorithm name
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),
}

/// Result type for type construction
pub type Result<T> = std::result::Result<T, Error>;
