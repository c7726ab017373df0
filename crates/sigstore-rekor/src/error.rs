//! Error types for sigstore-rekor

use thiserror::Error;

/// Errors that can occur decoding Rekor entries
#[derive(Error, Debug)]
pub enum Error {
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Kind and version pair this crate does not model
    #[error("unsupported entry kind {kind} version {version}")]
    UnsupportedKind { kind: String, version: String },

    /// Body declares a different kind or version than the entry
    #[error("body is {found}, entry says {expected}")]
    KindMismatch { expected: String, found: String },

    /// Base64 decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for Rekor operations
pub type Result<T> = std::result::Result<T, Error>;
