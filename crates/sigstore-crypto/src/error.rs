//! Error types for sigstore-crypto

use thiserror::Error;

/// Errors that can occur in decoding and cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Ran past the end of a byte buffer
    #[error("unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        needed: usize,
        offset: usize,
        available: usize,
    },

    /// Malformed DER or a typed accessor used on the wrong tag
    #[error("ASN.1 decode error: {0}")]
    Asn1(String),

    /// Certificate structure error
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Malformed signed certificate timestamp
    #[error("invalid SCT: {0}")]
    InvalidSct(String),

    /// Malformed signed note or checkpoint body
    #[error("malformed checkpoint: {0}")]
    MalformedCheckpoint(String),

    /// Public key could not be parsed or is unusable
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Algorithm or key type not supported
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature did not verify
    #[error("signature verification failed: {0}")]
    Verification(String),

    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Signing failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// Base64 decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<aws_lc_rs::error::KeyRejected> for Error {
    fn from(e: aws_lc_rs::error::KeyRejected) -> Self {
        Error::InvalidKey(e.to_string())
    }
}

impl From<aws_lc_rs::error::Unspecified> for Error {
    fn from(_: aws_lc_rs::error::Unspecified) -> Self {
        Error::Signing("unspecified aws-lc error".to_string())
    }
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, Error>;
