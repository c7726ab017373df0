//! Error types for sigstore-verify

use std::fmt;
use thiserror::Error;

/// The stage of [`crate::Verifier::verify`] that rejected a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStage {
    /// Digest or signature over the artifact
    ArtifactSignature,
    /// Certificate path to a trusted authority
    SigningCertificate,
    /// Embedded SCTs from certificate transparency logs
    SctThreshold,
    /// Signer identity against the configured policy
    SignerIdentity,
    /// Accepted transparency log entries
    LogThreshold,
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerificationStage::ArtifactSignature => "artifact signature",
            VerificationStage::SigningCertificate => "signing certificate",
            VerificationStage::SctThreshold => "SCT threshold",
            VerificationStage::SignerIdentity => "signer identity",
            VerificationStage::LogThreshold => "transparency log threshold",
        })
    }
}

/// Errors that can occur during verification
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed DER, certificate, or log entry data
    #[error("decode error: {0}")]
    Decode(String),

    /// Bundle is structurally incomplete
    #[error("bundle validation failed: {0}")]
    Validation(#[from] sigstore_bundle::Error),

    /// A cryptographic, chain, or log check failed
    #[error("{stage} verification failed: {message}")]
    Verification {
        stage: VerificationStage,
        message: String,
    },

    /// Signer identity did not match the policy
    #[error("policy error: {0}")]
    Policy(String),

    /// Requested behavior this crate does not provide
    #[error("not implemented: {0}")]
    Unimplemented(String),

    /// Types error
    #[error("Types error: {0}")]
    Types(#[from] sigstore_types::Error),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] sigstore_crypto::Error),

    /// Failure reported by a caller-supplied collaborator
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn verification(stage: VerificationStage, message: impl Into<String>) -> Self {
        Error::Verification {
            stage,
            message: message.into(),
        }
    }

    /// The stage that failed, for verification and policy errors
    pub fn stage(&self) -> Option<VerificationStage> {
        match self {
            Error::Verification { stage, .. } => Some(*stage),
            Error::Policy(_) => Some(VerificationStage::SignerIdentity),
            _ => None,
        }
    }
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_in_message() {
        let err = Error::verification(VerificationStage::ArtifactSignature, "bad signature");
        assert_eq!(
            err.to_string(),
            "artifact signature verification failed: bad signature"
        );
        assert_eq!(err.stage(), Some(VerificationStage::ArtifactSignature));
    }

    #[test]
    fn test_policy_and_validation_stages() {
        assert_eq!(
            Error::Policy("no identity matched".into()).stage(),
            Some(VerificationStage::SignerIdentity)
        );
        let err: Error = sigstore_bundle::Error::MissingTlogEntries.into();
        assert_eq!(err.stage(), None);
        assert!(err.to_string().starts_with("bundle validation failed"));
    }
}
