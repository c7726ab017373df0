//! Structural bundle checks
//!
//! Version rules follow the bundle media types: 0.1 bundles predate
//! inclusion proofs and must carry signed entry timestamps instead, while
//! 0.2 and later must carry an inclusion proof with a checkpoint for every
//! entry.

use crate::error::{Error, Result};
use sigstore_types::{
    Bundle, MediaType, SignatureContent, TransparencyLogEntry, VerificationMaterialContent,
};
use tracing::debug;

/// Extra requirements on top of the media-type rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Require an inclusion proof for every entry, whatever the version
    pub require_inclusion_proof: bool,
    /// Require a signed entry timestamp for every entry, whatever the version
    pub require_inclusion_promise: bool,
}

impl ValidationOptions {
    pub fn with_inclusion_proof(mut self) -> Self {
        self.require_inclusion_proof = true;
        self
    }

    pub fn with_inclusion_promise(mut self) -> Self {
        self.require_inclusion_promise = true;
        self
    }
}

/// Validate with the media-type rules only
pub fn validate_bundle(bundle: &Bundle) -> Result<()> {
    validate_bundle_with_options(bundle, &ValidationOptions::default())
}

pub fn validate_bundle_with_options(bundle: &Bundle, options: &ValidationOptions) -> Result<()> {
    validate_material(&bundle.verification_material.content)?;
    validate_content(&bundle.content)?;

    let entries = &bundle.verification_material.tlog_entries;
    if entries.is_empty() {
        return Err(Error::MissingTlogEntries);
    }

    let needs_promise =
        options.require_inclusion_promise || bundle.media_type == MediaType::Bundle0_1;
    let needs_proof = options.require_inclusion_proof || bundle.media_type >= MediaType::Bundle0_2;

    for (index, entry) in entries.iter().enumerate() {
        validate_entry(index, entry, needs_promise, needs_proof)?;
    }

    debug!(media_type = bundle.media_type.as_str(), entries = entries.len(), "bundle is complete");
    Ok(())
}

fn validate_material(material: &VerificationMaterialContent) -> Result<()> {
    match material {
        VerificationMaterialContent::X509CertificateChain { certificates } => {
            if certificates.is_empty() {
                return Err(Error::Invalid("certificate chain is empty".into()));
            }
            if certificates.iter().any(|cert| cert.is_empty()) {
                return Err(Error::Invalid("certificate chain has an empty entry".into()));
            }
        }
        VerificationMaterialContent::Certificate(cert) => {
            if cert.is_empty() {
                return Err(Error::Invalid("certificate is empty".into()));
            }
        }
        VerificationMaterialContent::PublicKey { hint } => {
            if hint.is_empty() {
                return Err(Error::Invalid("public key hint is empty".into()));
            }
        }
    }
    Ok(())
}

fn validate_content(content: &SignatureContent) -> Result<()> {
    match content {
        SignatureContent::MessageSignature(sig) => {
            let digest = sig
                .message_digest
                .as_ref()
                .ok_or_else(|| Error::Invalid("message signature has no digest".into()))?;
            if digest.digest.len() != digest.algorithm.output_len() {
                return Err(Error::Invalid(format!(
                    "{} digest is {} bytes",
                    digest.algorithm.rekor_name(),
                    digest.digest.len()
                )));
            }
            if sig.signature.is_empty() {
                return Err(Error::Invalid("message signature is empty".into()));
            }
        }
        SignatureContent::DsseEnvelope(envelope) => {
            if envelope.signatures.len() != 1 {
                return Err(Error::Invalid(format!(
                    "DSSE envelope must have exactly one signature, found {}",
                    envelope.signatures.len()
                )));
            }
            if envelope.payload_type.is_empty() {
                return Err(Error::Invalid("DSSE envelope has no payload type".into()));
            }
        }
    }
    Ok(())
}

fn validate_entry(
    index: usize,
    entry: &TransparencyLogEntry,
    needs_promise: bool,
    needs_proof: bool,
) -> Result<()> {
    if entry.canonicalized_body.is_empty() {
        return Err(Error::Invalid(format!("tlog entry {index} has no body")));
    }
    if entry.integrated_time.parse::<i64>().is_err() {
        return Err(Error::Invalid(format!(
            "tlog entry {index} integrated time {:?} is not an integer",
            entry.integrated_time
        )));
    }
    if needs_promise && entry.inclusion_promise.is_none() {
        return Err(Error::MissingInclusionPromise { index });
    }
    match &entry.inclusion_proof {
        None if needs_proof => Err(Error::MissingInclusionProof { index }),
        Some(proof) if needs_proof && proof.checkpoint.envelope.is_empty() => {
            Err(Error::MissingCheckpoint { index })
        }
        _ => Ok(()),
    }
}
