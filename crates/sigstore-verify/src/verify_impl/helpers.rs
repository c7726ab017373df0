//! Helper functions for verification
//!
//! Extraction of certificates, signatures and times from bundle parts.

use crate::error::{Error, Result, VerificationStage};
use chrono::{DateTime, TimeZone, Utc};
use sigstore_crypto::X509Certificate;
use sigstore_types::{
    SignatureBytes, SignatureContent, TransparencyLogEntry, VerificationMaterialContent,
};

/// Parse the certificates of the verification material, leaf first
///
/// Returns `None` for bundles signed with a bare public key.
pub fn extract_certificates(
    material: &VerificationMaterialContent,
) -> Result<Option<Vec<X509Certificate>>> {
    let ders = match material {
        VerificationMaterialContent::Certificate(cert) => std::slice::from_ref(cert),
        VerificationMaterialContent::X509CertificateChain { certificates } => {
            if certificates.is_empty() {
                return Err(Error::Decode("no certificates in chain".to_string()));
            }
            certificates.as_slice()
        }
        VerificationMaterialContent::PublicKey { .. } => return Ok(None),
    };

    ders.iter()
        .map(|der| {
            X509Certificate::parse(der.as_bytes())
                .map_err(|e| Error::Decode(format!("failed to parse certificate: {e}")))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// The one signature the bundle content carries
pub fn extract_signature_bytes(content: &SignatureContent) -> Result<&SignatureBytes> {
    match content {
        SignatureContent::MessageSignature(sig) => Ok(&sig.signature),
        SignatureContent::DsseEnvelope(envelope) => match envelope.signatures.as_slice() {
            [only] => Ok(&only.sig),
            sigs => Err(Error::verification(
                VerificationStage::ArtifactSignature,
                format!("DSSE envelope has {} signatures, expected one", sigs.len()),
            )),
        },
    }
}

/// Integrated time of a log entry
pub fn integrated_time(entry: &TransparencyLogEntry) -> Result<DateTime<Utc>> {
    let seconds = entry.integrated_time.parse::<i64>().map_err(|e| {
        Error::Decode(format!(
            "invalid integrated time {:?}: {e}",
            entry.integrated_time
        ))
    })?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| Error::Decode(format!("integrated time {seconds} is out of range")))
}

/// Validate certificate is within validity period
pub fn validate_certificate_time(
    validation_time: DateTime<Utc>,
    cert: &X509Certificate,
) -> Result<()> {
    if validation_time < cert.not_before() {
        return Err(Error::verification(
            VerificationStage::LogThreshold,
            format!(
                "certificate not yet valid: {validation_time} is before not_before {}",
                cert.not_before()
            ),
        ));
    }

    if validation_time > cert.not_after() {
        return Err(Error::verification(
            VerificationStage::LogThreshold,
            format!(
                "certificate has expired: {validation_time} is after not_after {}",
                cert.not_after()
            ),
        ));
    }

    Ok(())
}
