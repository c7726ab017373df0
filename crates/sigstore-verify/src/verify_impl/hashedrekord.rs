//! hashedrekord entry validation
//!
//! A hashedrekord body records the artifact digest and the signature over
//! it; both must match the bundle's message signature.

use crate::error::{Error, Result, VerificationStage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sigstore_rekor::HashedRekordV001Body;
use sigstore_types::MessageSignature;

/// Verify a hashedrekord v0.0.1 body against the bundle's message signature
pub fn verify_hashedrekord_v001(
    body: &HashedRekordV001Body,
    sig: &MessageSignature,
) -> Result<()> {
    let digest = sig
        .message_digest
        .as_ref()
        .ok_or_else(|| mismatch("bundle message signature has no digest"))?;

    let hash = &body.spec.data.hash;
    if hash.algorithm != digest.algorithm.rekor_name() {
        return Err(mismatch(format!(
            "digest algorithm mismatch: entry has {}, bundle has {}",
            hash.algorithm,
            digest.algorithm.rekor_name()
        )));
    }
    let expected = hex::encode(&digest.digest);
    if !hash.value.eq_ignore_ascii_case(&expected) {
        return Err(mismatch(format!(
            "digest mismatch: entry has {}, bundle has {expected}",
            hash.value
        )));
    }

    let logged = STANDARD
        .decode(&body.spec.signature.content)
        .map_err(|e| mismatch(format!("failed to decode entry signature: {e}")))?;
    if logged != sig.signature.as_bytes() {
        return Err(mismatch("signature in bundle does not match hashedrekord entry"));
    }

    Ok(())
}

fn mismatch(message: impl Into<String>) -> Error {
    Error::verification(VerificationStage::LogThreshold, message)
}
