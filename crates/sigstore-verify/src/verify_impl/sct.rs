//! SCT threshold verification
//!
//! The signing certificate must carry enough embedded SCTs that verify
//! against the certificate transparency logs of the trusted root.

use crate::error::{Error, Result, VerificationStage};
use sigstore_crypto::X509Certificate;
use sigstore_types::TransparencyLogInstance;
use tracing::debug;

/// Verify that at least `threshold` SCTs of `leaf` check out
///
/// `issuer` is the certificate that issued `leaf`; its key hash is part of
/// what the logs signed.
pub fn verify_sct_threshold(
    leaf: &X509Certificate,
    issuer: &X509Certificate,
    ctlogs: &[TransparencyLogInstance],
    threshold: usize,
) -> Result<()> {
    let results = leaf
        .verify_scts(issuer, ctlogs)
        .map_err(|e| Error::verification(VerificationStage::SctThreshold, e.to_string()))?;

    for result in results.iter().filter(|result| !result.verified) {
        debug!(log_id = %hex::encode(result.log_id), "SCT did not verify");
    }
    let verified = results.iter().filter(|result| result.verified).count();
    if verified < threshold {
        return Err(Error::verification(
            VerificationStage::SctThreshold,
            format!(
                "{verified} of {} SCTs verified, {threshold} required",
                results.len()
            ),
        ));
    }

    debug!(verified, threshold, "SCT threshold met");
    Ok(())
}
