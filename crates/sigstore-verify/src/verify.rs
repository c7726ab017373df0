//! Bundle verification
//!
//! [`Verifier::verify`] runs the artifact signature, signing certificate
//! and transparency log stages in order. The first stage to fail aborts the
//! rest and names itself in the returned error.

use crate::chain::CertificateChainVerifier;
use crate::error::{Error, Result, VerificationStage};
use crate::key::KeySelector;
use crate::policy::VerificationPolicy;
use crate::verify_impl::{
    extract_certificates, extract_signature_bytes, verify_sct_threshold, verify_tlog_entries,
};
use sigstore_bundle::{validate_bundle_with_options, ValidationOptions};
use sigstore_crypto::{digest, Keyring, VerificationKey, X509Certificate};
use sigstore_types::{
    Bundle, DerPublicKey, SignatureContent, TrustedRoot, VerificationMaterialContent,
};
use tracing::debug;

/// Verifies bundles against one trusted root
pub struct Verifier<'a> {
    trusted_root: &'a TrustedRoot,
    /// Keys of the signing-event logs
    tlog_keyring: Keyring,
    key_selector: Option<Box<dyn KeySelector + 'a>>,
}

impl<'a> Verifier<'a> {
    pub fn new(trusted_root: &'a TrustedRoot) -> Self {
        Self {
            trusted_root,
            tlog_keyring: Keyring::from_logs(&trusted_root.tlogs),
            key_selector: None,
        }
    }

    /// Resolve public-key hints of bundles signed without a certificate
    pub fn with_key_selector(mut self, selector: impl KeySelector + 'a) -> Self {
        self.key_selector = Some(Box::new(selector));
        self
    }

    /// Verify `bundle`, and `artifact` when given
    ///
    /// Message-signature bundles sign the artifact itself, so they cannot be
    /// verified without it. DSSE bundles sign their own payload and ignore
    /// `artifact`.
    pub fn verify(
        &self,
        bundle: &Bundle,
        artifact: Option<&[u8]>,
        policy: &VerificationPolicy,
    ) -> Result<()> {
        if policy.online {
            return Err(Error::Unimplemented(
                "online transparency log verification".to_string(),
            ));
        }

        let options = ValidationOptions {
            require_inclusion_proof: policy.require_inclusion_proof,
            ..ValidationOptions::default()
        };
        validate_bundle_with_options(bundle, &options)?;

        let chain = extract_certificates(&bundle.verification_material.content)?;
        let leaf = chain.as_deref().and_then(<[X509Certificate]>::first);

        self.verify_artifact(bundle, leaf, artifact)?;
        debug!("artifact signature verified");

        match chain.as_deref() {
            Some(chain) => self.verify_signing_certificate(chain, policy)?,
            None if !policy.identities.is_empty() => {
                return Err(Error::Policy(
                    "signer identity policy requires a signing certificate".to_string(),
                ))
            }
            None => {}
        }

        verify_tlog_entries(
            &bundle.verification_material.tlog_entries,
            &bundle.content,
            &self.tlog_keyring,
            leaf,
            policy.tlog_threshold,
        )?;

        debug!(media_type = bundle.media_type.as_str(), "bundle verified");
        Ok(())
    }

    fn verify_artifact(
        &self,
        bundle: &Bundle,
        leaf: Option<&X509Certificate>,
        artifact: Option<&[u8]>,
    ) -> Result<()> {
        let spki = match leaf {
            Some(cert) => cert.public_key().clone(),
            None => self.select_key(&bundle.verification_material.content)?,
        };
        let key = VerificationKey::from_spki_der(spki.as_bytes(), None)
            .map_err(|e| artifact_error(format!("unusable public key: {e}")))?;

        match &bundle.content {
            SignatureContent::MessageSignature(sig) => {
                let artifact = artifact.ok_or_else(|| {
                    artifact_error("message signature bundles need the artifact to verify")
                })?;
                if let Some(expected) = &sig.message_digest {
                    let computed = digest(expected.algorithm, artifact);
                    if computed != expected.digest {
                        return Err(artifact_error(format!(
                            "artifact digest {} does not match bundle digest {}",
                            hex::encode(&computed),
                            hex::encode(&expected.digest)
                        )));
                    }
                }
                key.verify(artifact, sig.signature.as_bytes())
                    .map_err(|e| artifact_error(e.to_string()))
            }
            SignatureContent::DsseEnvelope(envelope) => {
                let signature = extract_signature_bytes(&bundle.content)?;
                key.verify(envelope.pae(), signature.as_bytes())
                    .map_err(|e| artifact_error(e.to_string()))
            }
        }
    }

    fn select_key(&self, material: &VerificationMaterialContent) -> Result<DerPublicKey> {
        let VerificationMaterialContent::PublicKey { hint } = material else {
            return Err(Error::Internal(
                "key selection requested for certificate material".to_string(),
            ));
        };
        let selector = self.key_selector.as_ref().ok_or_else(|| {
            artifact_error(format!("no key selector configured for public key hint {hint:?}"))
        })?;
        selector
            .select_key(hint)
            .ok_or_else(|| artifact_error(format!("no public key for hint {hint:?}")))
    }

    fn verify_signing_certificate(
        &self,
        chain: &[X509Certificate],
        policy: &VerificationPolicy,
    ) -> Result<()> {
        let (leaf, intermediates) = chain
            .split_first()
            .ok_or_else(|| Error::Decode("no certificates in chain".to_string()))?;
        let issued_at = leaf.not_before();

        let mut path = None;
        for authority in self.trusted_root.certificate_authorities_at(issued_at) {
            let attempt = CertificateChainVerifier::from_authority(authority)
                .and_then(|verifier| {
                    verifier
                        .with_untrusted(intermediates.iter().cloned())
                        .verify(leaf, issued_at)
                });
            match attempt {
                Ok(verified) => {
                    debug!(authority = %authority.uri, "certificate chain verified");
                    path = Some(verified);
                    break;
                }
                Err(e) => {
                    debug!(authority = %authority.uri, error = %e, "authority rejected chain")
                }
            }
        }
        let path = path.ok_or_else(|| {
            Error::verification(
                VerificationStage::SigningCertificate,
                "no trusted certificate authority issued the signing certificate",
            )
        })?;

        if !policy.skip_sct {
            let issuer = path.get(1).unwrap_or(leaf);
            verify_sct_threshold(leaf, issuer, &self.trusted_root.ctlogs, policy.ctlog_threshold)?;
        }

        if !policy.identities.is_empty()
            && !policy.identities.iter().any(|identity| identity.matches(leaf))
        {
            return Err(Error::Policy(format!(
                "signing certificate from {} matches none of {} trusted identities",
                leaf.ext_fulcio_issuer().as_deref().unwrap_or("an unknown issuer"),
                policy.identities.len()
            )));
        }
        Ok(())
    }
}

fn artifact_error(message: impl Into<String>) -> Error {
    Error::verification(VerificationStage::ArtifactSignature, message)
}
