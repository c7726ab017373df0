//! Rekor transparency log entry validation
//!
//! This module checks that the canonicalized body of a log entry describes
//! the same signing event as the bundle content: the same digest or payload
//! and the same signatures.

use super::hashedrekord::verify_hashedrekord_v001;
use crate::error::{Error, Result, VerificationStage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sigstore_rekor::{DsseV001Body, HashValue, IntotoV001Body, IntotoV002Body, RekorEntryBody};
use sigstore_types::{DsseEnvelope, SignatureContent, TransparencyLogEntry};

/// Verify that the entry body matches the bundle content
///
/// Unknown kinds, and kinds that cannot describe the content, are errors.
pub fn verify_body(entry: &TransparencyLogEntry, content: &SignatureContent) -> Result<()> {
    let body = RekorEntryBody::from_json(
        &entry.canonicalized_body,
        &entry.kind_version.kind,
        &entry.kind_version.version,
    )
    .map_err(|e| mismatch(format!("failed to parse Rekor body: {e}")))?;

    match (&body, content) {
        (RekorEntryBody::HashedRekordV001(body), SignatureContent::MessageSignature(sig)) => {
            verify_hashedrekord_v001(body, sig)
        }
        (RekorEntryBody::DsseV001(body), SignatureContent::DsseEnvelope(envelope)) => {
            verify_dsse_v001(body, envelope)
        }
        (RekorEntryBody::IntotoV001(body), SignatureContent::DsseEnvelope(envelope)) => {
            verify_intoto_v001(body, envelope)
        }
        (RekorEntryBody::IntotoV002(body), SignatureContent::DsseEnvelope(envelope)) => {
            verify_intoto_v002(body, envelope)
        }
        _ => Err(mismatch(format!(
            "{} {} entry does not describe this bundle content",
            entry.kind_version.kind, entry.kind_version.version
        ))),
    }
}

/// Verify DSSE v0.0.1 entry
///
/// The envelope hash is not checked: it covers the envelope JSON as
/// submitted, which cannot be reproduced from the decoded bundle.
fn verify_dsse_v001(body: &DsseV001Body, envelope: &DsseEnvelope) -> Result<()> {
    verify_payload_hash(&body.spec.payload_hash, &envelope.payload)?;

    if envelope.signatures.len() != body.spec.signatures.len() {
        return Err(mismatch(format!(
            "DSSE signature count mismatch: bundle has {}, Rekor entry has {}",
            envelope.signatures.len(),
            body.spec.signatures.len()
        )));
    }

    let logged = body
        .spec
        .signatures
        .iter()
        .map(|sig| STANDARD.decode(&sig.signature))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| mismatch(format!("failed to decode Rekor signature: {e}")))?;

    // Check that each signature in the bundle exists in the Rekor entry
    for bundle_sig in &envelope.signatures {
        if !logged.iter().any(|sig| sig.as_slice() == bundle_sig.sig.as_bytes()) {
            return Err(mismatch(
                "DSSE signature in bundle does not match any signature in Rekor entry",
            ));
        }
    }

    Ok(())
}

/// Verify intoto v0.0.1 entry, which only records payload and envelope hashes
fn verify_intoto_v001(body: &IntotoV001Body, envelope: &DsseEnvelope) -> Result<()> {
    verify_payload_hash(&body.spec.content.payload_hash, &envelope.payload)
}

/// Verify intoto v0.0.2 entry
fn verify_intoto_v002(body: &IntotoV002Body, envelope: &DsseEnvelope) -> Result<()> {
    let content = &body.spec.content;
    let payload_hash = content
        .payload_hash
        .as_ref()
        .ok_or_else(|| mismatch("intoto Rekor entry has no payload hash"))?;
    verify_payload_hash(payload_hash, &envelope.payload)?;

    // Rekor strips the payload from stored entries, so it may be absent
    let logged_payload = content
        .envelope
        .payload_bytes()
        .map_err(|e| mismatch(format!("failed to decode Rekor payload: {e}")))?;
    if logged_payload.is_some_and(|payload| payload != envelope.payload) {
        return Err(mismatch(
            "DSSE payload in bundle does not match intoto Rekor entry",
        ));
    }

    let mut found_match = false;
    for rekor_sig in &content.envelope.signatures {
        let logged = rekor_sig
            .signature_bytes()
            .map_err(|e| mismatch(format!("failed to decode Rekor signature: {e}")))?;
        if envelope
            .signatures
            .iter()
            .any(|bundle_sig| bundle_sig.sig.as_bytes() == logged.as_slice())
        {
            found_match = true;
            break;
        }
    }
    if !found_match {
        return Err(mismatch(
            "DSSE signature in bundle does not match intoto Rekor entry",
        ));
    }

    Ok(())
}

/// Payload hashes are lowercase hex SHA-256
fn verify_payload_hash(expected: &HashValue, payload: &[u8]) -> Result<()> {
    if expected.algorithm != "sha256" {
        return Err(mismatch(format!(
            "unsupported payload hash algorithm {}",
            expected.algorithm
        )));
    }
    let computed = sigstore_crypto::sha256(payload).to_hex();
    if !expected.value.eq_ignore_ascii_case(&computed) {
        return Err(mismatch(format!(
            "DSSE payload hash mismatch: computed {computed}, expected {}",
            expected.value
        )));
    }
    Ok(())
}

fn mismatch(message: impl Into<String>) -> Error {
    Error::verification(VerificationStage::LogThreshold, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigstore_types::{
        DsseSignature, HashAlgorithm, KindVersion, LogKeyId, MessageDigest, MessageSignature,
        SignatureBytes,
    };

    const PAYLOAD: &[u8] = br#"{"_type":"https://in-toto.io/Statement/v1"}"#;

    fn entry(kind: &str, version: &str, body: String) -> TransparencyLogEntry {
        TransparencyLogEntry {
            log_index: "0".into(),
            log_id: LogKeyId::new(vec![0; 32]),
            kind_version: KindVersion {
                kind: kind.into(),
                version: version.into(),
            },
            integrated_time: "0".into(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: body.into_bytes(),
        }
    }

    fn envelope(sig: &[u8]) -> SignatureContent {
        SignatureContent::DsseEnvelope(DsseEnvelope {
            payload_type: "application/vnd.in-toto+json".into(),
            payload: PAYLOAD.to_vec(),
            signatures: vec![DsseSignature {
                sig: SignatureBytes::new(sig.to_vec()),
                keyid: String::new(),
            }],
        })
    }

    fn payload_hash() -> String {
        sigstore_crypto::sha256(PAYLOAD).to_hex()
    }

    fn dsse_entry(sig: &[u8]) -> TransparencyLogEntry {
        let body = format!(
            r#"{{"apiVersion":"0.0.1","kind":"dsse","spec":{{"payloadHash":{{"algorithm":"sha256","value":"{}"}},"signatures":[{{"signature":"{}","verifier":"a2V5"}}]}}}}"#,
            payload_hash(),
            STANDARD.encode(sig)
        );
        entry("dsse", "0.0.1", body)
    }

    fn intoto_v002_entry(sig: &[u8], payload: Option<&[u8]>) -> TransparencyLogEntry {
        let hash = format!(
            r#","payloadHash":{{"algorithm":"sha256","value":"{}"}}"#,
            payload_hash()
        );
        intoto_v002_body(sig, payload, &hash)
    }

    fn intoto_v002_body(sig: &[u8], payload: Option<&[u8]>, hash: &str) -> TransparencyLogEntry {
        let payload = payload
            .map(|p| format!(r#""payload":"{}","#, STANDARD.encode(STANDARD.encode(p))))
            .unwrap_or_default();
        let body = format!(
            r#"{{"apiVersion":"0.0.2","kind":"intoto","spec":{{"content":{{"envelope":{{"payloadType":"application/vnd.in-toto+json",{payload}"signatures":[{{"sig":"{}","publicKey":"a2V5"}}]}}{hash}}}}}}}"#,
            STANDARD.encode(STANDARD.encode(sig)),
        );
        entry("intoto", "0.0.2", body)
    }

    #[test]
    fn test_dsse_v001() {
        assert!(verify_body(&dsse_entry(b"sig"), &envelope(b"sig")).is_ok());
        assert!(verify_body(&dsse_entry(b"sig"), &envelope(b"other")).is_err());
    }

    #[test]
    fn test_intoto_v002() {
        assert!(verify_body(&intoto_v002_entry(b"sig", Some(PAYLOAD)), &envelope(b"sig")).is_ok());
        assert!(verify_body(&intoto_v002_entry(b"sig", None), &envelope(b"sig")).is_ok());
        assert!(verify_body(&intoto_v002_entry(b"bad", None), &envelope(b"sig")).is_err());
        assert!(
            verify_body(&intoto_v002_entry(b"sig", Some(b"{}")), &envelope(b"sig")).is_err()
        );
    }

    #[test]
    fn test_intoto_v002_requires_payload_hash() {
        let bare = intoto_v002_body(b"sig", None, "");
        let err = verify_body(&bare, &envelope(b"sig")).unwrap_err();
        assert_eq!(err.stage(), Some(VerificationStage::LogThreshold));
        assert!(err.to_string().contains("no payload hash"));

        let with_payload = intoto_v002_body(b"sig", Some(PAYLOAD), "");
        assert!(verify_body(&with_payload, &envelope(b"sig")).is_err());
    }

    #[test]
    fn test_intoto_v002_payload_hash_mismatch() {
        let hash = format!(
            r#","payloadHash":{{"algorithm":"sha256","value":"{}"}}"#,
            "00".repeat(32)
        );
        let entry = intoto_v002_body(b"sig", None, &hash);
        let err = verify_body(&entry, &envelope(b"sig")).unwrap_err();
        assert!(err.to_string().contains("payload hash mismatch"));
    }

    #[test]
    fn test_intoto_v001_payload_hash() {
        let body = |hash: &str| {
            format!(
                r#"{{"apiVersion":"0.0.1","kind":"intoto","spec":{{"content":{{"payloadHash":{{"algorithm":"sha256","value":"{hash}"}}}}}}}}"#
            )
        };
        let good = entry("intoto", "0.0.1", body(&payload_hash()));
        assert!(verify_body(&good, &envelope(b"sig")).is_ok());
        let bad = entry("intoto", "0.0.1", body(&"00".repeat(32)));
        assert!(verify_body(&bad, &envelope(b"sig")).is_err());
    }

    #[test]
    fn test_kind_must_fit_content() {
        let message = SignatureContent::MessageSignature(MessageSignature {
            message_digest: Some(MessageDigest {
                algorithm: HashAlgorithm::Sha2_256,
                digest: vec![0; 32],
            }),
            signature: SignatureBytes::new(b"sig".to_vec()),
        });
        let err = verify_body(&dsse_entry(b"sig"), &message).unwrap_err();
        assert!(err.to_string().contains("does not describe"));

        let rekord = r#"{"apiVersion":"0.0.1","kind":"rekord","spec":{}}"#;
        let unknown = entry("rekord", "0.0.1", rekord.into());
        assert!(verify_body(&unknown, &message).is_err());
    }
}
