//! Transparency log entry verification
//!
//! An entry is accepted when its body matches the bundle, the log vouched
//! for it (a signed entry timestamp, or a signed checkpoint plus a Merkle
//! inclusion proof), and it was integrated while the signing certificate
//! was valid.

use super::helpers::{integrated_time, validate_certificate_time};
use super::rekor::verify_body;
use crate::error::{Error, Result, VerificationStage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sigstore_crypto::{Keyring, LogCheckpoint, SignedNote, X509Certificate};
use sigstore_merkle::{hash_leaf, verify_inclusion_proof};
use sigstore_types::{
    InclusionPromise, InclusionProof, Sha256Hash, SignatureContent, TransparencyLogEntry,
};
use std::collections::HashSet;
use tracing::debug;

/// What a log signs in a signed entry timestamp
#[derive(Serialize)]
struct RekorPayload {
    body: String,
    #[serde(rename = "integratedTime")]
    integrated_time: i64,
    #[serde(rename = "logIndex")]
    log_index: i64,
    #[serde(rename = "logID")]
    log_id: String,
}

/// Require at least `threshold` accepted entries
///
/// Entries are counted once per log id and log index.
pub fn verify_tlog_entries(
    entries: &[TransparencyLogEntry],
    content: &SignatureContent,
    keyring: &Keyring,
    signing_cert: Option<&X509Certificate>,
    threshold: usize,
) -> Result<()> {
    let mut accepted = 0;
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        match verify_entry(entry, content, keyring, signing_cert) {
            Ok(()) => {
                if seen.insert((&entry.log_id, entry.log_index.as_str())) {
                    accepted += 1;
                } else {
                    debug!(index, log_index = %entry.log_index, "duplicate tlog entry ignored");
                }
            }
            Err(e) => {
                debug!(index, log_index = %entry.log_index, error = %e, "tlog entry rejected")
            }
        }
    }

    if accepted < threshold {
        return Err(tlog_error(format!(
            "{accepted} of {} tlog entries verified, {threshold} required",
            entries.len()
        )));
    }
    debug!(accepted, threshold, "tlog threshold met");
    Ok(())
}

/// Check one entry
pub fn verify_entry(
    entry: &TransparencyLogEntry,
    content: &SignatureContent,
    keyring: &Keyring,
    signing_cert: Option<&X509Certificate>,
) -> Result<()> {
    verify_body(entry, content)?;

    let set_result = entry
        .inclusion_promise
        .as_ref()
        .map(|promise| verify_set(entry, promise, keyring));
    let proof_result = entry
        .inclusion_proof
        .as_ref()
        .map(|proof| {
            integrated_time(entry)
                .and_then(|at| verify_checkpoint(proof, keyring, Some(at)))
                .and_then(|()| verify_inclusion(entry, proof))
        });

    match (set_result, proof_result) {
        (Some(Ok(())), _) | (_, Some(Ok(()))) => {}
        (Some(Err(e)), _) | (None, Some(Err(e))) => return Err(e),
        (None, None) => {
            return Err(tlog_error(
                "entry has neither an inclusion promise nor an inclusion proof",
            ))
        }
    }

    if let Some(cert) = signing_cert {
        validate_certificate_time(integrated_time(entry)?, cert)?;
    }
    Ok(())
}

/// Verify the signed entry timestamp against the log's key
///
/// The key must belong to the log named by the entry and be valid at the
/// entry's integrated time.
pub fn verify_set(
    entry: &TransparencyLogEntry,
    promise: &InclusionPromise,
    keyring: &Keyring,
) -> Result<()> {
    let integrated = integrated_time(entry)?;
    let payload = RekorPayload {
        body: STANDARD.encode(&entry.canonicalized_body),
        integrated_time: integrated.timestamp(),
        log_index: entry
            .log_index
            .parse::<i64>()
            .map_err(|e| Error::Decode(format!("invalid log index {:?}: {e}", entry.log_index)))?,
        log_id: entry.log_id.to_hex(),
    };
    let canonical_json = serde_json_canonicalizer::to_vec(&payload)
        .map_err(|e| tlog_error(format!("canonicalization failed: {e}")))?;

    keyring
        .verify_with_key_id(
            &entry.log_id,
            &canonical_json,
            promise.signed_entry_timestamp.as_bytes(),
            Some(integrated),
        )
        .map_err(|e| tlog_error(format!("SET verification failed: {e}")))
}

/// Verify the checkpoint signatures and bind the checkpoint to the proof
///
/// Every signature on the note must verify with a log key selected by its
/// key hint and valid at `at`, and the checkpoint must commit to the proof's
/// root hash.
pub fn verify_checkpoint(
    proof: &InclusionProof,
    keyring: &Keyring,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let note =
        SignedNote::parse(&proof.checkpoint.envelope).map_err(|e| tlog_error(e.to_string()))?;
    let checkpoint = LogCheckpoint::parse(&note.note).map_err(|e| tlog_error(e.to_string()))?;

    for signature in &note.signatures {
        keyring
            .verify_with_hint(
                &signature.key_hint,
                note.signed_bytes(),
                &signature.signature,
                at,
            )
            .map_err(|e| {
                tlog_error(format!(
                    "checkpoint signature by {} failed: {e}",
                    signature.name
                ))
            })?;
    }

    if checkpoint.root_hash != proof.root_hash {
        return Err(tlog_error(format!(
            "checkpoint root hash {} does not match inclusion proof root hash {}",
            hex::encode(&checkpoint.root_hash),
            hex::encode(&proof.root_hash)
        )));
    }
    let tree_size = parse_u64("tree size", &proof.tree_size)?;
    if checkpoint.size != tree_size {
        return Err(tlog_error(format!(
            "checkpoint size {} does not match inclusion proof tree size {tree_size}",
            checkpoint.size
        )));
    }

    debug!(origin = %checkpoint.origin, size = checkpoint.size, "checkpoint verified");
    Ok(())
}

/// Verify the Merkle inclusion proof of the entry body
pub fn verify_inclusion(entry: &TransparencyLogEntry, proof: &InclusionProof) -> Result<()> {
    let leaf = hash_leaf(&entry.canonicalized_body);
    let index = parse_u64("log index", &proof.log_index)?;
    let tree_size = parse_u64("tree size", &proof.tree_size)?;
    let hashes = proof
        .hashes
        .iter()
        .map(|hash| to_hash(hash))
        .collect::<Result<Vec<_>>>()?;
    let root = to_hash(&proof.root_hash)?;

    verify_inclusion_proof(&leaf, index, tree_size, &hashes, &root)
        .map_err(|e| tlog_error(format!("inclusion proof failed: {e}")))
}

fn to_hash(bytes: &[u8]) -> Result<Sha256Hash> {
    Sha256Hash::try_from_slice(bytes)
        .map_err(|e| Error::Decode(format!("invalid proof hash: {e}")))
}

fn parse_u64(what: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|e| Error::Decode(format!("invalid {what} {value:?}: {e}")))
}

fn tlog_error(message: impl Into<String>) -> Error {
    Error::verification(VerificationStage::LogThreshold, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigstore_crypto::testing::{log_id, log_instance, signed_checkpoint, utc};
    use sigstore_crypto::KeyPair;
    use sigstore_merkle::{inclusion_path, root_from_leaf_hashes};
    use sigstore_types::{
        Checkpoint, HashAlgorithm, KindVersion, MessageDigest, MessageSignature, SignatureBytes,
        ValidityPeriod,
    };

    struct Fixture {
        log: KeyPair,
        keyring: Keyring,
        content: SignatureContent,
        entry: TransparencyLogEntry,
    }

    fn fixture() -> Fixture {
        let log = KeyPair::generate_ecdsa_p256().unwrap();
        let window = ValidityPeriod {
            start: utc(2023, 1, 1),
            end: Some(utc(2025, 1, 1)),
        };
        let keyring = Keyring::from_logs(&[log_instance(&log, Some(window)).unwrap()]);

        let digest = vec![0x11; 32];
        let signature = vec![0x30, 0x02, 0x01, 0x00];
        let body = format!(
            r#"{{"apiVersion":"0.0.1","kind":"hashedrekord","spec":{{"data":{{"hash":{{"algorithm":"sha256","value":"{}"}}}},"signature":{{"content":"{}"}}}}}}"#,
            hex::encode(&digest),
            STANDARD.encode(&signature)
        );
        let content = SignatureContent::MessageSignature(MessageSignature {
            message_digest: Some(MessageDigest {
                algorithm: HashAlgorithm::Sha2_256,
                digest,
            }),
            signature: SignatureBytes::new(signature),
        });
        let entry = TransparencyLogEntry {
            log_index: "2".into(),
            log_id: log_id(&log).unwrap(),
            kind_version: KindVersion {
                kind: "hashedrekord".into(),
                version: "0.0.1".into(),
            },
            // 2024-01-01T00:00:00Z
            integrated_time: "1704067200".into(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: body.into_bytes(),
        };
        Fixture {
            log,
            keyring,
            content,
            entry,
        }
    }

    fn sign_set(log: &KeyPair, entry: &TransparencyLogEntry) -> InclusionPromise {
        let payload = RekorPayload {
            body: STANDARD.encode(&entry.canonicalized_body),
            integrated_time: entry.integrated_time.parse().unwrap(),
            log_index: entry.log_index.parse().unwrap(),
            log_id: entry.log_id.to_hex(),
        };
        let bytes = serde_json_canonicalizer::to_vec(&payload).unwrap();
        InclusionPromise {
            signed_entry_timestamp: log.sign(&bytes).unwrap(),
        }
    }

    /// Entry at index 2 of a five-leaf tree
    fn prove(log: &KeyPair, entry: &TransparencyLogEntry) -> InclusionProof {
        let mut leaves: Vec<Sha256Hash> = (0u8..5).map(|i| hash_leaf(&[i])).collect();
        leaves[2] = hash_leaf(&entry.canonicalized_body);
        let root = root_from_leaf_hashes(&leaves);
        InclusionProof {
            log_index: "2".into(),
            root_hash: root.as_ref().to_vec(),
            tree_size: "5".into(),
            hashes: inclusion_path(&leaves, 2)
                .unwrap()
                .iter()
                .map(|h| h.as_ref().to_vec())
                .collect(),
            checkpoint: Checkpoint {
                envelope: signed_checkpoint(log, "log.example.dev - 42", 5, root.as_ref())
                    .unwrap(),
            },
        }
    }

    #[test]
    fn test_set_verifies() {
        let f = fixture();
        let promise = sign_set(&f.log, &f.entry);
        assert!(verify_set(&f.entry, &promise, &f.keyring).is_ok());

        let mut moved = f.entry.clone();
        moved.log_index = "3".into();
        assert!(verify_set(&moved, &promise, &f.keyring).is_err());
    }

    #[test]
    fn test_set_outside_key_window() {
        let f = fixture();
        let mut late = f.entry.clone();
        // 2026-01-01
        late.integrated_time = "1767225600".into();
        let promise = sign_set(&f.log, &late);
        assert!(verify_set(&late, &promise, &f.keyring).is_err());
    }

    #[test]
    fn test_checkpoint_and_inclusion() {
        let f = fixture();
        let proof = prove(&f.log, &f.entry);
        assert!(verify_checkpoint(&proof, &f.keyring, None).is_ok());
        assert!(verify_inclusion(&f.entry, &proof).is_ok());

        let mut other = f.entry.clone();
        other.canonicalized_body.push(b' ');
        assert!(verify_inclusion(&other, &proof).is_err());
    }

    #[test]
    fn test_checkpoint_key_outside_window() {
        let f = fixture();
        let proof = prove(&f.log, &f.entry);
        assert!(verify_checkpoint(&proof, &f.keyring, Some(utc(2024, 6, 1))).is_ok());
        let err = verify_checkpoint(&proof, &f.keyring, Some(utc(2026, 1, 1))).unwrap_err();
        assert!(err.to_string().contains("checkpoint signature"));

        let mut late = f.entry.clone();
        // 2026-01-01
        late.integrated_time = "1767225600".into();
        late.inclusion_proof = Some(prove(&f.log, &late));
        assert!(verify_entry(&late, &f.content, &f.keyring, None).is_err());
    }

    #[test]
    fn test_checkpoint_root_must_match_proof() {
        let f = fixture();
        let mut proof = prove(&f.log, &f.entry);
        proof.root_hash = vec![0; 32];
        let err = verify_checkpoint(&proof, &f.keyring, None).unwrap_err();
        assert!(err.to_string().contains("does not match inclusion proof root hash"));
    }

    #[test]
    fn test_checkpoint_from_unknown_log() {
        let f = fixture();
        let stranger = KeyPair::generate_ecdsa_p256().unwrap();
        let proof = prove(&stranger, &f.entry);
        assert!(verify_checkpoint(&proof, &f.keyring, None).is_err());
    }

    #[test]
    fn test_malformed_checkpoint() {
        let f = fixture();
        let mut proof = prove(&f.log, &f.entry);
        proof.checkpoint.envelope = proof.checkpoint.envelope.replacen("\n\n", "\n", 1);
        let err = verify_checkpoint(&proof, &f.keyring, None).unwrap_err();
        assert!(err.to_string().contains("malformed checkpoint"));
        assert_eq!(err.stage(), Some(VerificationStage::LogThreshold));
    }

    #[test]
    fn test_entry_acceptance() {
        let f = fixture();
        let mut entry = f.entry.clone();
        assert!(verify_entry(&entry, &f.content, &f.keyring, None).is_err());

        entry.inclusion_promise = Some(sign_set(&f.log, &entry));
        assert!(verify_entry(&entry, &f.content, &f.keyring, None).is_ok());

        entry.inclusion_promise = Some(InclusionPromise {
            signed_entry_timestamp: SignatureBytes::new(vec![0x30, 0x00]),
        });
        assert!(verify_entry(&entry, &f.content, &f.keyring, None).is_err());
        // a broken promise is fine when the proof holds
        entry.inclusion_proof = Some(prove(&f.log, &entry));
        assert!(verify_entry(&entry, &f.content, &f.keyring, None).is_ok());
    }

    #[test]
    fn test_digest_mismatch_with_valid_set() {
        let f = fixture();
        let mut entry = f.entry.clone();
        entry.inclusion_promise = Some(sign_set(&f.log, &entry));
        let promise = entry.inclusion_promise.as_ref().unwrap();
        assert!(verify_set(&entry, promise, &f.keyring).is_ok());

        let mut content = f.content.clone();
        if let SignatureContent::MessageSignature(sig) = &mut content {
            sig.message_digest = Some(MessageDigest {
                algorithm: HashAlgorithm::Sha2_256,
                digest: vec![0x22; 32],
            });
        }
        let err = verify_entry(&entry, &content, &f.keyring, None).unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
    }

    #[test]
    fn test_threshold() {
        let f = fixture();
        let mut entry = f.entry.clone();
        entry.inclusion_promise = Some(sign_set(&f.log, &entry));
        let entries = vec![entry, f.entry.clone()];

        assert!(verify_tlog_entries(&entries, &f.content, &f.keyring, None, 1).is_ok());
        let err = verify_tlog_entries(&entries, &f.content, &f.keyring, None, 2).unwrap_err();
        assert_eq!(err.stage(), Some(VerificationStage::LogThreshold));
        assert!(err.to_string().contains("1 of 2 tlog entries verified"));
    }

    #[test]
    fn test_threshold_counts_duplicates_once() {
        let f = fixture();
        let mut entry = f.entry.clone();
        entry.inclusion_promise = Some(sign_set(&f.log, &entry));
        let mut entries = vec![entry.clone(), entry.clone()];

        let err = verify_tlog_entries(&entries, &f.content, &f.keyring, None, 2).unwrap_err();
        assert!(err.to_string().contains("1 of 2 tlog entries verified"));

        entry.log_index = "3".into();
        entry.inclusion_promise = Some(sign_set(&f.log, &entry));
        entries[1] = entry;
        assert!(verify_tlog_entries(&entries, &f.content, &f.keyring, None, 2).is_ok());
    }
}
