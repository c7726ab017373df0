//! Fixtures for end-to-end verification tests
//!
//! A small PKI (root, intermediate), one CT log and one Rekor log, all with
//! fresh P-256 keys. Bundles built here verify unless a test breaks them.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use sigstore_crypto::testing::{log_id, log_instance, signed_checkpoint, utc, CertificateBuilder};
use sigstore_crypto::{sha256, KeyPair, X509Certificate};
use sigstore_merkle::{hash_leaf, inclusion_path, root_from_leaf_hashes};
use sigstore_types::{
    Bundle, CertificateAuthority, Checkpoint, DerCertificate, DsseEnvelope, DsseSignature,
    HashAlgorithm, InclusionPromise, InclusionProof, KindVersion, MediaType, MessageDigest,
    MessageSignature, SignatureContent, TransparencyLogEntry, TrustedRoot, ValidityPeriod,
    VerificationMaterial, VerificationMaterialContent,
};

pub const ARTIFACT: &[u8] = b"release-1.2.3.tar.gz contents";
pub const ISSUER: &str = "https://token.actions.githubusercontent.com";
pub const EMAIL: &str = "release@example.com";

/// 2024-01-01T12:00:00Z
pub const INTEGRATED_TIME: i64 = 1_704_110_400;
pub const LOG_INDEX: u64 = 2;
pub const TREE_SIZE: u64 = 5;

pub struct Fixture {
    pub root_key: KeyPair,
    pub root: X509Certificate,
    pub intermediate_key: KeyPair,
    pub intermediate: X509Certificate,
    pub ct_log: KeyPair,
    pub rekor: KeyPair,
    pub signer: KeyPair,
}

impl Fixture {
    pub fn new() -> Self {
        let root_key = KeyPair::generate_ecdsa_p256().unwrap();
        let root = CertificateBuilder::new("sigstore root")
            .ca(None)
            .self_signed(&root_key)
            .unwrap();
        let intermediate_key = KeyPair::generate_ecdsa_p256().unwrap();
        let intermediate = CertificateBuilder::new("sigstore intermediate")
            .serial(2)
            .ca(Some(0))
            .issued_by(&intermediate_key, &root, &root_key)
            .unwrap();
        Self {
            root_key,
            root,
            intermediate_key,
            intermediate,
            ct_log: KeyPair::generate_ecdsa_p256().unwrap(),
            rekor: KeyPair::generate_ecdsa_p256().unwrap(),
            signer: KeyPair::generate_ecdsa_p256().unwrap(),
        }
    }

    pub fn trusted_root(&self) -> TrustedRoot {
        TrustedRoot {
            certificate_authorities: vec![CertificateAuthority {
                uri: "https://ca.example.dev".to_string(),
                cert_chain: vec![
                    DerCertificate::new(self.intermediate.to_der()),
                    DerCertificate::new(self.root.to_der()),
                ],
                valid_for: ValidityPeriod::starting(utc(2020, 1, 1)),
            }],
            ctlogs: vec![log_instance(&self.ct_log, None).unwrap()],
            tlogs: vec![log_instance(&self.rekor, None).unwrap()],
        }
    }

    /// Signing certificate for `signer`, valid on 2024-01-01
    pub fn leaf(&self) -> CertificateBuilder<'_> {
        CertificateBuilder::new("signer")
            .serial(7)
            .validity(utc(2024, 1, 1), utc(2024, 1, 2))
            .email(EMAIL)
            .fulcio_issuer(ISSUER)
            .sct(&self.ct_log, utc(2024, 1, 1))
    }

    pub fn issue(&self, builder: CertificateBuilder<'_>) -> X509Certificate {
        builder
            .issued_by(&self.signer, &self.intermediate, &self.intermediate_key)
            .unwrap()
    }

    /// Message-signature bundle over `ARTIFACT` with a hashedrekord entry
    pub fn message_bundle(&self, material: VerificationMaterialContent) -> Bundle {
        let digest = sha256(ARTIFACT).as_ref().to_vec();
        let signature = self.signer.sign(ARTIFACT).unwrap();
        let body = json!({
            "apiVersion": "0.0.1",
            "kind": "hashedrekord",
            "spec": {
                "data": {"hash": {"algorithm": "sha256", "value": hex::encode(&digest)}},
                "signature": {"content": signature.to_base64()},
            },
        });
        let entry = self.entry("hashedrekord", "0.0.1", canonical(&body));
        Bundle {
            media_type: MediaType::Bundle0_3,
            verification_material: VerificationMaterial {
                content: material,
                tlog_entries: vec![entry],
            },
            content: SignatureContent::MessageSignature(MessageSignature {
                message_digest: Some(MessageDigest {
                    algorithm: HashAlgorithm::Sha2_256,
                    digest,
                }),
                signature,
            }),
        }
    }

    /// DSSE bundle with a dsse 0.0.1 entry
    pub fn dsse_bundle(&self, material: VerificationMaterialContent) -> Bundle {
        let payload = br#"{"_type":"https://in-toto.io/Statement/v1"}"#.to_vec();
        let envelope = DsseEnvelope {
            payload_type: "application/vnd.in-toto+json".to_string(),
            payload,
            signatures: Vec::new(),
        };
        let signature = self.signer.sign(&envelope.pae()).unwrap();
        let body = json!({
            "apiVersion": "0.0.1",
            "kind": "dsse",
            "spec": {
                "payloadHash": {
                    "algorithm": "sha256",
                    "value": sha256(&envelope.payload).to_hex(),
                },
                "signatures": [{"signature": signature.to_base64(), "verifier": "a2V5"}],
            },
        });
        let entry = self.entry("dsse", "0.0.1", canonical(&body));
        let envelope = DsseEnvelope {
            signatures: vec![DsseSignature {
                sig: signature,
                keyid: String::new(),
            }],
            ..envelope
        };
        Bundle {
            media_type: MediaType::Bundle0_3,
            verification_material: VerificationMaterial {
                content: material,
                tlog_entries: vec![entry],
            },
            content: SignatureContent::DsseEnvelope(envelope),
        }
    }

    /// Entry carrying both a signed entry timestamp and an inclusion proof
    pub fn entry(&self, kind: &str, version: &str, body: Vec<u8>) -> TransparencyLogEntry {
        let mut entry = TransparencyLogEntry {
            log_index: LOG_INDEX.to_string(),
            log_id: log_id(&self.rekor).unwrap(),
            kind_version: KindVersion {
                kind: kind.to_string(),
                version: version.to_string(),
            },
            integrated_time: INTEGRATED_TIME.to_string(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: body,
        };
        self.resign(&mut entry);
        entry
    }

    /// Recompute the promise and proof after `entry` was modified
    ///
    /// The log index must stay below `TREE_SIZE`.
    pub fn resign(&self, entry: &mut TransparencyLogEntry) {
        let payload = json!({
            "body": STANDARD.encode(&entry.canonicalized_body),
            "integratedTime": entry.integrated_time.parse::<i64>().unwrap(),
            "logIndex": entry.log_index.parse::<i64>().unwrap(),
            "logID": entry.log_id.to_hex(),
        });
        entry.inclusion_promise = Some(InclusionPromise {
            signed_entry_timestamp: self.rekor.sign(&canonical(&payload)).unwrap(),
        });

        let index: usize = entry.log_index.parse().unwrap();
        let mut leaves: Vec<_> = (0..TREE_SIZE).map(|i| hash_leaf(&i.to_be_bytes())).collect();
        leaves[index] = hash_leaf(&entry.canonicalized_body);
        let root = root_from_leaf_hashes(&leaves);
        let hashes = inclusion_path(&leaves, index).unwrap();
        entry.inclusion_proof = Some(InclusionProof {
            log_index: index.to_string(),
            root_hash: root.as_ref().to_vec(),
            tree_size: TREE_SIZE.to_string(),
            hashes: hashes.iter().map(|h| h.as_ref().to_vec()).collect(),
            checkpoint: Checkpoint {
                envelope: signed_checkpoint(
                    &self.rekor,
                    "rekor.example.dev - 1193050959916656506",
                    TREE_SIZE,
                    root.as_ref(),
                )
                .unwrap(),
            },
        });
    }
}

pub fn chain_material(certs: &[&X509Certificate]) -> VerificationMaterialContent {
    VerificationMaterialContent::X509CertificateChain {
        certificates: certs
            .iter()
            .map(|cert| DerCertificate::new(cert.to_der()))
            .collect(),
    }
}

pub fn key_hint(hint: &str) -> VerificationMaterialContent {
    VerificationMaterialContent::PublicKey {
        hint: hint.to_string(),
    }
}

pub fn canonical(value: &serde_json::Value) -> Vec<u8> {
    serde_json_canonicalizer::to_vec(value).unwrap()
}
