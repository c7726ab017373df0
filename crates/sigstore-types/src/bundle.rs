//! Sigstore bundle model
//!
//! Field layout follows the `dev.sigstore.bundle` protobuf messages, with
//! base64 fields already decoded to bytes.

use crate::dsse::DsseEnvelope;
use crate::encoding::{DerCertificate, LogKeyId, SignatureBytes};
use crate::error::{Error, Result};
use std::str::FromStr;

/// Bundle media type, which determines the structural rules a bundle obeys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaType {
    /// `application/vnd.dev.sigstore.bundle+json;version=0.1`
    Bundle0_1,
    /// `application/vnd.dev.sigstore.bundle+json;version=0.2`
    Bundle0_2,
    /// `application/vnd.dev.sigstore.bundle.v0.3+json`
    Bundle0_3,
}

impl MediaType {
    /// The canonical media type string
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Bundle0_1 => "application/vnd.dev.sigstore.bundle+json;version=0.1",
            MediaType::Bundle0_2 => "application/vnd.dev.sigstore.bundle+json;version=0.2",
            MediaType::Bundle0_3 => "application/vnd.dev.sigstore.bundle.v0.3+json",
        }
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "application/vnd.dev.sigstore.bundle+json;version=0.1" => Ok(MediaType::Bundle0_1),
            "application/vnd.dev.sigstore.bundle+json;version=0.2" => Ok(MediaType::Bundle0_2),
            "application/vnd.dev.sigstore.bundle+json;version=0.3"
            | "application/vnd.dev.sigstore.bundle.v0.3+json" => Ok(MediaType::Bundle0_3),
            other => Err(Error::UnsupportedMediaType(other.to_string())),
        }
    }
}

/// Digest algorithms that can appear in a message signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha2_256,
    Sha2_384,
    Sha2_512,
}

impl HashAlgorithm {
    /// Name as used in transparency log bodies (`sha256`, ...)
    pub fn rekor_name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha2_256 => "sha256",
            HashAlgorithm::Sha2_384 => "sha384",
            HashAlgorithm::Sha2_512 => "sha512",
        }
    }

    /// Digest length in bytes
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha2_256 => 32,
            HashAlgorithm::Sha2_384 => 48,
            HashAlgorithm::Sha2_512 => 64,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" | "SHA2_256" => Ok(HashAlgorithm::Sha2_256),
            "sha384" | "SHA2_384" => Ok(HashAlgorithm::Sha2_384),
            "sha512" | "SHA2_512" => Ok(HashAlgorithm::Sha2_512),
            other => Err(Error::UnsupportedHashAlgorithm(other.to_string())),
        }
    }
}

/// A complete verification bundle
#[derive(Debug, Clone)]
pub struct Bundle {
    pub media_type: MediaType,
    pub verification_material: VerificationMaterial,
    pub content: SignatureContent,
}

/// Key material and log entries
#[derive(Debug, Clone)]
pub struct VerificationMaterial {
    pub content: VerificationMaterialContent,
    pub tlog_entries: Vec<TransparencyLogEntry>,
}

/// How the signer's key is conveyed
#[derive(Debug, Clone)]
pub enum VerificationMaterialContent {
    /// Leaf first, optionally followed by intermediates
    X509CertificateChain { certificates: Vec<DerCertificate> },
    /// A single leaf certificate
    Certificate(DerCertificate),
    /// A hint the caller resolves to a public key
    PublicKey { hint: String },
}

/// The signed content
#[derive(Debug, Clone)]
pub enum SignatureContent {
    MessageSignature(MessageSignature),
    DsseEnvelope(DsseEnvelope),
}

/// Signature over an artifact, optionally with the artifact digest
#[derive(Debug, Clone)]
pub struct MessageSignature {
    pub message_digest: Option<MessageDigest>,
    pub signature: SignatureBytes,
}

/// Artifact digest stored alongside a message signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigest {
    pub algorithm: HashAlgorithm,
    pub digest: Vec<u8>,
}

/// Entry kind and API version, e.g. `hashedrekord` / `0.0.1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindVersion {
    pub kind: String,
    pub version: String,
}

/// A transparency log entry recorded for the signing event
#[derive(Debug, Clone)]
pub struct TransparencyLogEntry {
    /// String-encoded integer
    pub log_index: String,
    pub log_id: LogKeyId,
    pub kind_version: KindVersion,
    /// Seconds since the epoch, string-encoded to preserve precision
    pub integrated_time: String,
    pub inclusion_promise: Option<InclusionPromise>,
    pub inclusion_proof: Option<InclusionProof>,
    pub canonicalized_body: Vec<u8>,
}

/// Signed entry timestamp issued by the log
#[derive(Debug, Clone)]
pub struct InclusionPromise {
    pub signed_entry_timestamp: SignatureBytes,
}

/// Merkle inclusion proof with the checkpoint it was computed against
#[derive(Debug, Clone)]
pub struct InclusionProof {
    pub log_index: String,
    pub root_hash: Vec<u8>,
    pub tree_size: String,
    pub hashes: Vec<Vec<u8>>,
    pub checkpoint: Checkpoint,
}

/// Signed note text of a log checkpoint
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub envelope: String,
}
