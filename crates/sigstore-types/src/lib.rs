//! Core types shared by the Sigstore verification crates
//!
//! Bundles and trust roots are modelled as already-decoded, in-memory values.
//! Parsing them from JSON or fetching them over TUF happens outside of this
//! workspace.

pub mod bundle;
pub mod dsse;
pub mod encoding;
pub mod error;
pub mod trust_root;

pub use bundle::{
    Bundle, Checkpoint, HashAlgorithm, InclusionPromise, InclusionProof, KindVersion, MediaType,
    MessageDigest, MessageSignature, SignatureContent, TransparencyLogEntry, VerificationMaterial,
    VerificationMaterialContent,
};
pub use dsse::{pae, DsseEnvelope, DsseSignature};
pub use encoding::{DerCertificate, DerPublicKey, LogKeyId, Sha256Hash, SignatureBytes};
pub use error::{Error, Result};
pub use trust_root::{
    CertificateAuthority, PublicKeyDetails, TransparencyLogInstance, TrustedRoot, ValidityPeriod,
};
