//! X.509 certificate model for Sigstore
//!
//! [`X509Certificate`] is a typed view over a parsed DER tree. Fields are
//! decoded once at construction and the tree is never mutated afterwards;
//! [`X509Certificate::without_extension`] returns a new certificate instead.

mod cert;
mod ext;
mod sct;

pub use cert::X509Certificate;
pub use ext::{BasicConstraints, ExtensionKind, GeneralName, KeyUsage, X509Extension};
pub use sct::{SctVerification, SignedCertificateTimestamp};

use crate::error::{Error, Result};
use base64::Engine;

/// Object identifiers used by the certificate model
pub mod oids {
    pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
    pub const SECP256R1: &str = "1.2.840.10045.3.1.7";
    pub const SECP384R1: &str = "1.3.132.0.34";
    pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
    pub const ED25519: &str = "1.3.101.112";

    pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
    pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
    pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
    pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
    pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
    pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

    pub const SUBJECT_KEY_ID: &str = "2.5.29.14";
    pub const KEY_USAGE: &str = "2.5.29.15";
    pub const SUBJECT_ALT_NAME: &str = "2.5.29.17";
    pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
    pub const AUTHORITY_KEY_ID: &str = "2.5.29.35";
    pub const EXT_KEY_USAGE: &str = "2.5.29.37";
    pub const EMBEDDED_SCT_LIST: &str = "1.3.6.1.4.1.11129.2.4.2";

    pub const COMMON_NAME: &str = "2.5.4.3";

    /// Fulcio OIDC issuer, raw string value
    pub const FULCIO_ISSUER_V1: &str = "1.3.6.1.4.1.57264.1.1";
    /// Fulcio OIDC issuer, DER UTF8String value
    pub const FULCIO_ISSUER_V2: &str = "1.3.6.1.4.1.57264.1.8";
}

/// Convert PEM-encoded certificate to DER
pub fn der_from_pem(pem: &str) -> Result<Vec<u8>> {
    const BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE-----";
    const END_MARKER: &str = "-----END CERTIFICATE-----";

    let start = pem
        .find(BEGIN_MARKER)
        .ok_or_else(|| Error::InvalidCertificate("missing PEM BEGIN marker".to_string()))?;

    let end = pem
        .find(END_MARKER)
        .filter(|end| *end > start)
        .ok_or_else(|| Error::InvalidCertificate("missing PEM END marker".to_string()))?;

    let clean_content: String = pem[start + BEGIN_MARKER.len()..end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(&clean_content)
        .map_err(|e| Error::InvalidCertificate(format!("failed to decode PEM: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_from_pem() {
        let pem = "-----BEGIN CERTIFICATE-----\nYWJj\nZA==\n-----END CERTIFICATE-----";
        assert_eq!(der_from_pem(pem).unwrap(), b"abcd");
    }

    #[test]
    fn test_der_from_pem_invalid() {
        assert!(der_from_pem("not a pem").is_err());
        assert!(der_from_pem("-----END CERTIFICATE----- -----BEGIN CERTIFICATE-----").is_err());
        assert!(der_from_pem("-----BEGIN CERTIFICATE-----\n!!\n-----END CERTIFICATE-----").is_err());
    }
}
