//! Verification policy and signer identities
//!
//! A policy sets how many CT log and transparency log attestations a bundle
//! needs and, optionally, which signers are acceptable. Policies can be built
//! in code or loaded from JSON:
//!
//! ```json
//! {
//!   "ctlogThreshold": 1,
//!   "tlogThreshold": 1,
//!   "identities": [{
//!     "issuer": "https://token.actions.githubusercontent.com",
//!     "subjectAlternativeName": { "uri": "https://github.com/org/repo/.github/workflows/ci.yml@refs/heads/main" }
//!   }]
//! }
//! ```

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer};
use sigstore_crypto::X509Certificate;
use tracing::warn;

/// What a bundle must prove to be accepted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationPolicy {
    /// Verified SCTs required on the signing certificate
    pub ctlog_threshold: usize,
    /// Accepted transparency log entries required
    pub tlog_threshold: usize,
    /// Skip SCT verification entirely
    pub skip_sct: bool,
    /// Query logs online instead of trusting bundled proofs
    pub online: bool,
    /// Require an inclusion proof on every entry, whatever the bundle version
    pub require_inclusion_proof: bool,
    /// Acceptable signers; empty accepts any signer
    pub identities: Vec<CertificateIdentity>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            ctlog_threshold: 1,
            tlog_threshold: 1,
            skip_sct: false,
            online: false,
            require_inclusion_proof: false,
            identities: Vec::new(),
        }
    }
}

impl VerificationPolicy {
    /// Load a policy from JSON, applying defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Decode(format!("invalid policy: {e}")))
    }

    pub fn with_ctlog_threshold(mut self, threshold: usize) -> Self {
        self.ctlog_threshold = threshold;
        self
    }

    pub fn with_tlog_threshold(mut self, threshold: usize) -> Self {
        self.tlog_threshold = threshold;
        self
    }

    /// Do not require SCTs on the signing certificate
    pub fn skip_sct(mut self) -> Self {
        self.skip_sct = true;
        self
    }

    /// Ask for online log verification, which is not supported
    pub fn online(mut self) -> Self {
        self.online = true;
        self
    }

    pub fn require_inclusion_proof(mut self) -> Self {
        self.require_inclusion_proof = true;
        self
    }

    /// Accept signers matching `identity`, in addition to any already listed
    pub fn require_identity(mut self, identity: CertificateIdentity) -> Self {
        self.identities.push(identity);
        self
    }
}

/// One acceptable signer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateIdentity {
    /// OIDC issuer recorded by the certificate authority
    pub issuer: String,
    pub subject_alternative_name: SanMatcher,
    /// Extensions the certificate must carry with exactly these values
    #[serde(default)]
    pub oids: Vec<ObjectIdentifierValuePair>,
}

impl CertificateIdentity {
    pub fn new(issuer: impl Into<String>, san: SanMatcher) -> Self {
        Self {
            issuer: issuer.into(),
            subject_alternative_name: san,
            oids: Vec::new(),
        }
    }

    /// Also require extension `oid` to hold `value`
    pub fn with_oid(mut self, oid: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.oids.push(ObjectIdentifierValuePair {
            oid: oid.into(),
            value: value.into(),
        });
        self
    }

    /// True when issuer, SAN and every extension pair match `cert`
    pub fn matches(&self, cert: &X509Certificate) -> bool {
        if cert.ext_fulcio_issuer().as_deref() != Some(self.issuer.as_str()) {
            return false;
        }
        if !self.subject_alternative_name.matches(cert) {
            return false;
        }
        self.oids.iter().all(|pair| {
            cert.extension(&pair.oid)
                .is_some_and(|ext| ext.value() == pair.value.as_slice())
        })
    }
}

/// How the subjectAltName must match
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SanMatcher {
    Email(String),
    Uri(String),
    /// Pattern match; not supported, never matches
    Regexp(String),
}

impl SanMatcher {
    pub fn matches(&self, cert: &X509Certificate) -> bool {
        match self {
            SanMatcher::Email(expected) => cert.san_emails().any(|email| email == expected),
            SanMatcher::Uri(expected) => cert.san_uris().any(|uri| uri == expected),
            SanMatcher::Regexp(pattern) => {
                warn!(%pattern, "SAN regexp matching is not supported, identity rejected");
                false
            }
        }
    }
}

/// Extension OID with its required raw value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectIdentifierValuePair {
    pub oid: String,
    /// `extnValue` content; base64 in JSON
    #[serde(deserialize_with = "base64_bytes")]
    pub value: Vec<u8>,
}

fn base64_bytes<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigstore_crypto::testing::CertificateBuilder;
    use sigstore_crypto::KeyPair;

    const GITHUB: &str = "https://token.actions.githubusercontent.com";

    #[test]
    fn test_policy_defaults() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.ctlog_threshold, 1);
        assert_eq!(policy.tlog_threshold, 1);
        assert!(!policy.skip_sct);
        assert!(!policy.online);
        assert!(policy.identities.is_empty());
    }

    #[test]
    fn test_policy_builder() {
        let policy = VerificationPolicy::default()
            .with_ctlog_threshold(2)
            .with_tlog_threshold(3)
            .skip_sct()
            .require_identity(CertificateIdentity::new(
                GITHUB,
                SanMatcher::Email("dev@example.com".into()),
            ));
        assert_eq!(policy.ctlog_threshold, 2);
        assert_eq!(policy.tlog_threshold, 3);
        assert!(policy.skip_sct);
        assert_eq!(policy.identities.len(), 1);
    }

    #[test]
    fn test_policy_from_json() {
        let policy = VerificationPolicy::from_json(
            r#"{
                "tlogThreshold": 2,
                "identities": [{
                    "issuer": "https://token.actions.githubusercontent.com",
                    "subjectAlternativeName": {"uri": "https://github.com/org/repo"},
                    "oids": [{"oid": "1.3.6.1.4.1.57264.1.9", "value": "aGVsbG8="}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(policy.ctlog_threshold, 1);
        assert_eq!(policy.tlog_threshold, 2);
        let identity = &policy.identities[0];
        assert_eq!(
            identity.subject_alternative_name,
            SanMatcher::Uri("https://github.com/org/repo".into())
        );
        assert_eq!(identity.oids[0].value, b"hello");

        assert!(VerificationPolicy::from_json(r#"{"tlogThreshold": "two"}"#).is_err());
    }

    #[test]
    fn test_identity_matching() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let cert = CertificateBuilder::new("leaf")
            .email("dev@example.com")
            .fulcio_issuer(GITHUB)
            .extension("1.3.6.1.4.1.57264.1.9", false, b"workflow".to_vec())
            .self_signed(&key)
            .unwrap();

        let email = SanMatcher::Email("dev@example.com".into());
        assert!(CertificateIdentity::new(GITHUB, email.clone()).matches(&cert));
        assert!(!CertificateIdentity::new("https://accounts.google.com", email.clone())
            .matches(&cert));
        assert!(!CertificateIdentity::new(GITHUB, SanMatcher::Email("other@example.com".into()))
            .matches(&cert));
        assert!(!CertificateIdentity::new(GITHUB, SanMatcher::Uri("dev@example.com".into()))
            .matches(&cert));

        let with_oid = CertificateIdentity::new(GITHUB, email.clone())
            .with_oid("1.3.6.1.4.1.57264.1.9", b"workflow".to_vec());
        assert!(with_oid.matches(&cert));
        let wrong_oid = CertificateIdentity::new(GITHUB, email)
            .with_oid("1.3.6.1.4.1.57264.1.9", b"other".to_vec());
        assert!(!wrong_oid.matches(&cert));
    }

    #[test]
    fn test_regexp_never_matches() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let cert = CertificateBuilder::new("leaf")
            .email("dev@example.com")
            .fulcio_issuer(GITHUB)
            .self_signed(&key)
            .unwrap();
        let identity = CertificateIdentity::new(GITHUB, SanMatcher::Regexp(".*".into()));
        assert!(!identity.matches(&cert));
    }
}
