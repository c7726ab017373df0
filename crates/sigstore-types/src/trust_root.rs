//! Trusted root: certificate authorities and log keys an installation trusts

use crate::bundle::HashAlgorithm;
use crate::encoding::{DerCertificate, DerPublicKey, LogKeyId};
use chrono::{DateTime, Utc};

/// A half-open-ended validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl ValidityPeriod {
    /// Window starting at `start` with no end
    pub fn starting(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// True when `at` lies within the window, bounds inclusive
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at <= end)
    }
}

/// A certificate authority and the window in which it issued certificates
#[derive(Debug, Clone)]
pub struct CertificateAuthority {
    pub uri: String,
    /// Ordered leaf-most first, root last
    pub cert_chain: Vec<DerCertificate>,
    pub valid_for: ValidityPeriod,
}

/// Public key of a log with an optional validity window
#[derive(Debug, Clone)]
pub struct PublicKeyDetails {
    pub raw_bytes: DerPublicKey,
    pub valid_for: Option<ValidityPeriod>,
}

/// A transparency log, either a CT log or a signing-event log
#[derive(Debug, Clone)]
pub struct TransparencyLogInstance {
    pub base_url: String,
    pub hash_algorithm: HashAlgorithm,
    pub public_key: PublicKeyDetails,
    pub log_id: LogKeyId,
}

impl TransparencyLogInstance {
    /// True when the log key was valid at `at`; keys without a window always are
    pub fn valid_at(&self, at: DateTime<Utc>) -> bool {
        self.public_key
            .valid_for
            .map_or(true, |window| window.contains(at))
    }
}

/// The full set of trust material for one verification
#[derive(Debug, Clone, Default)]
pub struct TrustedRoot {
    pub certificate_authorities: Vec<CertificateAuthority>,
    pub ctlogs: Vec<TransparencyLogInstance>,
    pub tlogs: Vec<TransparencyLogInstance>,
}

impl TrustedRoot {
    /// Authorities whose window covers `at`
    pub fn certificate_authorities_at(
        &self,
        at: DateTime<Utc>,
    ) -> impl Iterator<Item = &CertificateAuthority> {
        self.certificate_authorities
            .iter()
            .filter(move |ca| ca.valid_for.contains(at))
    }
}
