//! Signed certificate timestamps (RFC 6962 §3.2)

use crate::error::{Error, Result};
use crate::signing::SigningScheme;
use crate::stream::ByteStream;
use crate::verification::{verify_signature, PublicKeyAlgorithm};
use chrono::{DateTime, TimeZone, Utc};
use sigstore_types::{DerPublicKey, HashAlgorithm, TransparencyLogInstance};
use tracing::debug;

/// `signature_type` for certificate timestamps
const CERTIFICATE_TIMESTAMP: u8 = 0;
/// `LogEntryType` for precertificates
const PRECERT_ENTRY: u16 = 1;

// TLS HashAlgorithm / SignatureAlgorithm registry values
const TLS_HASH_SHA256: u8 = 4;
const TLS_HASH_SHA384: u8 = 5;
const TLS_HASH_SHA512: u8 = 6;
const TLS_SIG_RSA: u8 = 1;
const TLS_SIG_ECDSA: u8 = 3;

/// One embedded SCT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificateTimestamp {
    pub version: u8,
    pub log_id: [u8; 32],
    /// Milliseconds since the epoch
    pub timestamp: u64,
    pub extensions: Vec<u8>,
    pub hash_algorithm: u8,
    pub signature_algorithm: u8,
    pub signature: Vec<u8>,
}

/// Outcome of checking one SCT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SctVerification {
    pub log_id: [u8; 32],
    pub verified: bool,
}

impl SignedCertificateTimestamp {
    /// Decode a `SignedCertificateTimestampList`
    pub fn parse_list(bytes: &[u8]) -> Result<Vec<Self>> {
        let mut stream = ByteStream::from_bytes(bytes);
        let total = stream.get_u16()? as usize;
        if total != stream.remaining() {
            return Err(Error::InvalidSct(format!(
                "list declares {total} bytes but {} follow",
                stream.remaining()
            )));
        }

        let mut scts = Vec::new();
        while stream.remaining() > 0 {
            let len = stream.get_u16()? as usize;
            let serialized = stream.get_block(len)?.to_vec();
            scts.push(Self::parse(&serialized)?);
        }
        Ok(scts)
    }

    /// Decode a single serialized SCT
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut stream = ByteStream::from_bytes(bytes);
        let version = stream.get_u8()?;
        let mut log_id = [0u8; 32];
        log_id.copy_from_slice(stream.get_block(32)?);
        let timestamp = stream.get_u64()?;
        let ext_len = stream.get_u16()? as usize;
        let extensions = stream.get_block(ext_len)?.to_vec();
        let hash_algorithm = stream.get_u8()?;
        let signature_algorithm = stream.get_u8()?;
        let sig_len = stream.get_u16()? as usize;
        let signature = stream.get_block(sig_len)?.to_vec();

        if stream.remaining() != 0 {
            return Err(Error::InvalidSct(format!(
                "{} trailing bytes",
                stream.remaining()
            )));
        }

        Ok(Self {
            version,
            log_id,
            timestamp,
            extensions,
            hash_algorithm,
            signature_algorithm,
            signature,
        })
    }

    /// Serialize in the wire format `parse` reads
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut stream = ByteStream::new();
        stream.append_u8(self.version);
        stream.append_block(&self.log_id);
        stream.append_u64(self.timestamp);
        stream.append_u16(self.extensions.len() as u16);
        stream.append_block(&self.extensions);
        stream.append_u8(self.hash_algorithm);
        stream.append_u8(self.signature_algorithm);
        stream.append_u16(self.signature.len() as u16);
        stream.append_block(&self.signature);
        stream.into_inner()
    }

    /// Serialize a list with its two-byte length prefixes
    pub fn encode_list(scts: &[Self]) -> Vec<u8> {
        let mut body = ByteStream::new();
        for sct in scts {
            let bytes = sct.to_bytes();
            body.append_u16(bytes.len() as u16);
            body.append_block(&bytes);
        }
        let mut stream = ByteStream::new();
        stream.append_u16(body.len() as u16);
        stream.append_block(body.buffer());
        stream.into_inner()
    }

    /// Timestamp as a date, if representable
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// The `digitally-signed` struct the log signed
    ///
    /// `precert` is the issuer key hash, the three-byte TBS length and the
    /// TBS certificate without its SCT extension.
    pub fn signed_data(&self, precert: &[u8]) -> Vec<u8> {
        let mut stream = ByteStream::new();
        stream.append_u8(self.version);
        stream.append_u8(CERTIFICATE_TIMESTAMP);
        stream.append_u64(self.timestamp);
        stream.append_u16(PRECERT_ENTRY);
        stream.append_block(precert);
        stream.append_u16(self.extensions.len() as u16);
        stream.append_block(&self.extensions);
        stream.into_inner()
    }

    /// Check the signature against every log with this SCT's id whose key
    /// was valid at the SCT timestamp
    pub fn verify(&self, precert: &[u8], logs: &[TransparencyLogInstance]) -> bool {
        let Some(at) = self.datetime() else {
            return false;
        };
        let data = self.signed_data(precert);

        logs.iter()
            .filter(|log| log.log_id.as_bytes() == self.log_id && log.valid_at(at))
            .any(
                |log| match self.verify_with_key(&log.public_key.raw_bytes, &data) {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(log = %log.base_url, error = %e, "SCT signature rejected");
                        false
                    }
                },
            )
    }

    fn verify_with_key(&self, key: &DerPublicKey, data: &[u8]) -> Result<()> {
        let key_alg = PublicKeyAlgorithm::from_spki(key.as_bytes())?;
        let hash = match self.hash_algorithm {
            TLS_HASH_SHA256 => HashAlgorithm::Sha2_256,
            TLS_HASH_SHA384 => HashAlgorithm::Sha2_384,
            TLS_HASH_SHA512 => HashAlgorithm::Sha2_512,
            other => {
                return Err(Error::UnsupportedAlgorithm(format!("TLS hash algorithm {other}")))
            }
        };
        let expected_sig = match key_alg {
            PublicKeyAlgorithm::EcP256 | PublicKeyAlgorithm::EcP384 => TLS_SIG_ECDSA,
            PublicKeyAlgorithm::Rsa => TLS_SIG_RSA,
            PublicKeyAlgorithm::Ed25519 => {
                return Err(Error::UnsupportedAlgorithm("Ed25519 CT log key".into()))
            }
        };
        if self.signature_algorithm != expected_sig {
            return Err(Error::UnsupportedAlgorithm(format!(
                "TLS signature algorithm {} with {key_alg:?} key",
                self.signature_algorithm
            )));
        }

        let scheme = SigningScheme::for_key(key_alg, hash)?;
        verify_signature(key, data, &self.signature, scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;
    use crate::testing::{log_instance, utc};
    use crate::signing::KeyPair;

    fn signed_sct(log: &KeyPair, precert: &[u8]) -> SignedCertificateTimestamp {
        let mut log_id = [0u8; 32];
        log_id.copy_from_slice(sha256(log.public_key_der().unwrap().as_bytes()).as_ref());
        let mut sct = SignedCertificateTimestamp {
            version: 0,
            log_id,
            timestamp: 1_700_000_000_000,
            extensions: vec![],
            hash_algorithm: TLS_HASH_SHA256,
            signature_algorithm: TLS_SIG_ECDSA,
            signature: vec![],
        };
        sct.signature = log.sign(&sct.signed_data(precert)).unwrap().into_bytes();
        sct
    }

    #[test]
    fn test_parse_list() {
        let log = KeyPair::generate_ecdsa_p256().unwrap();
        let first = signed_sct(&log, b"precert");
        let mut second = first.clone();
        second.extensions = vec![1, 2, 3];

        let encoded = SignedCertificateTimestamp::encode_list(&[first.clone(), second.clone()]);
        let parsed = SignedCertificateTimestamp::parse_list(&encoded).unwrap();
        assert_eq!(parsed, vec![first, second]);

        let mut truncated = encoded.clone();
        truncated.pop();
        assert!(SignedCertificateTimestamp::parse_list(&truncated).is_err());
    }

    #[test]
    fn test_signed_data_layout() {
        let log = KeyPair::generate_ecdsa_p256().unwrap();
        let sct = signed_sct(&log, b"PRE");
        let data = sct.signed_data(b"PRE");
        assert_eq!(data[0], 0);
        assert_eq!(data[1], CERTIFICATE_TIMESTAMP);
        assert_eq!(&data[2..10], &1_700_000_000_000u64.to_be_bytes());
        assert_eq!(&data[10..12], &[0, 1]);
        assert_eq!(&data[12..15], b"PRE");
        assert_eq!(&data[15..], &[0, 0]);
    }

    #[test]
    fn test_verify_against_logs() {
        let log = KeyPair::generate_ecdsa_p256().unwrap();
        let other = KeyPair::generate_ecdsa_p256().unwrap();
        let sct = signed_sct(&log, b"precert");

        let logs = vec![log_instance(&log, None).unwrap()];
        assert!(sct.verify(b"precert", &logs));
        assert!(!sct.verify(b"other precert", &logs));

        // right key under the wrong id is never consulted
        let mut misfiled = log_instance(&other, None).unwrap();
        misfiled.public_key = logs[0].public_key.clone();
        assert!(!sct.verify(b"precert", &[misfiled]));
    }

    #[test]
    fn test_log_key_outside_validity_window() {
        let log = KeyPair::generate_ecdsa_p256().unwrap();
        let sct = signed_sct(&log, b"precert");
        // SCT is from November 2023; key only valid from 2024
        let window = sigstore_types::ValidityPeriod::starting(utc(2024, 1, 1));
        let logs = vec![log_instance(&log, Some(window)).unwrap()];
        assert!(!sct.verify(b"precert", &logs));
    }
}
