//! Certificate, SCT and log fixtures for tests
//!
//! Everything here signs with freshly generated P-256 keys, so fixtures are
//! real: chains verify, SCTs verify against the log instances built from the
//! same keys, and tampering is detected.

use crate::asn1::{Asn1Obj, Asn1Tag};
use crate::error::Result;
use crate::hash::sha256;
use crate::signing::KeyPair;
use crate::stream::ByteStream;
use crate::x509::{oids, KeyUsage, SignedCertificateTimestamp, X509Certificate};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use sigstore_types::{
    DerPublicKey, HashAlgorithm, LogKeyId, PublicKeyDetails, TransparencyLogInstance,
    ValidityPeriod,
};

/// Midnight UTC on the given day
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Log id as CT and Rekor derive it: SHA-256 of the SPKI
pub fn log_id(key: &KeyPair) -> Result<LogKeyId> {
    let spki = key.public_key_der()?;
    Ok(LogKeyId::new(sha256(spki.as_bytes()).as_ref().to_vec()))
}

/// A log instance backed by `key`
pub fn log_instance(
    key: &KeyPair,
    valid_for: Option<ValidityPeriod>,
) -> Result<TransparencyLogInstance> {
    Ok(TransparencyLogInstance {
        base_url: "https://log.example.dev".to_string(),
        hash_algorithm: HashAlgorithm::Sha2_256,
        public_key: PublicKeyDetails {
            raw_bytes: key.public_key_der()?,
            valid_for,
        },
        log_id: log_id(key)?,
    })
}

/// Signed-note checkpoint for a tree, signed by `log`
///
/// The signer name is the first word of `origin`.
pub fn signed_checkpoint(
    log: &KeyPair,
    origin: &str,
    tree_size: u64,
    root_hash: &[u8],
) -> Result<String> {
    let note = format!("{origin}\n{tree_size}\n{}\n", STANDARD.encode(root_hash));
    let signature = log.sign(note.as_bytes())?;
    let mut hinted = log_id(log)?.as_bytes()[..4].to_vec();
    hinted.extend_from_slice(signature.as_bytes());
    let name = origin.split(' ').next().unwrap_or(origin);
    Ok(format!("{note}\n\u{2014} {name} {}\n", STANDARD.encode(hinted)))
}

/// `Name` with a single commonName
pub fn name(common_name: &str) -> Result<Asn1Obj> {
    Ok(Asn1Obj::sequence(vec![Asn1Obj::set(vec![Asn1Obj::sequence(
        vec![
            Asn1Obj::from_oid(oids::COMMON_NAME)?,
            Asn1Obj::utf8_string(common_name),
        ],
    )])]))
}

struct SctSpec<'a> {
    log: &'a KeyPair,
    at: DateTime<Utc>,
    corrupt: bool,
}

/// Builds and signs certificates
pub struct CertificateBuilder<'a> {
    subject: String,
    serial: u64,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    basic_constraints: Option<(bool, Option<u32>)>,
    key_usage: Option<u16>,
    san: Vec<Asn1Obj>,
    extra: Vec<(String, bool, Vec<u8>)>,
    key_ids: bool,
    scts: Vec<SctSpec<'a>>,
}

impl<'a> CertificateBuilder<'a> {
    /// An end-entity certificate valid 2020 through 2040
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            serial: 1,
            not_before: utc(2020, 1, 1),
            not_after: utc(2040, 1, 1),
            basic_constraints: None,
            key_usage: None,
            san: Vec::new(),
            extra: Vec::new(),
            key_ids: true,
            scts: Vec::new(),
        }
    }

    pub fn serial(mut self, serial: u64) -> Self {
        self.serial = serial;
        self
    }

    pub fn validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    /// Mark as CA with keyCertSign and cRLSign
    pub fn ca(mut self, path_len: Option<u32>) -> Self {
        self.basic_constraints = Some((true, path_len));
        self.key_usage = Some(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN);
        self
    }

    pub fn key_usage(mut self, bits: u16) -> Self {
        self.key_usage = Some(bits);
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.san.push(Asn1Obj::new(
            Asn1Tag::context(1, false),
            email.as_bytes().to_vec(),
        ));
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.san.push(Asn1Obj::new(
            Asn1Tag::context(6, false),
            uri.as_bytes().to_vec(),
        ));
        self
    }

    /// Fulcio v2 issuer extension
    pub fn fulcio_issuer(self, issuer: &str) -> Self {
        let value = Asn1Obj::utf8_string(issuer).to_der();
        self.extension(oids::FULCIO_ISSUER_V2, false, value)
    }

    /// Arbitrary extension; `value` is the `extnValue` content
    pub fn extension(mut self, oid: &str, critical: bool, value: Vec<u8>) -> Self {
        self.extra.push((oid.to_string(), critical, value));
        self
    }

    /// Omit subject and authority key identifiers
    pub fn without_key_ids(mut self) -> Self {
        self.key_ids = false;
        self
    }

    /// Embed an SCT from `log`
    pub fn sct(mut self, log: &'a KeyPair, at: DateTime<Utc>) -> Self {
        self.scts.push(SctSpec {
            log,
            at,
            corrupt: false,
        });
        self
    }

    /// Embed an SCT from `log` whose signature covers the wrong bytes
    pub fn corrupt_sct(mut self, log: &'a KeyPair, at: DateTime<Utc>) -> Self {
        self.scts.push(SctSpec {
            log,
            at,
            corrupt: true,
        });
        self
    }

    pub fn self_signed(self, key: &KeyPair) -> Result<X509Certificate> {
        let issuer_name = name(&self.subject)?;
        let issuer_spki = key.public_key_der()?;
        let aki = if self.key_ids {
            Some(key_id(&issuer_spki))
        } else {
            None
        };
        self.build(key, issuer_name, &issuer_spki, aki, key)
    }

    pub fn issued_by(
        self,
        key: &KeyPair,
        issuer: &X509Certificate,
        issuer_key: &KeyPair,
    ) -> Result<X509Certificate> {
        let issuer_name = Asn1Obj::parse_buffer(issuer.subject())?;
        let aki = if self.key_ids {
            issuer.ext_subject_key_id().map(<[u8]>::to_vec)
        } else {
            None
        };
        self.build(key, issuer_name, issuer.public_key(), aki, issuer_key)
    }

    fn build(
        self,
        subject_key: &KeyPair,
        issuer_name: Asn1Obj,
        issuer_spki: &DerPublicKey,
        aki: Option<Vec<u8>>,
        signer: &KeyPair,
    ) -> Result<X509Certificate> {
        let spki = subject_key.public_key_der()?;
        let mut extensions = Vec::new();

        if let Some((ca, path_len)) = self.basic_constraints {
            let mut fields = Vec::new();
            if ca {
                fields.push(Asn1Obj::from_bool(true));
            }
            if let Some(len) = path_len {
                fields.push(Asn1Obj::from_u64(u64::from(len)));
            }
            extensions.push(extension(
                oids::BASIC_CONSTRAINTS,
                true,
                Asn1Obj::sequence(fields).to_der(),
            )?);
        }
        if let Some(bits) = self.key_usage {
            let [high, low] = bits.to_be_bytes();
            let octets = if low == 0 { vec![high] } else { vec![high, low] };
            extensions.push(extension(
                oids::KEY_USAGE,
                true,
                Asn1Obj::bit_string(&octets).to_der(),
            )?);
        }
        if self.key_ids {
            extensions.push(extension(
                oids::SUBJECT_KEY_ID,
                false,
                Asn1Obj::octet_string(key_id(&spki)).to_der(),
            )?);
            if let Some(aki) = aki {
                let value = Asn1Obj::sequence(vec![Asn1Obj::new(Asn1Tag::context(0, false), aki)]);
                extensions.push(extension(oids::AUTHORITY_KEY_ID, false, value.to_der())?);
            }
        }
        if !self.san.is_empty() {
            extensions.push(extension(
                oids::SUBJECT_ALT_NAME,
                false,
                Asn1Obj::sequence(self.san).to_der(),
            )?);
        }
        for (oid, critical, value) in self.extra {
            extensions.push(extension(&oid, critical, value)?);
        }

        let algorithm = Asn1Obj::sequence(vec![Asn1Obj::from_oid(oids::ECDSA_WITH_SHA256)?]);
        let spki_obj = Asn1Obj::parse_buffer(spki.as_bytes())?;
        let subject_name = name(&self.subject)?;
        let tbs_with = |extensions: Vec<Asn1Obj>| {
            Asn1Obj::sequence(vec![
                Asn1Obj::constructed(Asn1Tag::context(0, true), vec![Asn1Obj::from_u64(2)]),
                Asn1Obj::from_u64(self.serial),
                algorithm.clone(),
                issuer_name.clone(),
                Asn1Obj::sequence(vec![
                    Asn1Obj::from_date(self.not_before),
                    Asn1Obj::from_date(self.not_after),
                ]),
                subject_name.clone(),
                spki_obj.clone(),
                Asn1Obj::constructed(
                    Asn1Tag::context(3, true),
                    vec![Asn1Obj::sequence(extensions)],
                ),
            ])
        };

        if !self.scts.is_empty() {
            // the SCT extension goes last so that removing it reproduces the precertificate TBS
            let precert_tbs = tbs_with(extensions.clone()).to_der();
            let mut precert = ByteStream::new();
            precert.append_block(sha256(issuer_spki.as_bytes()).as_ref());
            precert.append_u24(precert_tbs.len() as u32);
            precert.append_block(&precert_tbs);

            let mut scts = Vec::with_capacity(self.scts.len());
            for spec in &self.scts {
                scts.push(sign_sct(spec, precert.buffer())?);
            }
            let list = SignedCertificateTimestamp::encode_list(&scts);
            extensions.push(extension(
                oids::EMBEDDED_SCT_LIST,
                false,
                Asn1Obj::octet_string(list).to_der(),
            )?);
        }

        let tbs = tbs_with(extensions);
        let signature = signer.sign(&tbs.to_der())?;
        let cert = Asn1Obj::sequence(vec![
            tbs,
            algorithm,
            Asn1Obj::bit_string(signature.as_bytes()),
        ]);
        X509Certificate::parse(&cert.to_der())
    }
}

fn key_id(spki: &DerPublicKey) -> Vec<u8> {
    sha256(spki.as_bytes()).as_ref()[..20].to_vec()
}

fn extension(oid: &str, critical: bool, value: Vec<u8>) -> Result<Asn1Obj> {
    let mut fields = vec![Asn1Obj::from_oid(oid)?];
    if critical {
        fields.push(Asn1Obj::from_bool(true));
    }
    fields.push(Asn1Obj::octet_string(value));
    Ok(Asn1Obj::sequence(fields))
}

fn sign_sct(spec: &SctSpec<'_>, precert: &[u8]) -> Result<SignedCertificateTimestamp> {
    let mut id = [0u8; 32];
    id.copy_from_slice(log_id(spec.log)?.as_bytes());
    let mut sct = SignedCertificateTimestamp {
        version: 0,
        log_id: id,
        timestamp: spec.at.timestamp_millis() as u64,
        extensions: Vec::new(),
        hash_algorithm: 4,
        signature_algorithm: 3,
        signature: Vec::new(),
    };
    let mut data = sct.signed_data(precert);
    if spec.corrupt {
        data.push(0);
    }
    sct.signature = spec.log.sign(&data)?.into_bytes();
    Ok(sct)
}
