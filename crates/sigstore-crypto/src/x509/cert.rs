use super::ext::{BasicConstraints, ExtensionKind, GeneralName, KeyUsage, X509Extension};
use super::sct::{SctVerification, SignedCertificateTimestamp};
use super::{der_from_pem, oids};
use crate::asn1::Asn1Obj;
use crate::error::{Error, Result};
use crate::hash::sha256;
use crate::signing::SigningScheme;
use crate::stream::ByteStream;
use crate::verification::{verify_signature, PublicKeyAlgorithm};
use chrono::{DateTime, Utc};
use sigstore_types::{DerPublicKey, TransparencyLogInstance};
use tracing::debug;

/// Extensions that may be marked critical
const RECOGNIZED_CRITICAL: [&str; 3] = [
    oids::KEY_USAGE,
    oids::BASIC_CONSTRAINTS,
    oids::SUBJECT_ALT_NAME,
];

/// Largest TBS that fits the three-byte precertificate length
const MAX_PRECERT_TBS_LEN: usize = 0xff_ffff;

/// A parsed X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Certificate {
    root: Asn1Obj,
    tbs: Vec<u8>,
    version: u32,
    serial_number: Vec<u8>,
    issuer: Vec<u8>,
    subject: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    public_key: DerPublicKey,
    signature_algorithm: String,
    signature_value: Vec<u8>,
    extensions: Vec<X509Extension>,
}

impl X509Certificate {
    /// Parse a DER certificate
    ///
    /// Fails on malformed DER, on a TBS missing mandatory fields, and on any
    /// critical extension other than keyUsage, basicConstraints or
    /// subjectAltName.
    pub fn parse(der: &[u8]) -> Result<Self> {
        Self::from_asn1(Asn1Obj::parse_buffer(der)?)
    }

    /// Parse a PEM `CERTIFICATE` block
    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::parse(&der_from_pem(pem)?)
    }

    fn from_asn1(root: Asn1Obj) -> Result<Self> {
        let tbs_obj = root.sub(0)?;

        // [0] EXPLICIT version is optional and shifts every later field
        let (offset, version) = match tbs_obj.sub(0)? {
            first if first.tag.is_context(0) => {
                let raw = first.sub(0)?.to_integer()?;
                let version = u32::try_from(raw)
                    .ok()
                    .and_then(|v| v.checked_add(1))
                    .ok_or_else(|| Error::InvalidCertificate(format!("invalid version {raw}")))?;
                (1, version)
            }
            _ => (0, 1),
        };

        let serial_number = tbs_obj.sub(offset)?.to_integer_bytes()?.to_vec();
        let issuer = tbs_obj.sub(offset + 2)?.to_der();
        let validity = tbs_obj.sub(offset + 3)?;
        let not_before = validity.sub(0)?.to_date()?;
        let not_after = validity.sub(1)?.to_date()?;
        let subject = tbs_obj.sub(offset + 4)?.to_der();
        let public_key = DerPublicKey::new(tbs_obj.sub(offset + 5)?.to_der());

        let signature_algorithm = root.sub(1)?.sub(0)?.to_oid()?;
        let signature_value = root.sub(2)?.to_bit_string()?.to_vec();

        let extensions = match tbs_obj.find_context(3) {
            Some(wrapper) => wrapper
                .sub(0)?
                .subs()
                .iter()
                .map(X509Extension::from_asn1)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        if let Some(ext) = extensions
            .iter()
            .find(|ext| ext.critical && !RECOGNIZED_CRITICAL.contains(&ext.oid.as_str()))
        {
            return Err(Error::InvalidCertificate(format!(
                "unrecognized critical extension {}",
                ext.oid
            )));
        }

        Ok(Self {
            tbs: tbs_obj.to_der(),
            root,
            version,
            serial_number,
            issuer,
            subject,
            not_before,
            not_after,
            public_key,
            signature_algorithm,
            signature_value,
            extensions,
        })
    }

    /// The certificate's DER encoding
    pub fn to_der(&self) -> Vec<u8> {
        self.root.to_der()
    }

    /// The signed `tbsCertificate` bytes
    pub fn tbs_der(&self) -> &[u8] {
        &self.tbs
    }

    /// X.509 version, 1 through 3
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    /// DER of the issuer Name
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    /// DER of the subject Name
    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// SubjectPublicKeyInfo
    pub fn public_key(&self) -> &DerPublicKey {
        &self.public_key
    }

    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    pub fn extensions(&self) -> &[X509Extension] {
        &self.extensions
    }

    pub fn extension(&self, oid: &str) -> Option<&X509Extension> {
        self.extensions.iter().find(|ext| ext.oid == oid)
    }

    pub fn ext_basic_constraints(&self) -> Option<&BasicConstraints> {
        self.extensions.iter().find_map(|ext| match ext.kind() {
            ExtensionKind::BasicConstraints(bc) => Some(bc),
            _ => None,
        })
    }

    pub fn ext_key_usage(&self) -> Option<&KeyUsage> {
        self.extensions.iter().find_map(|ext| match ext.kind() {
            ExtensionKind::KeyUsage(ku) => Some(ku),
            _ => None,
        })
    }

    pub fn ext_subject_alt_name(&self) -> Option<&[GeneralName]> {
        self.extensions.iter().find_map(|ext| match ext.kind() {
            ExtensionKind::SubjectAltName(names) => Some(names.as_slice()),
            _ => None,
        })
    }

    pub fn ext_authority_key_id(&self) -> Option<&[u8]> {
        self.extensions.iter().find_map(|ext| match ext.kind() {
            ExtensionKind::AuthorityKeyId(Some(id)) => Some(id.as_slice()),
            _ => None,
        })
    }

    pub fn ext_subject_key_id(&self) -> Option<&[u8]> {
        self.extensions.iter().find_map(|ext| match ext.kind() {
            ExtensionKind::SubjectKeyId(id) => Some(id.as_slice()),
            _ => None,
        })
    }

    /// Embedded SCTs, empty when the extension is absent
    pub fn ext_scts(&self) -> &[SignedCertificateTimestamp] {
        self.extensions
            .iter()
            .find_map(|ext| match ext.kind() {
                ExtensionKind::EmbeddedScts(scts) => Some(scts.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// OIDC issuer recorded by Fulcio, preferring the DER-encoded v2 extension
    pub fn ext_fulcio_issuer(&self) -> Option<String> {
        if let Some(ext) = self.extension(oids::FULCIO_ISSUER_V2) {
            return Asn1Obj::parse_buffer(ext.value())
                .and_then(|value| value.to_text())
                .ok();
        }
        self.extension(oids::FULCIO_ISSUER_V1)
            .and_then(|ext| String::from_utf8(ext.value().to_vec()).ok())
    }

    /// rfc822Name entries of the subjectAltName
    pub fn san_emails(&self) -> impl Iterator<Item = &str> {
        self.ext_subject_alt_name()
            .unwrap_or_default()
            .iter()
            .filter_map(|name| match name {
                GeneralName::Email(email) => Some(email.as_str()),
                _ => None,
            })
    }

    /// uniformResourceIdentifier entries of the subjectAltName
    pub fn san_uris(&self) -> impl Iterator<Item = &str> {
        self.ext_subject_alt_name()
            .unwrap_or_default()
            .iter()
            .filter_map(|name| match name {
                GeneralName::Uri(uri) => Some(uri.as_str()),
                _ => None,
            })
    }

    /// True when basicConstraints marks this certificate as a CA
    ///
    /// A keyUsage extension without keyCertSign is logged but does not change
    /// the result.
    pub fn is_ca(&self) -> bool {
        let ca = self.ext_basic_constraints().is_some_and(|bc| bc.ca);
        if ca && self.ext_key_usage().is_some_and(|ku| !ku.key_cert_sign()) {
            debug!(
                serial = %hex::encode(&self.serial_number),
                "CA certificate key usage does not include keyCertSign"
            );
        }
        ca
    }

    /// Issuer and subject names are identical
    pub fn is_self_issued(&self) -> bool {
        self.issuer == self.subject
    }

    /// Check the signature over the TBS bytes with `issuer`'s key, or with
    /// this certificate's own key when no issuer is given
    pub fn verify(&self, issuer: Option<&X509Certificate>) -> bool {
        let key = issuer.unwrap_or(self).public_key();
        self.verify_with_key(key).is_ok()
    }

    fn verify_with_key(&self, key: &DerPublicKey) -> Result<()> {
        let key_alg = PublicKeyAlgorithm::from_spki(key.as_bytes())?;
        let scheme = SigningScheme::from_signature_algorithm(&self.signature_algorithm, key_alg)?;
        verify_signature(key, &self.tbs, &self.signature_value, scheme)
    }

    /// True when `at` lies within notBefore..=notAfter
    pub fn valid_for_date(&self, at: DateTime<Utc>) -> bool {
        at >= self.not_before && at <= self.not_after
    }

    /// A new certificate equal to this one with every extension carrying
    /// `oid` removed
    ///
    /// The result keeps the original signature, which no longer covers its
    /// TBS; it exists to reconstruct what a log or CA signed.
    pub fn without_extension(&self, oid: &str) -> Result<Self> {
        let tbs_obj = self.root.sub(0)?;

        let mut fields = Vec::with_capacity(tbs_obj.subs().len());
        for field in tbs_obj.subs() {
            if !field.tag.is_context(3) {
                fields.push(field.clone());
                continue;
            }
            let kept: Vec<Asn1Obj> = field
                .sub(0)?
                .subs()
                .iter()
                .filter(|ext| ext.sub(0).and_then(|id| id.to_oid()).map_or(true, |id| id != oid))
                .cloned()
                .collect();
            if !kept.is_empty() {
                fields.push(Asn1Obj::constructed(
                    field.tag,
                    vec![Asn1Obj::sequence(kept)],
                ));
            }
        }

        let root = Asn1Obj::constructed(
            self.root.tag,
            vec![
                Asn1Obj::constructed(tbs_obj.tag, fields),
                self.root.sub(1)?.clone(),
                self.root.sub(2)?.clone(),
            ],
        );
        Self::from_asn1(root)
    }

    /// Verify each embedded SCT against the CT logs
    ///
    /// Returns one record per SCT. Individual failures are reported as
    /// `verified: false`; only a certificate that cannot be turned into a
    /// precertificate fails outright.
    pub fn verify_scts(
        &self,
        issuer: &X509Certificate,
        logs: &[TransparencyLogInstance],
    ) -> Result<Vec<SctVerification>> {
        let scts = self.ext_scts();
        if scts.is_empty() {
            return Ok(Vec::new());
        }

        let precert_tbs = self.without_extension(oids::EMBEDDED_SCT_LIST)?;
        let tbs = precert_tbs.tbs_der();
        if tbs.len() > MAX_PRECERT_TBS_LEN {
            return Err(Error::InvalidSct(format!(
                "TBS of {} bytes does not fit a precertificate entry",
                tbs.len()
            )));
        }

        let mut precert = ByteStream::new();
        precert.append_block(sha256(issuer.public_key().as_bytes()).as_ref());
        precert.append_u24(tbs.len() as u32);
        precert.append_block(tbs);

        Ok(scts
            .iter()
            .map(|sct| SctVerification {
                log_id: sct.log_id,
                verified: sct.verify(precert.buffer(), logs),
            })
            .collect())
    }
}
