use super::oids;
use super::sct::SignedCertificateTimestamp;
use crate::asn1::{universal, Asn1Obj, TagClass};
use crate::error::{Error, Result};
use tracing::debug;

/// A certificate extension with its decoded form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Extension {
    pub oid: String,
    pub critical: bool,
    value: Vec<u8>,
    kind: ExtensionKind,
}

/// Decoded extension payloads, chosen by OID
///
/// Unknown OIDs, and known OIDs whose value fails to decode, become `Opaque`
/// and keep only their raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionKind {
    BasicConstraints(BasicConstraints),
    KeyUsage(KeyUsage),
    ExtKeyUsage(Vec<String>),
    SubjectAltName(Vec<GeneralName>),
    AuthorityKeyId(Option<Vec<u8>>),
    SubjectKeyId(Vec<u8>),
    EmbeddedScts(Vec<SignedCertificateTimestamp>),
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// keyUsage bits, first octet in the high byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub u16);

/// Entries of a subjectAltName
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralName {
    Email(String),
    Dns(String),
    Uri(String),
    /// `otherName`; `value` is the content of the wrapped value
    OtherName { type_id: String, value: Vec<u8> },
    /// Any other choice, by context tag number
    Other(u32),
}

impl X509Extension {
    pub(crate) fn from_asn1(obj: &Asn1Obj) -> Result<Self> {
        let oid = obj.sub(0)?.to_oid()?;
        let (critical, value_obj) = match obj.subs().len() {
            2 => (false, obj.sub(1)?),
            3 => (obj.sub(1)?.to_boolean()?, obj.sub(2)?),
            n => {
                return Err(Error::InvalidCertificate(format!(
                    "extension {oid} has {n} fields"
                )))
            }
        };
        if !value_obj.tag.is_universal(universal::OCTET_STRING) {
            return Err(Error::InvalidCertificate(format!(
                "extension {oid} value is not an OCTET STRING"
            )));
        }

        let value = value_obj.value().to_vec();
        let kind = ExtensionKind::decode(&oid, &value);
        Ok(Self {
            oid,
            critical,
            value,
            kind,
        })
    }

    /// Raw `extnValue` content
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn kind(&self) -> &ExtensionKind {
        &self.kind
    }
}

impl ExtensionKind {
    fn decode(oid: &str, value: &[u8]) -> Self {
        let decoded = match oid {
            oids::BASIC_CONSTRAINTS => BasicConstraints::decode(value).map(Self::BasicConstraints),
            oids::KEY_USAGE => KeyUsage::decode(value).map(Self::KeyUsage),
            oids::EXT_KEY_USAGE => decode_ext_key_usage(value).map(Self::ExtKeyUsage),
            oids::SUBJECT_ALT_NAME => decode_general_names(value).map(Self::SubjectAltName),
            oids::AUTHORITY_KEY_ID => decode_authority_key_id(value).map(Self::AuthorityKeyId),
            oids::SUBJECT_KEY_ID => Asn1Obj::parse_buffer(value).and_then(|obj| {
                if obj.tag.is_universal(universal::OCTET_STRING) {
                    Ok(Self::SubjectKeyId(obj.value().to_vec()))
                } else {
                    Err(Error::Asn1(format!("expected OCTET STRING, found {}", obj.tag)))
                }
            }),
            oids::EMBEDDED_SCT_LIST => Asn1Obj::parse_buffer(value)
                .and_then(|obj| SignedCertificateTimestamp::parse_list(obj.value()))
                .map(Self::EmbeddedScts),
            _ => return Self::Opaque,
        };

        decoded.unwrap_or_else(|e| {
            debug!(oid, error = %e, "extension value did not decode, keeping it opaque");
            Self::Opaque
        })
    }
}

impl BasicConstraints {
    fn decode(value: &[u8]) -> Result<Self> {
        let seq = Asn1Obj::parse_buffer(value)?;
        let mut constraints = BasicConstraints {
            ca: false,
            path_len: None,
        };
        for field in seq.subs() {
            if field.tag.is_universal(universal::BOOLEAN) {
                constraints.ca = field.to_boolean()?;
            } else {
                let len = field.to_integer()?;
                constraints.path_len = Some(u32::try_from(len).map_err(|_| {
                    Error::InvalidCertificate(format!("invalid pathLenConstraint {len}"))
                })?);
            }
        }
        Ok(constraints)
    }
}

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: u16 = 0x8000;
    pub const KEY_CERT_SIGN: u16 = 0x0400;
    pub const CRL_SIGN: u16 = 0x0200;

    fn decode(value: &[u8]) -> Result<Self> {
        let obj = Asn1Obj::parse_buffer(value)?;
        let bits = obj.to_bit_string()?;
        let high = bits.first().copied().unwrap_or(0);
        let low = bits.get(1).copied().unwrap_or(0);
        Ok(KeyUsage(u16::from_be_bytes([high, low])))
    }

    pub fn digital_signature(&self) -> bool {
        self.0 & Self::DIGITAL_SIGNATURE != 0
    }

    pub fn key_cert_sign(&self) -> bool {
        self.0 & Self::KEY_CERT_SIGN != 0
    }

    pub fn crl_sign(&self) -> bool {
        self.0 & Self::CRL_SIGN != 0
    }
}

fn decode_ext_key_usage(value: &[u8]) -> Result<Vec<String>> {
    Asn1Obj::parse_buffer(value)?
        .subs()
        .iter()
        .map(Asn1Obj::to_oid)
        .collect()
}

fn decode_general_names(value: &[u8]) -> Result<Vec<GeneralName>> {
    let seq = Asn1Obj::parse_buffer(value)?;
    seq.subs().iter().map(GeneralName::decode).collect()
}

fn decode_authority_key_id(value: &[u8]) -> Result<Option<Vec<u8>>> {
    let seq = Asn1Obj::parse_buffer(value)?;
    Ok(seq.find_context(0).map(|id| id.value().to_vec()))
}

impl GeneralName {
    fn decode(obj: &Asn1Obj) -> Result<Self> {
        let text = || {
            String::from_utf8(obj.value().to_vec())
                .map_err(|e| Error::InvalidCertificate(format!("general name is not UTF-8: {e}")))
        };
        if obj.tag.class != TagClass::ContextSpecific {
            return Err(Error::InvalidCertificate(format!(
                "general name has non-context tag {}",
                obj.tag
            )));
        }
        Ok(match obj.tag.number {
            0 => {
                let type_id = obj.sub(0)?.to_oid()?;
                let wrapped = obj.sub(1)?.sub(0)?;
                GeneralName::OtherName {
                    type_id,
                    value: wrapped.value().to_vec(),
                }
            }
            1 => GeneralName::Email(text()?),
            2 => GeneralName::Dns(text()?),
            6 => GeneralName::Uri(text()?),
            n => GeneralName::Other(n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::Asn1Tag;

    fn extension(oid: &str, critical: bool, value: Asn1Obj) -> X509Extension {
        let mut fields = vec![Asn1Obj::from_oid(oid).unwrap()];
        if critical {
            fields.push(Asn1Obj::from_bool(true));
        }
        fields.push(Asn1Obj::octet_string(value.to_der()));
        X509Extension::from_asn1(&Asn1Obj::sequence(fields)).unwrap()
    }

    #[test]
    fn test_basic_constraints() {
        let ext = extension(
            oids::BASIC_CONSTRAINTS,
            true,
            Asn1Obj::sequence(vec![Asn1Obj::from_bool(true), Asn1Obj::from_u64(1)]),
        );
        assert!(ext.critical);
        assert_eq!(
            ext.kind(),
            &ExtensionKind::BasicConstraints(BasicConstraints {
                ca: true,
                path_len: Some(1)
            })
        );

        // cA defaults to FALSE when absent
        let ext = extension(oids::BASIC_CONSTRAINTS, false, Asn1Obj::sequence(vec![]));
        assert_eq!(
            ext.kind(),
            &ExtensionKind::BasicConstraints(BasicConstraints {
                ca: false,
                path_len: None
            })
        );
    }

    #[test]
    fn test_key_usage_bits() {
        let ext = extension(oids::KEY_USAGE, true, Asn1Obj::bit_string(&[0x06]));
        match ext.kind() {
            ExtensionKind::KeyUsage(ku) => {
                assert!(ku.key_cert_sign());
                assert!(ku.crl_sign());
                assert!(!ku.digital_signature());
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_subject_alt_name() {
        let san = Asn1Obj::sequence(vec![
            Asn1Obj::new(Asn1Tag::context(1, false), b"dev@example.com".to_vec()),
            Asn1Obj::new(Asn1Tag::context(6, false), b"https://example.com/ci".to_vec()),
            Asn1Obj::constructed(
                Asn1Tag::context(0, true),
                vec![
                    Asn1Obj::from_oid("1.3.6.1.4.1.57264.1.7").unwrap(),
                    Asn1Obj::constructed(
                        Asn1Tag::context(0, true),
                        vec![Asn1Obj::utf8_string("octocat")],
                    ),
                ],
            ),
        ]);
        let ext = extension(oids::SUBJECT_ALT_NAME, false, san);
        let ExtensionKind::SubjectAltName(names) = ext.kind() else {
            panic!("expected SAN");
        };
        assert_eq!(names[0], GeneralName::Email("dev@example.com".into()));
        assert_eq!(names[1], GeneralName::Uri("https://example.com/ci".into()));
        assert_eq!(
            names[2],
            GeneralName::OtherName {
                type_id: "1.3.6.1.4.1.57264.1.7".into(),
                value: b"octocat".to_vec()
            }
        );
    }

    #[test]
    fn test_key_identifiers() {
        let ski = extension(
            oids::SUBJECT_KEY_ID,
            false,
            Asn1Obj::octet_string(vec![0xab; 20]),
        );
        assert_eq!(ski.kind(), &ExtensionKind::SubjectKeyId(vec![0xab; 20]));

        let aki = extension(
            oids::AUTHORITY_KEY_ID,
            false,
            Asn1Obj::sequence(vec![Asn1Obj::new(Asn1Tag::context(0, false), vec![0xcd; 20])]),
        );
        assert_eq!(aki.kind(), &ExtensionKind::AuthorityKeyId(Some(vec![0xcd; 20])));
    }

    #[test]
    fn test_unknown_and_malformed_are_opaque() {
        let ext = extension("1.3.6.1.4.1.57264.1.8", false, Asn1Obj::utf8_string("x"));
        assert_eq!(ext.kind(), &ExtensionKind::Opaque);
        assert_eq!(ext.value(), Asn1Obj::utf8_string("x").to_der());

        let ext = extension(oids::KEY_USAGE, true, Asn1Obj::from_u64(3));
        assert_eq!(ext.kind(), &ExtensionKind::Opaque);
    }
}
