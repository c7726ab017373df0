//! Canonicalized entry bodies by kind and version
//!
//! Field names follow the Rekor OpenAPI types. Hash values are lowercase hex;
//! signatures and keys are base64. The intoto 0.0.2 envelope stores payload
//! and signatures base64-encoded a second time.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// A decoded entry body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RekorEntryBody {
    HashedRekordV001(HashedRekordV001Body),
    IntotoV001(IntotoV001Body),
    IntotoV002(IntotoV002Body),
    DsseV001(DsseV001Body),
}

impl RekorEntryBody {
    /// Decode canonicalized JSON for the given kind and version
    pub fn from_json(bytes: &[u8], kind: &str, version: &str) -> Result<Self> {
        let header: Header = serde_json::from_slice(bytes)?;
        if header.kind != kind || header.api_version != version {
            return Err(Error::KindMismatch {
                expected: format!("{kind} {version}"),
                found: format!("{} {}", header.kind, header.api_version),
            });
        }

        Ok(match (kind, version) {
            ("hashedrekord", "0.0.1") => Self::HashedRekordV001(serde_json::from_slice(bytes)?),
            ("intoto", "0.0.1") => Self::IntotoV001(serde_json::from_slice(bytes)?),
            ("intoto", "0.0.2") => Self::IntotoV002(serde_json::from_slice(bytes)?),
            ("dsse", "0.0.1") => Self::DsseV001(serde_json::from_slice(bytes)?),
            _ => {
                return Err(Error::UnsupportedKind {
                    kind: kind.to_string(),
                    version: version.to_string(),
                })
            }
        })
    }

    /// Decode base64 of canonicalized JSON
    pub fn from_base64_json(encoded: &str, kind: &str, version: &str) -> Result<Self> {
        Self::from_json(&STANDARD.decode(encoded)?, kind, version)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    api_version: String,
    kind: String,
}

/// `{algorithm, value}` with a hex value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashValue {
    pub algorithm: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedRekordV001Body {
    pub api_version: String,
    pub kind: String,
    pub spec: HashedRekordSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedRekordSpec {
    pub data: HashedRekordData,
    pub signature: HashedRekordSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedRekordData {
    pub hash: HashValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedRekordSignature {
    /// Base64 signature
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeyContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyContent {
    /// Base64 PEM certificate or public key
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoV001Body {
    pub api_version: String,
    pub kind: String,
    pub spec: IntotoV001Spec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoV001Spec {
    pub content: IntotoV001Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoV001Content {
    /// Hash of the whole envelope as submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashValue>,
    pub payload_hash: HashValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoV002Body {
    pub api_version: String,
    pub kind: String,
    pub spec: IntotoV002Spec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntotoV002Spec {
    pub content: IntotoV002Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoV002Content {
    pub envelope: IntotoEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<HashValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoEnvelope {
    pub payload_type: String,
    /// Absent once Rekor has stripped the payload from stored entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub signatures: Vec<IntotoSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoSignature {
    /// base64 of the base64 signature
    pub sig: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl IntotoSignature {
    /// Raw signature bytes
    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        let once = STANDARD.decode(&self.sig)?;
        Ok(STANDARD.decode(once)?)
    }
}

impl IntotoEnvelope {
    /// Raw payload bytes, when the entry still carries them
    pub fn payload_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.payload
            .as_ref()
            .map(|payload| Ok(STANDARD.decode(STANDARD.decode(payload)?)?))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseV001Body {
    pub api_version: String,
    pub kind: String,
    pub spec: DsseV001Spec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseV001Spec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_hash: Option<HashValue>,
    pub payload_hash: HashValue,
    pub signatures: Vec<DsseSignatureEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsseSignatureEntry {
    /// Base64 signature
    pub signature: String,
    /// Base64 PEM of the verifying key or certificate
    pub verifier: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASHEDREKORD: &str = r#"{"apiVersion":"0.0.1","kind":"hashedrekord","spec":{"data":{"hash":{"algorithm":"sha256","value":"a0cfc71271d6e278e57cd332ff957c3f7043fdda354c4cbb190a30d56efa01bf"}},"signature":{"content":"MEUCIQDx","publicKey":{"content":"LS0tLS1CRUdJTg=="}}}}"#;

    #[test]
    fn test_hashedrekord() {
        let body = RekorEntryBody::from_json(HASHEDREKORD.as_bytes(), "hashedrekord", "0.0.1")
            .unwrap();
        let RekorEntryBody::HashedRekordV001(body) = body else {
            panic!("wrong variant");
        };
        assert_eq!(body.spec.data.hash.algorithm, "sha256");
        assert_eq!(body.spec.signature.content, "MEUCIQDx");
        assert!(body.spec.signature.public_key.is_some());

        let encoded = STANDARD.encode(HASHEDREKORD);
        assert!(RekorEntryBody::from_base64_json(&encoded, "hashedrekord", "0.0.1").is_ok());
    }

    #[test]
    fn test_kind_mismatch_and_unknown_kind() {
        let err = RekorEntryBody::from_json(HASHEDREKORD.as_bytes(), "dsse", "0.0.1").unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));

        let rekord = r#"{"apiVersion":"0.0.1","kind":"rekord","spec":{}}"#;
        let err = RekorEntryBody::from_json(rekord.as_bytes(), "rekord", "0.0.1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { .. }));

        assert!(RekorEntryBody::from_json(b"not json", "hashedrekord", "0.0.1").is_err());
    }

    #[test]
    fn test_intoto_v002_double_encoding() {
        let payload = STANDARD.encode(STANDARD.encode(b"{\"_type\":\"statement\"}"));
        let sig = STANDARD.encode(STANDARD.encode([1u8, 2, 3]));
        let json = format!(
            r#"{{"apiVersion":"0.0.2","kind":"intoto","spec":{{"content":{{"envelope":{{"payloadType":"application/vnd.in-toto+json","payload":"{payload}","signatures":[{{"sig":"{sig}","publicKey":"a2V5"}}]}},"payloadHash":{{"algorithm":"sha256","value":"00"}}}}}}}}"#
        );
        let RekorEntryBody::IntotoV002(body) =
            RekorEntryBody::from_json(json.as_bytes(), "intoto", "0.0.2").unwrap()
        else {
            panic!("wrong variant");
        };
        let envelope = &body.spec.content.envelope;
        assert_eq!(
            envelope.payload_bytes().unwrap().unwrap(),
            b"{\"_type\":\"statement\"}"
        );
        assert_eq!(envelope.signatures[0].signature_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dsse_v001() {
        let json = r#"{"apiVersion":"0.0.1","kind":"dsse","spec":{"envelopeHash":{"algorithm":"sha256","value":"aa"},"payloadHash":{"algorithm":"sha256","value":"bb"},"signatures":[{"signature":"c2ln","verifier":"a2V5"}]}}"#;
        let RekorEntryBody::DsseV001(body) =
            RekorEntryBody::from_json(json.as_bytes(), "dsse", "0.0.1").unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(body.spec.payload_hash.value, "bb");
        assert_eq!(body.spec.signatures[0].signature, "c2ln");
    }

    #[test]
    fn test_intoto_v001() {
        let json = r#"{"apiVersion":"0.0.1","kind":"intoto","spec":{"content":{"hash":{"algorithm":"sha256","value":"aa"},"payloadHash":{"algorithm":"sha256","value":"bb"}},"publicKey":"a2V5"}}"#;
        let RekorEntryBody::IntotoV001(body) =
            RekorEntryBody::from_json(json.as_bytes(), "intoto", "0.0.1").unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(body.spec.content.payload_hash.value, "bb");
    }
}
