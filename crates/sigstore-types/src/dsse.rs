//! Dead Simple Signing Envelope

use crate::encoding::SignatureBytes;

/// A DSSE envelope with the payload already base64-decoded
#[derive(Debug, Clone)]
pub struct DsseEnvelope {
    pub payload_type: String,
    pub payload: Vec<u8>,
    pub signatures: Vec<DsseSignature>,
}

/// One envelope signature
#[derive(Debug, Clone)]
pub struct DsseSignature {
    pub sig: SignatureBytes,
    pub keyid: String,
}

impl DsseEnvelope {
    /// Pre-authentication encoding of this envelope's payload
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type, &self.payload)
    }
}

/// Compute the DSSE v1 pre-authentication encoding
///
/// `"DSSEv1" SP len(type) SP type SP len(payload) SP payload`, lengths in
/// ASCII decimal.
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let header = format!(
        "DSSEv1 {} {} {} ",
        payload_type.len(),
        payload_type,
        payload.len()
    );
    let mut out = Vec::with_capacity(header.len() + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}
