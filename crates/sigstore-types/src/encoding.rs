//! Byte newtypes for hashes, keys, certificates and signatures

use crate::error::{Error, Result};
use base64::Engine;
use std::fmt;

/// A SHA-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash([u8; 32]);

impl Sha256Hash {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build a hash from a slice, failing unless it is exactly 32 bytes
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::InvalidHash(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Parse a hex-encoded hash
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::try_from_slice(&hex::decode(s)?)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({})", self.to_hex())
    }
}

macro_rules! byte_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wrap raw bytes
            pub fn new(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Consume and return the raw bytes
            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }

            /// Number of bytes
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// True when no bytes are held
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Standard base64 encoding of the bytes
            pub fn to_base64(&self) -> String {
                base64::engine::general_purpose::STANDARD.encode(&self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl From<&[u8]> for $name {
            fn from(bytes: &[u8]) -> Self {
                Self(bytes.to_vec())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({} bytes)"), self.0.len())
            }
        }
    };
}

byte_newtype!(
    /// A DER-encoded SubjectPublicKeyInfo
    DerPublicKey
);

byte_newtype!(
    /// A DER-encoded X.509 certificate
    DerCertificate
);

byte_newtype!(
    /// Raw signature bytes, in whatever encoding the scheme produces
    SignatureBytes
);

byte_newtype!(
    /// Identifier of a transparency log, normally the SHA-256 of its public key
    LogKeyId
);

impl LogKeyId {
    /// Lowercase hex encoding, as used in signed entry timestamps
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// True when the first four bytes equal a signed-note key hint
    pub fn matches_hint(&self, hint: &[u8; 4]) -> bool {
        self.0.len() >= 4 && &self.0[..4] == hint
    }
}

impl DerPublicKey {
    /// Encode as a PEM `PUBLIC KEY` block
    pub fn to_pem(&self) -> String {
        let b64 = self.to_base64();
        let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
        for chunk in b64.as_bytes().chunks(64) {
            pem.push_str(&String::from_utf8_lossy(chunk));
            pem.push('\n');
        }
        pem.push_str("-----END PUBLIC KEY-----\n");
        pem
    }
}
