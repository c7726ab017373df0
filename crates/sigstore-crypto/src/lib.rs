//! Decoding and cryptographic primitives for Sigstore verification
//!
//! This crate holds everything that touches raw bytes: a cursor over binary
//! buffers, a strict DER decoder, the X.509 certificate model with embedded
//! SCTs, signed-note checkpoints, and signature verification on top of
//! aws-lc-rs.

pub mod asn1;
pub mod checkpoint;
pub mod error;
pub mod hash;
pub mod keyring;
pub mod signing;
pub mod stream;
pub mod verification;
pub mod x509;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use asn1::Asn1Obj;
pub use checkpoint::{LogCheckpoint, NoteSignature, SignedNote};
pub use error::{Error, Result};
pub use hash::{digest, sha256};
pub use keyring::Keyring;
pub use signing::{KeyPair, SigningScheme};
pub use stream::ByteStream;
pub use verification::{verify_signature, PublicKeyAlgorithm, VerificationKey};
pub use x509::{der_from_pem, X509Certificate};
