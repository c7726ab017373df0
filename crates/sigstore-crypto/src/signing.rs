//! Signing schemes, and key generation and signing using aws-lc-rs

use crate::asn1::Asn1Obj;
use crate::error::{Error, Result};
use crate::verification::PublicKeyAlgorithm;
use crate::x509::oids;
use aws_lc_rs::{
    rand::SystemRandom,
    signature::{EcdsaKeyPair, KeyPair as AwsKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING},
};
use sigstore_types::{DerPublicKey, HashAlgorithm, SignatureBytes};

/// Supported signing schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    /// ECDSA P-256 with SHA-256
    EcdsaP256Sha256,
    /// ECDSA P-256 with SHA-384 (non-standard but valid)
    EcdsaP256Sha384,
    /// ECDSA P-384 with SHA-256 (non-standard but valid)
    EcdsaP384Sha256,
    /// ECDSA P-384 with SHA-384
    EcdsaP384Sha384,
    /// Ed25519
    Ed25519,
    /// RSA PSS with SHA-256
    RsaPssSha256,
    /// RSA PSS with SHA-384
    RsaPssSha384,
    /// RSA PSS with SHA-512
    RsaPssSha512,
    /// RSA PKCS#1 v1.5 with SHA-256
    RsaPkcs1Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384
    RsaPkcs1Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512
    RsaPkcs1Sha512,
}

impl SigningScheme {
    /// Get the name of this scheme
    pub fn name(&self) -> &'static str {
        match self {
            SigningScheme::EcdsaP256Sha256 => "ECDSA_P256_SHA256",
            SigningScheme::EcdsaP256Sha384 => "ECDSA_P256_SHA384",
            SigningScheme::EcdsaP384Sha256 => "ECDSA_P384_SHA256",
            SigningScheme::EcdsaP384Sha384 => "ECDSA_P384_SHA384",
            SigningScheme::Ed25519 => "ED25519",
            SigningScheme::RsaPssSha256 => "RSA_PSS_SHA256",
            SigningScheme::RsaPssSha384 => "RSA_PSS_SHA384",
            SigningScheme::RsaPssSha512 => "RSA_PSS_SHA512",
            SigningScheme::RsaPkcs1Sha256 => "RSA_PKCS1_SHA256",
            SigningScheme::RsaPkcs1Sha384 => "RSA_PKCS1_SHA384",
            SigningScheme::RsaPkcs1Sha512 => "RSA_PKCS1_SHA512",
        }
    }

    /// The key type this scheme verifies with
    pub fn key_algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            SigningScheme::EcdsaP256Sha256 | SigningScheme::EcdsaP256Sha384 => {
                PublicKeyAlgorithm::EcP256
            }
            SigningScheme::EcdsaP384Sha256 | SigningScheme::EcdsaP384Sha384 => {
                PublicKeyAlgorithm::EcP384
            }
            SigningScheme::Ed25519 => PublicKeyAlgorithm::Ed25519,
            _ => PublicKeyAlgorithm::Rsa,
        }
    }

    /// Pick the scheme for a key type and message hash
    ///
    /// Ed25519 hashes internally, so `hash` is ignored for it. RSA keys map
    /// to PKCS#1 v1.5; PSS is never inferred.
    pub fn for_key(key: PublicKeyAlgorithm, hash: HashAlgorithm) -> Result<Self> {
        use HashAlgorithm::*;
        use PublicKeyAlgorithm::*;
        match (key, hash) {
            (EcP256, Sha2_256) => Ok(SigningScheme::EcdsaP256Sha256),
            (EcP256, Sha2_384) => Ok(SigningScheme::EcdsaP256Sha384),
            (EcP384, Sha2_256) => Ok(SigningScheme::EcdsaP384Sha256),
            (EcP384, Sha2_384) => Ok(SigningScheme::EcdsaP384Sha384),
            (Ed25519, _) => Ok(SigningScheme::Ed25519),
            (Rsa, Sha2_256) => Ok(SigningScheme::RsaPkcs1Sha256),
            (Rsa, Sha2_384) => Ok(SigningScheme::RsaPkcs1Sha384),
            (Rsa, Sha2_512) => Ok(SigningScheme::RsaPkcs1Sha512),
            (key, hash) => Err(Error::UnsupportedAlgorithm(format!(
                "{key:?} with {}",
                hash.rekor_name()
            ))),
        }
    }

    /// The conventional scheme for a key when nothing else says otherwise
    pub fn default_for_key(key: PublicKeyAlgorithm) -> Self {
        match key {
            PublicKeyAlgorithm::EcP256 => SigningScheme::EcdsaP256Sha256,
            PublicKeyAlgorithm::EcP384 => SigningScheme::EcdsaP384Sha384,
            PublicKeyAlgorithm::Ed25519 => SigningScheme::Ed25519,
            PublicKeyAlgorithm::Rsa => SigningScheme::RsaPkcs1Sha256,
        }
    }

    /// Resolve a certificate `signatureAlgorithm` OID against the issuer's key type
    pub fn from_signature_algorithm(oid: &str, key: PublicKeyAlgorithm) -> Result<Self> {
        let hash = match oid {
            oids::ECDSA_WITH_SHA256 | oids::SHA256_WITH_RSA => HashAlgorithm::Sha2_256,
            oids::ECDSA_WITH_SHA384 | oids::SHA384_WITH_RSA => HashAlgorithm::Sha2_384,
            oids::ECDSA_WITH_SHA512 | oids::SHA512_WITH_RSA => HashAlgorithm::Sha2_512,
            oids::ED25519 => return Ok(SigningScheme::Ed25519),
            other => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "signature algorithm {other}"
                )))
            }
        };
        let is_rsa_oid = matches!(
            oid,
            oids::SHA256_WITH_RSA | oids::SHA384_WITH_RSA | oids::SHA512_WITH_RSA
        );
        if is_rsa_oid != (key == PublicKeyAlgorithm::Rsa) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "signature algorithm {oid} does not match {key:?} key"
            )));
        }
        Self::for_key(key, hash)
    }
}

/// A private key, used to sign test fixtures and checkpoints
pub enum KeyPair {
    EcdsaP256(EcdsaKeyPair),
}

impl KeyPair {
    /// Fresh P-256 key from the system RNG
    pub fn generate_ecdsa_p256() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|_| Error::KeyGeneration("failed to generate ECDSA P-256 key".to_string()))?;
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref())?;
        Ok(KeyPair::EcdsaP256(key_pair))
    }

    /// Uncompressed EC point
    pub fn public_key_bytes(&self) -> &[u8] {
        match self {
            KeyPair::EcdsaP256(kp) => kp.public_key().as_ref(),
        }
    }

    /// DER-encoded ECDSA signature over `data`
    pub fn sign(&self, data: &[u8]) -> Result<SignatureBytes> {
        let rng = SystemRandom::new();
        match self {
            KeyPair::EcdsaP256(kp) => {
                let sig = kp.sign(&rng, data)?;
                Ok(SignatureBytes::new(sig.as_ref().to_vec()))
            }
        }
    }

    /// SubjectPublicKeyInfo for the public half
    pub fn public_key_der(&self) -> Result<DerPublicKey> {
        let (alg, params) = match self {
            KeyPair::EcdsaP256(_) => (oids::EC_PUBLIC_KEY, oids::SECP256R1),
        };
        let spki = Asn1Obj::sequence(vec![
            Asn1Obj::sequence(vec![Asn1Obj::from_oid(alg)?, Asn1Obj::from_oid(params)?]),
            Asn1Obj::bit_string(self.public_key_bytes()),
        ]);
        Ok(DerPublicKey::new(spki.to_der()))
    }
}
