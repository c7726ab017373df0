//! Signature verification using aws-lc-rs

use crate::asn1::Asn1Obj;
use crate::error::{Error, Result};
use crate::signing::SigningScheme;
use crate::x509::oids;
use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use sigstore_types::DerPublicKey;

/// Public key types found in SubjectPublicKeyInfo structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyAlgorithm {
    EcP256,
    EcP384,
    Ed25519,
    Rsa,
}

impl PublicKeyAlgorithm {
    /// Identify the key type of a DER SubjectPublicKeyInfo
    pub fn from_spki(spki_der: &[u8]) -> Result<Self> {
        let (alg, _) = decode_spki(spki_der)?;
        Ok(alg)
    }
}

/// Split an SPKI into its key type and the raw key bits aws-lc-rs expects
fn decode_spki(spki_der: &[u8]) -> Result<(PublicKeyAlgorithm, Vec<u8>)> {
    let spki = Asn1Obj::parse_buffer(spki_der)?;
    let algorithm = spki.sub(0)?;
    let oid = algorithm.sub(0)?.to_oid()?;

    let alg = match oid.as_str() {
        oids::EC_PUBLIC_KEY => {
            let curve = algorithm
                .sub(1)
                .and_then(|p| p.to_oid())
                .map_err(|_| Error::InvalidKey("EC key without named curve".into()))?;
            match curve.as_str() {
                oids::SECP256R1 => PublicKeyAlgorithm::EcP256,
                oids::SECP384R1 => PublicKeyAlgorithm::EcP384,
                other => {
                    return Err(Error::UnsupportedAlgorithm(format!("EC curve {other}")));
                }
            }
        }
        oids::RSA_ENCRYPTION => PublicKeyAlgorithm::Rsa,
        oids::ED25519 => PublicKeyAlgorithm::Ed25519,
        other => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "public key algorithm {other}"
            )))
        }
    };

    let key_bits = spki.sub(1)?.to_bit_string()?.to_vec();
    Ok((alg, key_bits))
}

fn verification_algorithm(scheme: SigningScheme) -> &'static dyn VerificationAlgorithm {
    match scheme {
        SigningScheme::EcdsaP256Sha256 => &signature::ECDSA_P256_SHA256_ASN1,
        SigningScheme::EcdsaP256Sha384 => &signature::ECDSA_P256_SHA384_ASN1,
        SigningScheme::EcdsaP384Sha256 => &signature::ECDSA_P384_SHA256_ASN1,
        SigningScheme::EcdsaP384Sha384 => &signature::ECDSA_P384_SHA384_ASN1,
        SigningScheme::Ed25519 => &signature::ED25519,
        SigningScheme::RsaPssSha256 => &signature::RSA_PSS_2048_8192_SHA256,
        SigningScheme::RsaPssSha384 => &signature::RSA_PSS_2048_8192_SHA384,
        SigningScheme::RsaPssSha512 => &signature::RSA_PSS_2048_8192_SHA512,
        SigningScheme::RsaPkcs1Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        SigningScheme::RsaPkcs1Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        SigningScheme::RsaPkcs1Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
    }
}

/// A public key bound to the scheme it verifies with
#[derive(Debug, Clone)]
pub struct VerificationKey {
    scheme: SigningScheme,
    key_bits: Vec<u8>,
}

impl VerificationKey {
    /// Build a key from an SPKI, checking that the scheme fits the key type
    pub fn from_spki(spki: &DerPublicKey, scheme: SigningScheme) -> Result<Self> {
        Self::from_spki_der(spki.as_bytes(), Some(scheme))
    }

    /// Build a key from raw SPKI bytes; without a scheme the key type's default is used
    pub fn from_spki_der(spki_der: &[u8], scheme: Option<SigningScheme>) -> Result<Self> {
        let (alg, key_bits) = decode_spki(spki_der)?;
        let scheme = scheme.unwrap_or_else(|| SigningScheme::default_for_key(alg));
        if scheme.key_algorithm() != alg {
            return Err(Error::InvalidKey(format!(
                "{} cannot be used with a {alg:?} key",
                scheme.name()
            )));
        }
        Ok(Self { scheme, key_bits })
    }

    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// Verify `signature` over `data`
    pub fn verify(&self, data: impl AsRef<[u8]>, signature: &[u8]) -> Result<()> {
        UnparsedPublicKey::new(verification_algorithm(self.scheme), &self.key_bits)
            .verify(data.as_ref(), signature)
            .map_err(|_| Error::Verification(format!("{} signature is invalid", self.scheme.name())))
    }
}

/// Verify a signature with an SPKI public key and an explicit scheme
pub fn verify_signature(
    spki: &DerPublicKey,
    data: &[u8],
    signature: &[u8],
    scheme: SigningScheme,
) -> Result<()> {
    VerificationKey::from_spki(spki, scheme)?.verify(data, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::KeyPair;

    #[test]
    fn test_verify_roundtrip_and_tamper() {
        let kp = KeyPair::generate_ecdsa_p256().unwrap();
        let spki = kp.public_key_der().unwrap();
        let sig = kp.sign(b"test data").unwrap();

        let key = VerificationKey::from_spki(&spki, SigningScheme::EcdsaP256Sha256).unwrap();
        assert!(key.verify(b"test data", sig.as_bytes()).is_ok());
        assert!(key.verify(b"test datA", sig.as_bytes()).is_err());

        let mut bad = sig.as_bytes().to_vec();
        let last = bad.len() - 1;
        bad[last] ^= 0x01;
        assert!(key.verify(b"test data", &bad).is_err());
    }

    #[test]
    fn test_scheme_must_match_key() {
        let kp = KeyPair::generate_ecdsa_p256().unwrap();
        let spki = kp.public_key_der().unwrap();
        assert!(VerificationKey::from_spki(&spki, SigningScheme::EcdsaP384Sha384).is_err());
        assert!(VerificationKey::from_spki(&spki, SigningScheme::Ed25519).is_err());

        let key = VerificationKey::from_spki_der(spki.as_bytes(), None).unwrap();
        assert_eq!(key.scheme(), SigningScheme::EcdsaP256Sha256);
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = KeyPair::generate_ecdsa_p256().unwrap();
        let other = KeyPair::generate_ecdsa_p256().unwrap();
        let sig = signer.sign(b"payload").unwrap();
        let result = verify_signature(
            &other.public_key_der().unwrap(),
            b"payload",
            sig.as_bytes(),
            SigningScheme::EcdsaP256Sha256,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_key_type() {
        let spki = Asn1Obj::sequence(vec![
            Asn1Obj::sequence(vec![Asn1Obj::from_oid("1.2.3.4").unwrap()]),
            Asn1Obj::bit_string(&[1, 2, 3]),
        ]);
        assert!(PublicKeyAlgorithm::from_spki(&spki.to_der()).is_err());
    }
}
