//! Digests over aws-lc-rs

use aws_lc_rs::digest::{self, SHA256, SHA384, SHA512};
use sigstore_types::{HashAlgorithm, Sha256Hash};

/// SHA-256 of `data` as a typed hash
pub fn sha256(data: &[u8]) -> Sha256Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest::digest(&SHA256, data).as_ref());
    Sha256Hash::from_bytes(out)
}

/// Digest of `data` under `algorithm`, as bundles record message digests
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        HashAlgorithm::Sha2_256 => &SHA256,
        HashAlgorithm::Sha2_384 => &SHA384,
        HashAlgorithm::Sha2_512 => &SHA512,
    };
    digest::digest(alg, data).as_ref().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256(b"hello").to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_digest_lengths() {
        for alg in [
            HashAlgorithm::Sha2_256,
            HashAlgorithm::Sha2_384,
            HashAlgorithm::Sha2_512,
        ] {
            assert_eq!(digest(alg, b"abc").len(), alg.output_len());
        }
        assert_eq!(
            digest(HashAlgorithm::Sha2_256, b"hello"),
            sha256(b"hello").as_ref()
        );
    }
}
