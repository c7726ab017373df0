//! Inclusion proof verification (RFC 9162 §2.1.3.2)

use crate::error::{Error, Result};
use crate::tree::{hash_children, HASH_SIZE};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sigstore_types::Sha256Hash;
use tracing::debug;

/// Verify that `leaf_hash` sits at `index` in a tree of `tree_size` leaves
/// with root `root_hash`
///
/// `proof` lists the sibling hashes bottom-up, as Rekor returns them.
pub fn verify_inclusion_proof(
    leaf_hash: &Sha256Hash,
    index: u64,
    tree_size: u64,
    proof: &[Sha256Hash],
    root_hash: &Sha256Hash,
) -> Result<()> {
    let computed = root_from_inclusion_proof(leaf_hash, index, tree_size, proof)?;
    if &computed != root_hash {
        return Err(Error::RootMismatch {
            computed: computed.to_hex(),
            expected: root_hash.to_hex(),
        });
    }
    debug!(index, tree_size, "inclusion proof verified");
    Ok(())
}

/// Like [`verify_inclusion_proof`] with base64-encoded hashes
pub fn verify_inclusion_proof_base64(
    leaf_hash: &Sha256Hash,
    index: u64,
    tree_size: u64,
    proof: &[String],
    root_hash: &str,
) -> Result<()> {
    let proof = proof
        .iter()
        .map(|h| decode_hash(&STANDARD.decode(h)?))
        .collect::<Result<Vec<_>>>()?;
    let root = decode_hash(&STANDARD.decode(root_hash)?)?;
    verify_inclusion_proof(leaf_hash, index, tree_size, &proof, &root)
}

fn decode_hash(bytes: &[u8]) -> Result<Sha256Hash> {
    if bytes.len() != HASH_SIZE {
        return Err(Error::InvalidHashLength(bytes.len()));
    }
    Sha256Hash::try_from_slice(bytes).map_err(|_| Error::InvalidHashLength(bytes.len()))
}

/// Recompute the root a proof commits to
pub fn root_from_inclusion_proof(
    leaf_hash: &Sha256Hash,
    index: u64,
    tree_size: u64,
    proof: &[Sha256Hash],
) -> Result<Sha256Hash> {
    if index >= tree_size {
        return Err(Error::IndexOutOfRange { index, tree_size });
    }

    // inner: levels where the path stays inside the complete left subtree;
    // border: levels where the leaf's ancestor is a right child on the tree's right edge
    let inner = (u64::BITS - (index ^ (tree_size - 1)).leading_zeros()) as usize;
    // inner reaches 64 once tree_size exceeds 2^63
    let border = index.checked_shr(inner as u32).unwrap_or(0).count_ones() as usize;
    if proof.len() != inner + border {
        return Err(Error::WrongProofLength {
            expected: inner + border,
            actual: proof.len(),
        });
    }

    let mut hash = *leaf_hash;
    for (level, sibling) in proof[..inner].iter().enumerate() {
        hash = if (index >> level) & 1 == 0 {
            hash_children(&hash, sibling)
        } else {
            hash_children(sibling, &hash)
        };
    }
    for sibling in &proof[inner..] {
        hash = hash_children(sibling, &hash);
    }
    Ok(hash)
}
