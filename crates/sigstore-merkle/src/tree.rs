//! RFC 6962 tree hashing

use aws_lc_rs::digest::{Context, SHA256};
use sigstore_types::Sha256Hash;

/// Size of every node hash
pub const HASH_SIZE: usize = 32;
/// Domain separator for leaf hashes
pub const LEAF_HASH_PREFIX: u8 = 0x00;
/// Domain separator for interior node hashes
pub const NODE_HASH_PREFIX: u8 = 0x01;

fn finish(ctx: Context) -> Sha256Hash {
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(ctx.finish().as_ref());
    Sha256Hash::from_bytes(out)
}

/// `SHA-256(0x00 || data)`
pub fn hash_leaf(data: &[u8]) -> Sha256Hash {
    let mut ctx = Context::new(&SHA256);
    ctx.update(&[LEAF_HASH_PREFIX]);
    ctx.update(data);
    finish(ctx)
}

/// `SHA-256(0x01 || left || right)`
pub fn hash_children(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    let mut ctx = Context::new(&SHA256);
    ctx.update(&[NODE_HASH_PREFIX]);
    ctx.update(left.as_bytes());
    ctx.update(right.as_bytes());
    finish(ctx)
}

/// Largest power of two strictly below `n`, for `n > 1`
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

/// Merkle tree hash over already-hashed leaves
pub fn root_from_leaf_hashes(leaves: &[Sha256Hash]) -> Sha256Hash {
    match leaves.len() {
        0 => finish(Context::new(&SHA256)),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            hash_children(
                &root_from_leaf_hashes(&leaves[..k]),
                &root_from_leaf_hashes(&leaves[k..]),
            )
        }
    }
}

/// Merkle tree hash over raw leaf data
pub fn root_from_leaves<T: AsRef<[u8]>>(leaves: &[T]) -> Sha256Hash {
    let hashes: Vec<Sha256Hash> = leaves.iter().map(|l| hash_leaf(l.as_ref())).collect();
    root_from_leaf_hashes(&hashes)
}

/// Audit path for leaf `index`, bottom-up
///
/// Returns `None` when `index` is outside the tree.
pub fn inclusion_path(leaves: &[Sha256Hash], index: usize) -> Option<Vec<Sha256Hash>> {
    if index >= leaves.len() {
        return None;
    }
    let mut path = Vec::new();
    collect_path(leaves, index, &mut path);
    Some(path)
}

fn collect_path(leaves: &[Sha256Hash], index: usize, path: &mut Vec<Sha256Hash>) {
    if leaves.len() <= 1 {
        return;
    }
    let k = split_point(leaves.len());
    if index < k {
        collect_path(&leaves[..k], index, path);
        path.push(root_from_leaf_hashes(&leaves[k..]));
    } else {
        collect_path(&leaves[k..], index - k, path);
        path.push(root_from_leaf_hashes(&leaves[..k]));
    }
}
