//! RFC 6962 Merkle tree verification for Sigstore
//!
//! Transparency logs commit to their entries in a Merkle tree; an inclusion
//! proof is the list of sibling hashes from an entry's leaf up to the root.

pub mod error;
pub mod proof;
pub mod tree;

pub use error::{Error, Result};
pub use proof::{root_from_inclusion_proof, verify_inclusion_proof, verify_inclusion_proof_base64};
pub use tree::{
    hash_children, hash_leaf, inclusion_path, root_from_leaf_hashes, root_from_leaves, HASH_SIZE,
    LEAF_HASH_PREFIX, NODE_HASH_PREFIX,
};
