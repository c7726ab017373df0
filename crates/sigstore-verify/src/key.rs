//! Resolution of public-key hints
//!
//! Bundles signed with a long-lived key carry only a hint naming the key.
//! The caller decides what hints mean by supplying a [`KeySelector`].

use sigstore_types::DerPublicKey;
use std::collections::HashMap;

/// Maps a bundle's public-key hint to an SPKI
pub trait KeySelector {
    fn select_key(&self, hint: &str) -> Option<DerPublicKey>;
}

impl KeySelector for HashMap<String, DerPublicKey> {
    fn select_key(&self, hint: &str) -> Option<DerPublicKey> {
        self.get(hint).cloned()
    }
}

impl<F> KeySelector for F
where
    F: Fn(&str) -> Option<DerPublicKey>,
{
    fn select_key(&self, hint: &str) -> Option<DerPublicKey> {
        self(hint)
    }
}
