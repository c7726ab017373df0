//! Per-stage verification steps used by [`crate::Verifier`]

pub(crate) mod hashedrekord;
pub(crate) mod helpers;
pub(crate) mod rekor;
pub(crate) mod sct;
pub(crate) mod tlog;

pub use helpers::{extract_certificates, extract_signature_bytes};
pub use sct::verify_sct_threshold;
pub use tlog::verify_tlog_entries;
