//! Bundle validation for Sigstore
//!
//! Checks that a bundle carries everything its media-type version requires
//! before any cryptography runs. Bundles arrive already decoded; see
//! `sigstore-types` for the model (versions 0.1, 0.2, and 0.3).

pub mod error;
pub mod validation;

pub use error::{Error, Result};
pub use validation::{validate_bundle, validate_bundle_with_options, ValidationOptions};
