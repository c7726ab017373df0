//! Rekor transparency-log entry bodies
//!
//! Each log entry carries a canonicalized JSON body whose shape depends on
//! the entry kind and API version. This crate decodes the kinds Sigstore
//! bundles reference so that verifiers can compare them with the bundle.

pub mod body;
pub mod error;

pub use body::{
    DsseV001Body, HashValue, HashedRekordV001Body, IntotoV001Body, IntotoV002Body, RekorEntryBody,
};
pub use error::{Error, Result};
