//! Offline verification of Sigstore bundles
//!
//! A [`Verifier`] checks a decoded bundle against a trusted root:
//!
//! 1. the signature over the artifact (or DSSE payload),
//! 2. the signing certificate's path to a trusted authority, its embedded
//!    SCTs and the signer identity,
//! 3. the transparency log entries recording the signing event.
//!
//! Fetching bundles, trusted roots and log entries is up to the caller;
//! nothing here does I/O.
//!
//! ```no_run
//! use sigstore_verify::{CertificateIdentity, SanMatcher, VerificationPolicy, Verifier};
//! # fn run(
//! #     trusted_root: &sigstore_types::TrustedRoot,
//! #     bundle: &sigstore_types::Bundle,
//! #     artifact: &[u8],
//! # ) -> sigstore_verify::Result<()> {
//! let policy = VerificationPolicy::default().require_identity(CertificateIdentity::new(
//!     "https://token.actions.githubusercontent.com",
//!     SanMatcher::Email("release@example.com".into()),
//! ));
//! Verifier::new(trusted_root).verify(bundle, Some(artifact), &policy)?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod error;
pub mod key;
pub mod policy;
mod verify;
pub(crate) mod verify_impl;

pub use chain::CertificateChainVerifier;
pub use error::{Error, Result, VerificationStage};
pub use key::KeySelector;
pub use policy::{CertificateIdentity, ObjectIdentifierValuePair, SanMatcher, VerificationPolicy};
pub use verify::Verifier;
