//! Certificate path building and validation
//!
//! Issuers are discovered by key identifier, or by name when a certificate
//! has no authority key identifier, and kept only when their key verifies
//! the certificate's signature. Every path up to a self-signed certificate
//! is enumerated; the shortest one that touches the trusted set wins.

use crate::error::{Error, Result, VerificationStage};
use chrono::{DateTime, Utc};
use sigstore_crypto::X509Certificate;
use sigstore_types::CertificateAuthority;
use std::collections::HashMap;
use tracing::debug;

/// Longest leaf-to-root path considered
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Builds and checks leaf-to-root paths against one authority's certificates
#[derive(Debug, Clone)]
pub struct CertificateChainVerifier {
    certs: Vec<X509Certificate>,
    /// Parallel to `certs`
    trusted: Vec<bool>,
}

impl CertificateChainVerifier {
    pub fn new(trusted: Vec<X509Certificate>) -> Self {
        let mut verifier = Self {
            certs: Vec::with_capacity(trusted.len()),
            trusted: Vec::with_capacity(trusted.len()),
        };
        for cert in trusted {
            verifier.add(cert, true);
        }
        verifier
    }

    /// Trust the certificate chain of `authority`
    pub fn from_authority(authority: &CertificateAuthority) -> Result<Self> {
        let certs = authority
            .cert_chain
            .iter()
            .map(|der| X509Certificate::parse(der.as_bytes()))
            .collect::<sigstore_crypto::Result<Vec<_>>>()
            .map_err(|e| Error::Decode(format!("authority {}: {e}", authority.uri)))?;
        Ok(Self::new(certs))
    }

    /// Offer extra issuer candidates that are not trusted by themselves
    pub fn with_untrusted(mut self, certs: impl IntoIterator<Item = X509Certificate>) -> Self {
        for cert in certs {
            self.add(cert, false);
        }
        self
    }

    fn add(&mut self, cert: X509Certificate, trusted: bool) {
        match self.certs.iter().position(|known| known == &cert) {
            Some(index) => self.trusted[index] |= trusted,
            None => {
                self.certs.push(cert);
                self.trusted.push(trusted);
            }
        }
    }

    /// Find the shortest trusted path for `leaf` and check it at `at`
    ///
    /// Returns the path leaf first, root last.
    pub fn verify(
        &self,
        leaf: &X509Certificate,
        at: DateTime<Utc>,
    ) -> Result<Vec<X509Certificate>> {
        let mut search = PathSearch::new(self, leaf);
        let paths = search.paths_from(0, &mut Vec::new())?;
        debug!(candidates = paths.len(), "built certificate paths");
        if paths.is_empty() {
            return Err(chain_error("no valid certificate path found"));
        }

        let path = paths
            .into_iter()
            .filter(|path| path.iter().any(|&index| search.trusted[index]))
            .min_by_key(Vec::len)
            .ok_or_else(|| chain_error("no trusted certificate path found"))?;

        let chain: Vec<X509Certificate> = path
            .into_iter()
            .map(|index| search.certs[index].clone())
            .collect();
        check_path(&chain, at)?;
        Ok(chain)
    }
}

/// Issuer search state for one leaf
struct PathSearch<'c> {
    /// The leaf at index 0, then the known certificates
    certs: Vec<&'c X509Certificate>,
    trusted: Vec<bool>,
    /// Keyed by certificate and the sorted stack its paths were built under
    memo: HashMap<(usize, Vec<usize>), Vec<Vec<usize>>>,
}

impl<'c> PathSearch<'c> {
    fn new(verifier: &'c CertificateChainVerifier, leaf: &'c X509Certificate) -> Self {
        let mut certs = vec![leaf];
        let mut trusted = vec![false];
        for (cert, &is_trusted) in verifier.certs.iter().zip(&verifier.trusted) {
            if cert == leaf {
                trusted[0] |= is_trusted;
            } else {
                certs.push(cert);
                trusted.push(is_trusted);
            }
        }
        Self {
            certs,
            trusted,
            memo: HashMap::new(),
        }
    }

    /// Every path from `index` to a self-signed certificate that avoids `stack`
    ///
    /// A certificate without any verifying issuer yields no paths.
    fn paths_from(&mut self, index: usize, stack: &mut Vec<usize>) -> Result<Vec<Vec<usize>>> {
        let mut visited = stack.clone();
        visited.sort_unstable();
        let key = (index, visited);
        if let Some(paths) = self.memo.get(&key) {
            return Ok(paths.clone());
        }
        if stack.len() >= MAX_CHAIN_DEPTH {
            return Err(chain_error(format!(
                "certificate path exceeds {MAX_CHAIN_DEPTH} certificates"
            )));
        }

        let cert = self.certs[index];
        let paths = if cert.is_self_issued() && cert.verify(None) {
            vec![vec![index]]
        } else {
            let issuers = self.issuers_of(index, stack);
            if issuers.is_empty() {
                debug!(
                    serial = %hex::encode(cert.serial_number()),
                    "no issuer verifies certificate"
                );
                return Ok(Vec::new());
            }
            stack.push(index);
            let mut paths = Vec::new();
            for issuer in issuers {
                for tail in self.paths_from(issuer, stack)? {
                    let mut path = Vec::with_capacity(tail.len() + 1);
                    path.push(index);
                    path.extend(tail);
                    paths.push(path);
                }
            }
            stack.pop();
            paths
        };

        self.memo.insert(key, paths.clone());
        Ok(paths)
    }

    /// Known certificates whose key verifies the certificate at `index`
    fn issuers_of(&self, index: usize, stack: &[usize]) -> Vec<usize> {
        let cert = self.certs[index];
        let authority_key_id = cert.ext_authority_key_id();

        self.certs
            .iter()
            .enumerate()
            .filter(|(candidate, _)| *candidate != index && !stack.contains(candidate))
            .filter(|(_, candidate)| match authority_key_id {
                Some(aki) => candidate.ext_subject_key_id() == Some(aki),
                None => candidate.subject() == cert.issuer(),
            })
            .filter(|(_, candidate)| cert.verify(Some(**candidate)))
            .map(|(candidate, _)| candidate)
            .collect()
    }
}

/// Validate an ordered leaf-to-root path at `at`
///
/// Every certificate must be valid at `at`, every certificate after the leaf
/// must be a CA that issued its predecessor, and no CA may have more
/// intermediates below it than its path length constraint allows.
pub fn check_path(path: &[X509Certificate], at: DateTime<Utc>) -> Result<()> {
    if path.is_empty() {
        return Err(chain_error("empty certificate path"));
    }

    for cert in path {
        if !cert.valid_for_date(at) {
            return Err(chain_error(format!(
                "certificate {} is not valid at {at}: valid {} to {}",
                hex::encode(cert.serial_number()),
                cert.not_before(),
                cert.not_after()
            )));
        }
    }

    for (position, pair) in path.windows(2).enumerate() {
        let (child, parent) = (&pair[0], &pair[1]);
        if child.issuer() != parent.subject() {
            return Err(chain_error(format!(
                "certificate at position {position} was not issued by its successor"
            )));
        }
    }

    for (position, cert) in path.iter().enumerate().skip(1) {
        if !cert.is_ca() {
            return Err(chain_error(format!(
                "certificate at position {position} is not a CA"
            )));
        }
        let below = position - 1;
        if let Some(max) = cert.ext_basic_constraints().and_then(|bc| bc.path_len) {
            if below > max as usize {
                return Err(chain_error(format!(
                    "certificate at position {position} allows {max} intermediates, found {below}"
                )));
            }
        }
    }

    Ok(())
}

fn chain_error(message: impl Into<String>) -> Error {
    Error::verification(VerificationStage::SigningCertificate, message)
}
