//! Keyring of transparency-log keys
//!
//! Log keys are indexed by log id. Signed entry timestamps name their log by
//! full id, while checkpoint signatures only carry a four-byte key hint, so
//! the keyring answers both kinds of lookup.

use crate::error::{Error, Result};
use crate::verification::VerificationKey;
use chrono::{DateTime, Utc};
use sigstore_types::{LogKeyId, TransparencyLogInstance, ValidityPeriod};
use std::collections::HashMap;
use tracing::debug;

struct LogKey {
    key: VerificationKey,
    valid_for: Option<ValidityPeriod>,
}

impl LogKey {
    fn valid_at(&self, at: Option<DateTime<Utc>>) -> bool {
        match (self.valid_for, at) {
            (Some(window), Some(at)) => window.contains(at),
            _ => true,
        }
    }
}

/// Verification keys of transparency logs, indexed by log id
#[derive(Default)]
pub struct Keyring {
    /// A log may list several keys over time, each with its own window
    keys: HashMap<LogKeyId, Vec<LogKey>>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyring holding every log whose key can be decoded
    ///
    /// Keys of unsupported types are skipped.
    pub fn from_logs(logs: &[TransparencyLogInstance]) -> Self {
        let mut keyring = Self::new();
        for log in logs {
            match VerificationKey::from_spki_der(log.public_key.raw_bytes.as_bytes(), None) {
                Ok(key) => {
                    keyring.add_key(log.log_id.clone(), key, log.public_key.valid_for);
                }
                Err(e) => {
                    debug!(log = %log.base_url, error = %e, "skipping unusable log key");
                }
            }
        }
        keyring
    }

    pub fn add_key(
        &mut self,
        log_id: LogKeyId,
        key: VerificationKey,
        valid_for: Option<ValidityPeriod>,
    ) {
        self.keys
            .entry(log_id)
            .or_default()
            .push(LogKey { key, valid_for });
    }

    /// First key registered for `log_id`
    pub fn get_key(&self, log_id: &LogKeyId) -> Option<&VerificationKey> {
        self.keys
            .get(log_id)
            .and_then(|entries| entries.first())
            .map(|entry| &entry.key)
    }

    /// Verify with a key of `log_id`
    ///
    /// With `at` set, only keys valid at that time are tried.
    pub fn verify_with_key_id(
        &self,
        log_id: &LogKeyId,
        data: impl AsRef<[u8]>,
        signature: &[u8],
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let entries = self
            .keys
            .get(log_id)
            .ok_or_else(|| Error::Verification(format!("no key for log {}", log_id.to_hex())))?;
        let data = data.as_ref();
        let mut candidates = entries.iter().filter(|entry| entry.valid_at(at)).peekable();
        if candidates.peek().is_none() {
            return Err(Error::Verification(format!(
                "no key of log {} was valid at the entry time",
                log_id.to_hex()
            )));
        }
        if candidates.any(|entry| entry.key.verify(data, signature).is_ok()) {
            Ok(())
        } else {
            Err(Error::Verification(format!(
                "no key of log {} verified the signature",
                log_id.to_hex()
            )))
        }
    }

    /// Verify with any key whose log id starts with `hint`
    ///
    /// With `at` set, only keys valid at that time are tried. Returns the id
    /// of the log whose key verified the signature.
    pub fn verify_with_hint(
        &self,
        hint: &[u8; 4],
        data: impl AsRef<[u8]>,
        signature: &[u8],
        at: Option<DateTime<Utc>>,
    ) -> Result<LogKeyId> {
        let data = data.as_ref();
        let mut candidates = 0;
        for (log_id, entries) in self.keys.iter().filter(|(id, _)| id.matches_hint(hint)) {
            for entry in entries.iter().filter(|entry| entry.valid_at(at)) {
                candidates += 1;
                if entry.key.verify(data, signature).is_ok() {
                    return Ok(log_id.clone());
                }
            }
        }
        Err(Error::Verification(if candidates == 0 {
            format!("no log key matches hint {}", hex::encode(hint))
        } else {
            format!("no log key with hint {} verified the signature", hex::encode(hint))
        }))
    }

    /// Number of keys across all logs
    pub fn len(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
