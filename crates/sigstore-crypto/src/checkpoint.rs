//! Signed notes and transparency-log checkpoints
//!
//! A signed note is a text body, a blank line, and one signature line per
//! signer of the form `— <name> <base64(key hint || signature)>`. The body
//! of a Rekor checkpoint is the log origin, the tree size, the base64 root
//! hash, and optional extension lines.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Em dash that opens every signature line
const SIGNATURE_PREFIX: &str = "\u{2014} ";
/// Bytes of the key hint in front of each signature
const KEY_HINT_LEN: usize = 4;

/// One signature line of a signed note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSignature {
    /// Signer name, usually the log origin
    pub name: String,
    /// First four bytes of the signer's key id
    pub key_hint: [u8; KEY_HINT_LEN],
    pub signature: Vec<u8>,
}

/// A parsed signed note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedNote {
    /// The signed text, including its final newline
    pub note: String,
    pub signatures: Vec<NoteSignature>,
}

impl SignedNote {
    /// Split a signed note into its text and signatures
    ///
    /// Fails on a missing blank-line separator, on lines without the
    /// signature prefix, and when no signature is present.
    pub fn parse(text: &str) -> Result<Self> {
        let (body, sigs) = text
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing blank line between note and signatures"))?;

        let mut signatures = Vec::new();
        for line in sigs.lines().filter(|line| !line.is_empty()) {
            signatures.push(parse_signature_line(line)?);
        }
        if signatures.is_empty() {
            return Err(malformed("note carries no signatures"));
        }

        Ok(Self {
            note: format!("{body}\n"),
            signatures,
        })
    }

    /// The bytes each signature covers
    pub fn signed_bytes(&self) -> &[u8] {
        self.note.as_bytes()
    }
}

fn parse_signature_line(line: &str) -> Result<NoteSignature> {
    let rest = line
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| malformed(format!("signature line {line:?} lacks the em dash prefix")))?;
    let (name, encoded) = rest
        .split_once(' ')
        .ok_or_else(|| malformed(format!("signature line {line:?} has no signature")))?;
    if name.is_empty() {
        return Err(malformed("signature line has an empty signer name"));
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| malformed(format!("signature of {name} is not base64: {e}")))?;
    if decoded.len() <= KEY_HINT_LEN {
        return Err(malformed(format!(
            "signature of {name} is {} bytes, too short for a key hint",
            decoded.len()
        )));
    }

    let mut key_hint = [0u8; KEY_HINT_LEN];
    key_hint.copy_from_slice(&decoded[..KEY_HINT_LEN]);
    Ok(NoteSignature {
        name: name.to_string(),
        key_hint,
        signature: decoded[KEY_HINT_LEN..].to_vec(),
    })
}

/// The body of a transparency-log checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCheckpoint {
    pub origin: String,
    pub size: u64,
    pub root_hash: Vec<u8>,
    /// Extension lines after the root hash
    pub rest: Vec<String>,
}

impl LogCheckpoint {
    /// Parse the note text of a signed checkpoint
    pub fn parse(note: &str) -> Result<Self> {
        let mut lines = note.lines();
        let origin = lines
            .next()
            .filter(|origin| !origin.is_empty())
            .ok_or_else(|| malformed("checkpoint has no origin line"))?;
        let size = lines
            .next()
            .ok_or_else(|| malformed("checkpoint has no tree size"))?
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid tree size: {e}")))?;
        let root_hash = lines
            .next()
            .ok_or_else(|| malformed("checkpoint has no root hash"))
            .and_then(|hash| {
                STANDARD
                    .decode(hash)
                    .map_err(|e| malformed(format!("root hash is not base64: {e}")))
            })?;

        Ok(Self {
            origin: origin.to_string(),
            size,
            root_hash,
            rest: lines.map(str::to_string).collect(),
        })
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedCheckpoint(message.into())
}
