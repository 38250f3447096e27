//! Signed note envelopes.
//!
//! A note is UTF-8 text followed by a blank line and one or more signature
//! lines:
//!
//! ```text
//! <text, ending in a newline>
//!
//! \u{2014} <key name> <base64(key hash || signature)>
//! ```
//!
//! Signatures cover the exact text bytes. Lines naming keys the caller does
//! not know are kept but never counted as verified.

use base64::Engine;
use std::collections::BTreeSet;

use crate::errors::NoteError;
use crate::key::{is_valid_key_name, KeyId, NoteSigner, NoteVerifier};

/// Upper bound on the size of an encoded note: 1 MiB.
pub const MAX_NOTE_SIZE: usize = 1 << 20;

/// Upper bound on the number of signature lines in a note.
pub const MAX_SIGNATURES: usize = 100;

const SIG_PREFIX: &str = "\u{2014} ";

/// Keys whose signatures verified over a note's text.
pub type SignerSet = BTreeSet<KeyId>;

/// One signature line of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSignature {
    name: String,
    key_hash: u32,
    signature: Vec<u8>,
}

impl NoteSignature {
    /// Builds a signature line from its parts.
    pub fn new(name: impl Into<String>, key_hash: u32, signature: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            key_hash,
            signature,
        }
    }

    /// Key name on the line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key hash prefixed to the signature bytes.
    pub fn key_hash(&self) -> u32 {
        self.key_hash
    }

    /// Name and key hash of the signing key.
    pub fn key_id(&self) -> KeyId {
        KeyId {
            name: self.name.clone(),
            key_hash: self.key_hash,
        }
    }

    /// Raw signature bytes (without the key hash).
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn matches(&self, verifier: &NoteVerifier) -> bool {
        self.name == verifier.name() && self.key_hash == verifier.key_hash()
    }

    fn encode_line(&self) -> String {
        let mut raw = Vec::with_capacity(4 + self.signature.len());
        raw.extend_from_slice(&self.key_hash.to_be_bytes());
        raw.extend_from_slice(&self.signature);
        format!(
            "{SIG_PREFIX}{} {}\n",
            self.name,
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    fn parse_line(line: &str) -> Result<Self, NoteError> {
        let rest = line
            .strip_prefix(SIG_PREFIX)
            .ok_or_else(|| NoteError::MalformedEnvelope(format!("bad signature line {line:?}")))?;
        let (name, b64) = rest
            .split_once(' ')
            .ok_or_else(|| NoteError::MalformedEnvelope(format!("bad signature line {line:?}")))?;
        if !is_valid_key_name(name) {
            return Err(NoteError::MalformedEnvelope(format!("bad signer name {name:?}")));
        }
        let raw = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|_| NoteError::MalformedEnvelope(format!("bad signature encoding for {name}")))?;
        if raw.len() < 5 {
            return Err(NoteError::MalformedEnvelope(format!("signature for {name} too short")));
        }
        let key_hash = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        Ok(Self {
            name: name.to_string(),
            key_hash,
            signature: raw[4..].to_vec(),
        })
    }
}

/// A parsed note: text plus every signature line, verified or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    text: String,
    signatures: Vec<NoteSignature>,
}

fn check_text(text: &str) -> Result<(), NoteError> {
    if text.is_empty() || !text.ends_with('\n') {
        return Err(NoteError::MalformedEnvelope(
            "note text must be non-empty and end in a newline".into(),
        ));
    }
    if text.chars().any(|c| c != '\n' && c.is_control()) {
        return Err(NoteError::MalformedEnvelope(
            "note text contains control characters".into(),
        ));
    }
    Ok(())
}

impl Note {
    /// Starts an unsigned note over `text`.
    pub fn new(text: impl Into<String>) -> Result<Self, NoteError> {
        let text = text.into();
        check_text(&text)?;
        Ok(Self {
            text,
            signatures: Vec::new(),
        })
    }

    /// Splits an encoded note into its text and signature lines.
    pub fn parse(bytes: &[u8]) -> Result<Self, NoteError> {
        if bytes.len() > MAX_NOTE_SIZE {
            return Err(NoteError::MalformedEnvelope(format!(
                "note is {} bytes, limit is {MAX_NOTE_SIZE}",
                bytes.len()
            )));
        }
        let msg = std::str::from_utf8(bytes)
            .map_err(|_| NoteError::MalformedEnvelope("note is not valid UTF-8".into()))?;
        let split = msg
            .rfind("\n\n")
            .ok_or_else(|| NoteError::MalformedEnvelope("missing signature block".into()))?;
        let (text, sig_block) = (&msg[..split + 1], &msg[split + 2..]);
        check_text(text)?;
        if sig_block.is_empty() || !sig_block.ends_with('\n') {
            return Err(NoteError::MalformedEnvelope(
                "signature block must be non-empty and end in a newline".into(),
            ));
        }

        let signatures = sig_block
            .lines()
            .map(NoteSignature::parse_line)
            .collect::<Result<Vec<_>, _>>()?;
        if signatures.len() > MAX_SIGNATURES {
            return Err(NoteError::MalformedEnvelope(format!(
                "{} signatures exceeds limit of {MAX_SIGNATURES}",
                signatures.len()
            )));
        }
        Ok(Self {
            text: text.to_string(),
            signatures,
        })
    }

    /// Signed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All signature lines, in envelope order.
    pub fn signatures(&self) -> &[NoteSignature] {
        &self.signatures
    }

    /// Adds a signature, replacing any existing line for the same key.
    pub fn add_signature(&mut self, sig: NoteSignature) {
        match self
            .signatures
            .iter_mut()
            .find(|s| s.name == sig.name && s.key_hash == sig.key_hash)
        {
            Some(existing) => *existing = sig,
            None => self.signatures.push(sig),
        }
    }

    /// Signs the text with `signer` and adds the signature.
    pub fn sign_with(&mut self, signer: &NoteSigner) {
        let sig = signer.sign(self.text.as_bytes());
        self.add_signature(NoteSignature::new(signer.name(), signer.key_hash(), sig));
    }

    /// Returns the signature line from `verifier`'s key, if present and valid.
    pub fn verified_signature(&self, verifier: &NoteVerifier) -> Option<&NoteSignature> {
        self.signatures
            .iter()
            .filter(|s| s.matches(verifier))
            .find(|s| verifier.verify(self.text.as_bytes(), &s.signature))
    }

    /// Keys of the given verifiers whose signatures verify over the text.
    ///
    /// Verifiers without a matching line, and lines from unknown keys, are
    /// simply not counted.
    pub fn verified_by<'a, I>(&self, verifiers: I) -> SignerSet
    where
        I: IntoIterator<Item = &'a NoteVerifier>,
    {
        verifiers
            .into_iter()
            .filter(|v| self.verified_signature(v).is_some())
            .map(NoteVerifier::key_id)
            .collect()
    }

    /// Encodes the note. A note without signatures cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NoteError> {
        if self.signatures.is_empty() {
            return Err(NoteError::MalformedEnvelope("note has no signatures".into()));
        }
        let mut out = String::with_capacity(self.text.len() + 1 + 100 * self.signatures.len());
        out.push_str(&self.text);
        out.push('\n');
        for sig in &self.signatures {
            out.push_str(&sig.encode_line());
        }
        Ok(out.into_bytes())
    }
}

/// Signs `text` with each signer in order and encodes the resulting note.
pub fn sign_note(text: &str, signers: &[&NoteSigner]) -> Result<Vec<u8>, NoteError> {
    let mut note = Note::new(text)?;
    for signer in signers {
        note.sign_with(signer);
    }
    note.to_bytes()
}
