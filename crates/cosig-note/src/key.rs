//! Ed25519 note keys: verifier/signer key strings and key hashes.
//!
//! Key strings follow the signed-note convention:
//! `<name>+<hash>+<base64(alg || key)>` for verifiers and
//! `PRIVATE+KEY+<name>+<hash>+<base64(alg || seed)>` for signers, where
//! `hash` is the first four bytes of `SHA-256(name || "\n" || alg || pubkey)`.

use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::errors::NoteError;

/// Algorithm byte for Ed25519 note keys.
pub const ALG_ED25519: u8 = 0x01;

const PRIVATE_KEY_PREFIX: &str = "PRIVATE+KEY+";

/// Computes the 32-bit key hash binding a key name to its public key.
pub fn key_hash(name: &str, public_key: &[u8; 32]) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"\n");
    hasher.update([ALG_ED25519]);
    hasher.update(public_key);
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Checks the key-name rules: non-empty, no `+`, no whitespace or control characters.
pub fn is_valid_key_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c != '+' && !c.is_whitespace() && !c.is_control())
}

fn decode_key_material(field: &str, b64: &str) -> Result<[u8; 32], NoteError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| NoteError::InvalidKey(format!("{field}: bad base64: {e}")))?;
    match raw.split_first() {
        Some((&ALG_ED25519, rest)) if rest.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(rest);
            Ok(out)
        }
        Some((&ALG_ED25519, rest)) => Err(NoteError::InvalidKey(format!(
            "{field}: expected 32 key bytes, got {}",
            rest.len()
        ))),
        Some((alg, _)) => Err(NoteError::InvalidKey(format!(
            "{field}: unsupported algorithm 0x{alg:02x}"
        ))),
        None => Err(NoteError::InvalidKey(format!("{field}: empty key"))),
    }
}

fn parse_hash_hex(hash: &str) -> Result<u32, NoteError> {
    if hash.len() != 8 {
        return Err(NoteError::InvalidKey(format!("key hash {hash:?} is not 8 hex digits")));
    }
    u32::from_str_radix(hash, 16)
        .map_err(|_| NoteError::InvalidKey(format!("key hash {hash:?} is not hex")))
}

fn encode_key_material(key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(33);
    raw.push(ALG_ED25519);
    raw.extend_from_slice(key);
    base64::engine::general_purpose::STANDARD.encode(raw)
}

/// Identity of a note key as it appears on signature lines.
///
/// Two keys may share a name; the key hash tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId {
    /// Key name.
    pub name: String,
    /// Key hash binding the name to the public key.
    pub key_hash: u32,
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:08x}", self.name, self.key_hash)
    }
}

/// Public half of a note key: checks signatures made by one named signer.
#[derive(Clone, PartialEq, Eq)]
pub struct NoteVerifier {
    name: String,
    key_hash: u32,
    key: VerifyingKey,
}

impl NoteVerifier {
    /// Parses a verifier key string `<name>+<hash>+<base64 key>`.
    pub fn parse(vkey: &str) -> Result<Self, NoteError> {
        let mut parts = vkey.splitn(3, '+');
        let (Some(name), Some(hash), Some(b64)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(NoteError::InvalidKey(format!("malformed verifier key {vkey:?}")));
        };
        if !is_valid_key_name(name) {
            return Err(NoteError::InvalidKey(format!("invalid key name {name:?}")));
        }
        let claimed = parse_hash_hex(hash)?;
        let public = decode_key_material("verifier key", b64)?;
        if key_hash(name, &public) != claimed {
            return Err(NoteError::InvalidKey(format!(
                "key hash {hash} does not match key for {name:?}"
            )));
        }
        let key = VerifyingKey::from_bytes(&public)
            .map_err(|e| NoteError::InvalidKey(format!("invalid ed25519 public key: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            key_hash: claimed,
            key,
        })
    }

    /// Name of the signer this verifier checks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key hash that signature lines must carry.
    pub fn key_hash(&self) -> u32 {
        self.key_hash
    }

    /// Name and key hash together.
    pub fn key_id(&self) -> KeyId {
        KeyId {
            name: self.name.clone(),
            key_hash: self.key_hash,
        }
    }

    /// Reports whether `sig` is a valid signature over `msg`.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> bool {
        let Ok(sig) = ed25519_dalek::Signature::from_slice(sig) else {
            return false;
        };
        self.key.verify(msg, &sig).is_ok()
    }
}

impl fmt::Display for NoteVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{:08x}+{}",
            self.name,
            self.key_hash,
            encode_key_material(self.key.as_bytes())
        )
    }
}

impl fmt::Debug for NoteVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteVerifier({}+{:08x})", self.name, self.key_hash)
    }
}

/// Private half of a note key.
#[derive(Clone)]
pub struct NoteSigner {
    name: String,
    key_hash: u32,
    key: SigningKey,
}

impl NoteSigner {
    /// Parses a signer key string `PRIVATE+KEY+<name>+<hash>+<base64 seed>`.
    pub fn parse(skey: &str) -> Result<Self, NoteError> {
        let rest = skey
            .strip_prefix(PRIVATE_KEY_PREFIX)
            .ok_or_else(|| NoteError::InvalidKey("signer key must start with PRIVATE+KEY+".into()))?;
        let mut parts = rest.splitn(3, '+');
        let (Some(name), Some(hash), Some(b64)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(NoteError::InvalidKey("malformed signer key".into()));
        };
        if !is_valid_key_name(name) {
            return Err(NoteError::InvalidKey(format!("invalid key name {name:?}")));
        }
        let claimed = parse_hash_hex(hash)?;
        let seed = decode_key_material("signer key", b64)?;
        let key = SigningKey::from_bytes(&seed);
        if key_hash(name, key.verifying_key().as_bytes()) != claimed {
            return Err(NoteError::InvalidKey(format!(
                "key hash {hash} does not match key for {name:?}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            key_hash: claimed,
            key,
        })
    }

    /// Name written into signature lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key hash written into signature lines.
    pub fn key_hash(&self) -> u32 {
        self.key_hash
    }

    /// Signs `msg`, returning the raw 64-byte signature.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.key.sign(msg).to_bytes().to_vec()
    }

    /// Verifier for the signatures this signer produces.
    pub fn verifier(&self) -> NoteVerifier {
        NoteVerifier {
            name: self.name.clone(),
            key_hash: self.key_hash,
            key: self.key.verifying_key(),
        }
    }

    /// Encodes the signer back into its key string.
    pub fn to_key_string(&self) -> String {
        format!(
            "{PRIVATE_KEY_PREFIX}{}+{:08x}+{}",
            self.name,
            self.key_hash,
            encode_key_material(self.key.as_bytes())
        )
    }
}

impl fmt::Debug for NoteSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteSigner({}+{:08x})", self.name, self.key_hash)
    }
}

/// Generates a fresh Ed25519 note key, returning `(signer, verifier)`.
pub fn generate_key(name: &str) -> Result<(NoteSigner, NoteVerifier), NoteError> {
    if !is_valid_key_name(name) {
        return Err(NoteError::InvalidKey(format!("invalid key name {name:?}")));
    }
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let signer = NoteSigner {
        name: name.to_string(),
        key_hash: key_hash(name, key.verifying_key().as_bytes()),
        key,
    };
    let verifier = signer.verifier();
    Ok((signer, verifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strings_parse_back() {
        let (signer, verifier) = generate_key("Whittle").unwrap();
        let reparsed_signer = NoteSigner::parse(&signer.to_key_string()).unwrap();
        let reparsed_verifier = NoteVerifier::parse(&verifier.to_string()).unwrap();
        assert_eq!(reparsed_signer.verifier(), reparsed_verifier);
        assert_eq!(reparsed_verifier.name(), "Whittle");
    }

    #[test]
    fn signatures_verify_only_for_the_signed_message() {
        let (signer, verifier) = generate_key("FooLog").unwrap();
        let sig = signer.sign(b"hello\n");
        assert!(verifier.verify(b"hello\n", &sig));
        assert!(!verifier.verify(b"hello!\n", &sig));
        assert!(!verifier.verify(b"hello\n", &sig[..10]));
    }

    #[test]
    fn rejects_tampered_key_hash() {
        let (_, verifier) = generate_key("FooLog").unwrap();
        let vkey = verifier.to_string();
        let mut parts: Vec<&str> = vkey.splitn(3, '+').collect();
        let bad_hash = format!("{:08x}", verifier.key_hash() ^ 1);
        parts[1] = &bad_hash;
        let err = NoteVerifier::parse(&parts.join("+")).unwrap_err();
        assert!(matches!(err, NoteError::InvalidKey(_)));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(generate_key("").is_err());
        assert!(generate_key("has space").is_err());
        assert!(generate_key("plus+sign").is_err());
    }

    #[test]
    fn debug_output_hides_private_key() {
        let (signer, _) = generate_key("Wattle").unwrap();
        let shown = format!("{signer:?}");
        assert!(shown.starts_with("NoteSigner(Wattle+"));
        assert!(!shown.contains(&signer.to_key_string()));
    }
}
