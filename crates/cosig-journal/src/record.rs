//! Typed record payloads carried by journal frames.

use cosig_note::{LogId, WitnessId};
use serde::{Deserialize, Serialize};

use crate::errors::JournalError;
use crate::frame::FrameKind;

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

/// Latest checkpoint a distributor holds for one `(log, witness)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Log the checkpoint belongs to.
    pub log_id: LogId,
    /// Witness that co-signed it.
    pub witness_id: WitnessId,
    /// Tree size of the checkpoint.
    pub size: u64,
    /// Signed envelope as submitted.
    #[serde(with = "base64_bytes")]
    pub envelope: Vec<u8>,
}

/// Golden checkpoint of a witness for one log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenRecord {
    /// Log the checkpoint belongs to.
    pub log_id: LogId,
    /// Envelope carrying the log signature and the witness co-signature.
    #[serde(with = "base64_bytes")]
    pub envelope: Vec<u8>,
}

/// Two envelopes for the same log and size with different roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkRecord {
    /// Affected log.
    pub log_id: LogId,
    /// Witness whose submission conflicted.
    pub witness_id: WitnessId,
    /// Tree size both envelopes claim.
    pub size: u64,
    /// Envelope already held.
    #[serde(with = "base64_bytes")]
    pub stored: Vec<u8>,
    /// Envelope that was refused.
    #[serde(with = "base64_bytes")]
    pub rejected: Vec<u8>,
    /// Milliseconds since the Unix epoch when the conflict was seen.
    pub observed_at_ms: u64,
}

/// Any record the journal knows how to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    /// Distributor checkpoint record.
    Checkpoint(CheckpointRecord),
    /// Witness golden checkpoint.
    Golden(GoldenRecord),
    /// Fork evidence.
    Fork(ForkRecord),
}

impl JournalRecord {
    /// Frame kind this record is written under.
    pub fn kind(&self) -> FrameKind {
        match self {
            JournalRecord::Checkpoint(_) => FrameKind::Checkpoint,
            JournalRecord::Golden(_) => FrameKind::Golden,
            JournalRecord::Fork(_) => FrameKind::Fork,
        }
    }

    /// Encodes the record as a JSON payload.
    pub fn encode(&self) -> Result<Vec<u8>, JournalError> {
        let bytes = match self {
            JournalRecord::Checkpoint(r) => serde_json::to_vec(r)?,
            JournalRecord::Golden(r) => serde_json::to_vec(r)?,
            JournalRecord::Fork(r) => serde_json::to_vec(r)?,
        };
        Ok(bytes)
    }

    /// Decodes a payload; unknown kinds yield `None`.
    pub fn decode(kind: FrameKind, payload: &[u8]) -> Result<Option<Self>, JournalError> {
        let record = match kind {
            FrameKind::Checkpoint => JournalRecord::Checkpoint(serde_json::from_slice(payload)?),
            FrameKind::Golden => JournalRecord::Golden(serde_json::from_slice(payload)?),
            FrameKind::Fork => JournalRecord::Fork(serde_json::from_slice(payload)?),
            FrameKind::Unknown(_) => return Ok(None),
        };
        Ok(Some(record))
    }
}
