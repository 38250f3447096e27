//! On-disk layout: a 16-byte file header followed by length-prefixed frames.
//!
//! ```text
//! header: "CSJ1" | version u16 LE | flags u16 LE | 8 zero bytes
//! frame:  kind u8 | 3 zero bytes | payload length u32 LE | payload
//! ```

use crate::errors::JournalError;

/// Journal file magic bytes: `b"CSJ1"`.
pub const MAGIC: &[u8; 4] = b"CSJ1";

/// Current journal format version.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum payload size: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// File header. Only the version is variable; everything else is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format version.
    pub version: u16,
}

impl JournalHeader {
    /// Header for the current format version.
    pub fn new() -> Self {
        Self { version: VERSION }
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(MAGIC);
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    /// Decodes a header, rejecting foreign files and unknown versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JournalError> {
        let bad = |msg: String| Err(JournalError::InvalidHeader(msg));
        let Some(bytes) = bytes.get(..HEADER_SIZE) else {
            return bad(format!("need {HEADER_SIZE} bytes, have {}", bytes.len()));
        };
        if &bytes[..4] != MAGIC {
            return bad(format!("not a cosig journal (magic {:02x?})", &bytes[..4]));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return bad(format!("version {version} is not supported"));
        }
        if bytes[6..].iter().any(|&b| b != 0) {
            return bad("flags and reserved bytes must be zero".to_string());
        }
        Ok(Self { version })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// What a frame's payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Latest checkpoint a distributor holds for a `(log, witness)` pair.
    Checkpoint,
    /// Golden checkpoint of a witness for a log.
    Golden,
    /// Evidence of two checkpoints at the same size with different roots.
    Fork,
    /// Written by a newer version; readers skip it.
    Unknown(u8),
}

const KIND_BYTES: [(FrameKind, u8); 3] = [
    (FrameKind::Checkpoint, 0x01),
    (FrameKind::Golden, 0x02),
    (FrameKind::Fork, 0x03),
];

impl FrameKind {
    /// Kind for a stored kind byte.
    pub fn from_byte(byte: u8) -> Self {
        KIND_BYTES
            .iter()
            .find(|(_, b)| *b == byte)
            .map_or(FrameKind::Unknown(byte), |(kind, _)| *kind)
    }

    /// Stored kind byte.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::Unknown(b) => b,
            known => KIND_BYTES
                .iter()
                .find(|(kind, _)| *kind == known)
                .map_or(0, |(_, b)| *b),
        }
    }
}

/// Frame header preceding each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFrame {
    /// Payload kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl RecordFrame {
    /// Frame header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        u32::try_from(len)
            .ok()
            .filter(|&len| len <= MAX_PAYLOAD_SIZE)
            .map(|len| Self { kind, len })
            .ok_or(JournalError::PayloadTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            })
    }

    /// Encodes the frame header.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        out[0] = self.kind.to_byte();
        out[4..].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    /// Decodes the frame header that starts at file `offset`.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| Err(JournalError::InvalidFrame { offset, reason });
        let Some(bytes) = bytes.get(..FRAME_HEADER_SIZE) else {
            return invalid(format!("only {} header bytes", bytes.len()));
        };
        if bytes[1..4] != [0, 0, 0] {
            return invalid("reserved bytes are set".to_string());
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return invalid(format!("payload length {len} over limit {MAX_PAYLOAD_SIZE}"));
        }
        Ok(Self {
            kind: FrameKind::from_byte(bytes[0]),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = JournalHeader::new().to_bytes();
        assert_eq!(&bytes[0..4], b"CSJ1");
        assert_eq!(&bytes[4..6], &[0x01, 0x00]);
        assert_eq!(&bytes[6..16], &[0u8; 10]);
        assert_eq!(JournalHeader::from_bytes(&bytes).unwrap(), JournalHeader::new());
    }

    #[test]
    fn header_rejects_foreign_magic() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[0..4].copy_from_slice(b"NRJ1");
        assert!(matches!(
            JournalHeader::from_bytes(&bytes),
            Err(JournalError::InvalidHeader(_))
        ));
    }

    #[test]
    fn header_rejects_future_version() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[4] = 0x02;
        let err = JournalHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn header_rejects_flags_and_reserved() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[6] = 0x01;
        assert!(JournalHeader::from_bytes(&bytes).is_err());

        let mut bytes = JournalHeader::new().to_bytes();
        bytes[15] = 0x01;
        assert!(JournalHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn frame_layout() {
        let bytes = RecordFrame::new(FrameKind::Golden, 0x0102).unwrap().to_bytes();
        assert_eq!(bytes, [0x02, 0, 0, 0, 0x02, 0x01, 0, 0]);
        let frame = RecordFrame::from_bytes(&bytes, 16).unwrap();
        assert_eq!(frame.kind, FrameKind::Golden);
        assert_eq!(frame.len, 0x0102);
    }

    #[test]
    fn frame_rejects_oversized_payload() {
        assert!(matches!(
            RecordFrame::new(FrameKind::Checkpoint, MAX_PAYLOAD_SIZE as usize + 1),
            Err(JournalError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn frame_reports_offset() {
        let mut bytes = RecordFrame::new(FrameKind::Fork, 10).unwrap().to_bytes();
        bytes[2] = 0xff;
        match RecordFrame::from_bytes(&bytes, 99) {
            Err(JournalError::InvalidFrame { offset, .. }) => assert_eq!(offset, 99),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_keeps_its_byte() {
        assert_eq!(FrameKind::from_byte(0x7f), FrameKind::Unknown(0x7f));
        assert_eq!(FrameKind::Unknown(0x7f).to_byte(), 0x7f);
    }
}
