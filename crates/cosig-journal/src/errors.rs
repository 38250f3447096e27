use thiserror::Error;

/// Failures reading or writing a journal file.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// File header is not a supported cosig journal header.
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),
    /// A frame header is malformed.
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// File offset of the frame header.
        offset: u64,
        /// What was wrong with it.
        reason: String,
    },
    /// A record would not fit in one frame.
    #[error("payload of {size} bytes is over the {max} byte frame limit")]
    PayloadTooLarge {
        /// Encoded payload length.
        size: usize,
        /// Frame payload limit.
        max: u32,
    },
    /// Record payload is not valid JSON for its frame kind.
    #[error("invalid record payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// Existing file is shorter than a header, so it cannot be a journal.
    #[error("refusing to write a header over {0} existing bytes")]
    FileNotEmpty(u64),
    /// Strict read hit the end of file inside a frame.
    #[error("journal ends inside the frame at offset {offset}")]
    TruncatedFrame {
        /// File offset of the incomplete frame.
        offset: u64,
    },
}
