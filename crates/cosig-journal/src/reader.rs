//! Sequential frame reader with crash-tolerant replay.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use crate::record::JournalRecord;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// How a reader treats a frame cut short by the end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// A torn frame is an error.
    Strict,
    /// A torn frame ends the journal, as after a crash mid-append.
    Permissive,
}

/// Sequential reader over a journal file.
///
/// [`JournalReader::position`] always points just past the last complete
/// frame, so after a permissive read hits a torn tail it gives the length
/// the file can be cut back to.
pub struct JournalReader {
    file: BufReader<File>,
    mode: ReadMode,
    position: u64,
    len: u64,
}

impl JournalReader {
    /// Opens a journal file and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut file = BufReader::new(file);

        let mut header_bytes = [0u8; HEADER_SIZE];
        match file.read_exact(&mut header_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(JournalError::InvalidHeader(format!(
                    "header too short: {len} bytes"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        JournalHeader::from_bytes(&header_bytes)?;

        Ok(Self {
            file,
            mode,
            position: HEADER_SIZE as u64,
            len,
        })
    }

    /// Offset just past the last complete frame read.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn truncated(&self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame {
                offset: self.position,
            }),
        }
    }

    /// Reads the next raw frame.
    ///
    /// Returns `Ok(None)` at end-of-file, or at a torn frame in permissive
    /// mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        if self.position >= self.len {
            return Ok(None);
        }
        let remaining = self.len - self.position;
        if remaining < FRAME_HEADER_SIZE as u64 {
            return self.truncated();
        }

        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.file.read_exact(&mut header)?;
        let frame = RecordFrame::from_bytes(&header, self.position)?;

        if remaining - (FRAME_HEADER_SIZE as u64) < u64::from(frame.len) {
            return self.truncated();
        }
        let mut payload = vec![0u8; frame.len as usize];
        self.file.read_exact(&mut payload)?;

        self.position += (FRAME_HEADER_SIZE as u64) + u64::from(frame.len);
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next decodable record, skipping unknown frame kinds.
    pub fn read_record(&mut self) -> Result<Option<JournalRecord>, JournalError> {
        loop {
            let Some((kind, payload)) = self.read_frame()? else {
                return Ok(None);
            };
            if let Some(record) = JournalRecord::decode(kind, &payload)? {
                return Ok(Some(record));
            }
        }
    }
}

impl Iterator for JournalReader {
    type Item = Result<JournalRecord, JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
