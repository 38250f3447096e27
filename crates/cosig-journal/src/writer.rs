//! Append-only frame writer.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use crate::record::JournalRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// How [`JournalWriter::open`] treats the file.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: true).
    pub sync: bool,
    /// Create a missing file (default: true).
    pub create: bool,
    /// Whether to keep existing records (default: true).
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: true,
            create: true,
            append: true,
        }
    }
}

/// Append-only writer for journal files.
///
/// Each append writes one frame header and payload and flushes; with
/// `sync` set it also fsyncs, so a returned `Ok` means the record is durable.
pub struct JournalWriter {
    file: File,
    sync: bool,
}

impl JournalWriter {
    /// Opens a journal for appending.
    ///
    /// An empty file gets a fresh header. An existing file must carry a
    /// valid header; it is appended to, or cut back to the header when
    /// `options.append` is false.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .truncate(false)
            .open(path)?;

        let mut writer = Self {
            file,
            sync: options.sync,
        };

        let len = writer.file.metadata()?.len();
        if len == 0 {
            writer.write_header()?;
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty(len));
        } else {
            let mut header_bytes = [0u8; HEADER_SIZE];
            writer.file.seek(io::SeekFrom::Start(0))?;
            writer.file.read_exact(&mut header_bytes)?;
            JournalHeader::from_bytes(&header_bytes)?;
            if options.append {
                writer.file.seek(io::SeekFrom::End(0))?;
            } else {
                writer.truncate(HEADER_SIZE as u64)?;
            }
        }

        Ok(writer)
    }

    fn write_header(&mut self) -> Result<(), JournalError> {
        self.file.write_all(&JournalHeader::new().to_bytes())?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Cuts the file back to `len` bytes and positions at the new end.
    ///
    /// Used after a permissive replay to drop a torn final frame.
    pub fn truncate(&mut self, len: u64) -> Result<(), JournalError> {
        if len < HEADER_SIZE as u64 {
            return Err(JournalError::InvalidHeader(format!(
                "cannot truncate into the header (to {len} bytes)"
            )));
        }
        self.file.set_len(len)?;
        self.file.seek(io::SeekFrom::Start(len))?;
        self.flush()
    }

    /// Appends a typed record.
    pub fn append_record(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        let payload = record.encode()?;
        self.append_raw(record.kind(), &payload)
    }

    /// Appends one frame holding `payload` verbatim.
    ///
    /// A failed append is rolled back, so the file never keeps a partial
    /// frame that later appends would land behind.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        let mut buf = Vec::with_capacity(frame.to_bytes().len() + payload.len());
        buf.extend_from_slice(&frame.to_bytes());
        buf.extend_from_slice(payload);
        self.append_with(|file| file.write_all(&buf))
    }

    fn append_with<F>(&mut self, write: F) -> Result<(), JournalError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let start = self.file.stream_position()?;
        let result = write(&mut self.file)
            .map_err(JournalError::from)
            .and_then(|()| self.flush());
        if result.is_err() {
            self.file.set_len(start)?;
            self.file.seek(io::SeekFrom::Start(start))?;
        }
        result
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.flush()
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
