//! Append-only journal for distributor and witness state.
//!
//! A journal is a `CSJ1` header followed by length-prefixed frames, each
//! holding one JSON record: a distributor checkpoint, a witness golden
//! checkpoint, or fork evidence. Stores replay it at startup to rebuild
//! their in-memory index.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cosig_journal::{GoldenRecord, JournalReader, JournalRecord, JournalWriter, ReadMode, WriteOptions};
//! use cosig_note::LogId;
//!
//! let mut writer = JournalWriter::open("state.csj", WriteOptions::default())?;
//! writer.append_record(&JournalRecord::Golden(GoldenRecord {
//!     log_id: LogId::parse("FooLog")?,
//!     envelope: b"...".to_vec(),
//! }))?;
//! writer.finish()?;
//!
//! for record in JournalReader::open("state.csj", ReadMode::Permissive)? {
//!     println!("{:?}", record?.kind());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Unknown frame kinds are skipped by readers, so newer writers can add
//! record types without breaking older readers.

#![deny(missing_docs)]

/// Journal errors.
pub mod errors;
/// Header and frame layout.
pub mod frame;
/// Frame and record reader.
pub mod reader;
/// Typed record payloads.
pub mod record;
/// Frame and record writer.
pub mod writer;

pub use errors::JournalError;
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use reader::{JournalReader, ReadMode};
pub use record::{CheckpointRecord, ForkRecord, GoldenRecord, JournalRecord};
pub use writer::{JournalWriter, WriteOptions};
