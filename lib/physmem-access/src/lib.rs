//! # Typed Physical Memory Access
//!
//! Reads and writes one mapped page at byte, half-word, native word or cache
//! line granularity, verifying every write by reading it back.
//!
//! The engine only ever sees a [`PageWindow`](physmem_map::PageWindow); which
//! backend produced it is decided by the caller.

mod engine;
mod pagetest;
mod report;
mod transfer;
mod width;

pub use engine::{
    AccessError, Operation, WORDS_PER_LINE, access, line_offset, sequence_word, synthesize_line, verify_words,
};
pub use pagetest::{DumpRow, PageTest, dump_page, fill_page, verify_page};
pub use report::{AccessReport, BulkSummary, Mismatch, Readback, Sample};
pub use transfer::TransferBuffer;
pub use width::{AccessWidth, InvalidAccessWidth};
