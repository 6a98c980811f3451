//! Output composition.
//!
//! Two compositors build new documents from decoded sources:
//! - [`MergeCompositor`] concatenates every source of a collection
//! - [`SplitCompositor`] carves one output per eligible range of a split source
//!
//! Codec work is CPU-bound and runs on tokio's blocking pool. Each output
//! is all-or-nothing: bytes are only handed back once serialization has
//! succeeded.

pub mod merge;
pub mod split;

pub use merge::{MergeCompositor, MergeOptions, MergeResult, MergeStatistics};
pub use split::{RangeOutcome, SplitCompositor, SplitReport};

/// One finished output: a file name and the serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionResult {
    /// Output file name, always ending in `.pdf`.
    pub name: String,
    /// Serialized document.
    pub bytes: Vec<u8>,
    /// Number of pages in the output.
    pub page_count: usize,
}

impl CompositionResult {
    /// Size of the output in bytes.
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}
