//! Document codec boundary.
//!
//! The engine never parses page content itself. Everything it needs from a
//! document container goes through [`DocumentCodec`]:
//! - Checking that bytes look like a supported container
//! - Decoding bytes into a page-addressable source
//! - Copying pages, in a caller-chosen order, into an output
//! - Appending blank pages
//! - Serializing an output back to bytes
//!
//! [`LopdfCodec`] is the PDF implementation used in production.
//!
//! # Examples
//!
//! ```no_run
//! use pdfweave::codec::{DecodedDocument, DocumentCodec, LopdfCodec};
//!
//! # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let codec = LopdfCodec::default();
//! let source = codec.decode(bytes)?;
//!
//! // Reverse the page order.
//! let indices: Vec<usize> = (0..source.page_count()).rev().collect();
//! let mut output = codec.new_output();
//! codec.copy_pages(&mut output, &source, &indices)?;
//! let reversed = codec.serialize(output)?;
//! # Ok(())
//! # }
//! ```

pub mod pdf;

pub use pdf::{LopdfCodec, PdfOutput, PdfSource};

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecFailure>;

/// Low-level failure reported by a codec.
///
/// The engine turns these into [`WeaveError`](crate::WeaveError) values
/// that name the source involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecFailure {
    /// Bytes are not a container this codec understands.
    #[error("not a PDF document: {0}")]
    Unsupported(String),

    /// Container signature is present but its structure is broken.
    #[error("invalid document structure: {0}")]
    Corrupt(String),

    /// A copy referenced a page the source does not have.
    #[error("page index {index} out of range for {page_count} page(s)")]
    PageOutOfRange {
        /// Requested 0-based page index.
        index: usize,
        /// Number of pages in the source.
        page_count: usize,
    },

    /// Writing the output failed.
    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
}

impl PageSize {
    /// ISO A4, the size used when no reference page exists.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// Create a page size from width and height in points.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// A decoded source whose pages can be addressed by 0-based index.
pub trait DecodedDocument: Send + Sync + 'static {
    /// Number of pages in the source.
    fn page_count(&self) -> usize;

    /// Size of the page at `index`, or `None` if there is no such page.
    fn page_size(&self, index: usize) -> Option<PageSize>;
}

/// Parse, copy and serialize operations over a document container.
///
/// Implementations are synchronous and CPU-bound; the compositors move
/// them onto blocking worker threads.
pub trait DocumentCodec: Send + Sync + 'static {
    /// A decoded, read-only source document.
    type Decoded: DecodedDocument;

    /// An output document under construction.
    type Output: Send + 'static;

    /// Cheap container check, without a full parse.
    fn probe(&self, bytes: &[u8]) -> CodecResult<()>;

    /// Fully decode `bytes`.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Self::Decoded>;

    /// Start an empty output document.
    fn new_output(&self) -> Self::Output;

    /// Append the pages at `indices` of `source` to `output`, in order.
    ///
    /// An index may appear more than once; each occurrence becomes its own page.
    fn copy_pages(
        &self,
        output: &mut Self::Output,
        source: &Self::Decoded,
        indices: &[usize],
    ) -> CodecResult<()>;

    /// Append one blank page of the given size.
    fn add_blank_page(&self, output: &mut Self::Output, size: PageSize) -> CodecResult<()>;

    /// Number of pages appended to `output` so far.
    fn output_page_count(&self, output: &Self::Output) -> usize;

    /// Finish `output` and write it to bytes.
    fn serialize(&self, output: Self::Output) -> CodecResult<Vec<u8>>;
}
