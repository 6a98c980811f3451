//! pdfweave - Merge page-based documents into one, or split one into named parts.
//!
//! This library is the engine behind a document assembly tool. It keeps
//! all editing state in memory and composes new documents on request:
//!
//! - An ordered collection of merge sources, with add, remove and reorder
//! - Named page ranges over one split source, with permissive editing
//! - Merge composition with optional blank separator pages
//! - Split composition, one output per eligible range, failures isolated per range
//! - Revocable preview handles for every buffer the host displays
//!
//! Parsing and serialization go through the [`codec::DocumentCodec`] trait;
//! [`codec::LopdfCodec`] implements it for PDF.
//!
//! # Examples
//!
//! ## Merge
//!
//! ```no_run
//! use pdfweave::config::EngineConfig;
//! use pdfweave::session::EditingSession;
//! use pdfweave::sources::SourceInput;
//!
//! # async fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = EditingSession::new(EngineConfig::default())?;
//! for result in session.add_sources(vec![
//!     SourceInput::new("cover.pdf", a),
//!     SourceInput::new("body.pdf", b),
//! ]) {
//!     result?;
//! }
//!
//! let options = session.merge_options(Some("book".to_string()));
//! let merged = session.merge(&options).await?;
//! assert_eq!(merged.output.name, "book.pdf");
//! # Ok(())
//! # }
//! ```
//!
//! ## Split
//!
//! ```no_run
//! use pdfweave::config::EngineConfig;
//! use pdfweave::ranges::RangeUpdate;
//! use pdfweave::session::EditingSession;
//! use pdfweave::sources::SourceInput;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = EditingSession::new(EngineConfig::default())?;
//! session.load_split_source(SourceInput::new("report.pdf", bytes)).await?;
//!
//! let appendix = session.add_range()?;
//! session.update_range(appendix, RangeUpdate::Start(12))?;
//!
//! let report = session.split().await?;
//! for output in report.outputs() {
//!     println!("{} ({} pages)", output.name, output.page_count);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod compose;
pub mod config;
pub mod error;
pub mod preview;
pub mod ranges;
pub mod session;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{Result, WeaveError};
pub use session::EditingSession;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
