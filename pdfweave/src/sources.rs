//! Ordered collection of merge sources.
//!
//! Insertion order is merge order. Entries are identified by a random
//! [`SourceId`] that survives reordering. Importing a source hands its
//! bytes to the [`PreviewRegistry`]; removing it revokes that preview.
//!
//! # Examples
//!
//! ```no_run
//! use pdfweave::codec::LopdfCodec;
//! use pdfweave::preview::PreviewRegistry;
//! use pdfweave::sources::{SourceCollection, SourceInput};
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let codec = LopdfCodec::default();
//! let mut previews = PreviewRegistry::new();
//! let mut sources = SourceCollection::new();
//!
//! let added = sources.add(
//!     vec![SourceInput::new("a.pdf", a), SourceInput::new("b.pdf", b)],
//!     &codec,
//!     &mut previews,
//! );
//! let second = *added[1].as_ref().unwrap();
//!
//! // Move b.pdf in front of a.pdf.
//! sources.reorder(second, 0)?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::codec::{DecodedDocument, DocumentCodec};
use crate::error::{Result, WeaveError};
use crate::preview::{PreviewKey, PreviewRegistry};
use crate::utils::format_file_size;

/// Stable identity of an imported source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Uuid);

impl SourceId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw input handed over by the host: a display name and the file bytes.
#[derive(Debug, Clone)]
pub struct SourceInput {
    /// Display name, usually the file name.
    pub name: String,
    /// Document bytes.
    pub bytes: Vec<u8>,
}

impl SourceInput {
    /// Create an input from a name and bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// An imported source document.
#[derive(Debug)]
pub struct SourceDocument {
    id: SourceId,
    name: String,
    bytes: Arc<[u8]>,
    page_count: OnceLock<usize>,
}

impl SourceDocument {
    /// Wrap already-probed bytes under a fresh id.
    pub(crate) fn new(name: String, bytes: Vec<u8>) -> Self {
        Self {
            id: SourceId::generate(),
            name,
            bytes: bytes.into(),
            page_count: OnceLock::new(),
        }
    }

    /// Stable id of this source.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the document bytes.
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Size of the document in bytes.
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Size formatted for display.
    pub fn format_size(&self) -> String {
        format_file_size(self.byte_len())
    }

    /// Page count, decoding the document on first access.
    ///
    /// The count is cached; later calls do not touch the codec.
    ///
    /// # Errors
    ///
    /// Returns `CorruptInput` or `UnsupportedFormat` if decoding fails.
    /// Nothing is cached on failure.
    pub fn page_count<C: DocumentCodec>(&self, codec: &C) -> Result<usize> {
        if let Some(count) = self.page_count.get() {
            return Ok(*count);
        }
        let decoded = codec
            .decode(&self.bytes)
            .map_err(|failure| WeaveError::from_load_failure(&self.name, failure))?;
        Ok(*self.page_count.get_or_init(|| decoded.page_count()))
    }

    /// Page count if it has already been resolved.
    pub fn cached_page_count(&self) -> Option<usize> {
        self.page_count.get().copied()
    }

    pub(crate) fn cache_page_count(&self, count: usize) {
        let _ = self.page_count.set(count);
    }
}

/// Ordered set of merge sources.
#[derive(Debug, Default)]
pub struct SourceCollection {
    entries: Vec<SourceDocument>,
}

impl SourceCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Import inputs, appending accepted ones at the end in input order.
    ///
    /// Each input is checked on its own; a rejected input does not stop the
    /// rest. Accepted sources get a preview keyed by their new id.
    ///
    /// # Returns
    ///
    /// One result per input, in input order: the new id, or
    /// `UnsupportedFormat` when the codec does not recognize the bytes.
    pub fn add<C: DocumentCodec>(
        &mut self,
        inputs: Vec<SourceInput>,
        codec: &C,
        previews: &mut PreviewRegistry,
    ) -> Vec<Result<SourceId>> {
        inputs
            .into_iter()
            .map(|input| -> Result<SourceId> {
                codec
                    .probe(&input.bytes)
                    .map_err(|failure| WeaveError::from_load_failure(&input.name, failure))?;

                let source = SourceDocument::new(input.name, input.bytes);
                let id = source.id;
                previews.acquire(PreviewKey::Source(id), Arc::clone(&source.bytes));
                tracing::debug!(
                    %id,
                    name = %source.name,
                    bytes = source.byte_len(),
                    "added source"
                );
                self.entries.push(source);
                Ok(id)
            })
            .collect()
    }

    /// Remove a source and revoke its preview.
    ///
    /// Unknown ids are ignored. Remaining entries keep their relative order.
    pub fn remove(
        &mut self,
        id: SourceId,
        previews: &mut PreviewRegistry,
    ) -> Option<SourceDocument> {
        let position = self.position(id)?;
        let removed = self.entries.remove(position);
        previews.release(&PreviewKey::Source(id));
        tracing::debug!(%id, name = %removed.name, "removed source");
        Some(removed)
    }

    /// Move a source to `new_index`, clamped to the valid positions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the collection; the order is
    /// left unchanged.
    pub fn reorder(&mut self, id: SourceId, new_index: usize) -> Result<()> {
        let from = self.position(id).ok_or_else(|| WeaveError::not_found(id))?;
        let to = new_index.min(self.entries.len() - 1);

        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            tracing::debug!(%id, from, to, "reordered source");
        }
        Ok(())
    }

    /// Remove every source and revoke their previews.
    pub fn clear(&mut self, previews: &mut PreviewRegistry) {
        for entry in self.entries.drain(..) {
            previews.release(&PreviewKey::Source(entry.id));
        }
    }

    /// Look up a source by id.
    pub fn get(&self, id: SourceId) -> Option<&SourceDocument> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Current position of `id` in merge order.
    pub fn position(&self, id: SourceId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Ids in merge order.
    pub fn ids(&self) -> Vec<SourceId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Iterate sources in merge order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDocument> {
        self.entries.iter()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combined size of all sources in bytes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(SourceDocument::byte_len).sum()
    }
}
