//! Merge composition.
//!
//! Concatenates every source of a [`SourceCollection`] into one output, in
//! collection order, optionally separating sources with a blank page.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codec::{DecodedDocument, DocumentCodec};
use crate::compose::CompositionResult;
use crate::config::DEFAULT_MERGE_NAME;
use crate::error::{Result, WeaveError};
use crate::sources::SourceCollection;
use crate::utils::{ensure_pdf_extension, format_file_size};

/// Per-merge choices made by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Append a blank page after every source except the last.
    pub insert_separators: bool,

    /// Output name; blank or missing falls back to the default name.
    pub output_name: Option<String>,
}

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of sources merged.
    pub files_merged: usize,

    /// Total number of pages in the output, separators included.
    pub total_pages: usize,

    /// Number of blank separator pages inserted.
    pub separators_inserted: usize,

    /// Combined size of the sources in bytes.
    pub input_size: u64,

    /// Total time taken for the merge.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }
}

/// Result of a merge operation.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The merged document.
    pub output: CompositionResult,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// Document merger over a [`DocumentCodec`].
#[derive(Debug)]
pub struct MergeCompositor<C> {
    codec: Arc<C>,
    default_name: String,
}

impl<C: DocumentCodec> MergeCompositor<C> {
    /// Create a merger that names unnamed outputs `merged.pdf`.
    pub fn new(codec: Arc<C>) -> Self {
        Self {
            codec,
            default_name: DEFAULT_MERGE_NAME.to_string(),
        }
    }

    /// Use `name` for outputs the caller leaves unnamed.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Resolve the file name of a merge output.
    ///
    /// The requested name is trimmed; a blank one is replaced by the
    /// default name. `.pdf` is appended when missing.
    pub fn output_name(&self, requested: Option<&str>) -> String {
        let name = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.default_name.as_str());
        ensure_pdf_extension(name)
    }

    /// Merge every source of `sources`, in collection order.
    ///
    /// Page counts discovered while decoding are cached on the sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The collection is empty (`EmptyInput`)
    /// - Any source fails to decode or copy (`CodecError` naming that source)
    /// - The output fails to serialize (`CodecError` naming the output)
    ///
    /// Nothing is returned on failure; the partial output is dropped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use pdfweave::codec::LopdfCodec;
    /// # use pdfweave::compose::{MergeCompositor, MergeOptions};
    /// # use pdfweave::sources::SourceCollection;
    /// # async fn example(sources: &SourceCollection) -> Result<(), Box<dyn std::error::Error>> {
    /// let merger = MergeCompositor::new(Arc::new(LopdfCodec::default()));
    /// let options = MergeOptions {
    ///     insert_separators: true,
    ///     output_name: Some("binder".to_string()),
    /// };
    /// let result = merger.merge(sources, &options).await?;
    /// println!("{}: {} pages", result.output.name, result.statistics.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(
        &self,
        sources: &SourceCollection,
        options: &MergeOptions,
    ) -> Result<MergeResult> {
        let merge_start = Instant::now();

        if sources.is_empty() {
            return Err(WeaveError::EmptyInput);
        }

        let name = self.output_name(options.output_name.as_deref());
        let inputs: Vec<(String, Arc<[u8]>)> = sources
            .iter()
            .map(|source| (source.name().to_string(), Arc::clone(source.bytes())))
            .collect();

        let codec = Arc::clone(&self.codec);
        let insert_separators = options.insert_separators;
        let output_name = name.clone();
        let merged = tokio::task::spawn_blocking(move || {
            compose_merge(codec.as_ref(), &inputs, insert_separators, &output_name)
        })
        .await??;

        for (source, count) in sources.iter().zip(&merged.page_counts) {
            source.cache_page_count(*count);
        }

        let statistics = MergeStatistics {
            files_merged: sources.len(),
            total_pages: merged.page_count,
            separators_inserted: merged.separators,
            input_size: sources.total_size(),
            merge_time: merge_start.elapsed(),
        };

        tracing::info!(
            output = %name,
            files = statistics.files_merged,
            pages = statistics.total_pages,
            separators = statistics.separators_inserted,
            elapsed_ms = statistics.merge_time.as_millis() as u64,
            "merge complete"
        );

        Ok(MergeResult {
            output: CompositionResult {
                name,
                bytes: merged.bytes,
                page_count: merged.page_count,
            },
            statistics,
        })
    }
}

struct MergedDocument {
    bytes: Vec<u8>,
    page_count: usize,
    page_counts: Vec<usize>,
    separators: usize,
}

fn compose_merge<C: DocumentCodec>(
    codec: &C,
    inputs: &[(String, Arc<[u8]>)],
    insert_separators: bool,
    output_name: &str,
) -> Result<MergedDocument> {
    let mut output = codec.new_output();
    let mut page_counts = Vec::with_capacity(inputs.len());
    let mut separators = 0;
    let last = inputs.len().saturating_sub(1);

    for (position, (name, bytes)) in inputs.iter().enumerate() {
        let compose_failure = |failure| WeaveError::from_compose_failure(name.as_str(), failure);

        let source = codec.decode(bytes).map_err(compose_failure)?;
        let indices: Vec<usize> = (0..source.page_count()).collect();
        codec
            .copy_pages(&mut output, &source, &indices)
            .map_err(compose_failure)?;
        page_counts.push(indices.len());

        // Sized after the source it follows, not the one it precedes.
        if insert_separators && position < last {
            let size = source.page_size(0).unwrap_or_default();
            codec
                .add_blank_page(&mut output, size)
                .map_err(compose_failure)?;
            separators += 1;
        }

        tracing::debug!(source = %name, pages = indices.len(), "appended source pages");
    }

    let page_count = codec.output_page_count(&output);
    let bytes = codec
        .serialize(output)
        .map_err(|failure| WeaveError::from_compose_failure(output_name, failure))?;

    Ok(MergedDocument {
        bytes,
        page_count,
        page_counts,
        separators,
    })
}
