//! Split composition.
//!
//! The source is decoded once and shared by every range. Each eligible
//! range becomes its own output and its own unit of failure: one range
//! failing to copy or serialize leaves its siblings untouched. Ranges run
//! concurrently up to the configured job count, and outcomes come back in
//! range-set order regardless of completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::codec::{CodecResult, DecodedDocument, DocumentCodec};
use crate::compose::CompositionResult;
use crate::error::{Result, WeaveError};
use crate::ranges::{RangeId, RangeSet, RangeSnapshot};
use crate::sources::SourceDocument;
use crate::utils::ensure_pdf_extension;

/// Outcome of composing one range.
#[derive(Debug)]
pub struct RangeOutcome {
    /// The range this outcome belongs to.
    pub range_id: RangeId,
    /// The finished output, or why this range failed.
    pub result: Result<CompositionResult>,
}

/// Result of a split operation.
#[derive(Debug)]
pub struct SplitReport {
    /// One outcome per eligible range, in range-set order.
    pub outcomes: Vec<RangeOutcome>,

    /// Ranges skipped because their bounds are not valid for the source.
    pub skipped: Vec<RangeId>,

    /// Total time taken for the split.
    pub elapsed: Duration,
}

impl SplitReport {
    /// Successful outputs, in range-set order.
    pub fn outputs(&self) -> impl Iterator<Item = &CompositionResult> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    /// Failed ranges with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (RangeId, &WeaveError)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|err| (outcome.range_id, err))
        })
    }

    /// Number of outputs produced.
    pub fn success_count(&self) -> usize {
        self.outputs().count()
    }
}

/// Document splitter over a [`DocumentCodec`].
#[derive(Debug)]
pub struct SplitCompositor<C> {
    codec: Arc<C>,
    jobs: usize,
}

impl<C: DocumentCodec> SplitCompositor<C> {
    /// Create a splitter that composes at most `jobs` ranges at once.
    pub fn new(codec: Arc<C>, jobs: usize) -> Self {
        Self {
            codec,
            jobs: jobs.max(1),
        }
    }

    /// Maximum number of concurrent range compositions.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Decode `source` for splitting and cache its page count.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` or `CorruptInput` naming the source.
    pub async fn decode_source(&self, source: &SourceDocument) -> Result<Arc<C::Decoded>> {
        let decoded = self
            .decode_blocking(source)
            .await?
            .map_err(|failure| WeaveError::from_load_failure(source.name(), failure))?;
        Ok(Arc::new(decoded))
    }

    /// Compose one output per range from an already decoded source.
    ///
    /// Callers pass eligible ranges only. Outcomes are returned in the order
    /// of `ranges`.
    pub async fn compose_ranges(
        &self,
        source_name: &str,
        decoded: Arc<C::Decoded>,
        ranges: Vec<RangeSnapshot>,
    ) -> Vec<RangeOutcome> {
        stream::iter(ranges)
            .map(|range| {
                let codec = Arc::clone(&self.codec);
                let decoded = Arc::clone(&decoded);
                let source_name = source_name.to_string();
                async move {
                    let range_id = range.id;
                    let result = tokio::task::spawn_blocking(move || {
                        compose_range(codec.as_ref(), decoded.as_ref(), &range, &source_name)
                    })
                    .await
                    .map_err(WeaveError::from)
                    .and_then(|result| result);

                    if let Err(err) = &result {
                        tracing::warn!(range = %range_id, error = %err, "range composition failed");
                    }
                    RangeOutcome { range_id, result }
                }
            })
            .buffered(self.jobs)
            .collect()
            .await
    }

    /// Split `source` into one output per eligible range of `ranges`.
    ///
    /// A range is eligible when `1 <= start <= end <= N`, with `N` the page
    /// count of the decoded source. Ineligible ranges produce no output and
    /// no error; their ids are listed in [`SplitReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns `CodecError` naming the source if it cannot be decoded. Per
    /// range failures are reported in [`SplitReport::outcomes`] instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use pdfweave::codec::LopdfCodec;
    /// # use pdfweave::compose::SplitCompositor;
    /// # use pdfweave::ranges::RangeSet;
    /// # use pdfweave::sources::SourceDocument;
    /// # async fn example(
    /// #     source: &SourceDocument,
    /// #     ranges: &RangeSet,
    /// # ) -> Result<(), Box<dyn std::error::Error>> {
    /// let splitter = SplitCompositor::new(Arc::new(LopdfCodec::default()), 4);
    /// let report = splitter.split(source, ranges).await?;
    /// for output in report.outputs() {
    ///     println!("{}: {} pages", output.name, output.page_count);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn split(&self, source: &SourceDocument, ranges: &RangeSet) -> Result<SplitReport> {
        let split_start = Instant::now();

        let decoded = Arc::new(
            self.decode_blocking(source)
                .await?
                .map_err(|failure| WeaveError::from_compose_failure(source.name(), failure))?,
        );
        let mut report = self.split_decoded(source.name(), decoded, ranges).await;
        report.elapsed = split_start.elapsed();
        Ok(report)
    }

    /// Split an already decoded source. Never fails as a whole.
    pub async fn split_decoded(
        &self,
        source_name: &str,
        decoded: Arc<C::Decoded>,
        ranges: &RangeSet,
    ) -> SplitReport {
        let split_start = Instant::now();
        let total_pages = decoded.page_count();

        let (eligible, ineligible): (Vec<RangeSnapshot>, Vec<RangeSnapshot>) = ranges
            .snapshots()
            .into_iter()
            .partition(|range| range.is_eligible(total_pages));
        let skipped: Vec<RangeId> = ineligible.iter().map(|range| range.id).collect();

        if !skipped.is_empty() {
            tracing::warn!(
                source = %source_name,
                skipped = skipped.len(),
                total_pages,
                "skipping split ranges outside the document"
            );
        }

        let outcomes = self.compose_ranges(source_name, decoded, eligible).await;

        let report = SplitReport {
            outcomes,
            skipped,
            elapsed: split_start.elapsed(),
        };

        tracing::info!(
            source = %source_name,
            outputs = report.success_count(),
            failed = report.failures().count(),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "split complete"
        );

        report
    }

    async fn decode_blocking(&self, source: &SourceDocument) -> Result<CodecResult<C::Decoded>> {
        let codec = Arc::clone(&self.codec);
        let bytes = Arc::clone(source.bytes());
        let decoded = tokio::task::spawn_blocking(move || codec.decode(&bytes)).await?;

        if let Ok(document) = &decoded {
            source.cache_page_count(document.page_count());
        }
        Ok(decoded)
    }
}

fn compose_range<C: DocumentCodec>(
    codec: &C,
    decoded: &C::Decoded,
    range: &RangeSnapshot,
    source_name: &str,
) -> Result<CompositionResult> {
    let indices: Vec<usize> = range.page_indices().collect();
    let name = ensure_pdf_extension(&range.name);

    let mut output = codec.new_output();
    codec
        .copy_pages(&mut output, decoded, &indices)
        .map_err(|failure| WeaveError::from_compose_failure(source_name, failure))?;
    let page_count = codec.output_page_count(&output);

    let bytes = codec
        .serialize(output)
        .map_err(|failure| WeaveError::from_compose_failure(name.as_str(), failure))?;

    tracing::debug!(range = %range.id, output = %name, pages = page_count, "composed range");
    Ok(CompositionResult {
        name,
        bytes,
        page_count,
    })
}
