//! Editing session.
//!
//! An [`EditingSession`] owns all engine state for one user session: the
//! merge sources, the document loaded for splitting with its ranges, and
//! the preview registry. Hosts drive every mutation and composition through
//! it; nothing is global. Dropping the session revokes every preview.
//!
//! # Examples
//!
//! ```no_run
//! use pdfweave::config::EngineConfig;
//! use pdfweave::ranges::{RangeBound, RangeUpdate};
//! use pdfweave::session::EditingSession;
//! use pdfweave::sources::SourceInput;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = EditingSession::new(EngineConfig::default())?;
//!
//! let pages = session
//!     .load_split_source(SourceInput::new("book.pdf", bytes))
//!     .await?;
//! let chapter = session.add_range()?;
//! session.update_range(chapter, RangeUpdate::Name("Chapter 2".to_string()))?;
//! session.edit_range_input(chapter, RangeBound::Start, "5")?;
//! session.commit_range_input(chapter, RangeBound::Start)?;
//!
//! session.refresh_previews().await?;
//! let report = session.split().await?;
//! println!("{} outputs from {pages} pages", report.success_count());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::codec::{DocumentCodec, LopdfCodec};
use crate::compose::{MergeCompositor, MergeOptions, MergeResult, SplitCompositor, SplitReport};
use crate::config::EngineConfig;
use crate::error::{Result, WeaveError};
use crate::preview::{PreviewHandle, PreviewKey, PreviewRegistry};
use crate::ranges::{RangeBound, RangeId, RangeSet, RangeUpdate};
use crate::sources::{SourceCollection, SourceDocument, SourceId, SourceInput};

/// The document loaded for splitting, decoded once, and its ranges.
struct SplitWorkspace<C: DocumentCodec> {
    source: SourceDocument,
    decoded: Arc<C::Decoded>,
    ranges: RangeSet,
}

/// What a preview refresh did.
#[derive(Debug, Default)]
pub struct PreviewRefresh {
    /// Ranges whose preview was recomposed, in range-set order.
    pub composed: Vec<RangeId>,
    /// Ranges whose preview was revoked because they became ineligible.
    pub released: Vec<RangeId>,
    /// Ranges whose recomposition failed; their previews were revoked.
    pub failed: Vec<(RangeId, WeaveError)>,
}

/// All engine state for one editing session.
pub struct EditingSession<C: DocumentCodec> {
    config: EngineConfig,
    codec: Arc<C>,
    sources: SourceCollection,
    split: Option<SplitWorkspace<C>>,
    previews: PreviewRegistry,
    merger: MergeCompositor<C>,
    splitter: SplitCompositor<C>,
}

impl EditingSession<LopdfCodec> {
    /// Create a session with the PDF codec configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let codec = LopdfCodec::new(config.compression);
        Self::with_codec(config, codec)
    }
}

impl<C: DocumentCodec> EditingSession<C> {
    /// Create a session over a custom codec.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn with_codec(config: EngineConfig, codec: C) -> Result<Self> {
        config.validate()?;

        let codec = Arc::new(codec);
        let merger = MergeCompositor::new(Arc::clone(&codec))
            .with_default_name(config.default_merge_name.clone());
        let splitter = SplitCompositor::new(Arc::clone(&codec), config.effective_jobs());

        Ok(Self {
            config,
            codec,
            sources: SourceCollection::new(),
            split: None,
            previews: PreviewRegistry::new(),
            merger,
            splitter,
        })
    }

    /// Session configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live preview handles.
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    // Merge sources

    /// Merge sources in merge order.
    pub fn sources(&self) -> &SourceCollection {
        &self.sources
    }

    /// Import merge sources. See [`SourceCollection::add`].
    pub fn add_sources(&mut self, inputs: Vec<SourceInput>) -> Vec<Result<SourceId>> {
        self.sources.add(inputs, self.codec.as_ref(), &mut self.previews)
    }

    /// Remove a merge source. Returns whether it was present.
    pub fn remove_source(&mut self, id: SourceId) -> bool {
        self.sources.remove(id, &mut self.previews).is_some()
    }

    /// Move a merge source. See [`SourceCollection::reorder`].
    pub fn reorder_source(&mut self, id: SourceId, new_index: usize) -> Result<()> {
        self.sources.reorder(id, new_index)
    }

    /// Remove every merge source.
    pub fn clear_sources(&mut self) {
        self.sources.clear(&mut self.previews);
    }

    /// Page count of a merge source, decoding it on first access.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or the decode failure.
    pub fn source_page_count(&self, id: SourceId) -> Result<usize> {
        self.sources
            .get(id)
            .ok_or_else(|| WeaveError::not_found(id))?
            .page_count(self.codec.as_ref())
    }

    /// Preview handle of a merge source.
    pub fn source_preview(&self, id: SourceId) -> Option<PreviewHandle> {
        self.previews.handle(&PreviewKey::Source(id))
    }

    /// Merge options prefilled from the configuration.
    pub fn merge_options(&self, output_name: Option<String>) -> MergeOptions {
        MergeOptions {
            insert_separators: self.config.insert_separators,
            output_name,
        }
    }

    /// Merge every source. See [`MergeCompositor::merge`].
    pub async fn merge(&self, options: &MergeOptions) -> Result<MergeResult> {
        self.merger.merge(&self.sources, options).await
    }

    // Split source and ranges

    /// Load the document to split, replacing any previous one.
    ///
    /// The range set is reset to a single `Part 1` covering every page, and
    /// every preview of the previous split source and its ranges is revoked.
    /// On failure the previous split state is left as it was.
    ///
    /// # Returns
    ///
    /// The page count of the loaded document.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` or `CorruptInput` naming the input.
    pub async fn load_split_source(&mut self, input: SourceInput) -> Result<u32> {
        self.codec
            .probe(&input.bytes)
            .map_err(|failure| WeaveError::from_load_failure(&input.name, failure))?;

        let source = SourceDocument::new(input.name, input.bytes);
        let decoded = self.splitter.decode_source(&source).await?;
        let page_count = source.page_count(self.codec.as_ref())?;
        let total_pages = u32::try_from(page_count).unwrap_or(u32::MAX);

        self.unload_split_source();
        self.previews
            .acquire(PreviewKey::SplitSource, Arc::clone(source.bytes()));
        tracing::debug!(name = %source.name(), total_pages, "loaded split source");

        self.split = Some(SplitWorkspace {
            source,
            decoded,
            ranges: RangeSet::initialize(total_pages),
        });
        Ok(total_pages)
    }

    /// Drop the split source, its ranges and all their previews.
    ///
    /// Returns whether a split source was loaded.
    pub fn unload_split_source(&mut self) -> bool {
        let Some(workspace) = self.split.take() else {
            return false;
        };

        for range in workspace.ranges.iter() {
            self.previews.release(&PreviewKey::Range(range.id()));
        }
        self.previews.release(&PreviewKey::SplitSource);
        true
    }

    /// The document loaded for splitting, if any.
    pub fn split_source(&self) -> Option<&SourceDocument> {
        self.split.as_ref().map(|workspace| &workspace.source)
    }

    /// Ranges over the split source.
    ///
    /// # Errors
    ///
    /// Returns `NoSplitSource` if nothing is loaded.
    pub fn ranges(&self) -> Result<&RangeSet> {
        Ok(&self.workspace()?.ranges)
    }

    /// Append a full-span range. See [`RangeSet::add`].
    pub fn add_range(&mut self) -> Result<RangeId> {
        Ok(self.workspace_mut()?.ranges.add())
    }

    /// Remove a range and its preview. Unknown ids are ignored.
    pub fn remove_range(&mut self, id: RangeId) -> Result<()> {
        let workspace = self.split.as_mut().ok_or(WeaveError::NoSplitSource)?;
        workspace.ranges.remove(id, &mut self.previews);
        Ok(())
    }

    /// Set one range field. See [`RangeSet::update`].
    pub fn update_range(&mut self, id: RangeId, update: RangeUpdate) -> Result<()> {
        self.workspace_mut()?.ranges.update(id, update)
    }

    /// Store draft text for a range bound. See [`RangeSet::edit_input`].
    pub fn edit_range_input(
        &mut self,
        id: RangeId,
        bound: RangeBound,
        text: impl Into<String>,
    ) -> Result<()> {
        self.workspace_mut()?.ranges.edit_input(id, bound, text)
    }

    /// Commit draft text for a range bound. See [`RangeSet::commit_input`].
    pub fn commit_range_input(&mut self, id: RangeId, bound: RangeBound) -> Result<u32> {
        self.workspace_mut()?.ranges.commit_input(id, bound)
    }

    /// Preview handle of a range.
    pub fn range_preview(&self, id: RangeId) -> Option<PreviewHandle> {
        self.previews.handle(&PreviewKey::Range(id))
    }

    /// Preview handle of the split source.
    pub fn split_source_preview(&self) -> Option<PreviewHandle> {
        self.previews.handle(&PreviewKey::SplitSource)
    }

    /// Bring range previews in line with the committed range bounds.
    ///
    /// Only ranges whose bounds changed since their last preview are
    /// recomposed. Ranges that became ineligible lose their preview.
    ///
    /// # Errors
    ///
    /// Returns `NoSplitSource` if nothing is loaded. Per range failures are
    /// reported in [`PreviewRefresh::failed`].
    pub async fn refresh_previews(&mut self) -> Result<PreviewRefresh> {
        let workspace = self.split.as_mut().ok_or(WeaveError::NoSplitSource)?;
        let mut refresh = PreviewRefresh::default();

        for id in workspace.ranges.invalidated_ranges() {
            self.previews.release(&PreviewKey::Range(id));
            workspace.ranges.clear_composed(id);
            refresh.released.push(id);
        }

        let stale = workspace.ranges.stale_ranges();
        if stale.is_empty() {
            return Ok(refresh);
        }

        let outcomes = self
            .splitter
            .compose_ranges(
                workspace.source.name(),
                Arc::clone(&workspace.decoded),
                stale.clone(),
            )
            .await;

        for (snapshot, outcome) in stale.into_iter().zip(outcomes) {
            let key = PreviewKey::Range(snapshot.id);
            match outcome.result {
                Ok(output) => {
                    self.previews.acquire(key, output.bytes);
                    workspace
                        .ranges
                        .mark_composed(snapshot.id, snapshot.start, snapshot.end);
                    refresh.composed.push(snapshot.id);
                }
                Err(err) => {
                    self.previews.release(&key);
                    workspace.ranges.clear_composed(snapshot.id);
                    refresh.failed.push((snapshot.id, err));
                }
            }
        }

        tracing::debug!(
            composed = refresh.composed.len(),
            released = refresh.released.len(),
            failed = refresh.failed.len(),
            "refreshed range previews"
        );
        Ok(refresh)
    }

    /// Split the loaded source into one output per eligible range.
    ///
    /// # Errors
    ///
    /// Returns `NoSplitSource` if nothing is loaded.
    pub async fn split(&self) -> Result<SplitReport> {
        let workspace = self.workspace()?;
        Ok(self
            .splitter
            .split_decoded(
                workspace.source.name(),
                Arc::clone(&workspace.decoded),
                &workspace.ranges,
            )
            .await)
    }

    // Lifecycle

    /// End the session: drop every source and revoke every preview.
    ///
    /// Returns the number of handles revoked. Safe to call more than once.
    pub fn teardown(&mut self) -> usize {
        self.sources = SourceCollection::new();
        self.split = None;
        let revoked = self.previews.release_all();
        if revoked > 0 {
            tracing::debug!(revoked, "session torn down");
        }
        revoked
    }

    fn workspace(&self) -> Result<&SplitWorkspace<C>> {
        self.split.as_ref().ok_or(WeaveError::NoSplitSource)
    }

    fn workspace_mut(&mut self) -> Result<&mut SplitWorkspace<C>> {
        self.split.as_mut().ok_or(WeaveError::NoSplitSource)
    }
}

impl<C: DocumentCodec> Drop for EditingSession<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
