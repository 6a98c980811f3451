//! Named page ranges over one split source.
//!
//! A [`RangeSet`] is bound to a source with a fixed page count `N`. Edits
//! are permissive: bounds that run past `N` or cross each other are kept
//! as typed, and only composition decides whether a range is eligible.
//!
//! Start and end are edited in two steps, like a text box: the raw text is
//! stored with [`RangeSet::edit_input`], then [`RangeSet::commit_input`]
//! parses it into the committed integer.
//!
//! # Examples
//!
//! ```
//! use pdfweave::ranges::{RangeBound, RangeSet};
//!
//! let mut ranges = RangeSet::initialize(10);
//! let first = ranges.iter().next().unwrap().id();
//!
//! ranges.edit_input(first, RangeBound::Start, "3").unwrap();
//! ranges.commit_input(first, RangeBound::Start).unwrap();
//! ranges.edit_input(first, RangeBound::End, "").unwrap();
//! assert_eq!(ranges.commit_input(first, RangeBound::End).unwrap(), 10);
//!
//! let range = ranges.get(first).unwrap();
//! assert_eq!((range.start(), range.end()), (3, 10));
//! ```

use std::fmt;
use std::ops::Range;

use crate::error::{Result, WeaveError};
use crate::preview::{PreviewKey, PreviewRegistry};
use crate::utils::parse_int_prefix;

/// Stable identity of a range within its set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(u32);

impl RangeId {
    /// Wrap a raw id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which bound of a range an input edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// First page, 1-based.
    Start,
    /// Last page, 1-based and inclusive.
    End,
}

/// A direct, typed change to one field of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeUpdate {
    /// Output name, stored verbatim.
    Name(String),
    /// First page.
    Start(u32),
    /// Last page.
    End(u32),
}

/// A named, 1-based inclusive page interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRange {
    id: RangeId,
    name: String,
    start: u32,
    end: u32,
    start_input: String,
    end_input: String,
    composed: Option<(u32, u32)>,
}

impl SplitRange {
    fn new(id: RangeId, name: String, start: u32, end: u32) -> Self {
        Self {
            id,
            name,
            start,
            end,
            start_input: start.to_string(),
            end_input: end.to_string(),
            composed: None,
        }
    }

    /// Range id.
    pub fn id(&self) -> RangeId {
        self.id
    }

    /// Output name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Committed first page.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Committed last page.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Current, possibly uncommitted, text of a bound.
    pub fn input(&self, bound: RangeBound) -> &str {
        match bound {
            RangeBound::Start => &self.start_input,
            RangeBound::End => &self.end_input,
        }
    }

    /// Whether this range can be composed from a source of `total_pages`.
    pub fn is_eligible(&self, total_pages: usize) -> bool {
        is_eligible(self.start, self.end, total_pages)
    }

    /// Owned copy of the fields a composition needs.
    pub fn snapshot(&self) -> RangeSnapshot {
        RangeSnapshot {
            id: self.id,
            name: self.name.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// The committed state of a range at the moment a composition starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSnapshot {
    /// Range id.
    pub id: RangeId,
    /// Output name.
    pub name: String,
    /// First page, 1-based.
    pub start: u32,
    /// Last page, 1-based and inclusive.
    pub end: u32,
}

impl RangeSnapshot {
    /// Whether this range can be composed from a source of `total_pages`.
    pub fn is_eligible(&self, total_pages: usize) -> bool {
        is_eligible(self.start, self.end, total_pages)
    }

    /// 0-based, half-open page indices covered by the range.
    pub fn page_indices(&self) -> Range<usize> {
        (self.start as usize).saturating_sub(1)..self.end as usize
    }
}

fn is_eligible(start: u32, end: u32, total_pages: usize) -> bool {
    start >= 1 && start <= end && (start as usize) <= total_pages && (end as usize) <= total_pages
}

/// Ordered ranges bound to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    total_pages: u32,
    ranges: Vec<SplitRange>,
    next_id: u32,
    added: u32,
}

impl RangeSet {
    /// Create an empty set for a source of `total_pages`.
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            ranges: Vec::new(),
            next_id: 1,
            added: 0,
        }
    }

    /// Create a set seeded with one range, `Part 1`, covering every page.
    pub fn initialize(total_pages: u32) -> Self {
        let mut set = Self::new(total_pages);
        set.add();
        set
    }

    /// Page count of the bound source.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Append a full-span range named `Part <n>`.
    ///
    /// `n` counts every range ever added to this set, so names are not
    /// reused after a removal.
    pub fn add(&mut self) -> RangeId {
        let id = RangeId(self.next_id);
        self.next_id += 1;
        self.added += 1;

        let name = format!("Part {}", self.added);
        tracing::debug!(%id, %name, "added split range");
        self.ranges.push(SplitRange::new(id, name, 1, self.total_pages));
        id
    }

    /// Remove a range and revoke its preview. Unknown ids are ignored.
    pub fn remove(&mut self, id: RangeId, previews: &mut PreviewRegistry) -> Option<SplitRange> {
        let position = self.ranges.iter().position(|range| range.id == id)?;
        let removed = self.ranges.remove(position);
        previews.release(&PreviewKey::Range(id));
        tracing::debug!(%id, "removed split range");
        Some(removed)
    }

    /// Set one field directly.
    ///
    /// Bounds are stored as given, even when they are out of order or past
    /// the last page; such ranges are skipped at composition time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the set.
    pub fn update(&mut self, id: RangeId, update: RangeUpdate) -> Result<()> {
        let range = self.range_mut(id)?;
        match update {
            RangeUpdate::Name(name) => range.name = name,
            RangeUpdate::Start(start) => {
                range.start = start;
                range.start_input = start.to_string();
            }
            RangeUpdate::End(end) => {
                range.end = end;
                range.end_input = end.to_string();
            }
        }
        Ok(())
    }

    /// Store raw text for a bound without committing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the set.
    pub fn edit_input(
        &mut self,
        id: RangeId,
        bound: RangeBound,
        text: impl Into<String>,
    ) -> Result<()> {
        let range = self.range_mut(id)?;
        match bound {
            RangeBound::Start => range.start_input = text.into(),
            RangeBound::End => range.end_input = text.into(),
        }
        Ok(())
    }

    /// Parse the pending text of a bound and commit it.
    ///
    /// Empty, unparsable or zero input resolves to `1` for the start and to
    /// the page count for the end. Negative values are raised to `1`. Values
    /// past the last page are kept. The stored text is rewritten to the
    /// committed value.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the set.
    pub fn commit_input(&mut self, id: RangeId, bound: RangeBound) -> Result<u32> {
        let total_pages = self.total_pages;
        let range = self.range_mut(id)?;

        let fallback = match bound {
            RangeBound::Start => 1,
            RangeBound::End => total_pages,
        };
        let value = match parse_int_prefix(range.input(bound)) {
            None | Some(0) => fallback,
            Some(parsed) if parsed < 0 => 1,
            Some(parsed) => u32::try_from(parsed).unwrap_or(u32::MAX),
        };

        match bound {
            RangeBound::Start => {
                range.start = value;
                range.start_input = value.to_string();
            }
            RangeBound::End => {
                range.end = value;
                range.end_input = value.to_string();
            }
        }
        tracing::debug!(%id, ?bound, value, "committed range bound");
        Ok(value)
    }

    /// Look up a range by id.
    pub fn get(&self, id: RangeId) -> Option<&SplitRange> {
        self.ranges.iter().find(|range| range.id == id)
    }

    /// Iterate ranges in order.
    pub fn iter(&self) -> impl Iterator<Item = &SplitRange> {
        self.ranges.iter()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the set has no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Snapshots of every range, in order.
    pub fn snapshots(&self) -> Vec<RangeSnapshot> {
        self.ranges.iter().map(SplitRange::snapshot).collect()
    }

    /// Eligible ranges whose bounds changed since their preview was composed.
    ///
    /// Ranges without a preview are stale. Renaming never makes a range stale.
    pub fn stale_ranges(&self) -> Vec<RangeSnapshot> {
        let total_pages = self.total_pages as usize;
        self.ranges
            .iter()
            .filter(|range| range.is_eligible(total_pages))
            .filter(|range| range.composed != Some((range.start, range.end)))
            .map(SplitRange::snapshot)
            .collect()
    }

    /// Ranges that have a preview but are no longer eligible.
    pub fn invalidated_ranges(&self) -> Vec<RangeId> {
        let total_pages = self.total_pages as usize;
        self.ranges
            .iter()
            .filter(|range| range.composed.is_some() && !range.is_eligible(total_pages))
            .map(SplitRange::id)
            .collect()
    }

    /// Record that a preview was composed from the given bounds.
    pub fn mark_composed(&mut self, id: RangeId, start: u32, end: u32) {
        if let Ok(range) = self.range_mut(id) {
            range.composed = Some((start, end));
        }
    }

    /// Forget the preview bounds of a range.
    pub fn clear_composed(&mut self, id: RangeId) {
        if let Ok(range) = self.range_mut(id) {
            range.composed = None;
        }
    }

    fn range_mut(&mut self, id: RangeId) -> Result<&mut SplitRange> {
        self.ranges
            .iter_mut()
            .find(|range| range.id == id)
            .ok_or_else(|| WeaveError::not_found(id))
    }
}
