//! Revocable preview handles.
//!
//! A host displays byte buffers (imported sources, split results) through
//! [`PreviewHandle`]s issued by a [`PreviewRegistry`]. The registry is a
//! plain owned map from [`PreviewKey`] to buffer:
//! - `acquire` replaces and revokes any handle already issued for the key
//! - `release` revokes one key, and is a no-op when nothing is live
//! - `release_all` revokes everything, and must run on session teardown
//!
//! Mutation needs `&mut self`, so two acquisitions for the same key can
//! never interleave. A revoked handle stays a valid value but no longer
//! opens anything.
//!
//! # Examples
//!
//! ```
//! use pdfweave::preview::{PreviewKey, PreviewRegistry};
//! use pdfweave::ranges::RangeId;
//! use std::io::Read;
//!
//! let mut previews = PreviewRegistry::new();
//! let key = PreviewKey::Range(RangeId::new(1));
//!
//! let first = previews.acquire(key, b"%PDF-1.5 one".to_vec());
//! let second = previews.acquire(key, b"%PDF-1.5 two".to_vec());
//! assert!(previews.open(&first).is_none());
//!
//! let mut text = String::new();
//! previews.open(&second).unwrap().read_to_string(&mut text).unwrap();
//! assert_eq!(text, "%PDF-1.5 two");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use uuid::Uuid;

use crate::ranges::RangeId;
use crate::sources::SourceId;

/// Owner of a preview buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewKey {
    /// An imported merge source.
    Source(SourceId),
    /// The document loaded for splitting.
    SplitSource,
    /// The output of one split range.
    Range(RangeId),
}

impl fmt::Display for PreviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(id) => write!(f, "source:{id}"),
            Self::SplitSource => write!(f, "split-source"),
            Self::Range(id) => write!(f, "range:{id}"),
        }
    }
}

/// An opaque, revocable reference to a preview buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    key: PreviewKey,
    token: Uuid,
}

impl PreviewHandle {
    /// The key this handle was issued under.
    pub fn key(&self) -> PreviewKey {
        self.key
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview:{}", self.token)
    }
}

#[derive(Debug)]
struct PreviewEntry {
    token: Uuid,
    bytes: Arc<[u8]>,
}

/// Counters describing registry activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewStatistics {
    /// Handles currently live.
    pub live: usize,
    /// Handles ever issued.
    pub issued: u64,
    /// Handles revoked, by release or by replacement.
    pub revoked: u64,
}

/// Owned map of live preview buffers.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: HashMap<PreviewKey, PreviewEntry>,
    issued: u64,
    revoked: u64,
}

impl PreviewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle for `bytes` under `key`.
    ///
    /// Any handle previously issued for `key` is revoked first.
    pub fn acquire(&mut self, key: PreviewKey, bytes: impl Into<Arc<[u8]>>) -> PreviewHandle {
        let token = Uuid::new_v4();
        let entry = PreviewEntry {
            token,
            bytes: bytes.into(),
        };

        if let Some(previous) = self.entries.insert(key, entry) {
            self.revoked += 1;
            tracing::debug!(%key, revoked = %previous.token, "replaced preview handle");
        }
        self.issued += 1;
        tracing::debug!(%key, %token, "issued preview handle");

        PreviewHandle { key, token }
    }

    /// Revoke the handle for `key`, if one is live.
    ///
    /// Returns whether a handle was revoked. Calling it again is a no-op.
    pub fn release(&mut self, key: &PreviewKey) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.revoked += 1;
                tracing::debug!(%key, token = %entry.token, "revoked preview handle");
                true
            }
            None => false,
        }
    }

    /// Revoke every live handle and return how many there were.
    pub fn release_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.revoked += count as u64;
        if count > 0 {
            tracing::debug!(count, "revoked all preview handles");
        }
        count
    }

    /// The live handle for `key`, if any.
    pub fn handle(&self, key: &PreviewKey) -> Option<PreviewHandle> {
        self.entries.get(key).map(|entry| PreviewHandle {
            key: *key,
            token: entry.token,
        })
    }

    /// Whether `handle` is still the live handle for its key.
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.entries
            .get(&handle.key)
            .is_some_and(|entry| entry.token == handle.token)
    }

    /// Open a readable view of the buffer behind `handle`.
    ///
    /// Returns `None` once the handle has been revoked or replaced.
    pub fn open(&self, handle: &PreviewHandle) -> Option<Cursor<Arc<[u8]>>> {
        self.bytes(handle).map(Cursor::new)
    }

    /// Shared buffer behind `handle`, while it is live.
    pub fn bytes(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.entries
            .get(&handle.key)
            .filter(|entry| entry.token == handle.token)
            .map(|entry| Arc::clone(&entry.bytes))
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handle is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activity counters.
    pub fn statistics(&self) -> PreviewStatistics {
        PreviewStatistics {
            live: self.entries.len(),
            issued: self.issued,
            revoked: self.revoked,
        }
    }
}
