/*!
 * Owner Matching and Tracking
 * How owner labels are compared, and per-owner usage history
 */

use super::types::{OwnerCounts, OwnerUsage};
use crate::core::types::Size;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Owner label comparison mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerMatch {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Equality after lowercasing
    CaseInsensitive,
}

impl OwnerMatch {
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            OwnerMatch::Exact => a == b,
            OwnerMatch::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Key under which `owner` is grouped in summaries and tracking
    pub fn key<'a>(self, owner: &'a str) -> Cow<'a, str> {
        match self {
            OwnerMatch::Exact => Cow::Borrowed(owner),
            OwnerMatch::CaseInsensitive => Cow::Owned(owner.to_lowercase()),
        }
    }

    /// Count held blocks per owner key
    pub(crate) fn count<'a>(self, owners: impl Iterator<Item = &'a str>) -> OwnerCounts {
        let mut counts = OwnerCounts::new();
        for owner in owners {
            *counts.entry(self.key(owner).into_owned()).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-owner usage history
#[derive(Debug, Clone, Default)]
pub(crate) struct OwnerTracking {
    pub current_bytes: Size,
    pub peak_bytes: Size,
    pub allocation_count: usize,
}

impl OwnerTracking {
    pub fn add_allocation(&mut self, size: Size) {
        self.current_bytes += size;
        self.allocation_count += 1;
        if self.current_bytes > self.peak_bytes {
            self.peak_bytes = self.current_bytes;
        }
    }

    pub fn remove_allocation(&mut self, size: Size) {
        self.current_bytes = self.current_bytes.saturating_sub(size);
    }
}

/// Tracking table keyed by owner key
#[derive(Debug, Clone, Default)]
pub(crate) struct OwnerTable {
    mode: OwnerMatch,
    entries: AHashMap<String, OwnerTracking>,
}

impl OwnerTable {
    pub fn new(mode: OwnerMatch) -> Self {
        Self {
            mode,
            entries: AHashMap::new(),
        }
    }

    pub fn mode(&self) -> OwnerMatch {
        self.mode
    }

    pub fn record_allocation(&mut self, owner: &str, size: Size) {
        self.entries
            .entry(self.mode.key(owner).into_owned())
            .or_default()
            .add_allocation(size);
    }

    pub fn record_free(&mut self, owner: &str, size: Size) {
        if let Some(track) = self.entries.get_mut(&*self.mode.key(owner)) {
            track.remove_allocation(size);
        }
    }

    /// Drop history for an owner whose blocks were all released
    pub fn forget(&mut self, owner: &str) {
        self.entries.remove(&*self.mode.key(owner));
    }

    /// Usage for `owner`, given the blocks and bytes it currently holds
    pub fn usage(&self, owner: &str, blocks: usize, bytes: Size) -> OwnerUsage {
        let track = self.entries.get(&*self.mode.key(owner));
        OwnerUsage {
            blocks,
            bytes,
            peak_bytes: track.map_or(0, |t| t.peak_bytes),
            allocation_count: track.map_or(0, |t| t.allocation_count),
        }
    }
}
