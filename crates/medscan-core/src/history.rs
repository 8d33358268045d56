//! # Scan History
//!
//! Host-side list of recently scanned codes, newest first. The session itself
//! never stores results; a host view that wants a "recently scanned" panel
//! records each [`ScanResult`] here as it arrives.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::symbology::Symbology;
use crate::types::ScanResult;
use crate::MAX_HISTORY_ENTRIES;

/// One scanned code as shown in the history panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryEntry {
    /// The decoded payload.
    pub code: String,

    /// When it was scanned.
    #[ts(as = "String")]
    pub scanned_at: DateTime<Utc>,

    /// What kind of code it looks like.
    pub symbology: Symbology,
}

impl From<&ScanResult> for HistoryEntry {
    fn from(result: &ScanResult) -> Self {
        HistoryEntry {
            code: result.payload.clone(),
            scanned_at: result.observed_at,
            symbology: Symbology::detect(&result.payload),
        }
    }
}

/// Bounded, newest-first scan history.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ScanHistory {
    /// Creates an empty history holding [`MAX_HISTORY_ENTRIES`] entries.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ENTRIES)
    }

    /// Creates an empty history with a custom bound (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ScanHistory {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a result at the front, evicting the oldest entry when full.
    pub fn record(&mut self, result: &ScanResult) -> &HistoryEntry {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(HistoryEntry::from(result));
        &self.entries[0]
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}
