//! # View State
//!
//! What the terminal host shows about its session. The session owns the real
//! state; this is the host's copy, updated only from the session's watch
//! channel and event streams.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              ViewState                                  │
//! │                                                                         │
//! │  watch::Receiver<SessionState> ──► on_state()  ──► state badge         │
//! │                                                    (clears the error   │
//! │                                                     when a retry       │
//! │                                                     starts)            │
//! │  results stream ─────────────────► on_result() ──► last code, history  │
//! │  errors stream ──────────────────► on_error()  ──► error message       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use medscan_core::{HistoryEntry, ScanError, ScanHistory, ScanResult, SessionState};

use crate::output::StatusView;

/// Host-side copy of the session's observable state.
#[derive(Debug, Clone)]
pub struct ViewState {
    state: SessionState,
    last_error: Option<ScanError>,
    history: ScanHistory,
    scans: usize,
}

impl ViewState {
    pub fn new(history_size: usize) -> Self {
        ViewState {
            state: SessionState::Idle,
            last_error: None,
            history: ScanHistory::with_capacity(history_size),
            scans: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&ScanError> {
        self.last_error.as_ref()
    }

    /// Applies a state change from the session.
    pub fn on_state(&mut self, state: SessionState) {
        if state == SessionState::Starting {
            self.last_error = None;
        }
        self.state = state;
    }

    /// Records an accepted scan and returns its history entry.
    pub fn on_result(&mut self, result: &ScanResult) -> HistoryEntry {
        self.scans += 1;
        self.history.record(result).clone()
    }

    pub fn on_error(&mut self, error: ScanError) {
        self.last_error = Some(error);
    }

    /// History entries, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.iter().cloned().collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            state: self.state,
            last_code: self.history.last().map(|e| e.code.clone()),
            last_error: self.last_error.as_ref().map(|e| e.message.clone()),
            scans: self.scans,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(medscan_core::MAX_HISTORY_ENTRIES)
    }
}
