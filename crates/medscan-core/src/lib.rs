//! # medscan-core: Pure Scan Domain Logic
//!
//! This crate holds everything about scanning that can be expressed without
//! touching a camera: session states, scan results and errors, decode error
//! classification, barcode symbology checks and the scan history list.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MedScan Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Host View (CLI / Web)                        │   │
//! │  │    Start button ──► State badge ──► Last code ──► History      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ start / stop / dispose                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              medscan-session (ScanSession actor)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ medscan-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ classify  │  │ symbology │  │  history  │  │   │
//! │  │   │ ScanResult│  │ NoSymbol  │  │  EAN-13   │  │ newest    │  │   │
//! │  │   │ ScanError │  │ vs Fault  │  │  UPC-A    │  │ first     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CAMERA • NO TASKS • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Session state, scan results, capture configuration
//! - [`classify`] - Decoder error message classification
//! - [`symbology`] - Retail barcode detection with check digits
//! - [`history`] - Bounded, newest-first scan history
//! - [`validation`] - Capture configuration and payload checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use medscan_core::classify::{ErrorClassifier, FrameOutcome};
//!
//! let classifier = ErrorClassifier::default();
//! let outcome = classifier.classify_error("QR code parse error, error = NotFoundException");
//! assert_eq!(outcome, FrameOutcome::NoSymbolFound);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod classify;
pub mod error;
pub mod history;
pub mod symbology;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use classify::{ErrorClassifier, FrameOutcome};
pub use error::{CoreError, ValidationError};
pub use history::{HistoryEntry, ScanHistory};
pub use symbology::Symbology;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Element id a web host mounts the capture video into.
pub const DEFAULT_TARGET_ID: &str = "scanner-container";

/// Maximum entries kept in a [`ScanHistory`].
///
/// ## Business Reason
/// The history panel is a quick "what did I just scan" list, not an audit log.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// Highest frame rate a capture may request.
pub const MAX_FPS: u32 = 60;
