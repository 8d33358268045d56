//! # medscan-session: Scan Session Controller
//!
//! This crate owns the lifecycle of one camera-backed capture-and-decode
//! resource: acquiring it, turning its frame reports into results and errors,
//! and releasing it on stop, on fault, or when the host goes away.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Session Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  ScanSession (actor, one Tokio task)             │  │
//! │  │                                                                  │  │
//! │  │  Owns SessionState and the CaptureHandle                         │  │
//! │  │  Serializes start / stop / dispose with acquire/release results  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ DecoderCapab.  │  │ ErrorClassifier│  │  ReplayDecoder         │    │
//! │  │                │  │ (core)         │  │                        │    │
//! │  │ acquire()      │  │ NoSymbolFound  │  │ Scripted frames at the │    │
//! │  │ release()      │  │ vs Fault       │  │ configured fps         │    │
//! │  │ FrameSink      │  │                │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  HOST-FACING OUTPUTS:                                                  │
//! │  • watch::Receiver<SessionState>  - current state                      │
//! │  • SessionEvents.results          - accepted decodes                   │
//! │  • SessionEvents.errors           - fatal errors, once per failure     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - `ScanSession` actor and `ScanSessionHandle`
//! - [`decoder`] - `DecoderCapability` trait and `FrameSink`
//! - [`replay`] - Script-driven decoder
//! - [`config`] - Scanner configuration (TOML + env)
//! - [`error`] - Session and decoder error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medscan_session::{ReplayDecoder, ReplayScript, ScanSession, ScannerConfig, SessionOptions};
//!
//! let config = ScannerConfig::load_or_default(None);
//! let decoder = Arc::new(ReplayDecoder::new(ReplayScript::parse("ok ABC123")?));
//! let (session, mut events) = ScanSession::spawn(decoder, SessionOptions::from_config(&config)?);
//!
//! session.start()?;
//! if let Some(result) = events.results.recv().await {
//!     println!("Scanned: {}", result.payload);
//! }
//! session.dispose().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod decoder;
pub mod error;
pub mod replay;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ScannerConfig;
pub use decoder::{AcquireRequest, DecoderCapability, FrameReport, FrameSink};
pub use error::{DecoderError, DecoderErrorKind, SessionError, SessionResult};
pub use replay::{ReplayDecoder, ReplayScript, ReplayStep};
pub use session::{CaptureHandle, ScanSession, ScanSessionHandle, SessionEvents, SessionOptions};
