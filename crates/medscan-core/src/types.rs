//! # Domain Types
//!
//! Core domain types shared by the session controller and host views.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SessionState   │   │   ScanResult    │   │   ScanError     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Idle           │   │  payload        │   │  message        │       │
//! │  │  Starting       │   │  observed_at    │   │  fatal          │       │
//! │  │  Active         │   └─────────────────┘   └─────────────────┘       │
//! │  │  Stopping       │                                                    │
//! │  │  Failed         │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  └─────────────────┘   │ CaptureConfig   │   │AcquisitionToken │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  fps, roi, ar   │   │  u64, per start │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//!               start                 acquired
//!   ┌──────┐ ─────────► ┌──────────┐ ─────────► ┌────────┐
//!   │ Idle │            │ Starting │            │ Active │
//!   └──────┘ ◄──┐       └────┬─────┘            └───┬────┘
//!       ▲       │  released  │ stop      stop/fault │
//!       │       │            ▼                      ▼
//!       │       │       ┌──────────┐ ◄──────────────┘
//!       │       └────── │ Stopping │
//!       │               └────┬─────┘
//!       │ start              │ released after fault
//!   ┌───┴────┐ ◄─────────────┘
//!   │ Failed │ ◄──── acquire failed (from Starting)
//!   └────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_dimension, validate_fps, validate_roi};

// =============================================================================
// Session State
// =============================================================================

/// Observable lifecycle state of one scan session.
///
/// Owned by the session actor. Host views only ever receive copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionState {
    /// No capture resource, ready to start.
    #[default]
    Idle,
    /// Acquisition requested, not yet resolved.
    Starting,
    /// Camera running, frames being decoded.
    Active,
    /// Release in progress.
    Stopping,
    /// Last acquisition or capture failed; `start` may be retried.
    Failed,
}

impl SessionState {
    /// Returns true if `start()` should request a new acquisition.
    pub fn accepts_start(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Failed)
    }

    /// Returns true if `stop()` has anything to tear down.
    pub fn accepts_stop(&self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Active)
    }

    /// Returns true if a capture handle may exist in this state.
    pub fn may_hold_capture(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Active | SessionState::Stopping
        )
    }

    /// Applies an event to the state machine.
    ///
    /// This is the single source of truth for legal transitions; the session
    /// actor performs side effects only after this returns `Ok`.
    pub fn transition(self, event: SessionEvent) -> CoreResult<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (self, event) {
            (S::Idle | S::Failed, E::StartRequested) => S::Starting,
            (S::Starting, E::Acquired) => S::Active,
            (S::Starting, E::AcquireFailed) => S::Failed,
            (S::Starting | S::Active, E::StopRequested) => S::Stopping,
            (S::Active, E::FaultDetected) => S::Stopping,
            (S::Stopping, E::Released) => S::Idle,
            (S::Stopping, E::ReleasedAfterFault) => S::Failed,
            (_, E::Disposed) => S::Idle,
            (from, event) => return Err(CoreError::InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Starting => write!(f, "starting"),
            SessionState::Active => write!(f, "active"),
            SessionState::Stopping => write!(f, "stopping"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Inputs to [`SessionState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host asked to start scanning.
    StartRequested,
    /// Capture resource acquired.
    Acquired,
    /// Capture resource could not be acquired.
    AcquireFailed,
    /// Host asked to stop scanning.
    StopRequested,
    /// A non-recoverable decode fault occurred while active.
    FaultDetected,
    /// Release finished after a stop.
    Released,
    /// Release finished after a fault.
    ReleasedAfterFault,
    /// Host is tearing the session down.
    Disposed,
}

// =============================================================================
// Acquisition Token
// =============================================================================

/// Identity of a single acquisition.
///
/// Every `start()` mints a fresh token. Frame reports carry the token of the
/// acquisition that produced them, so a report from a handle the session has
/// already let go of can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcquisitionToken(u64);

impl AcquisitionToken {
    /// First token of a session.
    pub const fn first() -> Self {
        AcquisitionToken(1)
    }

    /// Returns the token following this one.
    pub const fn next(self) -> Self {
        AcquisitionToken(self.0.wrapping_add(1))
    }

    /// Raw value, for logging.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AcquisitionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Scan Result / Scan Error
// =============================================================================

/// One accepted decode.
///
/// Never persisted by the session: it is handed to the host view and
/// forgotten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanResult {
    /// Decoded text, trimmed.
    pub payload: String,

    /// When the session accepted the decode.
    #[ts(as = "String")]
    pub observed_at: DateTime<Utc>,
}

impl ScanResult {
    /// Creates a result stamped with the current time.
    pub fn now(payload: impl Into<String>) -> Self {
        ScanResult {
            payload: payload.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Error surfaced to the host view.
///
/// `fatal == true` means the capture resource is gone and the session is
/// Failed. Non-fatal errors describe a single frame and are never emitted by
/// the session; the flag exists so adapters and hosts can share one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanError {
    /// Human-readable message.
    pub message: String,

    /// Whether the session lost its capture resource.
    pub fatal: bool,
}

impl ScanError {
    /// Creates a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        ScanError {
            message: message.into(),
            fatal: true,
        }
    }

    /// Creates a per-frame, non-fatal error.
    pub fn transient(message: impl Into<String>) -> Self {
        ScanError {
            message: message.into(),
            fatal: false,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fatal {
            write!(f, "fatal: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

// =============================================================================
// Capture Configuration
// =============================================================================

/// Which camera to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera (the one pointed at products).
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            _ => Err(ValidationError::NotAllowed {
                field: "facing_mode".to_string(),
                allowed: vec!["environment".to_string(), "user".to_string()],
            }),
        }
    }
}

/// Parameters handed to the decoder capability on acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Target decode rate in frames per second.
    pub fps: u32,

    /// Width of the decode region of interest, in pixels.
    pub roi_width: u32,

    /// Height of the decode region of interest, in pixels.
    pub roi_height: u32,

    /// Video aspect ratio, `width / height` of the requested frame.
    pub aspect_ratio: f64,

    /// Camera to use.
    pub facing_mode: FacingMode,
}

impl CaptureConfig {
    /// Builds a validated capture config, deriving the aspect ratio from the
    /// requested frame size.
    ///
    /// ## Example
    /// ```rust
    /// use medscan_core::{CaptureConfig, FacingMode};
    ///
    /// let config = CaptureConfig::new(10, 250, 250, 640, 480, FacingMode::Environment).unwrap();
    /// assert!((config.aspect_ratio - 4.0 / 3.0).abs() < f64::EPSILON);
    /// ```
    pub fn new(
        fps: u32,
        roi_width: u32,
        roi_height: u32,
        width: u32,
        height: u32,
        facing_mode: FacingMode,
    ) -> CoreResult<Self> {
        validate_fps(fps)?;
        validate_dimension("width", width)?;
        validate_dimension("height", height)?;
        validate_roi("roi_width", roi_width, width)?;
        validate_roi("roi_height", roi_height, height)?;

        Ok(CaptureConfig {
            fps,
            roi_width,
            roi_height,
            aspect_ratio: f64::from(width) / f64::from(height),
            facing_mode,
        })
    }

    /// Time between two frames at the configured rate.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            fps: 10,
            roi_width: 250,
            roi_height: 250,
            aspect_ratio: 640.0 / 480.0,
            facing_mode: FacingMode::Environment,
        }
    }
}
