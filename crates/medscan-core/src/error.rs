//! # Error Types
//!
//! Domain-specific error types for medscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medscan-core errors (this file)                                       │
//! │  ├── CoreError        - Illegal state transitions, wrapped validation  │
//! │  └── ValidationError  - Capture config / payload input failures        │
//! │                                                                         │
//! │  medscan-session errors (separate crate)                               │
//! │  ├── DecoderError     - What the capture adapter reports               │
//! │  └── SessionError     - Config loading, channel closure                │
//! │                                                                         │
//! │  Host view                                                              │
//! │  └── ScanError        - What the user sees (message + fatal flag)      │
//! │                                                                         │
//! │  Flow: DecoderError → ScanError → Host view                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{SessionEvent, SessionState};

// =============================================================================
// Core Error
// =============================================================================

/// Core scan domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The session state machine has no edge for this event.
    ///
    /// ## When This Occurs
    /// - A release completion arrives while the session is Idle
    /// - An acquisition result arrives for a session that is already Active
    ///
    /// The session actor treats this as a bug signal and logs it; the host
    /// never sees it.
    #[error("Invalid transition: {event:?} while {from}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., whitespace in an element id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidTransition {
            from: SessionState::Idle,
            event: SessionEvent::Released,
        };
        assert_eq!(err.to_string(), "Invalid transition: Released while idle");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::OutOfRange {
            field: "fps".to_string(),
            min: 1,
            max: 60,
        };
        assert_eq!(err.to_string(), "fps must be between 1 and 60");

        let err = ValidationError::Required {
            field: "payload".to_string(),
        };
        assert_eq!(err.to_string(), "payload is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "width".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
