//! # Validation Module
//!
//! Input validation for capture configuration and decoded payloads.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Config load (medscan-session::config)                        │
//! │  ├── TOML shape (deserialization)                                      │
//! │  └── THIS MODULE: ranges for fps, frame size, ROI, target id           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Session actor                                                │
//! │  └── THIS MODULE: decoded payloads are trimmed and non-empty           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Decoder adapter                                              │
//! │  └── Device-specific limits (resolution, supported rates)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medscan_core::validation::{validate_fps, validate_payload};
//!
//! validate_fps(10).unwrap();
//! assert_eq!(validate_payload("  0123456789012 \n").unwrap(), "0123456789012");
//! ```

use crate::error::ValidationError;
use crate::MAX_FPS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted capture target id.
pub const MAX_TARGET_ID_LEN: usize = 100;

// =============================================================================
// Capture Validators
// =============================================================================

/// Validates the requested frame rate (1 to [`MAX_FPS`]).
pub fn validate_fps(fps: u32) -> ValidationResult<()> {
    if fps == 0 || fps > MAX_FPS {
        return Err(ValidationError::OutOfRange {
            field: "fps".to_string(),
            min: 1,
            max: i64::from(MAX_FPS),
        });
    }
    Ok(())
}

/// Validates a frame dimension.
pub fn validate_dimension(field: &str, value: u32) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates one side of the decode region against the frame side it sits in.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed the frame
pub fn validate_roi(field: &str, roi: u32, frame: u32) -> ValidationResult<()> {
    if roi == 0 || roi > frame {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(frame),
        });
    }
    Ok(())
}

/// Validates the element/device id the capture attaches to.
///
/// ## Example
/// ```rust
/// use medscan_core::validation::validate_target_id;
///
/// assert!(validate_target_id("scanner-container").is_ok());
/// assert!(validate_target_id("").is_err());
/// assert!(validate_target_id("two words").is_err());
/// ```
pub fn validate_target_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "target_id".to_string(),
        });
    }

    if id.len() > MAX_TARGET_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "target_id".to_string(),
            max: MAX_TARGET_ID_LEN,
        });
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "target_id".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Normalizes a decoded payload.
///
/// Returns the trimmed payload. Only blank payloads are rejected; the session
/// treats them the same as a frame with no symbol. Length is not capped, since
/// a numeric QR code alone can hold 7089 digits.
pub fn validate_payload(raw: &str) -> ValidationResult<String> {
    let payload = raw.trim();

    if payload.is_empty() {
        return Err(ValidationError::Required {
            field: "payload".to_string(),
        });
    }

    Ok(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fps() {
        assert!(validate_fps(1).is_ok());
        assert!(validate_fps(60).is_ok());
        assert!(validate_fps(0).is_err());
        assert!(validate_fps(61).is_err());
    }

    #[test]
    fn test_validate_roi() {
        assert!(validate_roi("roi_width", 250, 640).is_ok());
        assert!(validate_roi("roi_width", 640, 640).is_ok());
        assert!(validate_roi("roi_width", 641, 640).is_err());
        assert!(validate_roi("roi_width", 0, 640).is_err());
    }

    #[test]
    fn test_validate_target_id() {
        assert!(validate_target_id("scanner-container").is_ok());
        assert!(validate_target_id("   ").is_err());
        assert!(validate_target_id(&"x".repeat(101)).is_err());
        assert!(validate_target_id("a\tb").is_err());
    }

    #[test]
    fn test_validate_payload() {
        assert_eq!(validate_payload(" ABC123 ").unwrap(), "ABC123");
        assert!(matches!(
            validate_payload(" \n"),
            Err(ValidationError::Required { .. })
        ));

        // Full-capacity numeric QR
        let long = "1".repeat(7089);
        assert_eq!(validate_payload(&long).unwrap(), long);
    }
}
