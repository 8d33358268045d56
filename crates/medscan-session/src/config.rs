//! # Scanner Configuration
//!
//! Configuration management for scan sessions.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDSCAN_FPS=15                                                      │
//! │     MEDSCAN_FACING_MODE=user                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/medscan-scanner/scanner.toml (Linux)                     │
//! │     ~/Library/Application Support/com.medscan.scanner/scanner.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10 fps, 250x250 ROI on a 640x480 rear-camera frame                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [capture]
//! target_id = "scanner-container"
//! fps = 10
//! roi_width = 250
//! roi_height = 250
//! width = 640
//! height = 480
//! facing_mode = "environment"  # environment | user
//!
//! [decoder]
//! no_symbol_markers = ["QR code not found", "NotFoundException"]
//!
//! [session]
//! dispose_timeout_ms = 2000
//!
//! [host]
//! history_size = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use medscan_core::classify::DEFAULT_NO_SYMBOL_MARKERS;
use medscan_core::validation::validate_target_id;
use medscan_core::{CaptureConfig, ErrorClassifier, FacingMode, DEFAULT_TARGET_ID, MAX_HISTORY_ENTRIES};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Capture Settings
// =============================================================================

/// Camera and decode-region settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Element or device id the capture attaches to.
    #[serde(default = "default_target_id")]
    pub target_id: String,

    /// Decode attempts per second.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Decode region width (pixels).
    #[serde(default = "default_roi")]
    pub roi_width: u32,

    /// Decode region height (pixels).
    #[serde(default = "default_roi")]
    pub roi_height: u32,

    /// Requested frame width; with `height` this sets the aspect ratio.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Requested frame height.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Which camera to ask for.
    #[serde(default)]
    pub facing_mode: FacingMode,
}

fn default_target_id() -> String {
    DEFAULT_TARGET_ID.to_string()
}
fn default_fps() -> u32 {
    10
}
fn default_roi() -> u32 {
    250
}
fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            target_id: default_target_id(),
            fps: default_fps(),
            roi_width: default_roi(),
            roi_height: default_roi(),
            width: default_width(),
            height: default_height(),
            facing_mode: FacingMode::default(),
        }
    }
}

// =============================================================================
// Decoder Settings
// =============================================================================

/// How decoder error messages are classified.
///
/// The wording a decoder uses for "nothing in this frame" is library-specific,
/// so it lives in config rather than code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderSettings {
    /// Case-insensitive substrings that mark a frame as "no symbol".
    #[serde(default = "default_markers")]
    pub no_symbol_markers: Vec<String>,
}

fn default_markers() -> Vec<String> {
    DEFAULT_NO_SYMBOL_MARKERS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            no_symbol_markers: default_markers(),
        }
    }
}

// =============================================================================
// Session / Host Settings
// =============================================================================

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// How long `dispose()` waits for the camera to be released.
    #[serde(default = "default_dispose_timeout")]
    pub dispose_timeout_ms: u64,
}

fn default_dispose_timeout() -> u64 {
    2000
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            dispose_timeout_ms: default_dispose_timeout(),
        }
    }
}

/// Host view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    /// Entries kept in the scan history panel.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_history_size() -> usize {
    MAX_HISTORY_ENTRIES
}

impl Default for HostSettings {
    fn default() -> Self {
        HostSettings {
            history_size: default_history_size(),
        }
    }
}

// =============================================================================
// Main Scanner Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Camera and decode region.
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Error classification.
    #[serde(default)]
    pub decoder: DecoderSettings,

    /// Session lifecycle.
    #[serde(default)]
    pub session: SessionSettings,

    /// Host view.
    #[serde(default)]
    pub host: HostSettings,
}

impl ScannerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SessionError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        validate_target_id(&self.capture.target_id)?;

        // Frame rate, frame size and ROI bounds
        self.capture_config()?;

        if ErrorClassifier::new(self.decoder.no_symbol_markers.iter().cloned())
            .markers()
            .is_empty()
        {
            return Err(SessionError::InvalidConfig(
                "decoder.no_symbol_markers must contain at least one non-blank marker".into(),
            ));
        }

        if self.session.dispose_timeout_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "session.dispose_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.host.history_size == 0 {
            return Err(SessionError::InvalidConfig(
                "host.history_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("MEDSCAN_TARGET_ID") {
            debug!(target_id = %id, "Overriding capture target from environment");
            self.capture.target_id = id;
        }

        if let Ok(fps) = std::env::var("MEDSCAN_FPS") {
            match fps.parse::<u32>() {
                Ok(v) => self.capture.fps = v,
                Err(_) => warn!(fps = %fps, "Ignoring non-numeric MEDSCAN_FPS"),
            }
        }

        if let Ok(width) = std::env::var("MEDSCAN_WIDTH") {
            if let Ok(v) = width.parse::<u32>() {
                self.capture.width = v;
            }
        }

        if let Ok(height) = std::env::var("MEDSCAN_HEIGHT") {
            if let Ok(v) = height.parse::<u32>() {
                self.capture.height = v;
            }
        }

        if let Ok(mode) = std::env::var("MEDSCAN_FACING_MODE") {
            match mode.parse() {
                Ok(parsed) => self.capture.facing_mode = parsed,
                Err(_) => warn!(mode = %mode, "Unknown facing mode in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "medscan", "scanner")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the validated capture config handed to the decoder.
    pub fn capture_config(&self) -> SessionResult<CaptureConfig> {
        let c = &self.capture;
        Ok(CaptureConfig::new(
            c.fps,
            c.roi_width,
            c.roi_height,
            c.width,
            c.height,
            c.facing_mode,
        )?)
    }

    /// Builds the error classifier from the configured markers.
    pub fn classifier(&self) -> ErrorClassifier {
        ErrorClassifier::new(self.decoder.no_symbol_markers.iter().cloned())
    }

    /// Dispose wait as a `Duration`.
    pub fn dispose_timeout(&self) -> Duration {
        Duration::from_millis(self.session.dispose_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.capture.target_id, "scanner-container");
        assert_eq!(config.capture.fps, 10);
        assert_eq!(config.capture.facing_mode, FacingMode::Environment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capture_config_derives_aspect_ratio() {
        let mut config = ScannerConfig::default();
        config.capture.width = 1280;
        config.capture.height = 720;
        let capture = config.capture_config().unwrap();
        assert!((capture.aspect_ratio - 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(capture.roi_width, 250);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();
        config.capture.fps = 0;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.capture.roi_width = 700;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.capture.target_id = " ".into();
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.decoder.no_symbol_markers = vec!["".into(), "  ".into()];
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());

        let mut config = ScannerConfig::default();
        config.host.history_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScannerConfig = toml::from_str(
            r#"
            [capture]
            fps = 15
            facing_mode = "user"
            "#,
        )
        .unwrap();
        assert_eq!(config.capture.fps, 15);
        assert_eq!(config.capture.facing_mode, FacingMode::User);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.session.dispose_timeout_ms, 2000);
        assert!(!config.decoder.no_symbol_markers.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scanner.toml");

        let mut config = ScannerConfig::default();
        config.capture.fps = 20;
        config.decoder.no_symbol_markers = vec!["nothing decoded".into()];
        let saved = config.save(Some(path.clone())).unwrap();
        assert_eq!(saved, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[capture]"));
        assert!(contents.contains("[decoder]"));

        let loaded: ScannerConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.capture.fps, 20);
        assert_eq!(loaded.decoder.no_symbol_markers, vec!["nothing decoded"]);
    }

    #[test]
    fn test_invalid_toml_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(&path, "[capture\nfps = ").unwrap();

        let err = ScannerConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, SessionError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(&path, "[capture]\nfps = 0\n").unwrap();

        let config = ScannerConfig::load_or_default(Some(path));
        assert_eq!(config.capture.fps, 10);
    }

    #[test]
    fn test_classifier_from_config() {
        let mut config = ScannerConfig::default();
        config.decoder.no_symbol_markers = vec!["empty frame".into()];
        let classifier = config.classifier();
        assert!(!classifier.classify_error("Empty frame #12").is_fatal());
        assert!(classifier.classify_error("QR code not found").is_fatal());
    }
}
