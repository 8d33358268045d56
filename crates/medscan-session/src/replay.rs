//! # Replay Decoder
//!
//! A [`DecoderCapability`] that plays back a script of frame reports instead
//! of reading a camera. Used by the CLI host and by tests.
//!
//! ## Script Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Replay Script                                  │
//! │                                                                         │
//! │  # comment                       ignored                               │
//! │  miss                            one "no symbol" frame                 │
//! │  ok 4006381333931                one decoded frame                     │
//! │  err Video stream ended          one error frame (classified later)    │
//! │  repeat 20 miss                  the step, 20 times (no nesting)       │
//! │  deny permission Camera blocked  the next acquisition fails            │
//! │                                                                         │
//! │  PLAYBACK                                                               │
//! │  • Each acquisition plays the frame steps from the top, one step per   │
//! │    frame interval (1 / fps).                                           │
//! │  • `deny` lines are not frames. Each one fails one acquisition, in     │
//! │    the order they appear. Kinds: permission, busy, no-device, runtime. │
//! │  • Playback ends at the last step, on release, or once the session     │
//! │    stops listening.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use medscan_core::AcquisitionToken;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::decoder::{AcquireRequest, DecoderCapability, FrameSink};
use crate::error::{DecoderError, DecoderErrorKind, SessionError, SessionResult};

/// Error message a `miss` step reports, in html5-qrcode wording.
pub const MISS_MESSAGE: &str =
    "QR code parse error, error = NotFoundException: No MultiFormat Readers were able to detect the code.";

/// Upper bound for `repeat N`.
pub const MAX_REPEAT: usize = 100_000;

/// Upper bound for the frame steps of a whole script, repeats expanded.
pub const MAX_STEPS: usize = 1_000_000;

// =============================================================================
// Script
// =============================================================================

/// One scripted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    Decoded(String),
    Failed(String),
    Miss,
}

/// Parsed replay script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayScript {
    steps: Vec<ReplayStep>,
    denials: Vec<DecoderError>,
}

enum Line {
    Steps(Vec<ReplayStep>),
    Deny(DecoderError),
}

impl ReplayScript {
    /// Parses a script. Blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> SessionResult<Self> {
        let mut script = ReplayScript::default();

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line).map_err(|reason| SessionError::InvalidScript {
                line: idx + 1,
                reason,
            })? {
                Line::Steps(steps) => {
                    if script.steps.len() + steps.len() > MAX_STEPS {
                        return Err(SessionError::InvalidScript {
                            line: idx + 1,
                            reason: format!("script expands to more than {} steps", MAX_STEPS),
                        });
                    }
                    script.steps.extend(steps);
                }
                Line::Deny(err) => script.denials.push(err),
            }
        }

        Ok(script)
    }

    /// Reads and parses a script file.
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            SessionError::ConfigLoadFailed(format!("{}: {}", path.display(), e))
        })?;
        Self::parse(&source)
    }

    /// Frame steps, in playback order.
    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    /// Acquisition failures, in the order they will be returned.
    pub fn denials(&self) -> &[DecoderError] {
        &self.denials
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for ReplayScript {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_line(line: &str) -> Result<Line, String> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (line, ""),
    };

    match keyword.to_lowercase().as_str() {
        "miss" if rest.is_empty() => Ok(Line::Steps(vec![ReplayStep::Miss])),
        "miss" => Err("'miss' takes no argument".into()),
        "ok" if rest.is_empty() => Err("'ok' needs a payload".into()),
        "ok" => Ok(Line::Steps(vec![ReplayStep::Decoded(rest.to_string())])),
        "err" if rest.is_empty() => Err("'err' needs a message".into()),
        "err" => Ok(Line::Steps(vec![ReplayStep::Failed(rest.to_string())])),
        "repeat" => parse_repeat(rest),
        "deny" => parse_deny(rest).map(Line::Deny),
        other => Err(format!("unknown step '{}'", other)),
    }
}

fn parse_repeat(rest: &str) -> Result<Line, String> {
    let (count, inner) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| "'repeat' needs a count and a step".to_string())?;

    let count: usize = count
        .parse()
        .map_err(|_| format!("expected a number after 'repeat', got '{}'", count))?;
    if count == 0 || count > MAX_REPEAT {
        return Err(format!("repeat count must be between 1 and {}", MAX_REPEAT));
    }

    let inner = inner.trim();
    if inner
        .split_whitespace()
        .next()
        .is_some_and(|k| k.eq_ignore_ascii_case("repeat"))
    {
        return Err("'repeat' cannot be nested".into());
    }

    match parse_line(inner)? {
        Line::Steps(steps) => {
            let mut out = Vec::with_capacity(steps.len() * count);
            for _ in 0..count {
                out.extend(steps.iter().cloned());
            }
            Ok(Line::Steps(out))
        }
        Line::Deny(_) => Err("'deny' cannot be repeated".into()),
    }
}

fn parse_deny(rest: &str) -> Result<DecoderError, String> {
    let (kind, message) = match rest.split_once(char::is_whitespace) {
        Some((k, m)) => (k, m.trim()),
        None => (rest, ""),
    };

    let kind = match kind.to_lowercase().as_str() {
        "permission" => DecoderErrorKind::PermissionDenied,
        "busy" => DecoderErrorKind::DeviceBusy,
        "no-device" => DecoderErrorKind::NoDevice,
        "runtime" => DecoderErrorKind::Runtime,
        "" => return Err("'deny' needs a kind".into()),
        other => return Err(format!("unknown deny kind '{}'", other)),
    };

    let message = if message.is_empty() {
        kind.to_string()
    } else {
        message.to_string()
    };

    Ok(DecoderError::new(kind, message))
}

// =============================================================================
// Replay Decoder
// =============================================================================

/// Handle for one replay acquisition.
#[derive(Debug)]
pub struct ReplayHandle {
    token: AcquisitionToken,
    task: JoinHandle<()>,
}

impl ReplayHandle {
    /// Token of the acquisition this handle belongs to.
    pub fn token(&self) -> AcquisitionToken {
        self.token
    }
}

/// Scripted decoder.
pub struct ReplayDecoder {
    steps: Arc<[ReplayStep]>,
    denials: Mutex<VecDeque<DecoderError>>,
    fail_release: bool,
}

impl ReplayDecoder {
    /// Creates a decoder that plays `script` on every acquisition.
    pub fn new(script: ReplayScript) -> Self {
        ReplayDecoder {
            steps: script.steps.into(),
            denials: Mutex::new(script.denials.into()),
            fail_release: false,
        }
    }

    /// Makes every release report a failure after stopping playback.
    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }
}

#[async_trait]
impl DecoderCapability for ReplayDecoder {
    type Handle = ReplayHandle;

    async fn acquire(
        &self,
        request: AcquireRequest,
        frames: FrameSink,
    ) -> Result<Self::Handle, DecoderError> {
        if let Some(err) = self.denials.lock().await.pop_front() {
            debug!(target_id = %request.target_id, kind = %err.kind, "Replay denying acquisition");
            return Err(err);
        }

        let token = frames.token();
        let steps = Arc::clone(&self.steps);
        let mut ticker = tokio::time::interval(request.config.frame_interval());

        info!(
            target_id = %request.target_id,
            %token,
            fps = request.config.fps,
            frames = steps.len(),
            "Replay capture started"
        );

        let task = tokio::spawn(async move {
            for step in steps.iter() {
                ticker.tick().await;
                let delivered = match step {
                    ReplayStep::Decoded(payload) => frames.decoded(payload.as_str()),
                    ReplayStep::Failed(message) => frames.failed(message.as_str()),
                    ReplayStep::Miss => frames.failed(MISS_MESSAGE),
                };
                if !delivered {
                    break;
                }
            }
            debug!(%token, "Replay playback finished");
        });

        Ok(ReplayHandle { token, task })
    }

    async fn release(&self, handle: Self::Handle) -> Result<(), DecoderError> {
        // Aborting a finished task is a no-op, so release stays idempotent.
        handle.task.abort();
        debug!(token = %handle.token, "Replay capture released");

        if self.fail_release {
            return Err(DecoderError::runtime("Failed to stop the video stream"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ScanSession, SessionOptions};
    use medscan_core::SessionState;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::parse(
            "# warm-up\n\
             repeat 3 miss\n\
             \n\
             ok   4006381333931  \n\
             err Video stream ended\n",
        )
        .unwrap();

        assert_eq!(script.len(), 5);
        assert_eq!(script.steps()[0], ReplayStep::Miss);
        assert_eq!(
            script.steps()[3],
            ReplayStep::Decoded("4006381333931".into())
        );
        assert_eq!(
            script.steps()[4],
            ReplayStep::Failed("Video stream ended".into())
        );
        assert!(script.denials().is_empty());
    }

    #[test]
    fn test_parse_deny() {
        let script: ReplayScript = "deny permission Camera access blocked\ndeny busy\nok A"
            .parse()
            .unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.denials().len(), 2);
        assert_eq!(
            script.denials()[0],
            DecoderError::permission_denied("Camera access blocked")
        );
        assert_eq!(script.denials()[1].message, "device busy");
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = ReplayScript::parse("miss\nscan now").unwrap_err();
        match err {
            SessionError::InvalidScript { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("scan"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(ReplayScript::parse("ok").is_err());
        assert!(ReplayScript::parse("repeat x miss").is_err());
        assert!(ReplayScript::parse("repeat 0 miss").is_err());
        assert!(ReplayScript::parse("repeat 2 deny busy").is_err());
        assert!(ReplayScript::parse("deny sideways").is_err());
    }

    #[test]
    fn test_repeat_cannot_nest() {
        let err = ReplayScript::parse("miss\nrepeat 1000 repeat 1000 miss").unwrap_err();
        match err {
            SessionError::InvalidScript { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("nested"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ReplayScript::parse("repeat 2 REPEAT 2 miss").is_err());
    }

    #[test]
    fn test_script_step_cap() {
        let at_cap = "repeat 100000 miss\n".repeat(MAX_STEPS / MAX_REPEAT);
        assert_eq!(ReplayScript::parse(&at_cap).unwrap().len(), MAX_STEPS);

        let over = format!("{at_cap}miss\n");
        match ReplayScript::parse(&over).unwrap_err() {
            SessionError::InvalidScript { line, .. } => {
                assert_eq!(line, MAX_STEPS / MAX_REPEAT + 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, "miss\nok ABC123\n").unwrap();

        let script = ReplayScript::from_file(&path).unwrap();
        assert_eq!(script.len(), 2);

        let missing = ReplayScript::from_file(dir.path().join("nope.txt")).unwrap_err();
        assert!(missing.is_config_error());
    }

    async fn wait_state(rx: &mut tokio::sync::watch::Receiver<SessionState>, s: SessionState) {
        timeout(Duration::from_secs(30), rx.wait_for(|v| *v == s))
            .await
            .expect("state not reached")
            .expect("session gone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_drives_session() {
        let script = ReplayScript::parse("repeat 10 miss\nok ABC123\nerr Video stream ended").unwrap();
        let decoder = Arc::new(ReplayDecoder::new(script));
        let (handle, mut events) = ScanSession::spawn(decoder, SessionOptions::default());
        let mut state = handle.watch_state();

        handle.start().unwrap();
        wait_state(&mut state, SessionState::Active).await;

        let result = events.results.recv().await.unwrap();
        assert_eq!(result.payload, "ABC123");

        let err = events.errors.recv().await.unwrap();
        assert!(err.fatal);
        assert_eq!(err.message, "Video stream ended");
        assert_eq!(handle.state(), SessionState::Failed);

        handle.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_denial_then_retry() {
        let script = ReplayScript::parse("deny permission Permission denied\nok ABC123").unwrap();
        let decoder = Arc::new(ReplayDecoder::new(script));
        let (handle, mut events) = ScanSession::spawn(decoder, SessionOptions::default());

        handle.start().unwrap();
        let err = events.errors.recv().await.unwrap();
        assert_eq!(err.message, "Permission denied");
        let mut state = handle.watch_state();
        wait_state(&mut state, SessionState::Failed).await;

        handle.start().unwrap();
        assert_eq!(events.results.recv().await.unwrap().payload, "ABC123");

        handle.stop().unwrap();
        wait_state(&mut state, SessionState::Idle).await;
        handle.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_release_is_swallowed() {
        let script = ReplayScript::parse("repeat 1000 miss").unwrap();
        let decoder = Arc::new(ReplayDecoder::new(script).with_failing_release());
        let (handle, mut events) = ScanSession::spawn(decoder, SessionOptions::default());
        let mut state = handle.watch_state();

        handle.start().unwrap();
        wait_state(&mut state, SessionState::Active).await;
        handle.stop().unwrap();
        wait_state(&mut state, SessionState::Idle).await;

        handle.dispose().await;
        assert!(events.errors.recv().await.is_none());
    }
}
