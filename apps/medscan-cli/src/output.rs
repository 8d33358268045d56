//! Output formatting for text vs JSON rendering
//!
//! Everything the host prints flows through [`OutputWriter`], which picks the
//! format. Payloads implement both `Serialize` (JSON lines) and [`Render`]
//! (text lines).

use std::io::Write;

use medscan_core::{HistoryEntry, ScanError, SessionState};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::HostError;

/// Abstraction for writing host output in different formats.
pub struct OutputWriter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    /// Renders one payload and flushes, so each event appears as it happens.
    pub fn render<T: Render + Serialize>(&mut self, payload: &T) -> Result<(), HostError> {
        match self.format {
            OutputFormat::Text => payload.render_text(&mut self.out)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, payload)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Human-readable text rendering.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

// =============================================================================
// Host Events
// =============================================================================

/// Snapshot shown by the `state` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub state: SessionState,
    pub last_code: Option<String>,
    pub last_error: Option<String>,
    pub scans: usize,
}

/// Everything the host prints while a session runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// Session state changed.
    State { state: SessionState },
    /// A code was scanned and recorded.
    Scanned { entry: HistoryEntry },
    /// The session reported a fatal error.
    Error { error: ScanError },
    /// Answer to `state`.
    Status(StatusView),
    /// Answer to `history`, newest first.
    History { entries: Vec<HistoryEntry> },
    /// Input line was rejected.
    Rejected(HostError),
    /// Answer to `help`.
    Help { commands: Vec<String> },
}

impl Render for HostEvent {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self {
            HostEvent::State { state } => writeln!(w, "state: {}", state),
            HostEvent::Scanned { entry } => {
                writeln!(w, "scanned: {} ({})", entry.code, entry.symbology)
            }
            HostEvent::Error { error } => {
                if error.fatal {
                    writeln!(w, "error: {} (type 'start' to retry)", error.message)
                } else {
                    writeln!(w, "warning: {}", error.message)
                }
            }
            HostEvent::Status(status) => {
                write!(w, "state: {} | scans: {}", status.state, status.scans)?;
                if let Some(code) = &status.last_code {
                    write!(w, " | last: {}", code)?;
                }
                if let Some(err) = &status.last_error {
                    write!(w, " | error: {}", err)?;
                }
                writeln!(w)
            }
            HostEvent::History { entries } => {
                if entries.is_empty() {
                    return writeln!(w, "history: (no scans yet)");
                }
                writeln!(w, "history:")?;
                for (i, entry) in entries.iter().enumerate() {
                    writeln!(
                        w,
                        "{:>3}. {}  {:<7} {}",
                        i + 1,
                        entry.scanned_at.format("%H:%M:%S"),
                        entry.symbology.to_string(),
                        entry.code
                    )?;
                }
                Ok(())
            }
            HostEvent::Rejected(err) => writeln!(w, "! {}", err.message),
            HostEvent::Help { commands } => {
                writeln!(w, "commands:")?;
                for line in commands {
                    writeln!(w, "  {}", line)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medscan_core::{ScanResult, Symbology};

    fn render(format: OutputFormat, event: &HostEvent) -> String {
        let mut writer = OutputWriter::new(format, Vec::new());
        writer.render(event).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_text_rendering() {
        let entry = HistoryEntry::from(&ScanResult::now("4006381333931"));
        assert_eq!(entry.symbology, Symbology::Ean13);

        let text = render(OutputFormat::Text, &HostEvent::Scanned { entry });
        assert_eq!(text, "scanned: 4006381333931 (EAN-13)\n");

        let text = render(
            OutputFormat::Text,
            &HostEvent::Error {
                error: ScanError::fatal("Permission denied"),
            },
        );
        assert!(text.starts_with("error: Permission denied"));
        assert!(text.contains("retry"));

        let text = render(
            OutputFormat::Text,
            &HostEvent::State {
                state: SessionState::Active,
            },
        );
        assert_eq!(text, "state: active\n");
    }

    #[test]
    fn test_json_lines() {
        let text = render(
            OutputFormat::Json,
            &HostEvent::State {
                state: SessionState::Starting,
            },
        );
        assert_eq!(text, "{\"event\":\"state\",\"state\":\"starting\"}\n");

        let text = render(
            OutputFormat::Json,
            &HostEvent::Rejected(HostError::unknown_command("scna")),
        );
        assert!(text.starts_with("{\"event\":\"rejected\",\"code\":\"UNKNOWN_COMMAND\""));
    }

    #[test]
    fn test_status_and_empty_history() {
        let status = HostEvent::Status(StatusView {
            state: SessionState::Failed,
            last_code: Some("ABC123".into()),
            last_error: Some("Video stream ended".into()),
            scans: 1,
        });
        assert_eq!(
            render(OutputFormat::Text, &status),
            "state: failed | scans: 1 | last: ABC123 | error: Video stream ended\n"
        );

        let history = HostEvent::History {
            entries: Vec::new(),
        };
        assert_eq!(render(OutputFormat::Text, &history), "history: (no scans yet)\n");
    }

    #[test]
    fn test_history_lists_newest_first() {
        let entries = vec![
            HistoryEntry::from(&ScanResult::now("036000291452")),
            HistoryEntry::from(&ScanResult::now("ABC123")),
        ];
        let text = render(OutputFormat::Text, &HostEvent::History { entries });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("UPC-A"));
        assert!(lines[1].ends_with("036000291452"));
        assert!(lines[2].ends_with("ABC123"));
    }
}
