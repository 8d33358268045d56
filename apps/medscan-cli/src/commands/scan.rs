//! # Scan Host Loop
//!
//! `medscan run`: spawns a session over the replay decoder and multiplexes
//! operator input with session output until `quit` or end of input.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         host_loop (select!)                             │
//! │                                                                         │
//! │   stdin line ─────► HostCommand ──► start()/stop() or answer from view │
//! │   state change ───► ViewState::on_state ──► "state: active"            │
//! │   result ─────────► ViewState::on_result ─► "scanned: ABC123 (text)"   │
//! │   error ──────────► ViewState::on_error ──► "error: ..."               │
//! │                                                                         │
//! │   quit / EOF ─────► dispose() ──► camera released before exit          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Write;
use std::sync::Arc;

use medscan_session::{
    ReplayDecoder, ReplayScript, ScanSession, ScanSessionHandle, ScannerConfig, SessionEvents,
    SessionOptions,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::commands::HostCommand;
use crate::error::HostError;
use crate::output::{HostEvent, OutputWriter};
use crate::state::ViewState;

/// Runs `medscan run` against stdin and the given writer.
pub async fn run<W: Write>(
    config: &ScannerConfig,
    args: &RunArgs,
    out: &mut OutputWriter<W>,
) -> anyhow::Result<ViewState> {
    let script = ReplayScript::from_file(&args.script)?;
    info!(script = ?args.script, frames = script.len(), "Replay script loaded");

    let mut decoder = ReplayDecoder::new(script);
    if args.fail_release {
        decoder = decoder.with_failing_release();
    }

    let options = SessionOptions::from_config(config)?;
    let (session, events) = ScanSession::spawn(Arc::new(decoder), options);
    info!(session = %session.session_id(), "Scan session ready");

    let input = BufReader::new(tokio::io::stdin());
    let view = ViewState::new(config.host.history_size);
    host_loop(session, events, input, out, view, args.autostart).await
}

/// Drives one session from line-based input until `quit` or end of input.
///
/// The session is always disposed before this returns.
pub async fn host_loop<R, W>(
    session: ScanSessionHandle,
    events: SessionEvents,
    input: R,
    out: &mut OutputWriter<W>,
    mut view: ViewState,
    autostart: bool,
) -> anyhow::Result<ViewState>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if autostart {
        session.start()?;
    }

    let outcome = drive(&session, events, input, out, &mut view).await;

    session.dispose().await;
    outcome?;
    Ok(view)
}

async fn drive<R, W>(
    session: &ScanSessionHandle,
    events: SessionEvents,
    input: R,
    out: &mut OutputWriter<W>,
    view: &mut ViewState,
) -> Result<(), HostError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (mut results, mut errors) = events.into_streams();
    let mut state_rx = session.watch_state();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<HostCommand>() {
                    Ok(HostCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(err) = apply(command, session, view, out) {
                            if err.is_fatal() {
                                return Err(err);
                            }
                            out.render(&HostEvent::Rejected(err))?;
                        }
                    }
                    Err(err) => out.render(&HostEvent::Rejected(err))?,
                }
            }

            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                view.on_state(state);
                out.render(&HostEvent::State { state })?;
            }

            Some(result) = results.next() => {
                let entry = view.on_result(&result);
                out.render(&HostEvent::Scanned { entry })?;
            }

            Some(error) = errors.next() => {
                view.on_error(error.clone());
                out.render(&HostEvent::Error { error })?;
            }
        }
    }

    Ok(())
}

fn apply<W: Write>(
    command: HostCommand,
    session: &ScanSessionHandle,
    view: &mut ViewState,
    out: &mut OutputWriter<W>,
) -> Result<(), HostError> {
    match command {
        HostCommand::Start => session.start()?,
        HostCommand::Stop => session.stop()?,
        HostCommand::State => out.render(&HostEvent::Status(view.status()))?,
        HostCommand::History => out.render(&HostEvent::History {
            entries: view.history(),
        })?,
        HostCommand::Clear => {
            view.clear_history();
            out.render(&HostEvent::History {
                entries: Vec::new(),
            })?;
        }
        HostCommand::Help => out.render(&HostEvent::Help {
            commands: HostCommand::help(),
        })?,
        // Handled by the loop
        HostCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use medscan_core::SessionState;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn spawn_replay(script: &str) -> (ScanSessionHandle, SessionEvents) {
        let decoder = ReplayDecoder::new(ReplayScript::parse(script).unwrap());
        ScanSession::spawn(Arc::new(decoder), SessionOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_and_quit() {
        let (session, events) = spawn_replay("repeat 5 miss\nok 4006381333931");
        let (mut client, server) = tokio::io::duplex(1024);

        let host = tokio::spawn(async move {
            let mut out = OutputWriter::new(OutputFormat::Text, Vec::new());
            let view = host_loop(
                session,
                events,
                BufReader::new(server),
                &mut out,
                ViewState::default(),
                false,
            )
            .await
            .unwrap();
            (view, String::from_utf8(out.into_inner()).unwrap())
        });

        client.write_all(b"start\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        client.write_all(b"bogus\nhistory\nquit\n").await.unwrap();

        let (view, text) = host.await.unwrap();
        assert_eq!(view.history().len(), 1);
        assert_eq!(view.status().last_code.as_deref(), Some("4006381333931"));
        assert!(text.contains("state: active"));
        assert!(text.contains("scanned: 4006381333931 (EAN-13)"));
        assert!(text.contains("! Unknown command 'bogus'"));
        assert!(text.contains("history:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_is_rendered_and_input_eof_disposes() {
        let (session, events) = spawn_replay("err Video stream ended");
        let mut out = OutputWriter::new(OutputFormat::Json, Vec::new());

        let (mut client, server) = tokio::io::duplex(1024);
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            client.shutdown().await.unwrap();
        });

        let view = host_loop(
            session,
            events,
            BufReader::new(server),
            &mut out,
            ViewState::default(),
            true,
        )
        .await
        .unwrap();
        writer.await.unwrap();

        assert_eq!(view.state(), SessionState::Failed);
        assert_eq!(
            view.last_error().map(|e| e.message.as_str()),
            Some("Video stream ended")
        );

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("{\"event\":\"error\",\"error\":{\"message\":\"Video stream ended\",\"fatal\":true}}"));
    }
}
