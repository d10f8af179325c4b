// Stream module - Writes recent or live logs to an output sink

use crate::client::{ClientConfig, LogClient};
use crate::endpoint::{resolve_endpoint, LogMode};
use crate::error::{is_abnormal_closure, Result, SilError};
use crate::logs::{format_record, DisplayZone, LogRecord};
use crate::transport::TailChannels;
use std::io::Write;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Progress of a live tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    Streaming,
    TerminatingError,
    TerminatingClean,
    Done,
}

/// What the error watcher reports back
#[derive(Debug)]
enum WatchOutcome {
    /// First error that was not an abnormal closure
    Terminal(SilError),
    /// Error channel closed without a terminal error
    ClosedCleanly,
}

fn transition(from: TailState, to: TailState) -> TailState {
    debug!(?from, ?to, "Tail state changed");
    to
}

/// Drive a live tail: write every record from the message channel to `sink`
/// while watching the error channel for a terminal error.
///
/// Abnormal closure errors (WebSocket code 1006) are ignored. On the first
/// other error this returns that error at once, leaving the message forwarder
/// running detached, so lines still in flight may not reach `sink` before the
/// caller resumes. When the error channel closes cleanly, waits for the
/// forwarder to drain the message channel and returns `Ok(())`.
pub async fn tail<W>(channels: TailChannels, zone: DisplayZone, sink: W) -> Result<()>
where
    W: Write + Send + 'static,
{
    let TailChannels { messages, errors } = channels;
    let mut state = TailState::Streaming;

    let forwarder = tokio::spawn(forward_messages(messages, zone, sink));

    let (signal_tx, signal_rx) = oneshot::channel();
    tokio::spawn(watch_errors(errors, signal_tx));

    let outcome = signal_rx.await.unwrap_or_else(|_| {
        WatchOutcome::Terminal(SilError::Transport(
            "Error watcher stopped unexpectedly".to_string(),
        ))
    });

    match outcome {
        WatchOutcome::Terminal(err) => {
            state = transition(state, TailState::TerminatingError);
            // Not joined: the forwarder keeps running until its channel closes
            drop(forwarder);
            transition(state, TailState::Done);
            Err(err)
        }
        WatchOutcome::ClosedCleanly => {
            state = transition(state, TailState::TerminatingClean);
            if let Err(e) = forwarder.await {
                warn!("Message forwarder failed: {}", e);
            }
            transition(state, TailState::Done);
            Ok(())
        }
    }
}

/// Format and write records in arrival order until the channel closes
async fn forward_messages<W: Write>(
    mut messages: mpsc::Receiver<LogRecord>,
    zone: DisplayZone,
    mut sink: W,
) {
    while let Some(record) = messages.recv().await {
        let line = format_record(&record, zone);
        if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
            warn!("Failed to write log line: {}", e);
            break;
        }
    }
}

async fn watch_errors(mut errors: mpsc::Receiver<SilError>, signal: oneshot::Sender<WatchOutcome>) {
    let outcome = loop {
        match errors.recv().await {
            Some(err) if is_abnormal_closure(&err) => {
                debug!("Ignoring abnormal closure: {}", err);
            }
            Some(err) => break WatchOutcome::Terminal(err),
            None => break WatchOutcome::ClosedCleanly,
        }
    };

    // Orchestrator may have gone away
    let _ = signal.send(outcome);
}

/// Write the recent batch for `target_id` to `sink`, one line per record
pub async fn dump_recent_logs<W: Write>(
    client: &LogClient,
    target_id: &str,
    auth_token: &str,
    sink: &mut W,
) -> Result<()> {
    let lines = client.recent_logs(target_id, auth_token).await?;
    for line in &lines {
        writeln!(sink, "{}", line)?;
    }
    sink.flush()?;
    Ok(())
}

/// Everything needed to show logs for one target
#[derive(Debug, Clone)]
pub struct LogsRequest {
    /// Identifier of the service instance whose logs are shown
    pub target_id: String,
    pub auth_token: String,
    /// Logs endpoint as discovered for the service, before mode resolution
    pub discovered_endpoint: String,
    pub mode: LogMode,
    pub insecure_skip_verify: bool,
    pub display_zone: DisplayZone,
}

/// Resolve the endpoint for the request's mode, build a client with
/// `build_client` and dump or tail logs into `sink`.
///
/// A blank line is written before any log lines.
pub async fn run_logs<W, F>(request: LogsRequest, mut sink: W, build_client: F) -> Result<()>
where
    W: Write + Send + 'static,
    F: FnOnce(ClientConfig) -> Result<LogClient>,
{
    let endpoint = resolve_endpoint(&request.discovered_endpoint, request.mode)?;
    debug!(%endpoint, mode = ?request.mode, "Resolved logs endpoint");

    let client = build_client(ClientConfig {
        endpoint_url: endpoint,
        insecure_skip_verify: request.insecure_skip_verify,
        display_zone: request.display_zone,
    })?;

    writeln!(sink)?;

    match request.mode {
        LogMode::Dump => {
            dump_recent_logs(&client, &request.target_id, &request.auth_token, &mut sink).await
        }
        LogMode::Tail => {
            client
                .tailing_logs(&request.target_id, &request.auth_token, sink)
                .await
        }
    }
}
