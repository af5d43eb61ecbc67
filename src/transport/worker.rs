//! Calculations in a long-running interpreter process.
//!
//! The child reads one `{"data": query}` object per stdin line and writes
//! one JSON object per stdout line: `{"worker_ready": true}` once the
//! backend is loaded, then a response for each request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{announce_ready, deliver, EventSink, Transport, TransportEvent};
use crate::config::TransportKind;
use crate::error::TransportError;
use crate::query::Query;
use crate::response::Response;

#[derive(Serialize)]
struct WorkerRequest<'a> {
    data: &'a Query,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkerReply {
    Ready { worker_ready: bool },
    Response(Response),
}

#[derive(Debug, Default)]
struct Outstanding {
    pending: usize,
    exited: bool,
}

/// Requests written but not yet answered, and whether the child is gone.
type SharedOutstanding = Arc<Mutex<Outstanding>>;

fn lock(state: &SharedOutstanding) -> std::sync::MutexGuard<'_, Outstanding> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct WorkerTransport {
    command: Vec<String>,
    script: String,
    requests: Option<mpsc::UnboundedSender<Query>>,
    outstanding: SharedOutstanding,
    events: Option<EventSink>,
}

impl WorkerTransport {
    /// `command` is the interpreter command line; `script` is appended as
    /// its last argument.
    pub fn new(command: Vec<String>, script: impl Into<String>) -> Self {
        Self {
            command,
            script: script.into(),
            requests: None,
            outstanding: SharedOutstanding::default(),
            events: None,
        }
    }

    fn spawn_worker(&self) -> Result<(ChildStdin, ChildStdout, tokio::process::Child), TransportError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| TransportError::Worker("worker command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Worker("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Worker("worker stdout unavailable".to_string()))?;
        Ok((stdin, stdout, child))
    }
}

async fn write_requests(mut stdin: ChildStdin, mut requests: mpsc::UnboundedReceiver<Query>) {
    while let Some(query) = requests.recv().await {
        let line = match serde_json::to_string(&WorkerRequest { data: &query }) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "could not encode worker request");
                continue;
            }
        };
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        };
        if let Err(err) = written.await {
            warn!(error = %err, "worker stdin closed");
            break;
        }
    }
}

async fn read_replies(
    stdout: ChildStdout,
    mut child: tokio::process::Child,
    events: EventSink,
    outstanding: SharedOutstanding,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut ready = false;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "reading worker stdout failed");
                break;
            }
        };
        match serde_json::from_str::<WorkerReply>(&line) {
            Ok(WorkerReply::Ready { worker_ready: true }) if !ready => {
                ready = true;
                info!("worker ready");
                announce_ready(&events);
            }
            Ok(WorkerReply::Ready { worker_ready: true }) => {
                warn!("worker reported ready more than once");
            }
            Ok(WorkerReply::Ready { worker_ready: false }) => {
                debug!("worker not ready yet");
            }
            Ok(WorkerReply::Response(response)) => {
                {
                    let mut state = lock(&outstanding);
                    state.pending = state.pending.saturating_sub(1);
                }
                deliver(&events, Ok(response));
            }
            Err(err) => {
                // Replies arrive in request order, so an unreadable line
                // answers the oldest outstanding request.
                let answers_request = {
                    let mut state = lock(&outstanding);
                    let waiting = state.pending > 0;
                    if waiting {
                        state.pending -= 1;
                    }
                    waiting
                };
                if answers_request {
                    deliver(&events, Err(TransportError::Json(err)));
                } else {
                    debug!(error = %err, line = %line, "skipping worker output");
                }
            }
        }
    }

    let unanswered = {
        let mut state = lock(&outstanding);
        state.exited = true;
        std::mem::take(&mut state.pending)
    };
    let status = child.wait().await;
    warn!(?status, unanswered, "worker exited");
    for _ in 0..unanswered {
        deliver(
            &events,
            Err(TransportError::Worker("worker exited before replying".to_string())),
        );
    }
}

#[async_trait]
impl Transport for WorkerTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Worker
    }

    async fn initialize(&mut self, events: EventSink) {
        self.events = Some(events.clone());
        let (stdin, stdout, child) = match self.spawn_worker() {
            Ok(parts) => parts,
            Err(err) => {
                lock(&self.outstanding).exited = true;
                deliver(&events, Err(err));
                return;
            }
        };
        info!(command = ?self.command, script = %self.script, "worker started");

        let (tx, rx) = mpsc::unbounded_channel();
        self.requests = Some(tx);
        tokio::spawn(write_requests(stdin, rx));
        tokio::spawn(read_replies(stdout, child, events, self.outstanding.clone()));
    }

    fn submit(&self, query: Query) {
        let Some(events) = &self.events else {
            warn!("submit before initialize; query dropped");
            return;
        };
        let mut state = lock(&self.outstanding);
        let sent = !state.exited
            && self
                .requests
                .as_ref()
                .is_some_and(|requests| requests.send(query).is_ok());
        if sent {
            state.pending += 1;
        } else {
            drop(state);
            deliver(
                events,
                Err(TransportError::Worker("worker is not running".to_string())),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_decode_by_shape() {
        let ready: WorkerReply = serde_json::from_str(r#"{"worker_ready": true}"#).unwrap();
        assert!(matches!(ready, WorkerReply::Ready { worker_ready: true }));

        let reply: WorkerReply =
            serde_json::from_str(r#"{"success": false, "detail": {"error": "x"}}"#).unwrap();
        assert!(matches!(reply, WorkerReply::Response(r) if !r.success));
    }

    #[tokio::test]
    async fn failed_spawn_reports_once_and_never_ready() {
        let mut worker = WorkerTransport::new(
            vec!["/nonexistent/interpreter".to_string()],
            "worker.py",
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        worker.initialize(tx).await;

        let Some(TransportEvent::Response(response)) = rx.recv().await else {
            panic!("expected a failure response");
        };
        assert!(!response.success);

        worker.submit(crate::query::Query {
            calculate: crate::query::Calculation::Activation,
            decay: 0.0005,
            abundance: crate::config::Abundance::Iaea,
            rest: Default::default(),
            fields: Default::default(),
        });
        assert!(matches!(rx.recv().await, Some(TransportEvent::Response(r)) if !r.success));

        drop(worker);
        assert!(rx.recv().await.is_none());
    }
}
