//! Python runner - interpreted snippets in a child process
//!
//! Same contract shape as the component pipeline: submit code, stream
//! output, report status. Every event carries the `messageId` of the
//! submission it belongs to.
//!
//! ```text
//! submit({code, messageId}) --> python3 -u -c <code>
//!                                  |  stdout/stderr (line batches)
//!   status: executing -> executed | error
//! ```

mod batch;
mod transcript;


pub use transcript::Transcripts;

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RunnerConfig;
use crate::debug;

/// How long output pipes may stay open after the process is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A snippet to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub code: String,
    pub message_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Executing,
    Executed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// Event emitted while a snippet runs (`{"type":"stdout","messageId":..}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum RunnerEvent {
    Status {
        message_id: String,
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Stdout {
        message_id: String,
        lines: Vec<String>,
    },
    Stderr {
        message_id: String,
        lines: Vec<String>,
    },
}

impl RunnerEvent {
    pub fn message_id(&self) -> &str {
        match self {
            Self::Status { message_id, .. }
            | Self::Stdout { message_id, .. }
            | Self::Stderr { message_id, .. } => message_id,
        }
    }

    fn status(message_id: &str, status: RunStatus, error: Option<String>) -> Self {
        Self::Status {
            message_id: message_id.to_owned(),
            status,
            error,
        }
    }

    fn output(stream: OutputStream, message_id: &str, lines: Vec<String>) -> Self {
        let message_id = message_id.to_owned();
        match stream {
            OutputStream::Stdout => Self::Stdout { message_id, lines },
            OutputStream::Stderr => Self::Stderr { message_id, lines },
        }
    }
}

/// Spawns one interpreter process per submission.
#[derive(Clone)]
pub struct PythonRunner {
    config: RunnerConfig,
    events: mpsc::UnboundedSender<RunnerEvent>,
}

impl PythonRunner {
    pub fn new(config: RunnerConfig, events: mpsc::UnboundedSender<RunnerEvent>) -> Self {
        Self { config, events }
    }

    /// Start `request` in the background. Must be called inside a tokio runtime.
    pub fn submit(&self, request: RunRequest) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.execute(request).await })
    }

    /// Run `request` to completion. The final event is always a terminal status.
    pub async fn execute(&self, request: RunRequest) {
        let RunRequest { code, message_id } = request;
        self.emit(RunnerEvent::status(&message_id, RunStatus::Executing, None));

        let outcome = self.run_process(&code, &message_id).await;
        let (status, error) = match outcome {
            Ok(()) => (RunStatus::Executed, None),
            Err(e) => (RunStatus::Error, Some(e)),
        };
        debug!("runner"; "{} {:?}", message_id, status);
        self.emit(RunnerEvent::status(&message_id, status, error));
    }

    async fn run_process(&self, code: &str, message_id: &str) -> Result<(), String> {
        let interpreter = &self.config.interpreter;
        let mut child = Command::new(interpreter)
            .arg("-u")
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start {interpreter}: {e}"))?;

        let readers = [
            child.stdout.take().map(|out| self.spawn_pump(out, OutputStream::Stdout, message_id)),
            child.stderr.take().map(|err| self.spawn_pump(err, OutputStream::Stderr, message_id)),
        ];

        let timeout = self.config.timeout();
        let exit = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(format!("process exited with {status}")),
            Ok(Err(e)) => Err(format!("failed to wait for {interpreter}: {e}")),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    crate::log!("runner"; "failed to kill {}: {}", message_id, e);
                }
                Err(format!("timed out after {} s", timeout.as_secs()))
            }
        };

        // All output precedes the terminal status.
        for reader in readers.into_iter().flatten() {
            let abort = reader.abort_handle();
            if tokio::time::timeout(DRAIN_GRACE, reader).await.is_err() {
                debug!("runner"; "{} output still open after exit", message_id);
                abort.abort();
            }
        }
        exit
    }

    fn spawn_pump<R>(&self, reader: R, stream: OutputStream, message_id: &str) -> JoinHandle<()>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(batch::pump(
            reader,
            stream,
            message_id.to_owned(),
            self.config.batch_lines,
            self.config.batch_interval(),
            self.events.clone(),
        ))
    }

    fn emit(&self, event: RunnerEvent) {
        if self.events.send(event).is_err() {
            debug!("runner"; "event receiver dropped");
        }
    }
}
