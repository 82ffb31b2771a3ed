//! `exec` command: run a Python snippet and stream its output.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::mpsc;

use super::common::{display_name, read_source};
use crate::config::SandboxConfig;
use crate::core::ContentHash;
use crate::debug;
use crate::runner::{PythonRunner, RunRequest, RunStatus, RunnerEvent, Transcripts};

/// Run `file`, echoing output batches (or every event, with `json`) as they arrive.
pub async fn exec(config: Arc<SandboxConfig>, file: &Path, json: bool) -> Result<()> {
    let code = read_source(file)?;
    let message_id = format!("{}-{}", display_name(file), &ContentHash::of(&code).to_hex()[..8]);

    let (tx, mut events) = mpsc::unbounded_channel();
    let runner = PythonRunner::new(config.runner.clone(), tx);
    let task = runner.submit(RunRequest {
        code,
        message_id: message_id.clone(),
    });
    drop(runner);

    let transcripts = Transcripts::new();
    while let Some(event) = events.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            echo(&event);
        }
        let id = event.message_id().to_owned();
        transcripts.apply(event);
        if transcripts.get(&id).is_some_and(|t| t.is_finished()) {
            break;
        }
    }
    let _ = task.await;

    let transcript = transcripts.remove(&message_id).unwrap_or_default();
    debug!("exec"; "{}: {} stdout / {} stderr lines", message_id, transcript.stdout.len(), transcript.stderr.len());
    match transcript.status {
        Some(RunStatus::Executed) => Ok(()),
        _ => bail!(
            "{} failed: {}",
            display_name(file),
            transcript.error.as_deref().unwrap_or("no status reported")
        ),
    }
}

fn echo(event: &RunnerEvent) {
    match event {
        RunnerEvent::Stdout { lines, .. } => {
            let mut stdout = std::io::stdout().lock();
            for line in lines {
                let _ = writeln!(stdout, "{line}");
            }
        }
        RunnerEvent::Stderr { lines, .. } => {
            let mut stderr = std::io::stderr().lock();
            for line in lines {
                let _ = writeln!(stderr, "{line}");
            }
        }
        RunnerEvent::Status { status, .. } => debug!("exec"; "{:?}", status),
    }
}
