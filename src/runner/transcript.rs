//! Output correlation by `messageId`.

use dashmap::DashMap;

use super::{RunStatus, RunnerEvent};

/// Everything observed for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub status: Option<RunStatus>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub error: Option<String>,
}

impl Transcript {
    pub fn is_finished(&self) -> bool {
        matches!(self.status, Some(RunStatus::Executed | RunStatus::Error))
    }
}

/// Concurrent store of transcripts, keyed by `messageId`.
#[derive(Debug, Default)]
pub struct Transcripts {
    entries: DashMap<String, Transcript>,
}

impl Transcripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `event` into the transcript of its message.
    pub fn apply(&self, event: RunnerEvent) {
        match event {
            RunnerEvent::Status {
                message_id,
                status,
                error,
            } => {
                let mut entry = self.entries.entry(message_id).or_default();
                entry.status = Some(status);
                if error.is_some() {
                    entry.error = error;
                }
            }
            RunnerEvent::Stdout { message_id, lines } => {
                self.entries.entry(message_id).or_default().stdout.extend(lines);
            }
            RunnerEvent::Stderr { message_id, lines } => {
                self.entries.entry(message_id).or_default().stderr.extend(lines);
            }
        }
    }

    pub fn get(&self, message_id: &str) -> Option<Transcript> {
        self.entries.get(message_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, message_id: &str) -> Option<Transcript> {
        self.entries.remove(message_id).map(|(_, transcript)| transcript)
    }

}
