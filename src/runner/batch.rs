//! Line batching for child process output.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{OutputStream, RunnerEvent};
use crate::log;

/// Lines collected since the last flush.
#[derive(Debug)]
pub(super) struct LineBatch {
    lines: Vec<String>,
    max_lines: usize,
}

impl LineBatch {
    pub(super) fn new(max_lines: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Add a line, returning the batch once it is full.
    pub(super) fn push(&mut self, line: String) -> Option<Vec<String>> {
        self.lines.push(line);
        (self.lines.len() >= self.max_lines).then(|| self.take_all())
    }

    /// Flush whatever is pending.
    pub(super) fn take(&mut self) -> Option<Vec<String>> {
        (!self.lines.is_empty()).then(|| self.take_all())
    }

    fn take_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

/// Forward `reader` line by line, flushing every `max_lines` lines or
/// `interval`, whichever comes first. Returns at EOF.
pub(super) async fn pump<R>(
    reader: R,
    stream: OutputStream,
    message_id: String,
    max_lines: usize,
    interval: Duration,
    tx: mpsc::UnboundedSender<RunnerEvent>,
) where
    R: AsyncRead + Unpin,
{
    let emit = |lines: Vec<String>| {
        let _ = tx.send(RunnerEvent::output(stream, &message_id, lines));
    };

    let mut lines = BufReader::new(reader).lines();
    let mut batch = LineBatch::new(max_lines);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(full) = batch.push(line) {
                        emit(full);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log!("runner"; "{} read failed: {}", stream, e);
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Some(pending) = batch.take() {
                    emit(pending);
                }
            }
        }
    }

    if let Some(rest) = batch.take() {
        emit(rest);
    }
}
