//! Observable host-side status.

use std::fmt;

use crate::core::ContentHash;
use crate::protocol::RenderOutcome;

/// Coarse phase of the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostPhase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A submission is queued or in flight.
    Loading,
    /// The latest submission rendered.
    Ready,
    /// The latest submission ended with an error.
    Error,
}

impl HostPhase {
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl fmt::Display for HostPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        })
    }
}

/// Snapshot published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStatus {
    pub phase: HostPhase,
    /// Context has announced `INIT_COMPLETE`.
    pub context_ready: bool,
    /// Message of the last failed outcome, cleared by a success.
    pub error: Option<String>,
    /// Document after the last settled submission.
    pub document: Option<String>,
    /// Hash of the source the last outcome belongs to.
    pub source: Option<ContentHash>,
    pub outcome: Option<RenderOutcome>,
}

impl HostStatus {
    pub(super) fn loading(&mut self) {
        self.phase = HostPhase::Loading;
    }

    pub(super) fn settle(&mut self, source: ContentHash, outcome: RenderOutcome, document: String) {
        match outcome.message() {
            Some(message) => {
                self.phase = HostPhase::Error;
                self.error = Some(message.to_owned());
            }
            None => {
                self.phase = HostPhase::Ready;
                self.error = None;
            }
        }
        self.document = Some(document);
        self.source = Some(source);
        self.outcome = Some(outcome);
    }
}
