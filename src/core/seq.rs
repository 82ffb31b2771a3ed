//! Submission sequence numbers.
//!
//! Every accepted submission gets the next number from a [`SeqCursor`].
//! Async results carry the number of the submission that started them and
//! are applied only while it is still the latest one.

use serde::{Deserialize, Serialize};

/// Monotonically increasing submission number. `0` is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionSeq(u64);

impl std::fmt::Display for SubmissionSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues sequence numbers and remembers the latest accepted one.
#[derive(Debug, Default)]
pub struct SeqCursor {
    latest: u64,
}

impl SeqCursor {
    pub const fn new() -> Self {
        Self { latest: 0 }
    }

    /// Accept a new submission, superseding every earlier one.
    pub fn advance(&mut self) -> SubmissionSeq {
        self.latest += 1;
        SubmissionSeq(self.latest)
    }

    /// True if `seq` has been superseded by a newer submission.
    pub fn is_stale(&self, seq: SubmissionSeq) -> bool {
        seq.0 != self.latest
    }
}
