//! Message envelopes and origin verification.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a message endpoint (host, context, or worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(u64);

impl Origin {
    /// Allocate a process-unique origin.
    pub fn fresh() -> Self {
        Self(NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "origin:{}", self.0)
    }
}

/// A message tagged with the endpoint that sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<M> {
    pub origin: Origin,
    pub message: M,
}

impl<M> Envelope<M> {
    pub fn new(origin: Origin, message: M) -> Self {
        Self { origin, message }
    }
}

/// Records the peer origin on first contact and rejects every other one.
///
/// Set exactly once; only dropping the endpoint resets it.
#[derive(Debug, Default)]
pub struct ChannelHandshake {
    remote_origin: Option<Origin>,
}

impl ChannelHandshake {
    pub const fn new() -> Self {
        Self {
            remote_origin: None,
        }
    }

    pub fn remote_origin(&self) -> Option<Origin> {
        self.remote_origin
    }

    /// Verify `origin`, recording it if no peer has been seen yet.
    pub fn accept(&mut self, origin: Origin) -> bool {
        match self.remote_origin {
            Some(known) => known == origin,
            None => {
                self.remote_origin = Some(origin);
                true
            }
        }
    }
}
