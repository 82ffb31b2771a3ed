//! Core types - pure abstractions shared across the codebase.

mod error;
mod hash;
mod seq;
mod state;

pub use error::SandboxError;
pub use hash::ContentHash;
pub use seq::{SeqCursor, SubmissionSeq};
pub use state::setup_shutdown_handler;
