//! Sandbox Message Protocol
//!
//! Typed messages exchanged between the three execution contexts:
//!
//! ```text
//! HostBridge --UPDATE_COMPONENT--> RenderingContext --TRANSFORM_CODE--> Transformer
//!     ^                                  |     ^                              |
//!     +--INIT_COMPLETE / RENDER_RESULT---+     +--TRANSFORM_SUCCESS / ERROR---+
//! ```
//!
//! Every message is plain structured data (JSON-serializable, `type` tag)
//! wrapped in an [`Envelope`] naming the sender's [`Origin`].

mod envelope;
mod message;
mod outcome;

pub use envelope::{ChannelHandshake, Envelope, Origin};
pub use message::{ContextMsg, HostMsg, RenderResult, WorkerRequest, WorkerResponse};
pub use outcome::RenderOutcome;
