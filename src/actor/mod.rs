//! Actor System for the Sandbox Pipeline
//!
//! Three execution contexts that share no memory and talk only through
//! typed, origin-stamped messages:
//!
//! ```text
//! HostBridge --> ContextActor --> TransformerActor
//! (tokio task)   (JS thread)      (compiler thread)
//! ```
//!
//! # Module Structure
//!
//! - `host` - Host bridge: lifecycle, resend rule, observable status
//! - `context` - Isolated rendering context: import, bindings, mount
//! - `transformer` - JSX/TSX compilation with a bounded module cache
//! - `fs` - File watcher with debouncing (watch mode)

pub mod context;
pub mod fs;
pub mod host;
pub mod transformer;

pub use host::{HostBridge, HostPhase, HostStatus};
