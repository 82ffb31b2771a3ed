//! Sandbox error taxonomy.

use thiserror::Error;

/// Errors produced while taking one submission through the pipeline.
///
/// `Compile`, `Load` and `BindingTimeout` end a submission's pipeline,
/// `Runtime` is contained by the error boundary, and `ChannelUnavailable`
/// is logged and swallowed by whoever tried to send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("compile error: {0}")]
    Compile(String),

    #[error("rendering library was not bound within {timeout_ms} ms")]
    BindingTimeout { timeout_ms: u64 },

    #[error("load error: {0}")]
    Load(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("channel unavailable: {0} is gone")]
    ChannelUnavailable(&'static str),
}

impl SandboxError {
    /// Human-readable headline for the inline error panel.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Compile(_) => "The component failed to compile.",
            Self::BindingTimeout { .. } => "The rendering library did not become available.",
            Self::Load(_) => "The compiled component could not be loaded.",
            Self::Runtime(_) => "The component threw while rendering.",
            Self::ChannelUnavailable(_) => "The rendering context is not reachable.",
        }
    }

    /// Raw diagnostic message, without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Compile(message) | Self::Load(message) | Self::Runtime(message) => {
                message.clone()
            }
            Self::BindingTimeout { .. } | Self::ChannelUnavailable(_) => self.to_string(),
        }
    }
}
