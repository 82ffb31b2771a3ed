//! Per-submission render outcome.

use serde::{Deserialize, Serialize};

use crate::core::SandboxError;

/// Result of taking one submission through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderOutcome {
    /// Component mounted and rendered without faults
    Success,
    /// Source failed to compile
    CompileError { message: String },
    /// Compiled module produced no usable default export
    LoadError { message: String },
    /// Mounted component threw; the error boundary shows its fallback
    RuntimeError { message: String },
    /// Rendering library globals never became available
    BindingTimeout { message: String },
    /// A pipeline stage could not be reached; nothing was compiled or run
    ChannelUnavailable { message: String },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Diagnostic message, `None` for success.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::CompileError { message }
            | Self::LoadError { message }
            | Self::RuntimeError { message }
            | Self::BindingTimeout { message }
            | Self::ChannelUnavailable { message } => Some(message),
        }
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "rendered",
            Self::CompileError { .. } => "compile error",
            Self::LoadError { .. } => "load error",
            Self::RuntimeError { .. } => "runtime error",
            Self::BindingTimeout { .. } => "binding timeout",
            Self::ChannelUnavailable { .. } => "channel unavailable",
        }
    }
}

impl From<&SandboxError> for RenderOutcome {
    fn from(err: &SandboxError) -> Self {
        let message = err.detail();
        match err {
            SandboxError::Compile(_) => Self::CompileError { message },
            SandboxError::Load(_) => Self::LoadError { message },
            SandboxError::Runtime(_) => Self::RuntimeError { message },
            SandboxError::BindingTimeout { .. } => Self::BindingTimeout { message },
            SandboxError::ChannelUnavailable(_) => Self::ChannelUnavailable { message },
        }
    }
}
