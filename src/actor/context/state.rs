//! Rendering context lifecycle states.

use std::fmt;

use crate::protocol::RenderOutcome;

/// Where the context is in handling its latest submission.
///
/// No state is terminal: every state after `Uninitialized` re-enters
/// `Processing` on the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    AwaitingFirstSubmission,
    Processing,
    Rendered,
    CompileFailed,
    LoadFailed,
    BindingFailed,
    /// Mounted, but the error boundary caught a fault.
    RuntimeFailed,
    /// The transformer worker is gone.
    Disconnected,
}

impl ContextState {
    /// State after a submission settles with `outcome`.
    pub const fn settled(outcome: &RenderOutcome) -> Self {
        match outcome {
            RenderOutcome::Success => Self::Rendered,
            RenderOutcome::CompileError { .. } => Self::CompileFailed,
            RenderOutcome::LoadError { .. } => Self::LoadFailed,
            RenderOutcome::BindingTimeout { .. } => Self::BindingFailed,
            RenderOutcome::RuntimeError { .. } => Self::RuntimeFailed,
            RenderOutcome::ChannelUnavailable { .. } => Self::Disconnected,
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingFirstSubmission => "awaitingFirstSubmission",
            Self::Processing => "processing",
            Self::Rendered => "rendered",
            Self::CompileFailed => "compileFailed",
            Self::LoadFailed => "loadFailed",
            Self::BindingFailed => "bindingFailed",
            Self::RuntimeFailed => "runtimeFailed",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SandboxError;

    fn after(err: SandboxError) -> ContextState {
        ContextState::settled(&RenderOutcome::from(&err))
    }

    #[test]
    fn test_settled_states() {
        assert_eq!(ContextState::settled(&RenderOutcome::Success), ContextState::Rendered);
        assert_eq!(after(SandboxError::Load("x".into())), ContextState::LoadFailed);
        assert_eq!(
            after(SandboxError::BindingTimeout { timeout_ms: 1 }),
            ContextState::BindingFailed
        );
        assert_eq!(
            after(SandboxError::ChannelUnavailable("transformer worker")),
            ContextState::Disconnected
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ContextState::AwaitingFirstSubmission.to_string(), "awaitingFirstSubmission");
        assert_eq!(ContextState::Disconnected.to_string(), "disconnected");
    }
}
