//! Error boundary around the dynamically loaded component subtree.

use super::tree::RenderFault;
use super::{Node, panel};
use crate::core::SubmissionSeq;
use crate::log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Ok,
    CaughtError(String),
}

/// Catches faults thrown while rendering its subtree and shows a fallback.
///
/// Keyed by the submission it was created for; once it has caught an error
/// it keeps showing the fallback until a new boundary replaces it.
#[derive(Debug)]
pub struct ErrorBoundary {
    key: SubmissionSeq,
    state: BoundaryState,
}

impl ErrorBoundary {
    pub const fn new(key: SubmissionSeq) -> Self {
        Self {
            key,
            state: BoundaryState::Ok,
        }
    }

    pub const fn key(&self) -> SubmissionSeq {
        self.key
    }

    pub const fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn render(&mut self, subtree: impl FnOnce() -> Result<Node, RenderFault>) -> Node {
        if let BoundaryState::CaughtError(message) = &self.state {
            return panel::boundary_fallback(message);
        }

        match subtree() {
            Ok(node) => node,
            Err(RenderFault::Thrown(message)) => {
                log!("context"; "component {} threw while rendering: {}", self.key, message);
                let fallback = panel::boundary_fallback(&message);
                self.state = BoundaryState::CaughtError(message);
                fallback
            }
            // Suspension is resolved by the deferred mount inside the boundary.
            Err(RenderFault::Suspended) => panel::loading_placeholder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SeqCursor;

    #[test]
    fn test_boundary_passes_through() {
        let mut boundary = ErrorBoundary::new(SeqCursor::new().advance());
        let node = boundary.render(|| Ok(Node::text("ok")));
        assert_eq!(node.to_html(), "ok");
        assert_eq!(boundary.state(), &BoundaryState::Ok);
    }

    #[test]
    fn test_boundary_catches_and_sticks() {
        let mut boundary = ErrorBoundary::new(SeqCursor::new().advance());
        let node = boundary.render(|| Err(RenderFault::Thrown("Error: boom".into())));
        assert!(node.to_html().contains("Error: boom"));
        assert_eq!(boundary.state(), &BoundaryState::CaughtError("Error: boom".into()));

        // No retry until the boundary is recreated.
        let mut ran = false;
        let again = boundary.render(|| {
            ran = true;
            Ok(Node::text("recovered"))
        });
        assert!(!ran);
        assert!(again.to_html().contains("sandbox-boundary"));
    }
}
