//! A mounted component: the loaded default export under its safety wrappers.

use std::time::Duration;

use rquickjs::{CatchResultExt, Function, Persistent};

use super::boundary::{BoundaryState, ErrorBoundary};
use super::suspense::{DeferredMount, MountState};
use super::tree::{RenderFault, TreeRenderer};
use super::Node;
use crate::core::SubmissionSeq;
use crate::protocol::RenderOutcome;
use crate::debug;
use crate::runtime::{Engine, describe_caught};

/// The active module handle plus the wrappers it is rendered under.
///
/// Created per submission; replacing it discards the previous boundary
/// state along with the component.
pub struct Mount {
    component: Persistent<Function<'static>>,
    boundary: ErrorBoundary,
    suspense: DeferredMount,
}

impl Mount {
    pub fn new(seq: SubmissionSeq, component: Persistent<Function<'static>>, suspense_retries: u32) -> Self {
        Self {
            component,
            boundary: ErrorBoundary::new(seq),
            suspense: DeferredMount::new(suspense_retries),
        }
    }

    /// Render the component once, bounded by `timeout`.
    pub fn render(&mut self, engine: &Engine, timeout: Duration) -> (Node, RenderOutcome) {
        let deadline = engine.arm_deadline(timeout);
        let component = &self.component;
        let suspense = &mut self.suspense;

        let node = self.boundary.render(|| {
            suspense
                .render(engine, || {
                    engine.with(|ctx| {
                        let function = component
                            .clone()
                            .restore(&ctx)
                            .catch(&ctx)
                            .map_err(|err| RenderFault::Thrown(describe_caught(&ctx, &err)))?;
                        TreeRenderer::new(ctx)?.render_root(function)
                    })
                })
                .map_err(|fault| match fault {
                    RenderFault::Thrown(message) => RenderFault::Thrown(deadline.explain(message)),
                    suspended => suspended,
                })
        });

        if self.suspense.state() == MountState::Pending {
            debug!("context"; "{} still suspended, showing placeholder", self.boundary.key());
        }

        let outcome = match self.boundary.state() {
            BoundaryState::Ok => RenderOutcome::Success,
            BoundaryState::CaughtError(message) => RenderOutcome::RuntimeError {
                message: message.clone(),
            },
        };
        (node, outcome)
    }
}
