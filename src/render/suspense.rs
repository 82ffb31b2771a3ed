//! Deferred mount: retries a subtree that suspended on pending async work.

use super::tree::RenderFault;
use super::{Node, panel};
use crate::debug;
use crate::runtime::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Nothing rendered yet.
    Idle,
    /// Last attempt rendered the subtree.
    Resolved,
    /// Still suspended when attempts ran out; the placeholder is shown.
    Pending,
}

#[derive(Debug)]
pub struct DeferredMount {
    retries: u32,
    state: MountState,
}

impl DeferredMount {
    pub const fn new(retries: u32) -> Self {
        Self {
            retries,
            state: MountState::Idle,
        }
    }

    pub const fn state(&self) -> MountState {
        self.state
    }

    /// Render `attempt`, draining pending jobs and retrying while it suspends.
    ///
    /// Gives up early once no job is left that could settle the thenable.
    pub fn render(
        &mut self,
        engine: &Engine,
        mut attempt: impl FnMut() -> Result<Node, RenderFault>,
    ) -> Result<Node, RenderFault> {
        for round in 0..=self.retries {
            match attempt() {
                Err(RenderFault::Suspended) => {
                    self.state = MountState::Pending;
                    if !engine.has_pending_jobs() {
                        debug!("context"; "suspended (attempt {}) with no pending jobs", round + 1);
                        break;
                    }
                    let drained = engine.run_pending_jobs();
                    debug!("context"; "suspended (attempt {}), drained {} jobs", round + 1, drained);
                }
                Ok(node) => {
                    self.state = MountState::Resolved;
                    return Ok(node);
                }
                Err(fault) => return Err(fault),
            }
        }
        Ok(panel::loading_placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;

    #[test]
    fn test_resolves_after_jobs_run() {
        let engine = Engine::new(&ContextConfig::default()).unwrap();
        engine
            .eval_script("setup", "globalThis.ready = false; Promise.resolve().then(() => { ready = true; })")
            .unwrap();

        let mut mount = DeferredMount::new(3);
        let node = mount
            .render(&engine, || {
                let ready: bool = engine.with(|ctx| ctx.globals().get("ready").unwrap());
                if ready { Ok(Node::text("done")) } else { Err(RenderFault::Suspended) }
            })
            .unwrap();
        assert_eq!(node.to_html(), "done");
        assert_eq!(mount.state(), MountState::Resolved);
    }

    #[test]
    fn test_never_settling_shows_placeholder() {
        let engine = Engine::new(&ContextConfig::default()).unwrap();
        let mut attempts = 0;
        let mut mount = DeferredMount::new(5);
        let node = mount
            .render(&engine, || {
                attempts += 1;
                Err(RenderFault::Suspended)
            })
            .unwrap();
        assert!(node.to_html().contains("sandbox-loading"));
        assert_eq!(mount.state(), MountState::Pending);
        // no pending jobs: gives up after the first attempt
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_thrown_fault_passes_through() {
        let engine = Engine::new(&ContextConfig::default()).unwrap();
        let mut mount = DeferredMount::new(2);
        let fault = mount
            .render(&engine, || Err(RenderFault::Thrown("Error: x".into())))
            .unwrap_err();
        assert_eq!(fault, RenderFault::Thrown("Error: x".into()));
    }
}
