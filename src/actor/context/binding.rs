//! Bounded wait for the rendering library's globals.

use std::time::Instant;

use crossbeam::channel::RecvTimeoutError;
use rquickjs::Function;

use super::ContextActor;
use crate::core::SubmissionSeq;
use crate::debug;
use crate::runtime::{Engine, hooks};

pub(super) enum BindingWait {
    Ready,
    TimedOut,
    /// A newer submission arrived while waiting.
    Superseded,
    Shutdown,
}

impl ContextActor {
    /// Poll until `React`/`ReactDOM` are bound, draining pending jobs and
    /// serving the inbox between polls.
    pub(super) fn await_bindings(&mut self, engine: &Engine, seq: SubmissionSeq) -> BindingWait {
        let timeout = self.config.context.binding_timeout();
        let interval = self.config.context.binding_poll_interval();
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            if self.stopping {
                return BindingWait::Shutdown;
            }
            if self.seqs.is_stale(seq) {
                return BindingWait::Superseded;
            }
            if self.bindings_ready(engine) {
                if polls > 0 {
                    debug!("context"; "bindings ready after {} polls", polls);
                }
                return BindingWait::Ready;
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return BindingWait::TimedOut;
            }

            polls += 1;
            engine.run_pending_jobs();
            match self.rx.recv_timeout(interval.min(timeout - elapsed)) {
                Ok(envelope) => self.on_host(envelope),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.stopping = true,
            }
        }
    }

    fn bindings_ready(&self, engine: &Engine) -> bool {
        let react = self.config.transform.react_global.as_str();
        let dom = self.config.transform.dom_global.as_str();
        engine.with(|ctx| {
            hooks(&ctx)
                .and_then(|hooks| hooks.get::<_, Function>("bindingsReady"))
                .and_then(|ready| ready.call::<_, bool>((react, dom)))
                .unwrap_or(false)
        })
    }
}
