//! QuickJS engine owned by one rendering context.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rquickjs::{CatchResultExt, Context, Ctx, Runtime};

use super::error::describe_caught;
use crate::config::ContextConfig;
use crate::core::SandboxError;
use crate::debug;
use crate::embed::runtime::HOST_JS;

/// Upper bound on jobs drained per call, so a self-rescheduling promise
/// chain cannot stall the context.
const MAX_JOBS_PER_DRAIN: usize = 10_000;

/// A QuickJS runtime plus its single global scope.
///
/// Not `Send`: created on, and confined to, the context thread.
pub struct Engine {
    runtime: Runtime,
    context: Context,
    deadline: Arc<Mutex<Option<Instant>>>,
}

impl Engine {
    /// Create a runtime with the configured limits and install the host hooks.
    pub fn new(config: &ContextConfig) -> Result<Self, SandboxError> {
        let runtime = Runtime::new()
            .map_err(|e| SandboxError::Load(format!("failed to create JavaScript runtime: {e}")))?;
        runtime.set_memory_limit(config.memory_limit_mb.saturating_mul(1024 * 1024));
        runtime.set_max_stack_size(config.max_stack_kb.saturating_mul(1024));

        let deadline = Arc::new(Mutex::new(None::<Instant>));
        let watched = Arc::clone(&deadline);
        runtime.set_interrupt_handler(Some(Box::new(move || {
            watched.lock().is_some_and(|at| Instant::now() >= at)
        })));

        let context = Context::full(&runtime)
            .map_err(|e| SandboxError::Load(format!("failed to create JavaScript context: {e}")))?;

        let engine = Self {
            runtime,
            context,
            deadline,
        };
        engine.eval_script("host hooks", HOST_JS)?;
        Ok(engine)
    }

    /// Run `f` inside the context's global scope.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Ctx<'js>) -> R,
    {
        self.context.with(f)
    }

    /// Evaluate a classic script in the global scope.
    pub fn eval_script(&self, name: &str, source: &str) -> Result<(), SandboxError> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(source)
                .catch(&ctx)
                .map_err(|err| SandboxError::Runtime(format!("{name}: {}", describe_caught(&ctx, &err))))
        })
    }

    /// Drain the microtask queue. Returns the number of jobs executed.
    pub fn run_pending_jobs(&self) -> usize {
        let mut executed = 0;
        while executed < MAX_JOBS_PER_DRAIN {
            match self.runtime.execute_pending_job() {
                Ok(true) => executed += 1,
                Ok(false) => break,
                Err(_) => {
                    executed += 1;
                    debug!("context"; "a pending job threw");
                }
            }
        }
        executed
    }

    pub fn has_pending_jobs(&self) -> bool {
        self.runtime.is_job_pending()
    }

    /// Interrupt JavaScript execution once `timeout` has elapsed, until the
    /// returned guard is dropped.
    pub fn arm_deadline(&self, timeout: Duration) -> DeadlineGuard<'_> {
        *self.deadline.lock() = Some(Instant::now() + timeout);
        DeadlineGuard {
            engine: self,
            timeout,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.lock().is_some_and(|at| Instant::now() >= at)
    }
}

/// Clears the engine deadline on drop.
pub struct DeadlineGuard<'a> {
    engine: &'a Engine,
    timeout: Duration,
}

impl DeadlineGuard<'_> {
    pub fn expired(&self) -> bool {
        self.engine.deadline_passed()
    }

    /// Replace `message` with a timeout description if the deadline fired.
    pub fn explain(&self, message: String) -> String {
        if self.expired() {
            format!("execution interrupted after {} ms", self.timeout.as_millis())
        } else {
            message
        }
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        *self.engine.deadline.lock() = None;
    }
}
