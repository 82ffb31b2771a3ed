//! Isolated Rendering Context - sandboxed module loading and rendering
//!
//! One OS thread owns a QuickJS runtime (its own global scope) and a
//! document. It is driven only by messages:
//!
//! ```text
//! Host --UPDATE_COMPONENT--> Context --TRANSFORM_CODE--> Transformer
//!                               |  <--TRANSFORM_SUCCESS/ERROR--
//!                               v
//!        resource -> binding poll -> import -> mount (boundary + suspense)
//!                               |
//! Host <--RENDER_RESULT---------+
//! ```
//!
//! Every submission gets a [`SubmissionSeq`]; results for anything but the
//! latest one are dropped.

mod binding;
mod loader;
mod resource;
mod state;

#[cfg(test)]
mod tests;

pub use resource::ResourceStats;
pub use state::ContextState;

use std::rc::Rc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, never, select, unbounded};
use tokio::sync::mpsc;

use self::binding::BindingWait;
use self::resource::ResourceRegistry;
use super::transformer::{CompilerLoader, TransformStats, TransformerActor, TransformerHandle};
use crate::config::SandboxConfig;
use crate::core::{ContentHash, SandboxError, SeqCursor, SubmissionSeq};
use crate::embed::runtime::REACT_SHIM_JS;
use crate::protocol::{
    ChannelHandshake, ContextMsg, Envelope, HostMsg, Origin, RenderOutcome, RenderResult,
    WorkerRequest, WorkerResponse,
};
use crate::render::{Document, Mount, panel};
use crate::runtime::Engine;
use crate::{debug, log};

/// Native stack of the context thread. Must exceed `context.max_stack_kb`.
const THREAD_STACK_BYTES: usize = 16 * 1024 * 1024;

/// Counters observable from outside the context thread.
#[derive(Debug, Clone, Default)]
pub struct ContextStats {
    pub transform: Arc<TransformStats>,
    pub resources: Arc<ResourceStats>,
}

/// The latest accepted submission.
#[derive(Debug, Clone, Copy)]
struct Submission {
    seq: SubmissionSeq,
    hash: ContentHash,
}

/// Context's link to its transformer worker.
struct WorkerLink {
    tx: Option<Sender<Envelope<WorkerRequest>>>,
    rx: Receiver<Envelope<WorkerResponse>>,
    origin: Origin,
    worker_origin: Option<Origin>,
    handle: Option<TransformerHandle>,
}

impl WorkerLink {
    fn connect(handle: TransformerHandle) -> Self {
        Self {
            tx: Some(handle.tx.clone()),
            rx: handle.rx.clone(),
            origin: handle.origin,
            worker_origin: Some(handle.worker_origin),
            handle: Some(handle),
        }
    }

    fn disconnected() -> Self {
        Self {
            tx: None,
            rx: never(),
            origin: Origin::fresh(),
            worker_origin: None,
            handle: None,
        }
    }

    fn shutdown(&mut self) {
        self.tx = None;
        self.rx = never();
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
        }
    }
}

/// Isolated rendering context. Owns its engine, document and worker.
pub struct ContextActor {
    config: Arc<SandboxConfig>,
    origin: Origin,
    rx: Receiver<Envelope<HostMsg>>,
    host_tx: mpsc::UnboundedSender<Envelope<ContextMsg>>,
    handshake: ChannelHandshake,
    worker: WorkerLink,
    resources: ResourceRegistry,
    seqs: SeqCursor,
    latest: Option<Submission>,
    state: ContextState,
    document: Document,
    // Must stay above `engine`: persistent handles drop before the runtime.
    mount: Option<Mount>,
    engine: Result<Rc<Engine>, SandboxError>,
    stopping: bool,
}

/// Host-side handle to a running context.
pub struct ContextHandle {
    pub origin: Origin,
    tx: Sender<Envelope<HostMsg>>,
    stats: ContextStats,
    thread: Option<JoinHandle<()>>,
}

impl ContextActor {
    /// Create a context on its own thread. Outbound messages go to `host_tx`.
    pub fn spawn(
        config: Arc<SandboxConfig>,
        loader: CompilerLoader,
        host_tx: mpsc::UnboundedSender<Envelope<ContextMsg>>,
    ) -> std::io::Result<ContextHandle> {
        let (tx, rx) = unbounded();
        let origin = Origin::fresh();
        let stats = ContextStats::default();
        let shared = stats.clone();

        let thread = std::thread::Builder::new()
            .name("sandbox-context".into())
            .stack_size(THREAD_STACK_BYTES)
            .spawn(move || Self::new(config, origin, rx, host_tx, loader, shared).run())?;

        Ok(ContextHandle {
            origin,
            tx,
            stats,
            thread: Some(thread),
        })
    }

    fn new(
        config: Arc<SandboxConfig>,
        origin: Origin,
        rx: Receiver<Envelope<HostMsg>>,
        host_tx: mpsc::UnboundedSender<Envelope<ContextMsg>>,
        loader: CompilerLoader,
        stats: ContextStats,
    ) -> Self {
        let worker = match TransformerActor::spawn(config.transform.clone(), loader, stats.transform) {
            Ok(handle) => WorkerLink::connect(handle),
            Err(e) => {
                log!("context"; "failed to spawn transformer worker: {}", e);
                WorkerLink::disconnected()
            }
        };

        let engine = Engine::new(&config.context).map(Rc::new);
        if let Err(e) = &engine {
            log!("context"; "engine unavailable: {}", e);
        }

        Self {
            document: Document::new(config.context.title.clone()),
            config,
            origin,
            rx,
            host_tx,
            handshake: ChannelHandshake::new(),
            worker,
            resources: ResourceRegistry::new(stats.resources),
            seqs: SeqCursor::new(),
            latest: None,
            state: ContextState::Uninitialized,
            mount: None,
            engine,
            stopping: false,
        }
    }

    fn run(mut self) {
        self.install_library();
        if self.wait_until_ready() {
            self.state = ContextState::AwaitingFirstSubmission;
            self.send_host(ContextMsg::InitComplete);
            self.serve();
        }
        self.shutdown();
    }

    /// Evaluate the rendering library. Failure surfaces later as a binding timeout.
    fn install_library(&self) {
        let Ok(engine) = &self.engine else {
            return;
        };

        let installed = match &self.config.context.library {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| SandboxError::Load(format!("{}: {e}", path.display())))
                .and_then(|source| engine.eval_script(&path.display().to_string(), &source)),
            None => engine.eval_script("react-shim.js", REACT_SHIM_JS),
        };
        if let Err(e) = installed {
            log!("context"; "rendering library not installed: {}", e);
        }
    }

    /// Sit out the ready delay. Returns `false` if shut down meanwhile.
    ///
    /// Submissions arriving before readiness are dropped, and their origin
    /// is not recorded: the peer is fixed by the first message after
    /// `INIT_COMPLETE`.
    fn wait_until_ready(&mut self) -> bool {
        let ready_at = Instant::now() + self.config.context.ready_delay();
        loop {
            let remaining = ready_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(envelope) if envelope.message == HostMsg::Shutdown => return false,
                Ok(envelope) => {
                    debug!("context"; "dropped message from {} received before ready", envelope.origin);
                }
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn serve(&mut self) {
        while !self.stopping {
            let inbox = self.rx.clone();
            let replies = self.worker.rx.clone();
            select! {
                recv(inbox) -> msg => match msg {
                    Ok(envelope) => self.on_host(envelope),
                    Err(_) => self.stopping = true,
                },
                recv(replies) -> msg => match msg {
                    Ok(envelope) => self.on_worker(envelope),
                    Err(_) => self.on_worker_lost(),
                },
            }
        }
    }

    fn shutdown(&mut self) {
        self.mount = None;
        self.worker.shutdown();
        let resources = self.resources.stats();
        debug!("context"; "stopped: {} resources created, {} live", resources.created(), resources.live());
    }

    // ========================================================================
    // inbound
    // ========================================================================

    fn on_host(&mut self, envelope: Envelope<HostMsg>) {
        if !self.handshake.accept(envelope.origin) {
            if let Some(peer) = self.handshake.remote_origin() {
                log!("context"; "ignored message from {}, peer is {}", envelope.origin, peer);
            }
            return;
        }

        match envelope.message {
            HostMsg::UpdateComponent { code } => self.submit(code),
            HostMsg::Shutdown => self.stopping = true,
        }
    }

    fn submit(&mut self, code: String) {
        let seq = self.seqs.advance();
        self.latest = Some(Submission {
            seq,
            hash: ContentHash::of(&code),
        });
        debug!("context"; "{} -> {} ({} bytes)", self.state, ContextState::Processing, code.len());
        self.state = ContextState::Processing;

        let request = Envelope::new(self.worker.origin, WorkerRequest::TransformCode { code, seq });
        let sent = self
            .worker
            .tx
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok());
        if !sent {
            let err = SandboxError::ChannelUnavailable("transformer worker");
            log!("context"; "{}", err);
            self.fail(err);
        }
    }

    fn on_worker(&mut self, envelope: Envelope<WorkerResponse>) {
        if Some(envelope.origin) != self.worker.worker_origin {
            log!("context"; "ignored worker reply from unexpected {}", envelope.origin);
            return;
        }

        let seq = envelope.message.seq();
        if self.seqs.is_stale(seq) {
            debug!("context"; "discarded stale transform {}", seq);
            return;
        }

        match envelope.message {
            WorkerResponse::TransformError { error, .. } => self.fail(SandboxError::Compile(error)),
            WorkerResponse::TransformSuccess {
                transformed_code, ..
            } => self.load_and_mount(seq, transformed_code),
        }
    }

    fn on_worker_lost(&mut self) {
        log!("context"; "{}", SandboxError::ChannelUnavailable("transformer worker"));
        self.worker.tx = None;
        self.worker.rx = never();
        if self.state == ContextState::Processing {
            self.fail(SandboxError::ChannelUnavailable("transformer worker"));
        }
    }

    // ========================================================================
    // pipeline
    // ========================================================================

    fn load_and_mount(&mut self, seq: SubmissionSeq, module_text: String) {
        let engine = match &self.engine {
            Ok(engine) => Rc::clone(engine),
            Err(e) => {
                let e = e.clone();
                self.fail(e);
                return;
            }
        };

        let resource = self.resources.create(module_text);
        debug!("context"; "{} importing {}", seq, resource.url());

        match self.await_bindings(&engine, seq) {
            BindingWait::Ready => {}
            BindingWait::Superseded => {
                debug!("context"; "{} superseded while waiting for bindings", seq);
                return;
            }
            BindingWait::Shutdown => return,
            BindingWait::TimedOut => {
                // released before the outcome is reported
                drop(resource);
                self.fail(SandboxError::BindingTimeout {
                    timeout_ms: self.config.context.binding_timeout_ms,
                });
                return;
            }
        }

        let imported = loader::import(&engine, &resource, self.config.context.render_timeout());
        drop(resource);

        let component = match imported {
            Ok(component) => component,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        // Replace the previous instance wholesale before rendering the new one.
        self.mount = None;
        let mut mount = Mount::new(seq, component, self.config.context.suspense_retries);
        let (body, outcome) = mount.render(&engine, self.config.context.render_timeout());
        self.mount = Some(mount);
        self.document.set_body(body);
        self.settle(outcome);
    }

    /// End the latest submission with an error panel.
    fn fail(&mut self, err: SandboxError) {
        debug!("context"; "submission failed: {}", err);
        self.mount = None;
        self.document.set_body(panel::error_panel(&err));
        self.settle(RenderOutcome::from(&err));
    }

    fn settle(&mut self, outcome: RenderOutcome) {
        self.state = ContextState::settled(&outcome);
        let Some(latest) = self.latest else {
            return;
        };
        debug!("context"; "{} settled: {}", latest.seq, self.state);
        self.send_host(ContextMsg::RenderResult(RenderResult {
            source_hash: latest.hash,
            outcome,
            document: self.document.to_html(),
        }));
    }

    fn send_host(&self, message: ContextMsg) {
        if self.host_tx.send(Envelope::new(self.origin, message)).is_err() {
            log!("context"; "{}", SandboxError::ChannelUnavailable("host bridge"));
        }
    }
}

impl ContextHandle {
    /// Deliver a message from `from`.
    pub fn send(&self, from: Origin, message: HostMsg) -> Result<(), SandboxError> {
        self.tx
            .send(Envelope::new(from, message))
            .map_err(|_| SandboxError::ChannelUnavailable("rendering context"))
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    /// Wait for the context thread to exit.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log!("context"; "context thread panicked");
        }
    }
}
