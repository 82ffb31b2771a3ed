//! Transformer Worker - JSX/TSX to loadable ES module text
//!
//! Runs on its own thread and shares nothing with the context that owns it:
//!
//! ```text
//! Context --TRANSFORM_CODE--> Transformer --TRANSFORM_SUCCESS/ERROR--> Context
//!                                 |
//!                          cache (by hash) -> oxc compile -> rewrites
//! ```
//!
//! Exactly one response per request. The compiler is loaded on the first
//! cache miss; a failed load is permanent for the worker's lifetime.

mod cache;
mod compile;
mod rewrite;

#[cfg(test)]
mod tests;

pub use cache::TransformStats;
pub use compile::{Compile, CompilerLoader, oxc_loader};

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender, unbounded};

use self::cache::ModuleCache;
use self::compile::compile_guarded;
use self::rewrite::Rewriter;
use crate::config::TransformConfig;
use crate::core::ContentHash;
use crate::protocol::{ChannelHandshake, Envelope, Origin, WorkerRequest, WorkerResponse};
use crate::{debug, log};

/// Lazily loaded compiler.
enum CompilerSlot {
    Unloaded(CompilerLoader),
    Ready(Box<dyn Compile>),
    Failed(String),
    /// Transient state while the loader runs.
    Loading,
}

impl CompilerSlot {
    fn ensure(&mut self, config: &TransformConfig) -> Result<&dyn Compile, String> {
        if let Self::Unloaded(_) = self
            && let Self::Unloaded(loader) = std::mem::replace(self, Self::Loading)
        {
            *self = match loader(config) {
                Ok(compiler) => {
                    debug!("worker"; "compiler loaded");
                    Self::Ready(compiler)
                }
                Err(reason) => {
                    log!("worker"; "compiler failed to load: {}", reason);
                    Self::Failed(format!("compiler unavailable: {reason}"))
                }
            };
        }

        match self {
            Self::Ready(compiler) => Ok(&**compiler),
            Self::Failed(error) => Err(error.clone()),
            Self::Unloaded(_) | Self::Loading => Err("compiler unavailable: not loaded".to_owned()),
        }
    }
}

pub struct TransformerActor {
    origin: Origin,
    rx: Receiver<Envelope<WorkerRequest>>,
    tx: Sender<Envelope<WorkerResponse>>,
    handshake: ChannelHandshake,
    compiler: CompilerSlot,
    rewriter: Rewriter,
    cache: ModuleCache,
    stats: Arc<TransformStats>,
    config: TransformConfig,
}

/// The context's side of its worker.
pub struct TransformerHandle {
    /// Origin the context sends from.
    pub origin: Origin,
    /// Origin the worker replies from.
    pub worker_origin: Origin,
    pub tx: Sender<Envelope<WorkerRequest>>,
    pub rx: Receiver<Envelope<WorkerResponse>>,
    pub stats: Arc<TransformStats>,
    thread: Option<JoinHandle<()>>,
}

impl TransformerActor {
    /// Spawn a worker thread reporting into `stats`.
    pub fn spawn(
        config: TransformConfig,
        loader: CompilerLoader,
        stats: Arc<TransformStats>,
    ) -> std::io::Result<TransformerHandle> {
        let (req_tx, req_rx) = unbounded();
        let (resp_tx, resp_rx) = unbounded();
        let worker_origin = Origin::fresh();

        let actor = Self {
            origin: worker_origin,
            rx: req_rx,
            tx: resp_tx,
            handshake: ChannelHandshake::new(),
            compiler: CompilerSlot::Unloaded(loader),
            rewriter: Rewriter::new(&config),
            cache: ModuleCache::new(&config),
            stats: Arc::clone(&stats),
            config,
        };

        let thread = std::thread::Builder::new()
            .name("sandbox-transformer".into())
            .spawn(move || actor.run())?;

        Ok(TransformerHandle {
            origin: Origin::fresh(),
            worker_origin,
            tx: req_tx,
            rx: resp_rx,
            stats,
            thread: Some(thread),
        })
    }

    fn run(mut self) {
        while let Ok(envelope) = self.rx.recv() {
            if !self.handshake.accept(envelope.origin) {
                log!("worker"; "rejected request from {}", envelope.origin);
                continue;
            }

            let response = self.handle(envelope.message);
            if self.tx.send(Envelope::new(self.origin, response)).is_err() {
                break;
            }
        }
        debug!("worker"; "exiting: {}", self.stats.snapshot());
    }

    fn handle(&mut self, request: WorkerRequest) -> WorkerResponse {
        let WorkerRequest::TransformCode { code, seq } = request;

        match self.transform(&code) {
            Ok(module) => WorkerResponse::TransformSuccess {
                transformed_code: module.to_string(),
                seq,
            },
            Err(error) => {
                self.stats.failed();
                debug!("worker"; "transform {} failed: {}", seq, error);
                WorkerResponse::TransformError { error, seq }
            }
        }
    }

    fn transform(&mut self, code: &str) -> Result<Arc<str>, String> {
        let key = ContentHash::of(code);
        if let Some(module) = self.cache.get(&key) {
            self.stats.hit();
            debug!("worker"; "cache hit {}", key);
            return Ok(module);
        }
        self.stats.miss();

        let compiler = self.compiler.ensure(&self.config)?;
        let compiled = compile_guarded(compiler, code)?;
        self.stats.compiled();

        let module: Arc<str> = Arc::from(self.rewriter.apply(&compiled)?);
        self.cache.insert(key, Arc::clone(&module));
        self.stats.set_entries(self.cache.entry_count());
        Ok(module)
    }
}

impl TransformerHandle {
    /// Close the request channel and wait for the worker to exit.
    pub fn shutdown(self) {
        let Self { tx, thread, .. } = self;
        drop(tx);
        if let Some(thread) = thread
            && thread.join().is_err()
        {
            log!("worker"; "transformer thread panicked");
        }
    }
}
