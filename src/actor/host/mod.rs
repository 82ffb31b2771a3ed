//! Host Bridge - owns a rendering context on behalf of the host
//!
//! ```text
//! submit(code) --> HostActor --UPDATE_COMPONENT--> Context
//!                     ^                               |
//!   watch<HostStatus> +--INIT_COMPLETE / RENDER_RESULT+
//! ```
//!
//! Until the context announces `INIT_COMPLETE` only the latest submission
//! is kept; it is forwarded the moment the context becomes ready.

mod status;


pub use status::{HostPhase, HostStatus};

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::context::{ContextActor, ContextHandle, ContextStats};
use super::transformer::{CompilerLoader, oxc_loader};
use crate::config::SandboxConfig;
use crate::core::{ContentHash, SandboxError};
use crate::protocol::{ContextMsg, Envelope, HostMsg, Origin, RenderResult};
use crate::{debug, log};

enum BridgeCmd {
    Submit(String),
    Dispose(oneshot::Sender<()>),
}

/// The last code handed to the context.
struct Forwarded {
    code: String,
    hash: ContentHash,
}

/// Public face of the bridge. Must be created inside a tokio runtime.
pub struct HostBridge {
    commands: mpsc::UnboundedSender<BridgeCmd>,
    status: watch::Receiver<HostStatus>,
    stats: ContextStats,
    task: Option<JoinHandle<()>>,
}

impl HostBridge {
    /// Spawn a context compiling with oxc.
    pub fn spawn(config: Arc<SandboxConfig>) -> std::io::Result<Self> {
        Self::spawn_with(config, oxc_loader())
    }

    pub fn spawn_with(config: Arc<SandboxConfig>, loader: CompilerLoader) -> std::io::Result<Self> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let context = ContextActor::spawn(config, loader, inbound_tx)?;
        let stats = context.stats().clone();

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(HostStatus::default());

        let actor = HostActor {
            origin: Origin::fresh(),
            context: Some(context),
            inbound: Some(inbound_rx),
            commands: commands_rx,
            status: status_tx,
            ready: false,
            queued: None,
            forwarded: None,
        };
        let task = tokio::spawn(actor.run());

        Ok(Self {
            commands,
            status,
            stats,
            task: Some(task),
        })
    }

    /// Hand `code` to the context. Returns immediately.
    pub fn submit(&self, code: impl Into<String>) {
        if self.commands.send(BridgeCmd::Submit(code.into())).is_err() {
            log!("host"; "{}", SandboxError::ChannelUnavailable("host bridge"));
        }
    }

    /// Subscribe to status changes.
    pub fn status(&self) -> watch::Receiver<HostStatus> {
        self.status.clone()
    }

    /// Wait until the submission of `code` has settled.
    ///
    /// Never returns if `code` is superseded before the bridge is disposed.
    pub async fn settled(&self, code: &str) -> HostStatus {
        let hash = ContentHash::of(code);
        let mut status = self.status();
        match status
            .wait_for(|s| s.phase.is_settled() && s.source == Some(hash))
            .await
        {
            Ok(current) => (*current).clone(),
            Err(_) => (*self.status.borrow()).clone(),
        }
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    /// Detach from the context, stop it and wait for its thread.
    pub async fn dispose(mut self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(BridgeCmd::Dispose(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        if let Some(task) = self.task.take()
            && task.await.is_err()
        {
            log!("host"; "bridge task panicked");
        }
    }
}

struct HostActor {
    origin: Origin,
    context: Option<ContextHandle>,
    inbound: Option<mpsc::UnboundedReceiver<Envelope<ContextMsg>>>,
    commands: mpsc::UnboundedReceiver<BridgeCmd>,
    status: watch::Sender<HostStatus>,
    ready: bool,
    /// Latest code submitted before the context became ready.
    queued: Option<String>,
    forwarded: Option<Forwarded>,
}

impl HostActor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(BridgeCmd::Submit(code)) => self.submit(code),
                    Some(BridgeCmd::Dispose(done)) => {
                        self.dispose().await;
                        let _ = done.send(());
                        return;
                    }
                    None => {
                        self.dispose().await;
                        return;
                    }
                },
                envelope = recv_inbound(&mut self.inbound) => match envelope {
                    Some(envelope) => self.on_context(envelope),
                    None => {
                        log!("host"; "{}", SandboxError::ChannelUnavailable("rendering context"));
                        self.inbound = None;
                    }
                },
            }
        }
    }

    fn submit(&mut self, code: String) {
        if !self.ready {
            debug!("host"; "context not ready, queued {} bytes", code.len());
            self.queued = Some(code);
            self.status.send_modify(HostStatus::loading);
            return;
        }
        if self.forwarded.as_ref().is_some_and(|f| f.code == code) {
            debug!("host"; "identical submission ignored");
            return;
        }
        self.forward(code);
    }

    fn forward(&mut self, code: String) {
        let Some(context) = &self.context else {
            log!("host"; "{}", SandboxError::ChannelUnavailable("rendering context"));
            return;
        };

        let hash = ContentHash::of(&code);
        let message = HostMsg::UpdateComponent { code: code.clone() };
        if let Err(e) = context.send(self.origin, message) {
            log!("host"; "{}", e);
            return;
        }
        debug!("host"; "forwarded {}", hash);
        self.forwarded = Some(Forwarded { code, hash });
        self.status.send_modify(HostStatus::loading);
    }

    fn on_context(&mut self, envelope: Envelope<ContextMsg>) {
        let expected = self.context.as_ref().map(|c| c.origin);
        if Some(envelope.origin) != expected {
            log!("host"; "ignored message from unexpected {}", envelope.origin);
            return;
        }

        match envelope.message {
            ContextMsg::InitComplete => self.on_ready(),
            ContextMsg::RenderResult(result) => self.on_result(result),
        }
    }

    fn on_ready(&mut self) {
        if self.ready {
            debug!("host"; "duplicate INIT_COMPLETE ignored");
            return;
        }
        self.ready = true;
        self.status.send_modify(|s| s.context_ready = true);
        if let Some(code) = self.queued.take() {
            self.forward(code);
        }
    }

    fn on_result(&mut self, result: RenderResult) {
        if self.forwarded.as_ref().map(|f| f.hash) != Some(result.source_hash) {
            debug!("host"; "dropped outcome of superseded {}", result.source_hash);
            return;
        }
        debug!("host"; "{}", result.outcome.label());
        self.status
            .send_modify(|s| s.settle(result.source_hash, result.outcome, result.document));
    }

    async fn dispose(&mut self) {
        self.inbound = None;
        let Some(mut context) = self.context.take() else {
            return;
        };
        if let Err(e) = context.send(self.origin, HostMsg::Shutdown) {
            log!("host"; "{}", e);
        }
        if tokio::task::spawn_blocking(move || context.join()).await.is_err() {
            log!("host"; "failed to join rendering context");
        }
        debug!("host"; "disposed");
    }
}

/// Next inbound message, or pending forever once detached.
async fn recv_inbound(
    inbound: &mut Option<mpsc::UnboundedReceiver<Envelope<ContextMsg>>>,
) -> Option<Envelope<ContextMsg>> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
