//! `watch` command: re-render a snippet whenever it changes.
//!
//! ```text
//! FsActor --WatchEvent--> watch loop --submit--> HostBridge
//!                              |  config changed: dispose + respawn
//!                              v
//!                        status block + output document
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::common::{display_name, read_source, write_document};
use super::{Cli, OutputArgs};
use crate::actor::fs::{FsActor, WatchEvent};
use crate::actor::{HostBridge, HostPhase, HostStatus};
use crate::config::{SandboxConfig, cfg, reload_config};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::{debug, log};

const WATCH_BUFFER: usize = 16;

struct WatchSession<'a> {
    cli: &'a Cli,
    file: PathBuf,
    name: String,
    output: Option<PathBuf>,
    bridge: HostBridge,
    /// Last code submitted, resubmitted after a bridge respawn.
    code: Option<String>,
}

/// Watch `file` until Ctrl+C.
pub async fn watch(cli: &Cli, file: &Path, output: &OutputArgs, shutdown: Receiver<()>) -> Result<()> {
    let config = cfg();
    let (tx, mut events) = mpsc::channel(WATCH_BUFFER);
    let tracked_config = config.config_path.exists().then_some(config.config_path.as_path());
    let fs_actor = FsActor::new(file, tracked_config, tx)
        .with_context(|| format!("failed to watch {}", file.display()))?;
    let watcher = tokio::spawn(fs_actor.run());

    let mut session = WatchSession {
        cli,
        file: file.to_path_buf(),
        name: display_name(file),
        output: output.output.clone(),
        bridge: spawn_bridge(config)?,
        code: None,
    };
    log!("watch"; "watching {}", session.file.display());

    let mut stop = tokio::task::spawn_blocking(move || {
        let _ = shutdown.recv();
    });

    session.source_changed().await;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = events.recv() => match event {
                Some(WatchEvent::SourceChanged) => session.source_changed().await,
                Some(WatchEvent::SourceRemoved) => {
                    status_error(&format!("{} was removed", session.name), "waiting for it to come back");
                }
                Some(WatchEvent::ConfigChanged) => session.config_changed().await?,
                None => break,
            },
        }
    }

    watcher.abort();
    session.bridge.dispose().await;
    debug!("watch"; "stopped");
    Ok(())
}

fn spawn_bridge(config: Arc<SandboxConfig>) -> Result<HostBridge> {
    HostBridge::spawn(config).context("failed to start rendering context")
}

impl WatchSession<'_> {
    async fn source_changed(&mut self) {
        let code = match read_source(&self.file) {
            Ok(code) => code,
            Err(e) => {
                status_error(&format!("cannot read {}", self.name), &format!("{e:#}"));
                return;
            }
        };
        if self.code.as_deref() == Some(code.as_str()) {
            status_unchanged(&format!("{} unchanged", self.name));
            return;
        }

        self.bridge.submit(code.as_str());
        let status = self.bridge.settled(&code).await;
        self.code = Some(code);
        self.report(&status);
    }

    async fn config_changed(&mut self) -> Result<()> {
        match reload_config(self.cli) {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => {
                status_error("config reload failed", &format!("{e:#}"));
                return Ok(());
            }
        }

        log!("watch"; "config changed, restarting rendering context");
        let fresh = spawn_bridge(cfg())?;
        let stale = std::mem::replace(&mut self.bridge, fresh);
        stale.dispose().await;

        // force a resubmit into the new context
        self.code = None;
        self.source_changed().await;
        Ok(())
    }

    fn report(&self, status: &HostStatus) {
        if let Some(document) = &status.document
            && let Err(e) = self.write(document)
        {
            status_error("failed to write document", &format!("{e:#}"));
            return;
        }

        match status.phase {
            HostPhase::Ready => status_success(&format!("rendered {}", self.name)),
            HostPhase::Error => {
                let label = status.outcome.as_ref().map_or("error", |o| o.label());
                status_error(
                    &format!("{}: {}", self.name, label),
                    status.error.as_deref().unwrap_or_default(),
                );
            }
            HostPhase::Idle | HostPhase::Loading => {}
        }
    }

    fn write(&self, document: &str) -> Result<()> {
        match &self.output {
            Some(path) => write_document(Some(path), document),
            // stdout would interleave with the status block
            None => Ok(()),
        }
    }
}
