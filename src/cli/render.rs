//! `render` command: compile a snippet and render it once.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::OutputArgs;
use super::common::{display_name, read_source, write_document};
use crate::actor::HostBridge;
use crate::config::SandboxConfig;
use crate::{debug, log};

/// Render `file` and write the document, error panel included.
///
/// Fails after writing when the outcome is not a success.
pub async fn render_once(config: Arc<SandboxConfig>, file: &Path, output: &OutputArgs) -> Result<()> {
    let code = read_source(file)?;
    let name = display_name(file);

    let bridge = HostBridge::spawn(config).context("failed to start rendering context")?;
    bridge.submit(code.as_str());
    let status = bridge.settled(&code).await;
    let stats = bridge.stats().clone();
    bridge.dispose().await;
    debug!("render"; "{}", stats.transform.snapshot());

    let document = status.document.unwrap_or_default();
    write_document(output.output.as_deref(), &document)?;

    match status.outcome {
        Some(outcome) if outcome.is_success() => {
            if let Some(path) = &output.output {
                log!("render"; "{} -> {}", name, path.display());
            }
            Ok(())
        }
        Some(outcome) => bail!("{}: {}", outcome.label(), outcome.message().unwrap_or_default()),
        None => bail!("{name} was not rendered"),
    }
}
