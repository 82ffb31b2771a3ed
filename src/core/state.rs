//! Process-wide shutdown state.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for long-running commands
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Returns a receiver that fires once per Ctrl+C. Commands that never look
/// at it simply exit when the handler finds nobody listening.
pub fn setup_shutdown_handler() -> anyhow::Result<crossbeam::channel::Receiver<()>> {
    let (tx, rx) = crossbeam::channel::bounded(1);
    let _ = SHUTDOWN_TX.set(tx);

    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            // Second Ctrl+C: stop waiting for graceful shutdown
            std::process::exit(130);
        }
        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.try_send(());
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    Ok(rx)
}
