use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

/// Forward Ctrl-C to the driver loop, which stops after the run in progress.
/// A second Ctrl-C exits at once.
pub fn install() -> Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        let _ = tx.send(());
    })
    .context("installing interrupt handler")?;
    Ok(rx)
}
