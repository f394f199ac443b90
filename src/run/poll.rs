use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::{Driver, shutdown};
use crate::config::AppConfig;

/// Entry point for the `poll` command: process every matching file, wait
/// the configured interval, repeat. `once` stops after the first cycle.
pub fn poll(config: AppConfig, once: bool) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    rt.block_on(poll_async(config, once))
}

async fn poll_async(config: AppConfig, once: bool) -> Result<()> {
    let driver = Driver::new(config)?;
    let mut interrupts = shutdown::install()?;

    let mut ticker = tokio::time::interval(driver.config().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        input = %driver.config().input_dir.display(),
        every_secs = driver.config().poll_interval.as_secs(),
        "polling for CSV files"
    );

    loop {
        tokio::select! {
            _ = interrupts.recv() => {
                info!("interrupt received, stopping poller");
                break;
            }
            _ = ticker.tick() => {
                // A missing or unreadable input directory fails the cycle, not the loop.
                match driver.run_cycle().await {
                    Ok(tally) => info!(?tally, "cycle complete"),
                    Err(e) => error!("cycle failed: {e:#}"),
                }
                if once {
                    break;
                }
            }
        }
    }

    Ok(())
}
