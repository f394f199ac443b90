//! Batch pass over dated folders (`<root>/2024-01-02/...`): every routed CSV
//! gets its artifact written next to it, then the daily index is rebuilt.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::persist::index;
use crate::run::{Driver, Tally};

/// Entry point for the `backfill` command.
pub fn run(mut config: AppConfig, root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.input_dir.clone());
    // Historical output is never announced.
    config.webhook = None;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    let tally = rt.block_on(backfill(Driver::new(config)?, &root))?;

    info!(
        generated = tally.written,
        skipped = tally.skipped,
        empty = tally.empty,
        failed = tally.failed,
        "backfill complete"
    );
    Ok(())
}

/// Entry point for the `index` command.
pub fn run_index(config: &AppConfig, root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.input_dir.clone());
    let path = index::write_index(&root, &config.pipeline.index_columns())
        .with_context(|| format!("writing index under {}", root.display()))?;
    info!(index = %path.display(), "index rebuilt");
    Ok(())
}

pub async fn backfill(driver: Driver, root: &Path) -> Result<Tally> {
    let folders = index::date_folders(root)
        .with_context(|| format!("listing date folders under {}", root.display()))?;

    let mut work: Vec<(PathBuf, PathBuf)> = Vec::new();
    for folder in &folders {
        let dir = root.join(folder);
        match driver.matching_files(&dir) {
            Ok(files) => work.extend(files.into_iter().map(|f| (f, dir.clone()))),
            Err(e) => warn!(folder = %dir.display(), "skipping folder: {e:#}"),
        }
    }
    info!(folders = folders.len(), files = work.len(), "backfilling");

    let pb = indicatif::ProgressBar::new(work.len() as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("  Backfill [{bar:40}] {pos}/{len} ({eta})")
            .context("progress bar template")?,
    );

    let mut tally = Tally::default();
    for (source, dir) in &work {
        tally.record(driver.process_into(source, dir).await.as_ref());
        pb.inc(1);
    }
    pb.finish_and_clear();

    let path = index::write_index(root, &driver.config().pipeline.index_columns())
        .with_context(|| format!("writing index under {}", root.display()))?;
    info!(index = %path.display(), "index rebuilt");

    Ok(tally)
}
