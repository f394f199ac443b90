//! Drivers that invoke the pipeline repeatedly: a directory watcher and a
//! fixed-interval poller. Both run on one thread, one file at a time.

pub mod poll;
pub mod shutdown;
pub mod watcher;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::pipeline::{Artifact, RunOutcome};
use crate::publish::{self, Webhook};

pub use poll::poll;

/// Counts of run outcomes over a batch or poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub written: usize,
    pub skipped: usize,
    pub empty: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Option<&RunOutcome>) {
        match outcome {
            Some(RunOutcome::Written(_)) => self.written += 1,
            Some(RunOutcome::Skipped(_)) => self.skipped += 1,
            Some(RunOutcome::Empty) => self.empty += 1,
            Some(RunOutcome::Unrouted) => {}
            None => self.failed += 1,
        }
    }
}

pub struct Driver {
    config: AppConfig,
    webhook: Option<Webhook>,
}

impl Driver {
    pub fn new(config: AppConfig) -> Result<Self> {
        let webhook = match &config.webhook {
            Some(w) => Some(Webhook::new(w.url.clone(), w.timeout).context("creating webhook client")?),
            None => None,
        };
        Ok(Driver { config, webhook })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the pipeline for one file into the configured output directory.
    pub async fn process_path(&self, source: &Path) -> Option<RunOutcome> {
        self.process_into(source, &self.config.output_dir).await
    }

    /// The containment boundary: every pipeline error stops here, is logged
    /// with its cause chain, and is reported as `None`.
    pub async fn process_into(&self, source: &Path, output_dir: &Path) -> Option<RunOutcome> {
        let outcome = match self.config.pipeline.run_file(source, output_dir) {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = anyhow::Error::new(e);
                error!(path = %source.display(), "pipeline run failed: {err:#}");
                return None;
            }
        };

        match &outcome {
            RunOutcome::Written(artifact) => {
                info!(source = %source.display(), artifact = %artifact.path.display(), "chart written");
                self.publish(artifact).await;
            }
            RunOutcome::Skipped(target) => {
                debug!(target = %target.display(), "artifact exists, skipped");
            }
            RunOutcome::Empty => {
                warn!(path = %source.display(), "no rows left after filtering, nothing written");
            }
            RunOutcome::Unrouted => {
                debug!(path = %source.display(), "no route for file");
            }
        }
        Some(outcome)
    }

    /// Post raster artifacts to the webhook. Failures are logged only.
    async fn publish(&self, artifact: &Artifact) {
        let Some(webhook) = &self.webhook else {
            return;
        };
        if !artifact.format.is_raster() {
            return;
        }
        let content = publish::message(&artifact.asset, Local::now().naive_local());
        match webhook.post_image(&artifact.path, &content).await {
            Ok(()) => info!(artifact = %artifact.path.display(), "posted to webhook"),
            Err(e) => {
                let err = anyhow::Error::new(e);
                error!(artifact = %artifact.path.display(), "webhook post failed: {err:#}");
            }
        }
    }

    /// Files in `dir` that some route accepts, sorted by name.
    pub fn matching_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            let routed = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.config.pipeline.matches(n));
            if routed && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every matching file in the input directory once.
    pub async fn run_cycle(&self) -> Result<Tally> {
        let mut tally = Tally::default();
        for path in self.matching_files(&self.config.input_dir)? {
            tally.record(self.process_path(&path).await.as_ref());
        }
        Ok(tally)
    }
}

// ── Event-driven driver ──────────────────────────────────────────────

/// Entry point for the `watch` command.
pub fn watch(config: AppConfig) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    rt.block_on(watch_async(config))
}

async fn watch_async(config: AppConfig) -> Result<()> {
    let driver = Driver::new(config)?;
    let input_dir = driver.config().input_dir.clone();
    let debounce = driver.config().debounce;

    let mut interrupts = shutdown::install()?;
    let (_watcher, mut file_rx) = watcher::watch_dir(&input_dir)?;
    info!(
        input = %input_dir.display(),
        output = %driver.config().output_dir.display(),
        policy = ?driver.config().pipeline.policy,
        "watching for CSV files"
    );

    if driver.config().initial_scan {
        let tally = driver.run_cycle().await?;
        info!(?tally, "initial scan complete");
    }

    loop {
        tokio::select! {
            _ = interrupts.recv() => {
                info!("interrupt received, stopping watcher");
                break;
            }
            Some(first) = file_rx.recv() => {
                // Debounce: collect queued events, let writes settle, collect again.
                let mut pending = BTreeSet::from([first]);
                while let Ok(path) = file_rx.try_recv() {
                    pending.insert(path);
                }
                tokio::time::sleep(debounce).await;
                while let Ok(path) = file_rx.try_recv() {
                    pending.insert(path);
                }

                for path in pending {
                    let routed = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| driver.config().pipeline.matches(n));
                    if routed && path.is_file() {
                        driver.process_path(&path).await;
                    }
                }
            }
            else => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_outcome() {
        let mut t = Tally::default();
        t.record(Some(&RunOutcome::Empty));
        t.record(Some(&RunOutcome::Skipped(PathBuf::from("a"))));
        t.record(Some(&RunOutcome::Unrouted));
        t.record(None);
        assert_eq!(
            t,
            Tally {
                written: 0,
                skipped: 1,
                empty: 1,
                failed: 1
            }
        );
    }
}
