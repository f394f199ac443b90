//! `animate` command: fold one day's timestamped volume images into a GIF.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::persist::animation;

/// Entry point for the `animate` command. `date` is `YYYYMMDD`, today if omitted.
pub fn run(config: &AppConfig, dir: Option<PathBuf>, date: Option<String>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.output_dir.clone());
    let date = match date {
        Some(d) => {
            NaiveDate::parse_from_str(&d, "%Y%m%d")
                .with_context(|| format!("date `{d}` is not YYYYMMDD"))?;
            d
        }
        None => Local::now().format("%Y%m%d").to_string(),
    };
    if !config.pipeline.volume.timestamped {
        warn!("volume.timestamped is off; only images named with a timestamp become frames");
    }

    match animation::write_daily(&dir, &date)
        .with_context(|| format!("building animation for {date} in {}", dir.display()))?
    {
        Some((path, frames)) => info!(gif = %path.display(), frames, "animation written"),
        None => warn!(dir = %dir.display(), date, "no images for that day, nothing written"),
    }
    Ok(())
}
