pub mod animation;
pub mod html;
pub mod image;
pub mod index;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// What to do when the target artifact already exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Build once: an existing artifact is left untouched.
    #[value(alias = "skip_existing")]
    SkipExisting,
    /// Live refresh: always rewrite the artifact.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// `{output_dir}/{stem}.{extension}` for a source file.
pub fn target_path(source: &Path, output_dir: &Path, extension: &str) -> Result<PathBuf, PersistError> {
    let stem = file_stem(source)?;
    Ok(output_dir.join(format!("{stem}.{extension}")))
}

/// `{output_dir}/{stem}_{YYYYMMDD_HHMMSS}.{extension}` for archive naming.
pub fn timestamped_path(
    source: &Path,
    output_dir: &Path,
    extension: &str,
    at: NaiveDateTime,
) -> Result<PathBuf, PersistError> {
    let stem = file_stem(source)?;
    Ok(output_dir.join(format!("{stem}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))))
}

pub fn file_stem(source: &Path) -> Result<&str, PersistError> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PersistError::NoStem {
            path: source.to_path_buf(),
        })
}

/// Whether `policy` lets a run produce `target`.
pub fn should_write(target: &Path, policy: WritePolicy) -> bool {
    policy == WritePolicy::Overwrite || !target.exists()
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
/// Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |source: std::io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| PersistError::Rename {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Apply the write policy, then write atomically.
pub fn persist(path: &Path, bytes: &[u8], policy: WritePolicy) -> Result<PersistOutcome, PersistError> {
    if !should_write(path, policy) {
        return Ok(PersistOutcome::Skipped(path.to_path_buf()));
    }
    write_atomic(path, bytes)?;
    Ok(PersistOutcome::Written(path.to_path_buf()))
}
