//! Daily GIF built from the timestamped volume images of one day.

use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::error::PersistError;

use super::write_atomic;

/// Display time of each frame.
pub const FRAME_DELAY_MS: u32 = 300;

/// `output_{date}.gif` in `dir`.
pub fn animation_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("output_{date}.gif"))
}

/// PNG files in `dir` whose name carries `date` (`YYYYMMDD`), sorted by name.
pub fn daily_frames(dir: &Path, date: &str) -> Result<Vec<PathBuf>, PersistError> {
    let io_err = |source: std::io::Error| PersistError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.contains(date) && name.to_ascii_lowercase().ends_with(".png") && path.is_file() {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Encode `frames` as a looping GIF. `target` is only used in errors.
pub fn encode(frames: &[PathBuf], target: &Path) -> Result<Vec<u8>, PersistError> {
    let mut decoded = Vec::with_capacity(frames.len());
    for path in frames {
        let encode_err = |source: image::ImageError| PersistError::Encode {
            path: path.clone(),
            source,
        };
        let rgba = image::open(path).map_err(encode_err)?.to_rgba8();
        decoded.push(Frame::from_parts(
            rgba,
            0,
            0,
            Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1),
        ));
    }

    let gif_err = |source: image::ImageError| PersistError::Encode {
        path: target.to_path_buf(),
        source,
    };
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite).map_err(gif_err)?;
        encoder.encode_frames(decoded).map_err(gif_err)?;
    }
    Ok(bytes)
}

/// Build and write the day's animation. `None` when there are no frames.
pub fn write_daily(dir: &Path, date: &str) -> Result<Option<(PathBuf, usize)>, PersistError> {
    let frames = daily_frames(dir, date)?;
    if frames.is_empty() {
        return Ok(None);
    }
    let path = animation_path(dir, date);
    let bytes = encode(&frames, &path)?;
    write_atomic(&path, &bytes)?;
    Ok(Some((path, frames.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_match_date_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "spx_vol_20240102_101500.png",
            "spx_vol_20240102_100000.png",
            "spx_vol_20240103_100000.png",
            "notes_20240102.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let frames = daily_frames(dir.path(), "20240102").unwrap();
        let names: Vec<_> = frames
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["spx_vol_20240102_100000.png", "spx_vol_20240102_101500.png"]);
    }

    #[test]
    fn unreadable_frame_is_an_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spx_vol_20240102_100000.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = encode(&[path], Path::new("out.gif")).unwrap_err();
        assert!(matches!(err, PersistError::Encode { .. }));
    }
}
