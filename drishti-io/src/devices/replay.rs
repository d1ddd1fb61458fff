//! Replay camera: serves recorded JPEG files as live frames
//!
//! All `*.jpg` / `*.jpeg` files in the configured directory are loaded at
//! startup, sorted by file name, and handed out in order at the configured
//! frame rate. With `loop_playback` the sequence restarts after the last
//! file; otherwise acquisition fails from then on.

use super::FramePacer;
use crate::config::{CameraConfig, ReplayConfig};
use crate::core::pool::FramePool;
use crate::core::source::{FrameBuffer, FrameSource};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed frame source
pub struct ReplayCamera {
    frames: Vec<Vec<u8>>,
    next_index: usize,
    loop_playback: bool,
    pool: FramePool,
    pacer: FramePacer,
    sequence: u64,
}

impl ReplayCamera {
    /// Load every JPEG in `replay.directory`
    pub fn open(camera: &CameraConfig, replay: &ReplayConfig) -> Result<Self> {
        let paths = list_jpeg_files(&replay.directory)?;
        if paths.is_empty() {
            return Err(Error::FrameSource(format!(
                "no jpeg files in {}",
                replay.directory.display()
            )));
        }

        let frames = paths
            .iter()
            .map(fs::read)
            .collect::<std::io::Result<Vec<_>>>()?;
        let largest = frames.iter().map(Vec::len).max().unwrap_or(0);

        log::info!(
            "Replay camera: {} frames from {} @ {} fps (loop: {})",
            frames.len(),
            replay.directory.display(),
            replay.fps,
            replay.loop_playback
        );

        Ok(Self {
            frames,
            next_index: 0,
            loop_playback: replay.loop_playback,
            pool: FramePool::new(camera.fb_count, largest),
            pacer: FramePacer::new(replay.fps),
            sequence: 0,
        })
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn list_jpeg_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::FrameSource(format!("cannot read {}: {}", dir.display(), e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
            .unwrap_or(false);
        if is_jpeg && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

impl FrameSource for ReplayCamera {
    fn acquire(&mut self) -> Option<FrameBuffer> {
        self.pacer.wait();

        if self.next_index >= self.frames.len() {
            if !self.loop_playback {
                return None;
            }
            log::debug!("Replay reached end, looping");
            self.next_index = 0;
        }

        let mut buf = self.pool.take()?;
        buf.extend_from_slice(&self.frames[self.next_index]);
        self.next_index += 1;
        self.sequence += 1;

        Some(FrameBuffer::new(self.sequence, buf))
    }

    fn release(&mut self, frame: FrameBuffer) {
        self.pool.give_back(frame.into_inner());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn replay_config(dir: &Path, loop_playback: bool) -> ReplayConfig {
        ReplayConfig {
            directory: dir.to_path_buf(),
            fps: 0.0,
            loop_playback,
        }
    }

    fn write_frames(dir: &Path) {
        fs::write(dir.join("b.jpg"), [0xFF, 0xD8, 0xFF, 2, 0xFF, 0xD9]).unwrap();
        fs::write(dir.join("a.JPEG"), [0xFF, 0xD8, 0xFF, 1, 0xFF, 0xD9]).unwrap();
        fs::write(dir.join("notes.txt"), b"not a frame").unwrap();
    }

    #[test]
    fn test_serves_files_in_name_order_and_loops() {
        let temp_dir = TempDir::new().unwrap();
        write_frames(temp_dir.path());

        let mut camera =
            ReplayCamera::open(&CameraConfig::default(), &replay_config(temp_dir.path(), true))
                .unwrap();
        assert_eq!(camera.frame_count(), 2);

        let mut marks = Vec::new();
        for _ in 0..3 {
            let frame = camera.acquire().unwrap();
            marks.push(frame.as_bytes()[3]);
            camera.release(frame);
        }
        assert_eq!(marks, vec![1, 2, 1]);
    }

    #[test]
    fn test_stops_without_loop() {
        let temp_dir = TempDir::new().unwrap();
        write_frames(temp_dir.path());

        let mut camera =
            ReplayCamera::open(&CameraConfig::default(), &replay_config(temp_dir.path(), false))
                .unwrap();
        for _ in 0..2 {
            let frame = camera.acquire().unwrap();
            camera.release(frame);
        }
        assert!(camera.acquire().is_none());
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            ReplayCamera::open(&CameraConfig::default(), &replay_config(temp_dir.path(), true)),
            Err(Error::FrameSource(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            ReplayCamera::open(&CameraConfig::default(), &replay_config(&missing, true)),
            Err(Error::FrameSource(_))
        ));
    }
}
