// src/display.rs
//! Headless presentation: the `Receiver` used when no window is attached.
//!
//! Each presented frame is counted and, if a snapshot directory is set, written
//! out as `frame-NNNNNN.png`.

use crate::painter::Receiver;
use crate::surface::PixelBuffer;
use anyhow::{Context, Result};
use image::RgbaImage;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct HeadlessReceiver {
    snapshot_dir: Option<PathBuf>,
    frames: Arc<AtomicU64>,
}

impl HeadlessReceiver {
    /// Create a receiver, creating `snapshot_dir` if needed.
    pub fn new(snapshot_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &snapshot_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
            info!("HeadlessReceiver: writing frames to {}", dir.display());
        }
        Ok(Self {
            snapshot_dir,
            frames: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Shared counter of frames presented so far.
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        self.frames.clone()
    }

    fn write_snapshot(dir: &Path, frame: u64, surface: &PixelBuffer) -> Result<PathBuf> {
        let image = RgbaImage::from_raw(surface.width(), surface.height(), surface.as_bytes().to_vec())
            .context("Pixel buffer size does not match its dimensions")?;
        let path = dir.join(format!("frame-{:06}.png", frame));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl Receiver<PixelBuffer> for HeadlessReceiver {
    fn update(&mut self, surface: &PixelBuffer) {
        let frame = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "HeadlessReceiver: frame {} ({}x{})",
            frame,
            surface.width(),
            surface.height()
        );
        if let Some(dir) = &self.snapshot_dir {
            match Self::write_snapshot(dir, frame, surface) {
                Ok(path) => debug!("HeadlessReceiver: wrote {}", path.display()),
                Err(e) => warn!("HeadlessReceiver: snapshot failed: {:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{GREEN, RED};
    use crate::surface::{PixelRect, Surface};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("painter-{}-{}-{}", name, std::process::id(), nanos))
    }

    #[test]
    fn counts_frames_without_snapshots() {
        let mut receiver = HeadlessReceiver::new(None).unwrap();
        let counter = receiver.frame_counter();
        let surface = PixelBuffer::new(4, 4);
        receiver.update(&surface);
        receiver.update(&surface);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn writes_png_snapshots() {
        let dir = scratch_dir("snapshots");
        let mut receiver = HeadlessReceiver::new(Some(dir.clone())).unwrap();
        let mut surface = PixelBuffer::new(8, 6);
        surface.fill(surface.bounds(), GREEN);
        surface.fill(PixelRect::new(0, 0, 2, 2), RED);
        receiver.update(&surface);

        let written = image::open(dir.join("frame-000001.png")).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (8, 6));
        assert_eq!(written.get_pixel(0, 0).0, RED.to_bytes());
        assert_eq!(written.get_pixel(7, 5).0, GREEN.to_bytes());

        let _ = fs::remove_dir_all(&dir);
    }
}
