//! Camera feed abstraction.
//!
//! The sampler only needs two things from a camera: whether it is live, and the
//! latest frame. Real capture backends live outside this crate.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::RgbImage;

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub image: Arc<RgbImage>,
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(image: Arc<RgbImage>) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }
}

pub trait VideoSource: Send + Sync {
    fn is_active(&self) -> bool;

    /// Latest frame, or `None` when the source is not delivering.
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// A source that keeps serving one still image while active.
pub struct StaticVideoSource {
    image: Arc<RgbImage>,
    active: AtomicBool,
}

impl StaticVideoSource {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
            active: AtomicBool::new(true),
        }
    }

    /// Black frame at the 640x480 preview size the capture side requests.
    pub fn blank() -> Self {
        Self::new(RgbImage::new(640, 480))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load frame image {}", path.display()))?
            .to_rgb8();
        Ok(Self::new(image))
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl VideoSource for StaticVideoSource {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_active() {
            return None;
        }
        Some(VideoFrame::new(Arc::clone(&self.image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_source_serves_nothing() {
        let source = StaticVideoSource::new(RgbImage::new(4, 4));
        assert!(source.current_frame().is_some());

        source.set_active(false);
        assert!(!source.is_active());
        assert!(source.current_frame().is_none());
    }

    #[test]
    fn loads_frame_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::new(8, 6).save(&path).unwrap();

        let source = StaticVideoSource::from_path(&path).unwrap();
        assert_eq!(source.current_frame().unwrap().image.dimensions(), (8, 6));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(StaticVideoSource::from_path(Path::new("/nonexistent/frame.png")).is_err());
    }
}
