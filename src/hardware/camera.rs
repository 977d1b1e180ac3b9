// hardware/camera.rs

// Camera stand-ins. `DisabledCamera` is for runs without a camera; every capture
// fails. `FrameFileCamera` snapshots the latest frame an external capture process
// leaves on disk, saving it as a timestamped `camera_image_<time>.png` next to the
// maps.

// Dependencies
use chrono::Utc;
use log::{debug, info, warn};
use std::path::PathBuf;

use super::ImageCapture;
use crate::core::ImageRef;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%.3f";

/// Camera that never captures
#[derive(Debug, Default)]
pub struct DisabledCamera;

impl ImageCapture for DisabledCamera {
    fn capture(&mut self) -> Option<ImageRef> {
        debug!("No camera configured, capture skipped");
        None
    }
}

/// Copies the current PNG frame at `source` into `directory` on every capture
#[derive(Clone, Debug)]
pub struct FrameFileCamera {
    source: PathBuf,
    directory: PathBuf,
}

impl FrameFileCamera {
    /// Reads frames from `source` and saves captures into `directory`
    pub fn new(source: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        FrameFileCamera {
            source: source.into(),
            directory: directory.into(),
        }
    }
}

impl ImageCapture for FrameFileCamera {
    fn capture(&mut self) -> Option<ImageRef> {
        let frame = match image::open(&self.source) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not read camera frame {:?}: {}", self.source, e);
                return None;
            }
        };

        if let Err(e) = std::fs::create_dir_all(&self.directory) {
            warn!("Could not create image directory {:?}: {}", self.directory, e);
            return None;
        }
        let path = self.directory.join(format!(
            "camera_image_{}.png",
            Utc::now().format(TIMESTAMP_FORMAT)
        ));
        match frame.save(&path) {
            Ok(()) => {
                info!("Image saved as {:?}", path);
                Some(ImageRef::new(path))
            }
            Err(e) => {
                warn!("Could not save camera image {:?}: {}", path, e);
                None
            }
        }
    }
}
