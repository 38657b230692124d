//! Camera backed by a snapshot file that an external capture daemon keeps
//! overwriting (`mjpg-streamer`, `fswebcam --loop`, ...).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use super::{CameraProvider, CameraStream};
use crate::error::{FacedeskError, Result};

/// Provider that opens a [`SnapshotStream`] over an image file.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    path: PathBuf,
}

impl SnapshotCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraProvider for SnapshotCamera {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn acquire(&self) -> Result<Arc<dyn CameraStream>> {
        let frame = read_frame(self.path.clone()).await.map_err(|e| {
            warn!(error = %e, "Snapshot camera unavailable");
            FacedeskError::CameraUnavailable(format!("{}: {e}", self.path.display()))
        })?;

        info!(
            width = frame.width(),
            height = frame.height(),
            "Snapshot camera opened"
        );

        Ok(Arc::new(SnapshotStream {
            path: self.path.clone(),
            resolution: frame.dimensions(),
        }))
    }
}

/// A stream whose every frame is a fresh read of the snapshot file.
struct SnapshotStream {
    path: PathBuf,
    resolution: (u32, u32),
}

#[async_trait]
impl CameraStream for SnapshotStream {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    async fn grab_frame(&self) -> Result<RgbImage> {
        let frame = read_frame(self.path.clone()).await?;
        debug!(
            width = frame.width(),
            height = frame.height(),
            "Grabbed snapshot frame"
        );
        Ok(frame)
    }
}

async fn read_frame(path: PathBuf) -> Result<RgbImage> {
    tokio::task::spawn_blocking(move || -> Result<RgbImage> {
        let reader = image::ImageReader::open(&path)
            .map_err(|e| FacedeskError::CameraUnavailable(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| FacedeskError::CameraUnavailable(e.to_string()))?;
        Ok(reader.decode()?.to_rgb8())
    })
    .await
    .map_err(|e| FacedeskError::Image(format!("snapshot task failed: {e}")))?
}
