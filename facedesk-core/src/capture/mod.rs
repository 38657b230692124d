//! Image sources for the capture session.
//!
//! A [`CameraProvider`] hands out live [`CameraStream`]s; the session grabs a
//! frame from the stream at the moment a still is requested and encodes it as
//! JPEG. User-selected files bypass this module entirely and are sent as-is.

mod snapshot;

pub use snapshot::SnapshotCamera;

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

use crate::error::{FacedeskError, Result};

/// Default JPEG quality for camera stills.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// A live video stream.
///
/// Dropping the last handle releases the device.
#[async_trait]
pub trait CameraStream: Send + Sync {
    /// Native resolution of the stream as `(width, height)`.
    fn resolution(&self) -> (u32, u32);

    /// Grab the current frame.
    async fn grab_frame(&self) -> Result<RgbImage>;
}

/// Platform access to a camera.
///
/// Implementations report denial or hardware failure as
/// [`FacedeskError::CameraUnavailable`].
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn CameraStream>>;
}

/// Provider for headless setups with no camera attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

#[async_trait]
impl CameraProvider for NoCamera {
    async fn acquire(&self) -> Result<Arc<dyn CameraStream>> {
        Err(FacedeskError::CameraUnavailable(
            "no camera configured".into(),
        ))
    }
}

/// Encode an RGB frame as JPEG at the given quality (1-100).
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(FacedeskError::Image("cannot encode an empty frame".into()));
    }
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    frame.write_with_encoder(encoder)?;
    Ok(out.into_inner())
}

/// Decode arbitrary image bytes into a raster on the blocking pool.
pub async fn decode_raster(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| FacedeskError::Image(format!("decode task failed: {e}")))?
        .map_err(FacedeskError::from)
}
