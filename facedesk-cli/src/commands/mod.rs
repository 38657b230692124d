//! Subcommand implementations and the setup they share.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use facedesk_core::{
    CameraProvider, CaptureSession, HttpFaceService, HttpServiceConfig, NoCamera, SessionConfig,
    SnapshotCamera,
};
use tracing::debug;

use crate::console::{ConsoleSink, SinkMode};
use crate::utils::read_image;

pub mod persons;
pub mod recognize;
pub mod register;
pub mod remove;
pub mod stats;
pub mod watch;

/// Where the still comes from. Exactly one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Image file to send as-is
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Snapshot file kept current by a capture daemon
    #[arg(long, value_name = "SNAPSHOT")]
    pub camera: Option<PathBuf>,
}

/// Settings resolved from flags and environment.
pub struct AppContext {
    pub config: SessionConfig,
    pub quiet: bool,
}

impl AppContext {
    pub fn service(&self) -> Result<HttpFaceService> {
        HttpFaceService::new(HttpServiceConfig::from(&self.config))
            .context("Failed to create service client")
    }

    pub fn session(&self, camera: Option<&Path>, mode: SinkMode) -> Result<CaptureSession> {
        let camera: Arc<dyn CameraProvider> = match camera {
            Some(path) => Arc::new(SnapshotCamera::new(path)),
            None => Arc::new(NoCamera),
        };
        Ok(CaptureSession::new(
            self.config.clone(),
            Arc::new(self.service()?),
            camera,
            Arc::new(ConsoleSink::new(mode, self.quiet)),
        ))
    }
}

/// Build a one-shot session and put it in the mode `source` asks for.
pub async fn prepared_session(ctx: &AppContext, source: &SourceArgs) -> Result<CaptureSession> {
    let session = ctx.session(source.camera.as_deref(), SinkMode::OneShot)?;

    match &source.file {
        Some(path) => {
            let (bytes, filename) = read_image(path)?;
            session.select_file(bytes, filename).await?;
        }
        None => {
            session.acquire_camera().await?;
        }
    }

    debug!(mode = %session.mode(), "Session ready");
    Ok(session)
}
