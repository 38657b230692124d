//! facedesk core - capture session controller for a face recognition service
//!
//! This crate drives a remote face registration/recognition HTTP API from a
//! camera or a user-selected image file.
//!
//! # Features
//!
//! - Camera / file capture modes with a single authoritative `capture_still`
//! - At most one registration or recognition request in flight
//! - Periodic roster and statistics refresh
//! - One-way notification sink for UI, toasts and speech
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use facedesk_core::{
//!     CaptureSession, HttpFaceService, HttpServiceConfig, SessionConfig, SnapshotCamera,
//!     TracingSink,
//! };
//!
//! # async fn example() -> facedesk_core::Result<()> {
//! let config = SessionConfig::from_env();
//! let service = HttpFaceService::new(HttpServiceConfig::from(&config))?;
//! let session = CaptureSession::new(
//!     config,
//!     Arc::new(service),
//!     Arc::new(SnapshotCamera::new("/run/webcam/latest.jpg")),
//!     Arc::new(TracingSink),
//! );
//!
//! session.start().await;
//! let outcome = session.submit_recognition().await?;
//! println!("recognized: {}", outcome.is_recognized());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod phrases;
pub mod service;
pub mod session;

// Re-export main types for convenience
pub use capture::{CameraProvider, CameraStream, NoCamera, SnapshotCamera};
pub use config::SessionConfig;
pub use error::{FacedeskError, Result};
pub use model::{
    CaptureMode, EnrolledPerson, PersonRecord, RecognitionOutcome, Stats, Still,
};
pub use notify::{NotificationSink, StatusLevel, TracingSink, UiEvent};
pub use phrases::{Locale, Phrases};
pub use service::{FaceService, HttpFaceService, HttpServiceConfig};
pub use session::CaptureSession;
