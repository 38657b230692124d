//! One-way notification sink between the session and whatever renders it.
//!
//! The session publishes [`UiEvent`]s synchronously after each state change.
//! Sinks never feed control flow back into the session.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::model::{CaptureMode, PersonRecord, Stats};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Decoded preview of a selected file.
#[derive(Debug, Clone)]
pub struct Preview {
    pub filename: String,
    pub image: Arc<image::DynamicImage>,
}

/// Everything the session tells the UI.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Transient status line / toast.
    Status { level: StatusLevel, message: String },
    /// A submit started (`true`) or finished (`false`).
    Busy(bool),
    /// Result panel contents.
    Result {
        level: StatusLevel,
        title: String,
        body: String,
    },
    ModeChanged(CaptureMode),
    Preview(Preview),
    PreviewFailed { filename: String, reason: String },
    /// Text to speak aloud in the given BCP 47 language.
    Speak { text: String, lang: &'static str },
    ClearNameInput,
    FocusNameInput,
    StatsUpdated(Stats),
    RosterUpdated(Vec<PersonRecord>),
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: UiEvent);
}

/// Sink that only logs. Useful for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, event: UiEvent) {
        match event {
            UiEvent::Status {
                level: StatusLevel::Error,
                message,
            } => warn!(%message, "status"),
            UiEvent::Status { level, message } => info!(?level, %message, "status"),
            UiEvent::Result { level, title, body } => info!(?level, %title, %body, "result"),
            UiEvent::ModeChanged(mode) => info!(%mode, "capture mode changed"),
            UiEvent::Preview(preview) => debug!(
                filename = %preview.filename,
                width = preview.image.width(),
                height = preview.image.height(),
                "preview ready"
            ),
            UiEvent::PreviewFailed { filename, reason } => {
                warn!(%filename, %reason, "preview failed")
            }
            UiEvent::Speak { text, lang } => debug!(%text, lang, "speak"),
            UiEvent::StatsUpdated(stats) => debug!(
                persons = stats.person_count,
                success_rate = stats.success_rate,
                "stats updated"
            ),
            UiEvent::RosterUpdated(persons) => debug!(count = persons.len(), "roster updated"),
            other => debug!(event = ?other, "ui event"),
        }
    }
}
