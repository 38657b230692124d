//! Data types shared by the session controller and the service client.
//!
//! `PersonRecord` and `Stats` are owned by the remote service; the client only
//! reads them. The `*Body` types mirror the service's JSON and are converted
//! into the public types at the HTTP boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Which image source is authoritative for `capture_still`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Camera,
    File,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A single immutable image payload ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Still {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl Still {
    /// Filename used for frames grabbed from the camera.
    pub const CAMERA_FILENAME: &'static str = "capture.jpg";

    /// Wrap a freshly encoded camera frame.
    pub fn from_camera(jpeg: Vec<u8>) -> Self {
        Self {
            bytes: jpeg,
            filename: Self::CAMERA_FILENAME.to_string(),
            content_type: "image/jpeg".to_string(),
        }
    }

    /// Wrap user-selected file bytes, guessing the content type from the
    /// bytes first and the name second.
    pub fn from_file(bytes: Vec<u8>, filename: &str) -> Self {
        let content_type = guess_content_type(&bytes, filename).to_string();
        Self {
            bytes,
            filename: filename.to_string(),
            content_type,
        }
    }
}

/// Guess an `image/*` MIME type for an upload.
///
/// The magic bytes win over the extension. Unrecognized input is labelled
/// `image/jpeg` so the service, not the client, decides whether it decodes.
pub fn guess_content_type(bytes: &[u8], filename: &str) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        let mime = format.to_mime_type();
        if mime.starts_with("image/") {
            return mime;
        }
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("avif") => "image/avif",
        _ => "image/jpeg",
    }
}

/// An enrolled person as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub recognition_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// The service's answer to a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledPerson {
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Aggregate usage statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub person_count: u64,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    pub total_attempts: u64,
    pub recognitions: u64,
    pub unknown_faces: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Result of a recognition request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RecognitionOutcome {
    Recognized { name: String, confidence_percent: f64 },
    Unknown { confidence_percent: f64 },
}

impl RecognitionOutcome {
    pub fn confidence_percent(&self) -> f64 {
        match self {
            Self::Recognized {
                confidence_percent, ..
            }
            | Self::Unknown { confidence_percent } => *confidence_percent,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Recognized { .. })
    }
}

/// `GET /stats` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct StatsBody {
    #[serde(default)]
    pub persons: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub recognitions: u64,
    #[serde(default)]
    pub unknown_faces: u64,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<StatsBody> for Stats {
    fn from(body: StatsBody) -> Self {
        Self {
            person_count: body.persons,
            success_rate: body.success_rate.clamp(0.0, 100.0),
            total_attempts: body.recognitions.saturating_add(body.unknown_faces),
            recognitions: body.recognitions,
            unknown_faces: body.unknown_faces,
            last_activity: body.last_activity,
        }
    }
}

/// `GET /persons` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct PersonsBody {
    pub persons: Vec<PersonRecord>,
}

/// `POST /recognize` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct RecognizeBody {
    pub recognized: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl TryFrom<RecognizeBody> for RecognitionOutcome {
    type Error = String;

    fn try_from(body: RecognizeBody) -> std::result::Result<Self, Self::Error> {
        if !body.recognized {
            return Ok(Self::Unknown {
                confidence_percent: body.confidence,
            });
        }
        match body.name {
            Some(name) if !name.is_empty() => Ok(Self::Recognized {
                name,
                confidence_percent: body.confidence,
            }),
            _ => Err("recognized=true without a name".to_string()),
        }
    }
}

/// Error body carried by non-2xx responses. `detail` may be any JSON value
/// (validation failures send a list); only a string is surfaced.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_text(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Parse RFC 3339 or SQLite `YYYY-MM-DD HH:MM:SS[.fff]` (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {s}"))),
    }
}
