//! Session configuration
//!
//! Loaded from `FACEDESK_*` environment variables with sensible defaults.

use std::time::Duration;

use crate::capture::DEFAULT_JPEG_QUALITY;
use crate::phrases::Locale;

/// Default service origin.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Session configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the recognition service (default: http://localhost:8000)
    pub api_url: String,
    /// Interval between background roster/stats refreshes (default: 30s)
    pub refresh_interval: Duration,
    /// Delay before returning to camera mode after a file registration (default: 3s)
    pub reset_delay: Duration,
    /// JPEG quality for camera stills, 1-100 (default: 95)
    pub jpeg_quality: u8,
    /// Transport timeout for HTTP requests (default: none)
    pub http_timeout: Option<Duration>,
    /// Interface language (default: en)
    pub locale: Locale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval: Duration::from_secs(30),
            reset_delay: Duration::from_millis(3000),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            http_timeout: None,
            locale: Locale::En,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("FACEDESK_API_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let refresh_interval = std::env::var("FACEDESK_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.refresh_interval);

        let reset_delay = std::env::var("FACEDESK_RESET_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.reset_delay);

        let jpeg_quality = std::env::var("FACEDESK_JPEG_QUALITY")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .map(|q| q.clamp(1, 100))
            .unwrap_or(defaults.jpeg_quality);

        let http_timeout = std::env::var("FACEDESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let locale = std::env::var("FACEDESK_LOCALE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.locale);

        Self {
            api_url,
            refresh_interval,
            reset_delay,
            jpeg_quality,
            http_timeout,
            locale,
        }
    }
}
