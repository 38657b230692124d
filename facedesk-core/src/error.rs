use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacedeskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("No active camera stream and no file selected")]
    NoActiveStream,

    #[error("A registration or recognition request is already in progress")]
    RequestInFlight,

    #[error("Service returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Service { status: u16, detail: Option<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FacedeskError {
    /// The service's own error detail, when it sent one.
    pub fn service_detail(&self) -> Option<&str> {
        match self {
            Self::Service { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<image::ImageError> for FacedeskError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FacedeskError>;
