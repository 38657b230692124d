//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling kiosk scripts and supervisors to react appropriately.

use facedesk_core::{FacedeskError, Phrases};

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Invalid input: empty name, empty file, unusable service URL.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// The service answered but refused the request.
/// Maps to EX_DATAERR from sysexits.h.
pub const SERVICE_REJECTED: i32 = 65;

/// Cannot open the input file or the camera.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unreachable or answering garbage.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// Another request is in flight; try again.
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const BUSY: i32 = 75;

/// Represents an exit code with the message shown to the user.
pub struct ExitCode {
    pub code: i32,
    pub message: String,
}

impl ExitCode {
    /// Classify an error by the first [`FacedeskError`] in its chain.
    ///
    /// Library errors are described in the session's language; anything else
    /// keeps its full context chain.
    pub fn from_anyhow(err: &anyhow::Error, phrases: &Phrases) -> Self {
        if let Some(facedesk) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<FacedeskError>())
        {
            return Self {
                code: code_for(facedesk),
                message: phrases.describe_error(facedesk),
            };
        }

        let io_failure = err
            .chain()
            .any(|cause| cause.downcast_ref::<std::io::Error>().is_some());

        Self {
            code: if io_failure { INPUT_ERROR } else { GENERAL_ERROR },
            message: format!("{err:#}"),
        }
    }
}

pub fn code_for(err: &FacedeskError) -> i32 {
    match err {
        FacedeskError::Validation(_) | FacedeskError::Config(_) => USAGE_ERROR,
        FacedeskError::Service { .. } => SERVICE_REJECTED,
        FacedeskError::CameraUnavailable(_) | FacedeskError::NoActiveStream => INPUT_ERROR,
        FacedeskError::Transport(_) | FacedeskError::InvalidResponse(_) => UNAVAILABLE,
        FacedeskError::RequestInFlight => BUSY,
        FacedeskError::Image(_) => GENERAL_ERROR,
    }
}
