//! Capture cycle states and the errors that end a cycle.
//!
//! A cycle runs: Idle → CapturePending → Captured → Normalizing → Recognizing
//! → Extracting → Idle. Any failure drops straight back to Idle.

use thiserror::Error;

use crate::capture::CaptureError;
use crate::ocr::engine::EngineError;
use crate::ocr::normalize::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    /// Camera launched, waiting for it to return
    CapturePending,
    /// Photo saved, queued for the worker
    Captured,
    Normalizing,
    Recognizing,
    Extracting,
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleState::Idle => write!(f, "Idle"),
            CycleState::CapturePending => write!(f, "Waiting for camera"),
            CycleState::Captured => write!(f, "Captured"),
            CycleState::Normalizing => write!(f, "Decoding photo"),
            CycleState::Recognizing => write!(f, "Recognizing"),
            CycleState::Extracting => write!(f, "Extracting code"),
        }
    }
}

/// Which stage a cycle failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// OCR setup failed at startup
    Setup,
    CameraUnavailable,
    Capture,
    Busy,
    Decode,
    Recognition,
    /// The worker panicked mid-cycle
    Internal,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("OCR engine unavailable")]
    EngineUnavailable,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("a capture is already being processed")]
    Busy,
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("recognition failed: {0}")]
    Recognition(#[from] EngineError),
    #[error("capture cycle panicked: {0}")]
    Panicked(String),
}

impl CycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CycleError::EngineUnavailable => ErrorKind::Setup,
            CycleError::Capture(CaptureError::CameraUnavailable) => ErrorKind::CameraUnavailable,
            CycleError::Capture(_) => ErrorKind::Capture,
            CycleError::Busy => ErrorKind::Busy,
            CycleError::Normalize(_) => ErrorKind::Decode,
            CycleError::Recognition(_) => ErrorKind::Recognition,
            CycleError::Panicked(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CycleError::from(CaptureError::CameraUnavailable).kind(),
            ErrorKind::CameraUnavailable
        );
        assert_eq!(CycleError::from(CaptureError::Canceled).kind(), ErrorKind::Capture);
        assert_eq!(CycleError::from(EngineError::NoImage).kind(), ErrorKind::Recognition);
        let empty = NormalizeError::EmptySurface { width: 0, height: 0 };
        assert_eq!(CycleError::from(empty).kind(), ErrorKind::Decode);
        assert_eq!(CycleError::Panicked("boom".into()).kind(), ErrorKind::Internal);
    }
}
