use thiserror::Error;

use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load model {path}: {reason}")]
    Load {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("inference runtime error: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    Output(String),
    #[error("unsupported frame: {0}")]
    Frame(String),
}

/// Domain interface for face detection.
///
/// Returns every face the model reports above its own candidate floor;
/// callers apply their confidence policy on top. Implementations may hold
/// mutable inference state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError>;
}
