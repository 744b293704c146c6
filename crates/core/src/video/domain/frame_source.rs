use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open capture source {source_name}: {reason}")]
    Open { source_name: String, reason: String },
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// Produces frames one at a time from a camera, stream or file.
///
/// `Ok(None)` means the source is exhausted; any error ends the capture.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}
