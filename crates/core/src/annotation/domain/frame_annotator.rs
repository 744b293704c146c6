use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Draws detections onto a frame for display.
///
/// Purely cosmetic: implementations mutate the frame in place and decide for
/// themselves which detections are worth drawing.
pub trait FrameAnnotator: Send {
    fn annotate(&self, frame: &mut Frame, detections: &[Detection]);
}
