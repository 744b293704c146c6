use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureError, FrameSource};

#[derive(Error, Debug)]
pub enum CaptureLoopError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("inference failed on frame {frame}: {source}")]
    Inference {
        frame: usize,
        #[source]
        source: DetectionError,
    },
}

/// Why a capture loop stopped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    QuitRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: usize,
    pub stop: StopReason,
}

/// Live monitoring loop: capture → detect → annotate → publish, one frame at
/// a time, until the source runs dry or someone asks to quit.
///
/// Quit can be requested either by the `on_frame` callback returning `false`
/// or by setting the shared `cancelled` flag from another thread. The flag is
/// checked once per iteration, before the next capture.
pub struct CaptureLoopUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
    cancelled: Arc<AtomicBool>,
}

impl CaptureLoopUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        annotator: Box<dyn FrameAnnotator>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source,
            detector,
            annotator,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn run(
        &mut self,
        mut on_frame: impl FnMut(Frame) -> bool,
    ) -> Result<CaptureSummary, CaptureLoopError> {
        let mut frames = 0;
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                return Ok(self.stopped(frames, StopReason::QuitRequested));
            }

            let Some(mut frame) = self.source.next_frame()? else {
                return Ok(self.stopped(frames, StopReason::SourceExhausted));
            };

            let detections =
                self.detector
                    .detect(&frame)
                    .map_err(|source| CaptureLoopError::Inference {
                        frame: frame.index(),
                        source,
                    })?;
            self.annotator.annotate(&mut frame, &detections);
            frames += 1;

            if !on_frame(frame) {
                return Ok(self.stopped(frames, StopReason::QuitRequested));
            }
        }
    }

    fn stopped(&self, frames: usize, stop: StopReason) -> CaptureSummary {
        log::info!("Capture loop stopped after {frames} frame(s): {stop:?}");
        CaptureSummary { frames, stop }
    }
}
