use serde::Serialize;
use thiserror::Error;

use crate::detection::domain::confidence_policy::ConfidencePolicy;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::frame::Frame;
use crate::video::infrastructure::image_decoder::{decode_image, DecodeError};
use crate::violation::domain::violation_logger::ViolationLogger;
use crate::violation::domain::violation_store::StoreError;

/// Result of checking one frame. Serializes to the wire shape
/// `{"faces": n}` or `{"violation": "...", "faces": n}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FaceCheckOutcome {
    Violation { violation: String, faces: usize },
    Clear { faces: usize },
}

impl FaceCheckOutcome {
    pub fn faces(&self) -> usize {
        match self {
            FaceCheckOutcome::Violation { faces, .. } | FaceCheckOutcome::Clear { faces } => *faces,
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, FaceCheckOutcome::Violation { .. })
    }
}

#[derive(Error, Debug)]
pub enum DetectFacesError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] DetectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DetectFacesError {
    /// Stable machine-readable name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectFacesError::Decode(_) => "decode",
            DetectFacesError::Inference(_) => "inference",
            DetectFacesError::Store(_) => "store",
        }
    }
}

/// Single-image check: decode → detect → count → log violation.
///
/// Every call starts from scratch; nothing is remembered between images.
pub struct DetectFacesUseCase {
    detector: Box<dyn FaceDetector>,
    logger: ViolationLogger,
    policy: ConfidencePolicy,
}

impl DetectFacesUseCase {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        logger: ViolationLogger,
        policy: ConfidencePolicy,
    ) -> Self {
        Self {
            detector,
            logger,
            policy,
        }
    }

    /// Checks an encoded image (as uploaded).
    pub fn execute(&mut self, image_bytes: &[u8]) -> Result<FaceCheckOutcome, DetectFacesError> {
        let frame = decode_image(image_bytes)?;
        self.check_frame(&frame)
    }

    /// Checks an already decoded frame.
    pub fn check_frame(&mut self, frame: &Frame) -> Result<FaceCheckOutcome, DetectFacesError> {
        let detections = self.detector.detect(frame)?;
        let faces = self.policy.count(&detections);
        log::debug!(
            "{faces} face(s) above {:.2} out of {} detection(s)",
            self.policy.threshold(),
            detections.len()
        );

        Ok(match self.logger.log_face_count(faces)? {
            Some(record) => FaceCheckOutcome::Violation {
                violation: record.kind,
                faces,
            },
            None => FaceCheckOutcome::Clear { faces },
        })
    }
}
