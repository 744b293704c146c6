use thiserror::Error;

use crate::shared::constants::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::shared::detection::Detection;

#[derive(Error, Debug, PartialEq)]
#[error("confidence threshold must be between 0.0 and 1.0, got {0}")]
pub struct InvalidThreshold(pub f64);

/// The single threshold that decides which detections count as faces.
///
/// Applied identically to the boxes drawn in the capture loop and the faces
/// counted by the detection endpoint. The comparison is strict: a detection
/// exactly at the threshold is rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfidencePolicy {
    threshold: f64,
}

impl ConfidencePolicy {
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.confidence > self.threshold
    }

    pub fn retain(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| self.accepts(d))
            .copied()
            .collect()
    }

    pub fn count(&self, detections: &[Detection]) -> usize {
        detections.iter().filter(|d| self.accepts(d)).count()
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}
