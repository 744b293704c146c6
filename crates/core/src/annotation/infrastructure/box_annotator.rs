use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::confidence_policy::ConfidencePolicy;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
/// Gap between the label baseline and the top edge of the box.
const LABEL_OFFSET: i32 = 10;

/// Draws a green rectangle and a `Face 0.87` label for every detection the
/// confidence policy accepts.
///
/// Labels need a TrueType font; without one only the boxes are drawn.
pub struct BoxAnnotator {
    policy: ConfidencePolicy,
    font: Option<FontVec>,
}

impl BoxAnnotator {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self { policy, font: None }
    }

    /// Loads the label font from `path`. A missing or invalid font is logged
    /// and labels are skipped.
    pub fn with_font_file(mut self, path: &Path) -> Self {
        match std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()))
        {
            Ok(font) => self.font = Some(font),
            Err(e) => log::warn!(
                "Cannot load label font {}: {e}; drawing boxes without labels",
                path.display()
            ),
        }
        self
    }

    pub fn label(detection: &Detection) -> String {
        format!("Face {:.2}", detection.confidence)
    }

    fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
        // Boxes under a pixel wide can still straddle a pixel edge after truncation.
        if detection.width() < 1.0 || detection.height() < 1.0 {
            return;
        }
        let (x1, y1, x2, y2) = detection.pixel_corners();
        let width = x2 - x1;
        let height = y2 - y1;
        if width <= 0 || height <= 0 {
            return;
        }

        for t in 0..BOX_THICKNESS {
            let w = width - 2 * t;
            let h = height - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }

        if let Some(font) = &self.font {
            let text_top = (y1 - LABEL_OFFSET - LABEL_FONT_SIZE as i32).max(0);
            draw_text_mut(
                image,
                BOX_COLOR,
                x1.max(0),
                text_top,
                PxScale::from(LABEL_FONT_SIZE),
                font,
                &Self::label(detection),
            );
        }
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(&self, frame: &mut Frame, detections: &[Detection]) {
        let accepted = self.policy.retain(detections);
        if accepted.is_empty() {
            return;
        }
        let Some(mut image) = frame.to_rgb_image() else {
            log::debug!("Skipping annotation of non-RGB frame {}", frame.index());
            return;
        };

        for detection in &accepted {
            self.draw_detection(&mut image, detection);
        }
        *frame = Frame::from_rgb_image(image, frame.index());
    }
}
