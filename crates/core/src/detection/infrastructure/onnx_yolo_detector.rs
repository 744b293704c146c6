/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing. The
/// returned detections are in original frame coordinates, clamped to the
/// frame, and filtered only by the model's candidate floor.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

use super::nms::non_max_suppression;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Candidate floor applied before NMS.
pub const DEFAULT_CANDIDATE_CONFIDENCE: f64 = 0.25;

const NMS_IOU_THRESH: f64 = 0.45;

/// Box (4) + face score (1); face models append keypoints after these.
const MIN_FEATURES: usize = 5;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    candidate_confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, candidate_confidence: f64) -> Result<Self, DetectionError> {
        let session = build_session(model_path).map_err(|reason| DetectionError::Load {
            path: model_path.to_path_buf(),
            reason,
        })?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded face model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            candidate_confidence,
            input_size,
        })
    }
}

/// Builds a session on the preferred execution provider for the platform.
/// CPU is always the implicit fallback.
fn build_session(model_path: &Path) -> Result<ort::session::Session, String> {
    #[cfg(target_os = "macos")]
    let session = ort::session::Session::builder()
        .map_err(|e| e.to_string())?
        .with_execution_providers([
            ort::execution_providers::CoreMLExecutionProvider::default().build(),
        ])
        .map_err(|e| e.to_string())?
        .commit_from_file(model_path)
        .map_err(|e| e.to_string())?;

    #[cfg(target_os = "windows")]
    let session = ort::session::Session::builder()
        .map_err(|e| e.to_string())?
        .with_execution_providers([
            ort::execution_providers::DirectMLExecutionProvider::default().build(),
        ])
        .map_err(|e| e.to_string())?
        .commit_from_file(model_path)
        .map_err(|e| e.to_string())?;

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let session = ort::session::Session::builder()
        .map_err(|e| e.to_string())?
        .commit_from_file(model_path)
        .map_err(|e| e.to_string())?;

    Ok(session)
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        if frame.channels() < 3 || frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::Frame(format!(
                "expected a non-empty RGB frame, got {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels()
            )));
        }

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, transform) = letterbox(frame, self.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)
            .map_err(|e| DetectionError::Runtime(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| DetectionError::Runtime(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(DetectionError::Output("model produced no outputs".into()));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::Runtime(e.to_string()))?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectionError::Output("output tensor is not contiguous".into()))?;

        // 3. Decode candidates
        let candidates = decode_output(
            data,
            &shape,
            self.candidate_confidence,
            &transform,
            frame.width(),
            frame.height(),
        )?;

        // 4. NMS
        Ok(non_max_suppression(candidates, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Scale and padding applied by [`letterbox`].
struct LetterboxTransform {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxTransform {
    /// Map a point from letterbox space back to the original frame.
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns the NCHW float32 tensor and the transform needed to map model
/// coordinates back onto the frame.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, LetterboxTransform) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padded area uses YOLO's 114/255 grey
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxTransform {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Decode a YOLO output tensor into frame-space detections.
///
/// Accepts `[1, features, anchors]` (the usual export) or
/// `[1, anchors, features]`. Each row starts with `cx, cy, w, h, score`.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    transform: &LetterboxTransform,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<Detection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::Output(format!(
            "unexpected output shape {shape:?}"
        )));
    }
    // Features come first when that axis is the smaller one, unless the
    // other axis is too short to hold a row.
    let transposed =
        shape[1] >= MIN_FEATURES && (shape[1] <= shape[2] || shape[2] < MIN_FEATURES);
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < MIN_FEATURES {
        return Err(DetectionError::Output(format!(
            "output has {num_feats} features per row, need at least {MIN_FEATURES}"
        )));
    }
    if data.len() < num_dets * num_feats {
        return Err(DetectionError::Output(format!(
            "output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        )));
    }

    let value = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < min_confidence {
            continue;
        }
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = transform.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = transform.unmap(cx + w / 2.0, cy + h / 2.0);
        dets.push(Detection::new(x1, y1, x2, y2, conf).clamped(frame_width, frame_height));
    }
    Ok(dets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_transform() -> LetterboxTransform {
        LetterboxTransform {
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 frame → scale 3.2, content 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_unmap_reverses_padding_and_scale() {
        let lb = LetterboxTransform {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let (x, y) = lb.unmap(40.0, 120.0);
        assert_relative_eq!(x, 20.0);
        assert_relative_eq!(y, 10.0);
    }

    #[test]
    fn test_decode_transposed_layout() {
        // [1, 5 features, 2 anchors]: column-major per anchor
        let data = vec![
            50.0, 150.0, // cx
            50.0, 150.0, // cy
            20.0, 20.0, // w
            20.0, 20.0, // h
            0.9, 0.1, // score
        ];
        let dets = decode_output(&data, &[1, 5, 2], 0.25, &identity_transform(), 640, 640)
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox(), [40.0, 40.0, 60.0, 60.0]);
        assert_relative_eq!(dets[0].confidence, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_row_major_layout() {
        // [1, 6 anchors, 5 features]
        let mut data = Vec::new();
        for i in 0..6 {
            data.extend_from_slice(&[10.0 + i as f32 * 30.0, 10.0, 10.0, 10.0, 0.8]);
        }
        let dets = decode_output(&data, &[1, 6, 5], 0.25, &identity_transform(), 640, 640)
            .unwrap();
        assert_eq!(dets.len(), 6);
    }

    #[test]
    fn test_decode_clamps_to_frame() {
        let data = vec![5.0, 0.0, 5.0, 0.0, 20.0, 0.0, 20.0, 0.0, 0.9, 0.0];
        let dets = decode_output(&data, &[1, 5, 2], 0.25, &identity_transform(), 100, 100)
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox(), [0.0, 0.0, 15.0, 15.0]);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        let err = decode_output(&[0.0; 4], &[1, 4], 0.25, &identity_transform(), 10, 10)
            .unwrap_err();
        assert!(matches!(err, DetectionError::Output(_)));
    }

    #[test]
    fn test_decode_rejects_short_rows() {
        let err = decode_output(&[0.0; 8], &[1, 2, 4], 0.25, &identity_transform(), 10, 10)
            .unwrap_err();
        assert!(matches!(err, DetectionError::Output(_)));
    }
}
