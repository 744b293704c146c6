//! Box overlap helpers for detector post-processing.

use std::cmp::Ordering;

use crate::shared::detection::Detection;

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy NMS: highest confidence first, dropping any box whose IoU with an
/// already kept box exceeds `iou_thresh`.
pub fn non_max_suppression(mut dets: Vec<Detection>, iou_thresh: f64) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(dets.len());
    for det in dets {
        let overlaps = keep
            .iter()
            .any(|k| bbox_iou(&k.bbox(), &det.bbox()) > iou_thresh);
        if !overlaps {
            keep.push(det);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_iou_no_overlap() {
        assert_eq!(
            bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]),
            0.0
        );
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let iou = bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[5.0, 5.0, 15.0, 15.0]);
        assert_relative_eq!(iou, 25.0 / 175.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nms_suppresses_overlapping_lower_confidence() {
        let dets = vec![
            Detection::new(2.0, 2.0, 102.0, 102.0, 0.6),
            Detection::new(0.0, 0.0, 100.0, 100.0, 0.9),
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_two_separate_faces() {
        let dets = vec![
            Detection::new(0.0, 0.0, 50.0, 50.0, 0.9),
            Detection::new(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(non_max_suppression(dets, 0.45).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.45).is_empty());
    }
}
