/// One detected face: a bounding box in frame pixel coordinates plus the
/// model's confidence in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl Detection {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    pub fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Integer pixel corners, truncated the same way the box is drawn.
    pub fn pixel_corners(&self) -> (i32, i32, i32, i32) {
        (
            self.x1 as i32,
            self.y1 as i32,
            self.x2 as i32,
            self.y2 as i32,
        )
    }

    /// Clamp the box into a `width` × `height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let max_x = width as f64;
        let max_y = height as f64;
        Self {
            x1: self.x1.clamp(0.0, max_x),
            y1: self.y1.clamp(0.0, max_y),
            x2: self.x2.clamp(0.0, max_x),
            y2: self.y2.clamp(0.0, max_y),
            confidence: self.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimensions() {
        let d = Detection::new(10.0, 20.0, 50.0, 80.0, 0.9);
        assert_relative_eq!(d.width(), 40.0);
        assert_relative_eq!(d.height(), 60.0);
    }

    #[test]
    fn test_inverted_box_has_zero_size() {
        let d = Detection::new(50.0, 50.0, 10.0, 10.0, 0.9);
        assert_eq!(d.width(), 0.0);
        assert_eq!(d.height(), 0.0);
    }

    #[test]
    fn test_pixel_corners_truncate() {
        let d = Detection::new(10.7, 20.2, 50.9, 80.5, 0.9);
        assert_eq!(d.pixel_corners(), (10, 20, 50, 80));
    }

    #[test]
    fn test_clamped_to_frame() {
        let d = Detection::new(-5.0, -3.0, 120.0, 90.0, 0.7).clamped(100, 80);
        assert_eq!(d.bbox(), [0.0, 0.0, 100.0, 80.0]);
        assert_relative_eq!(d.confidence, 0.7);
    }
}
