pub const YOLO_MODEL_NAME: &str = "yolov8n-face-lindevs.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/lindevs/yolov8-face/releases/latest/download/yolov8n-face-lindevs.onnx";

/// Violation type recorded when a frame contains more than one face.
pub const MULTIPLE_FACES_VIOLATION: &str = "Multiple Faces Detected";

/// Faces above this count in a single frame constitute a violation.
pub const MAX_FACES_PER_FRAME: usize = 1;

/// Default confidence threshold (strict `>`) for counting and drawing faces.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

pub const DEFAULT_PORT: u16 = 5001;

pub const DEFAULT_STORE_PATH: &str = "proctoring.db";

pub const DISPLAY_WINDOW_TITLE: &str = "Proctor Face Detection";

pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
