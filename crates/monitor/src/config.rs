use std::path::PathBuf;

use clap::Parser;

use proctor_core::shared::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_FONT_PATH};
use proctor_core::video::infrastructure::ffmpeg_camera_source::{
    DEFAULT_CAMERA_DEVICE, DEFAULT_CAMERA_FORMAT,
};

/// Live face monitor: shows the camera feed with every detected face boxed.
/// Press `q` in the window to quit.
#[derive(Parser, Debug, Clone)]
#[command(name = "proctor-monitor", version)]
pub struct MonitorConfig {
    /// Camera device (`/dev/video0`, `0` on macOS, `video=<name>` on Windows).
    #[arg(long, env = "PROCTOR_CAMERA", default_value = DEFAULT_CAMERA_DEVICE)]
    pub camera: String,

    /// Show a still image instead of the camera feed.
    #[arg(long, conflicts_with_all = ["camera", "camera_format"])]
    pub image: Option<PathBuf>,

    /// ffmpeg input format for the camera. Platform default when unset.
    #[arg(long, env = "PROCTOR_CAMERA_FORMAT")]
    pub camera_format: Option<String>,

    /// Face model weights. Resolved from the cache or downloaded when unset.
    #[arg(long, env = "PROCTOR_MODEL")]
    pub model: Option<PathBuf>,

    /// Minimum confidence (exclusive) for a face to be boxed.
    #[arg(long, env = "PROCTOR_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f64,

    /// TrueType font for the confidence labels.
    #[arg(long, env = "PROCTOR_FONT", default_value = DEFAULT_FONT_PATH)]
    pub font: PathBuf,
}

impl MonitorConfig {
    pub fn input_format(&self) -> Option<&str> {
        self.camera_format.as_deref().or(DEFAULT_CAMERA_FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::try_parse_from(["proctor-monitor"]).unwrap();
        assert_eq!(config.camera, DEFAULT_CAMERA_DEVICE);
        assert_eq!(config.input_format(), DEFAULT_CAMERA_FORMAT);
        assert_eq!(config.confidence, 0.5);
        assert_eq!(config.font, PathBuf::from(DEFAULT_FONT_PATH));
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = MonitorConfig::try_parse_from([
            "proctor-monitor",
            "--camera",
            "rtsp://cam.local/stream",
            "--camera-format",
            "rtsp",
        ])
        .unwrap();
        assert_eq!(config.camera, "rtsp://cam.local/stream");
        assert_eq!(config.input_format(), Some("rtsp"));
    }

    #[test]
    fn test_image_conflicts_with_camera() {
        let config =
            MonitorConfig::try_parse_from(["proctor-monitor", "--image", "desk.jpg"]).unwrap();
        assert_eq!(config.image, Some(PathBuf::from("desk.jpg")));

        let both = MonitorConfig::try_parse_from([
            "proctor-monitor",
            "--image",
            "desk.jpg",
            "--camera",
            "/dev/video1",
        ]);
        assert!(both.is_err());
    }
}
