use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureError, FrameSource};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes an encoded image (JPEG, PNG, BMP, WebP, TIFF...) into an RGB frame.
///
/// The format is sniffed from the bytes; file names and content types are
/// not trusted.
pub fn decode_image(bytes: &[u8]) -> Result<Frame, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let image = image::load_from_memory(bytes)?;
    Ok(Frame::from_rgb_image(image.into_rgb8(), 0))
}

/// Adapts a single image file to the [`FrameSource`] interface: yields the
/// decoded image once, then reports exhaustion.
pub struct ImageFileSource {
    path: PathBuf,
    consumed: bool,
}

impl ImageFileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            consumed: false,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;

        let bytes = std::fs::read(&self.path).map_err(|e| CaptureError::Open {
            source_name: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        decode_image(&bytes)
            .map(Some)
            .map_err(|e| CaptureError::Read(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png_to_rgb_frame() {
        let frame = decode_image(&encode_png(100, 80)).unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
        assert_eq!(frame.channels(), 3);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_decode_empty_payload() {
        assert!(matches!(decode_image(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_garbage_payload() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_image_file_source_yields_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, encode_png(20, 10)).unwrap();

        let mut source = ImageFileSource::new(&path);
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.width(), 20);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_image_file_source_missing_file() {
        let mut source = ImageFileSource::new(Path::new("/nonexistent/frame.png"));
        assert!(matches!(source.next_frame(), Err(CaptureError::Open { .. })));
    }
}
