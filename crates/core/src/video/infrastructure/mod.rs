pub mod ffmpeg_camera_source;
pub mod image_decoder;
