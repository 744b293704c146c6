use std::thread;
use std::time::Duration;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureError, FrameSource};

/// Input format used for camera devices when none is configured.
#[cfg(target_os = "linux")]
pub const DEFAULT_CAMERA_FORMAT: Option<&str> = Some("v4l2");
#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_FORMAT: Option<&str> = Some("avfoundation");
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_FORMAT: Option<&str> = Some("dshow");
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_FORMAT: Option<&str> = None;

#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";

/// Pulls frames from a camera (or any ffmpeg-readable stream) via
/// libavdevice + libavformat.
///
/// Each decoded picture is converted to RGB24. Frames are read on demand, so
/// the caller's loop naturally blocks on acquisition.
pub struct FfmpegCameraSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    next_index: usize,
    flushing: bool,
}

// Safety: FfmpegCameraSource is owned and driven by a single capture thread.
// The raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    /// Opens `device` with the named input format (`v4l2`, `avfoundation`,
    /// `dshow`...), or lets ffmpeg probe it when `format` is `None`.
    pub fn open(device: &str, format: Option<&str>) -> Result<Self, CaptureError> {
        let open_err = |reason: String| CaptureError::Open {
            source_name: device.to_string(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| open_err(e.to_string()))?;
        ffmpeg_next::device::register_all();

        let ictx = match format {
            Some(name) => {
                let input_format = ffmpeg_next::device::input::video()
                    .find(|f| f.name() == name)
                    .ok_or_else(|| open_err(format!("input format '{name}' is not available")))?;
                ffmpeg_next::format::open_with(
                    &device,
                    &ffmpeg_next::format::Format::Input(input_format),
                    ffmpeg_next::Dictionary::new(),
                )
                .map_err(|e| open_err(e.to_string()))?
                .input()
            }
            None => ffmpeg_next::format::input(&device).map_err(|e| open_err(e.to_string()))?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| open_err("no video stream found".into()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_err(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| open_err(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| open_err(e.to_string()))?;

        log::info!("Opened capture source {device} ({width}x{height})");

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            next_index: 0,
            flushing: false,
        })
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegCameraSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }
        if self.flushing {
            return Ok(None);
        }

        let mut not_ready = 0;
        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match classify_read(packet.read(&mut self.ictx))? {
                ReadStep::Packet => not_ready = 0,
                ReadStep::NotReady => {
                    not_ready += 1;
                    if not_ready > NOT_READY_LIMIT {
                        return Err(CaptureError::Read(format!(
                            "no packet from device after {} ms",
                            NOT_READY_LIMIT as u128 * NOT_READY_BACKOFF.as_millis()
                        )));
                    }
                    thread::sleep(NOT_READY_BACKOFF);
                    continue;
                }
                ReadStep::Exhausted => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    return self.try_receive();
                }
            }

            if packet.stream() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }
}

/// Wait before polling a device that had no packet ready.
const NOT_READY_BACKOFF: Duration = Duration::from_millis(5);
/// Consecutive empty polls before the device is treated as stalled.
const NOT_READY_LIMIT: u32 = 400;

#[derive(Debug, PartialEq, Eq)]
enum ReadStep {
    Packet,
    /// The device has no packet yet (avfoundation reports EAGAIN).
    NotReady,
    Exhausted,
}

/// Sorts the result of one packet read. Anything other than end of stream
/// or "try again" is a failed read.
fn classify_read(result: Result<(), ffmpeg_next::Error>) -> Result<ReadStep, CaptureError> {
    match result {
        Ok(()) => Ok(ReadStep::Packet),
        Err(ffmpeg_next::Error::Eof) => Ok(ReadStep::Exhausted),
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
            Ok(ReadStep::NotReady)
        }
        Err(e) => Err(CaptureError::Read(e.to_string())),
    }
}

/// Copies RGB24 rows out of a (possibly padded) ffmpeg picture.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
