//! Video frames and captured stills
//!
//! The engine does not own a camera. Hosts implement [`FrameSource`] over
//! whatever stream they have; the engine only grabs frames from it, and
//! encodes the final still as JPEG.

use crate::{MudraError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

/// One RGB24 video frame in native resolution
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB bytes, row-major, `width * height * 3` long
    pub rgb: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(MudraError::CameraError(format!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB",
                rgb.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self { width, height, rgb })
    }

    /// A solid-color frame, for demos and tests
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            rgb: data,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Format of an encoded still
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StillFormat {
    Jpeg,
}

/// An encoded still image ready for upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: StillFormat,
}

impl EncodedImage {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Encode a frame as JPEG at the given quality (1-100)
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<EncodedImage> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .write_image(
            &frame.rgb,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| MudraError::CaptureError(format!("JPEG encoding failed: {}", e)))?;

    Ok(EncodedImage {
        bytes,
        format: StillFormat::Jpeg,
    })
}

/// Source of live video frames, shared by detection ticks and the final grab
pub trait FrameSource: Send {
    /// Grab the current frame.
    ///
    /// Returns `Ok(None)` while the stream is not ready yet; a tick that sees
    /// `None` is a no-op. Errors indicate the stream itself failed.
    fn grab_frame(&mut self) -> Result<Option<VideoFrame>>;

    /// Native resolution of the stream
    fn native_size(&self) -> (u32, u32);
}

/// Frame source producing solid-color frames, for demos and tests
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    color: [u8; 3],
    ready: bool,
    frames_served: u64,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: [32, 96, 160],
            ready: true,
            frames_served: 0,
        }
    }

    /// A source whose stream never becomes ready
    pub fn never_ready(width: u32, height: u32) -> Self {
        Self {
            ready: false,
            ..Self::new(width, height)
        }
    }

    pub fn frames_served(&self) -> u64 {
        self.frames_served
    }
}

impl FrameSource for SyntheticFrameSource {
    fn grab_frame(&mut self) -> Result<Option<VideoFrame>> {
        if !self.ready {
            return Ok(None);
        }
        self.frames_served += 1;
        Ok(Some(VideoFrame::solid(self.width, self.height, self.color)))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_length_checked() {
        assert!(VideoFrame::new(4, 4, vec![0; 48]).is_ok());
        assert!(VideoFrame::new(4, 4, vec![0; 47]).is_err());
    }

    #[test]
    fn test_solid_frame() {
        let frame = VideoFrame::solid(2, 2, [10, 20, 30]);
        assert_eq!(frame.rgb.len(), 12);
        assert_eq!(&frame.rgb[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg_bytes() {
        let frame = VideoFrame::solid(8, 8, [200, 100, 50]);
        let still = encode_jpeg(&frame, 85).unwrap();
        assert!(!still.is_empty());
        // JPEG SOI marker
        assert_eq!(&still.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(still.format, StillFormat::Jpeg);
    }
}
