// Opens the kiosk camera and hands out mirrored frames ready for the games.
// Visual expectation: every `read_mirrored_frame()` is one 0x00RRGGBB frame,
// flipped left-right so moving your right hand moves the right side of the screen.

use crate::config::CameraConfig;
use crate::error::{Error, Result};
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};

/// A small wrapper around nokhwa::Camera so the main loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open the configured camera. Asks for the closest match to the configured
    /// format first; if the driver refuses, takes whatever runs fastest.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let index = CameraIndex::Index(config.index);
        let wanted = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            config.fps,
        );

        let mut cam = match Camera::new(index.clone(), RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted))) {
            Ok(cam) => cam,
            Err(e) => {
                tracing::warn!(error = %e, "requested camera format unavailable, falling back to highest frame rate");
                Camera::new(index, RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate))
                    .map_err(|e| Error::CameraInit(format!("create camera: {e}")))?
            }
        };

        cam.open_stream().map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        tracing::info!(
            index = config.index,
            width = actual.width(),
            height = actual.height(),
            fps = cam.frame_rate(),
            "camera opened"
        );
        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    /// Grab one frame, decode it to RGB and mirror it.
    pub fn next_frame(&mut self) -> Result<FrameBuffer> {
        let frame = self.cam.frame().map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;
        let (w, h) = rgb_img.dimensions();
        FrameBuffer::from_rgb_mirrored(w as usize, h as usize, rgb_img.as_raw())
            .ok_or_else(|| Error::CameraFrame(format!("short {w}x{h} frame")))
    }

    /// One mirrored frame, or `None` when this tick has nothing usable.
    /// Failures are logged and never escalate.
    pub fn read_mirrored_frame(&mut self) -> Option<FrameBuffer> {
        match self.next_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(error = %e, "camera frame dropped");
                None
            }
        }
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            tracing::debug!(error = %e, "camera stream did not stop cleanly");
        }
    }
}
