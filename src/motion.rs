// Frame-differencing motion detector.
// Keeps exactly one blurred grayscale reference frame (a sliding one-frame
// window, not a background model): a hand moving continuously lights up,
// a hand held still disappears after one frame.
use crate::types::{FrameBuffer, Observation};
use crate::vision::{self, Kernel};
use image::GrayImage;

const BLUR_KSIZE: usize = 21;
const DILATE_KSIZE: usize = 9;
const DILATE_ITERATIONS: usize = 2;

pub struct MotionDetector {
    previous: Option<GrayImage>,
    min_area: f32,
    threshold: u8,
    kernel: Kernel,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(1500.0, 30)
    }
}

impl MotionDetector {
    /// `min_area`: smallest region (px²) reported; `threshold`: binarisation level
    /// for the absolute difference.
    pub fn new(min_area: f32, threshold: u8) -> Self {
        Self {
            previous: None,
            min_area,
            threshold,
            kernel: Kernel::ellipse(DILATE_KSIZE),
        }
    }

    /// Regions that changed since the previous call. The first call after
    /// construction or `reset()` only primes the reference and returns nothing.
    /// Order of the returned observations is unspecified.
    pub fn detect(&mut self, frame: &FrameBuffer) -> Vec<Observation> {
        if frame.is_empty() {
            return Vec::new();
        }
        let gray = vision::gaussian_blur(&vision::to_gray(frame), BLUR_KSIZE);

        let Some(prev) = self.previous.replace(gray) else {
            return Vec::new();
        };
        let Some(current) = self.previous.as_ref() else {
            return Vec::new();
        };
        if prev.dimensions() != current.dimensions() {
            // Resolution changed under us: treat as a cold start.
            return Vec::new();
        }

        let mut diff = vision::abs_diff(&prev, current);
        vision::threshold_binary(&mut diff, self.threshold);
        let grown = vision::dilate(&diff, &self.kernel, DILATE_ITERATIONS);

        vision::find_blobs(&grown)
            .into_iter()
            .filter(|b| b.area() as f32 >= self.min_area)
            .filter_map(|b| {
                b.centroid().map(|center| Observation { center, area: b.area() as f32 })
            })
            .collect()
    }

    /// Drop the reference frame (call when switching scenes).
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rect, WHITE};

    fn with_square(x: i32, y: i32, side: i32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(320, 240);
        fb.fill_rect(Rect::new(x, y, side, side), WHITE);
        fb
    }

    #[test]
    fn first_call_is_always_empty() {
        let mut det = MotionDetector::default();
        assert!(det.detect(&with_square(100, 100, 60)).is_empty());
        assert_eq!(det.detect(&FrameBuffer::new(320, 240)).len(), 1);
    }

    #[test]
    fn detects_a_square_appearing() {
        let mut det = MotionDetector::default();
        det.detect(&FrameBuffer::new(320, 240));
        let found = det.detect(&with_square(100, 80, 60));
        assert_eq!(found.len(), 1);
        let (cx, cy) = found[0].center;
        assert!((cx - 130).abs() <= 3 && (cy - 110).abs() <= 3, "centre {:?}", found[0].center);
        assert!(found[0].area >= 1500.0);
    }

    #[test]
    fn identical_frames_yield_nothing() {
        let mut det = MotionDetector::default();
        let frame = with_square(50, 50, 80);
        det.detect(&FrameBuffer::new(320, 240));
        det.detect(&frame);
        assert!(det.detect(&frame).is_empty());
    }

    #[test]
    fn reset_restores_cold_start() {
        let mut det = MotionDetector::default();
        det.detect(&FrameBuffer::new(320, 240));
        det.reset();
        assert!(det.detect(&with_square(100, 80, 60)).is_empty());
    }

    #[test]
    fn small_changes_are_filtered_by_min_area() {
        let mut det = MotionDetector::new(50_000.0, 30);
        det.detect(&FrameBuffer::new(320, 240));
        assert!(det.detect(&with_square(100, 80, 30)).is_empty());
    }

    #[test]
    fn empty_frame_is_a_no_op() {
        let mut det = MotionDetector::default();
        assert!(det.detect(&FrameBuffer::new(0, 0)).is_empty());
        // Still cold: this frame only primes the reference.
        assert!(det.detect(&with_square(100, 80, 60)).is_empty());
    }

    #[test]
    fn object_inside_a_moving_outline_is_one_region() {
        let mut det = MotionDetector::default();
        let dark = FrameBuffer::new(640, 480);
        let mut scene = dark.clone();
        scene.fill_rect(Rect::new(120, 40, 400, 400), WHITE);
        scene.fill_rect(Rect::new(132, 52, 376, 376), 0);
        scene.fill_rect(Rect::new(280, 200, 80, 80), WHITE);

        det.detect(&dark);
        let found = det.detect(&scene);
        assert_eq!(found.len(), 1, "{found:?}");
        assert!(found[0].area > 150_000.0, "area {}", found[0].area);
        let (cx, cy) = found[0].center;
        assert!((cx - 320).abs() <= 3 && (cy - 240).abs() <= 3, "centre {:?}", found[0].center);
    }
}
