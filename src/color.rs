// HSV colour tracking: a fixed table of colour ranges, largest-blob tracking
// for one or several colours, and a coarse "how much of this colour is in the
// box" ratio used by the colour-matching game.
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::types::{rgb, FrameBuffer, Observation, Rect};
use crate::vision::{self, HsvImage, Kernel};
use image::GrayImage;

/// Blobs smaller than this (px²) are treated as "colour not present".
pub const MIN_CONTOUR_AREA: f32 = 800.0;

const MORPH_KSIZE: usize = 5;
const ERODE_ITERATIONS: usize = 1;
const DILATE_ITERATIONS: usize = 2;

type HsvRange = ([u8; 3], [u8; 3]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorId {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
}

impl ColorId {
    /// Every colour the tracker knows.
    pub const ALL: [ColorId; 6] = [
        ColorId::Red,
        ColorId::Blue,
        ColorId::Green,
        ColorId::Yellow,
        ColorId::Orange,
        ColorId::Purple,
    ];

    /// Colours that are easy to find around the house; used for painting.
    pub const PAINT: [ColorId; 4] = [ColorId::Red, ColorId::Blue, ColorId::Green, ColorId::Yellow];

    /// Inclusive HSV intervals. Red straddles hue 0/180 and needs two.
    pub fn ranges(self) -> &'static [HsvRange] {
        match self {
            ColorId::Red => &[([0, 120, 70], [10, 255, 255]), ([170, 120, 70], [180, 255, 255])],
            ColorId::Blue => &[([100, 120, 70], [130, 255, 255])],
            ColorId::Green => &[([35, 80, 70], [85, 255, 255])],
            ColorId::Yellow => &[([20, 100, 100], [35, 255, 255])],
            ColorId::Orange => &[([10, 120, 100], [20, 255, 255])],
            ColorId::Purple => &[([130, 80, 70], [170, 255, 255])],
        }
    }

    /// Colour used to draw this id on screen (lies inside its own range).
    pub fn display_rgb(self) -> u32 {
        match self {
            ColorId::Red => rgb(255, 0, 0),
            ColorId::Blue => rgb(0, 100, 255),
            ColorId::Green => rgb(0, 200, 0),
            ColorId::Yellow => rgb(255, 255, 0),
            ColorId::Orange => rgb(255, 140, 0),
            ColorId::Purple => rgb(200, 50, 200),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorId::Red => "red",
            ColorId::Blue => "blue",
            ColorId::Green => "green",
            ColorId::Yellow => "yellow",
            ColorId::Orange => "orange",
            ColorId::Purple => "purple",
        }
    }
}

/// Per-channel membership bits for every (colour, range) pair. A pixel lies in
/// range `i` when bit `i` is set in the H, S and V entries alike, so one AND of
/// three table lookups tests every colour at once.
struct RangeTable {
    h: [u8; 256],
    s: [u8; 256],
    v: [u8; 256],
    bits: [u8; ColorId::ALL.len()],
}

impl RangeTable {
    fn build() -> Self {
        let mut table = Self { h: [0; 256], s: [0; 256], v: [0; 256], bits: [0; ColorId::ALL.len()] };
        let mut next = 0;
        for color in ColorId::ALL {
            for &(lower, upper) in color.ranges() {
                let bit = 1u8 << next;
                next += 1;
                table.bits[color as usize] |= bit;
                for (lut, ch) in [(&mut table.h, 0), (&mut table.s, 1), (&mut table.v, 2)] {
                    for value in lower[ch]..=upper[ch] {
                        lut[value as usize] |= bit;
                    }
                }
            }
        }
        table
    }

    fn get() -> &'static Self {
        static TABLE: OnceLock<RangeTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    #[inline]
    fn hits(&self, px: [u8; 3]) -> u8 {
        self.h[px[0] as usize] & self.s[px[1] as usize] & self.v[px[2] as usize]
    }

    #[inline]
    fn contains(&self, color: ColorId, px: [u8; 3]) -> bool {
        self.hits(px) & self.bits[color as usize] != 0
    }
}

/// Raw in-range masks for several colours from a single pass over the pixels.
fn raw_masks(hsv: &HsvImage, colors: &[ColorId]) -> Vec<GrayImage> {
    let table = RangeTable::get();
    let mut masks = vec![vec![0u8; hsv.data.len()]; colors.len()];
    for (i, &px) in hsv.data.iter().enumerate() {
        let hits = table.hits(px);
        if hits == 0 {
            continue;
        }
        for (mask, &color) in masks.iter_mut().zip(colors) {
            if hits & table.bits[color as usize] != 0 {
                mask[i] = 255;
            }
        }
    }
    masks
        .into_iter()
        .map(|m| {
            GrayImage::from_raw(hsv.width as u32, hsv.height as u32, m)
                .unwrap_or_else(|| GrayImage::new(0, 0))
        })
        .collect()
}

/// Erode once / dilate twice to drop speckles and reconnect fragments.
/// An empty mask is returned as is.
fn clean(mask: GrayImage) -> GrayImage {
    if mask.as_raw().iter().all(|&v| v == 0) {
        return mask;
    }
    let kernel = Kernel::ellipse(MORPH_KSIZE);
    let mask = vision::erode(&mask, &kernel, ERODE_ITERATIONS);
    vision::dilate(&mask, &kernel, DILATE_ITERATIONS)
}

fn color_mask(hsv: &HsvImage, color: ColorId) -> GrayImage {
    let raw = raw_masks(hsv, &[color]).pop().unwrap_or_else(|| GrayImage::new(0, 0));
    clean(raw)
}

fn largest_blob(mask: &GrayImage) -> Option<Observation> {
    let largest = vision::find_blobs(mask)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))?;
    let area = largest.area() as f32;
    if area < MIN_CONTOUR_AREA {
        return None;
    }
    let center = largest.centroid()?;
    Some(Observation { center, area })
}

/// Largest blob of `color`, or `None` when nothing big enough is visible.
/// The area covers the blob's whole outline, holes included.
pub fn track_color(frame: &FrameBuffer, color: ColorId) -> Option<Observation> {
    let hsv = vision::to_hsv(frame, frame.bounds())?;
    largest_blob(&color_mask(&hsv, color))
}

/// Track several colours off one HSV conversion and one range pass. Only
/// colours that pass the area threshold appear in the map.
pub fn track_all_colors(frame: &FrameBuffer, colors: &[ColorId]) -> BTreeMap<ColorId, Observation> {
    let Some(hsv) = vision::to_hsv(frame, frame.bounds()) else {
        return BTreeMap::new();
    };
    colors
        .iter()
        .zip(raw_masks(&hsv, colors))
        .filter_map(|(&c, raw)| largest_blob(&clean(raw)).map(|obs| (c, obs)))
        .collect()
}

/// Fraction of `roi` covered by `color`, in `[0, 1]`. The ROI is clipped to
/// the frame; an empty ROI yields 0.
pub fn detect_color_ratio(frame: &FrameBuffer, roi: Rect, color: ColorId) -> f32 {
    let Some(hsv) = vision::to_hsv(frame, roi) else {
        return 0.0;
    };
    let total = hsv.width * hsv.height;
    if total == 0 {
        return 0.0;
    }
    let hits = vision::count_nonzero(&color_mask(&hsv, color));
    (hits as f32 / total as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_blob(color: ColorId, x: i32, y: i32, side: i32) -> FrameBuffer {
        let mut fb = FrameBuffer::filled(320, 240, rgb(40, 40, 40));
        fb.fill_rect(Rect::new(x, y, side, side), color.display_rgb());
        fb
    }

    #[test]
    fn display_colours_fall_inside_their_own_ranges() {
        for c in ColorId::ALL {
            let fb = FrameBuffer::filled(16, 16, c.display_rgb());
            assert!(detect_color_ratio(&fb, fb.bounds(), c) > 0.99, "{}", c.name());
        }
    }

    #[test]
    fn small_blob_is_ignored() {
        let fb = frame_with_blob(ColorId::Blue, 50, 50, 20);
        assert_eq!(track_color(&fb, ColorId::Blue), None);
    }

    #[test]
    fn large_blob_reports_its_centre() {
        let fb = frame_with_blob(ColorId::Red, 100, 60, 60);
        let obs = track_color(&fb, ColorId::Red).expect("red blob");
        assert!((obs.center.0 - 130).abs() <= 3);
        assert!((obs.center.1 - 90).abs() <= 3);
        assert!(obs.area >= MIN_CONTOUR_AREA);
    }

    #[test]
    fn track_color_picks_the_largest_blob() {
        let mut fb = frame_with_blob(ColorId::Green, 20, 20, 40);
        fb.fill_rect(Rect::new(200, 120, 70, 70), ColorId::Green.display_rgb());
        let obs = track_color(&fb, ColorId::Green).unwrap();
        assert!((obs.center.0 - 235).abs() <= 3);
    }

    #[test]
    fn track_all_returns_only_present_colours() {
        let mut fb = frame_with_blob(ColorId::Red, 20, 20, 50);
        fb.fill_rect(Rect::new(200, 100, 50, 50), ColorId::Yellow.display_rgb());
        let found = track_all_colors(&fb, &ColorId::PAINT);
        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![ColorId::Red, ColorId::Yellow]);
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let fb = frame_with_blob(ColorId::Purple, 0, 0, 100);
        assert!(detect_color_ratio(&fb, Rect::new(0, 0, 100, 100), ColorId::Purple) > 0.95);
        assert!(detect_color_ratio(&fb, Rect::new(150, 150, 50, 50), ColorId::Purple) < 0.01);
        let half = detect_color_ratio(&fb, Rect::new(0, 0, 200, 100), ColorId::Purple);
        assert!((0.4..=0.6).contains(&half), "{half}");
        assert_eq!(detect_color_ratio(&fb, Rect::new(500, 500, 10, 10), ColorId::Purple), 0.0);
        assert_eq!(detect_color_ratio(&fb, Rect::new(10, 10, 0, 10), ColorId::Purple), 0.0);
    }

    #[test]
    fn range_table_agrees_with_the_interval_list() {
        let table = RangeTable::get();
        for h in (0..=180u8).step_by(3) {
            for s in (0..=255u8).step_by(17) {
                for v in (0..=255u8).step_by(17) {
                    for c in ColorId::ALL {
                        let want = c.ranges().iter().any(|&(lo, hi)| {
                            (0..3).all(|i| [h, s, v][i] >= lo[i] && [h, s, v][i] <= hi[i])
                        });
                        assert_eq!(table.contains(c, [h, s, v]), want, "{} at {h},{s},{v}", c.name());
                    }
                }
            }
        }
    }

    #[test]
    fn hollow_ring_reports_its_enclosed_area() {
        let mut fb = FrameBuffer::filled(320, 240, rgb(40, 40, 40));
        fb.fill_rect(Rect::new(60, 20, 200, 200), ColorId::Red.display_rgb());
        fb.fill_rect(Rect::new(80, 40, 160, 160), rgb(40, 40, 40));
        let obs = track_color(&fb, ColorId::Red).expect("red ring");
        assert!((36_000.0..48_000.0).contains(&obs.area), "area {}", obs.area);
        assert!((obs.center.0 - 160).abs() <= 3 && (obs.center.1 - 120).abs() <= 3);
    }

    #[test]
    fn shared_pass_matches_single_colour_tracking() {
        let mut fb = frame_with_blob(ColorId::Blue, 10, 10, 60);
        fb.fill_rect(Rect::new(150, 100, 80, 50), ColorId::Orange.display_rgb());
        let all = track_all_colors(&fb, &ColorId::ALL);
        for c in ColorId::ALL {
            assert_eq!(all.get(&c).copied(), track_color(&fb, c), "{}", c.name());
        }
    }
}
