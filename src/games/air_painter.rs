//! Air Painter: coloured objects held up to the camera leave fading trails.

use std::collections::BTreeMap;
use std::rc::Rc;

use image::GrayImage;

use super::{Game, GameContext};
use crate::color::{track_all_colors, ColorId};
use crate::compositor::Compositor;
use crate::draw;
use crate::fx::{self, Particle, ParticleSystem};
use crate::types::{mix, rgb, FrameBuffer, Observation, WHITE};

/// Jumps longer than this (px) are tracking glitches and are not drawn.
pub const MAX_SEGMENT: f32 = 200.0;
pub const MIN_THICKNESS: i32 = 4;
pub const MAX_THICKNESS: i32 = 20;
/// Strongest weight the trail gets over the camera image.
pub const TRAIL_OPACITY: f32 = 0.8;

const DECAY_EVERY: u64 = 5;
const DECAY_STEP: u8 = 2;
/// Coverage below this clears the trail colour.
const FADED_BELOW: u8 = 10;
const SPARKLE_EVERY: u64 = 3;
const SPARKLES_PER_COLOR: usize = 2;

/// Stroke width for an object of `area` px²: bigger object, thicker brush.
pub fn stroke_thickness(area: f32) -> i32 {
    ((area / 3000.0 * 8.0) as i32).clamp(MIN_THICKNESS, MAX_THICKNESS)
}

/// Trail layer: colour plus how strongly it covers the camera image.
struct Canvas {
    color: FrameBuffer,
    coverage: GrayImage,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self { color: FrameBuffer::new(width, height), coverage: GrayImage::new(width as u32, height as u32) }
    }

    fn matches(&self, frame: &FrameBuffer) -> bool {
        self.color.width == frame.width && self.color.height == frame.height
    }

    fn clear(&mut self) {
        self.color.pixels.fill(0);
        self.coverage.fill(0);
    }

    fn stroke(&mut self, from: (i32, i32), to: (i32, i32), color: u32, thickness: i32) {
        let (w, h) = (self.color.width as i32, self.color.height as i32);
        let color_px = &mut self.color.pixels;
        let coverage = &mut self.coverage;
        draw::line_footprint(from.0, from.1, to.0, to.1, thickness, |x, y| {
            if x < 0 || y < 0 || x >= w || y >= h {
                return;
            }
            color_px[(y * w + x) as usize] = color;
            coverage.put_pixel(x as u32, y as u32, image::Luma([255]));
        });
    }

    fn decay(&mut self) {
        for (px, cov) in self.color.pixels.iter_mut().zip(self.coverage.iter_mut()) {
            *cov = cov.saturating_sub(DECAY_STEP);
            if *cov < FADED_BELOW {
                *px = 0;
            }
        }
    }

    /// `frame = frame * (1 - a) + trail * a` with `a = coverage / 255 * 0.8`.
    fn composite(&self, frame: &mut FrameBuffer) {
        for ((dst, &src), &cov) in frame.pixels.iter_mut().zip(&self.color.pixels).zip(self.coverage.iter()) {
            if cov == 0 {
                continue;
            }
            *dst = mix(*dst, src, cov as f32 / 255.0 * TRAIL_OPACITY);
        }
    }
}

pub struct AirPainter {
    compositor: Rc<Compositor>,
    fx: ParticleSystem,
    canvas: Option<Canvas>,
    prev_points: BTreeMap<ColorId, (i32, i32)>,
    sparkles: Vec<Particle>,
    frame_count: u64,
}

impl AirPainter {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            compositor: Rc::clone(&ctx.compositor),
            fx: ParticleSystem::new(ctx.make_rng()),
            canvas: None,
            prev_points: BTreeMap::new(),
            sparkles: Vec::new(),
            frame_count: 0,
        }
    }

    /// Where `color` was last seen, if it was seen in the previous frame.
    pub fn previous_point(&self, color: ColorId) -> Option<(i32, i32)> {
        self.prev_points.get(&color).copied()
    }

    /// Trail coverage at (x, y); 0 outside the canvas or before the first frame.
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.canvas
            .as_ref()
            .and_then(|c| c.coverage.get_pixel_checked(x, y))
            .map_or(0, |p| p[0])
    }

    /// Trail colour at (x, y), black where nothing is painted.
    pub fn trail_color_at(&self, x: i32, y: i32) -> u32 {
        self.canvas.as_ref().and_then(|c| c.color.get(x, y)).unwrap_or(0)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn paint(&mut self, detected: &BTreeMap<ColorId, Observation>) {
        let Some(canvas) = self.canvas.as_mut() else { return };
        for (&color, obs) in detected {
            let paint = color.display_rgb();
            if let Some(prev) = self.prev_points.get(&color) {
                let (dx, dy) = ((obs.center.0 - prev.0) as f32, (obs.center.1 - prev.1) as f32);
                if (dx * dx + dy * dy).sqrt() < MAX_SEGMENT {
                    canvas.stroke(*prev, obs.center, paint, stroke_thickness(obs.area));
                }
            }
            self.prev_points.insert(color, obs.center);

            if self.frame_count % SPARKLE_EVERY == 0 {
                let (x, y) = (obs.center.0 as f32, obs.center.1 as f32);
                let sparkles = self.fx.spawn_sparkle(x, y, paint, SPARKLES_PER_COLOR);
                self.sparkles.extend(sparkles);
            }
        }
        // A colour that dropped out must not be joined to where it reappears.
        self.prev_points.retain(|color, _| detected.contains_key(color));
    }

    /// Small dots down the left edge; a colour in view gets a bigger, ringed dot.
    fn draw_indicators(frame: &mut FrameBuffer, detected: &BTreeMap<ColorId, Observation>) {
        let (x, mut y) = (35, 80);
        for color in ColorId::PAINT {
            let active = detected.contains_key(&color);
            let r = if active { 15 } else { 10 };
            draw::fill_circle(frame, x, y, r, color.display_rgb());
            if active {
                draw::stroke_circle(frame, x, y, r + 3, WHITE, 2);
            }
            y += 40;
        }
    }
}

impl Game for AirPainter {
    fn on_frame(&mut self, frame: &mut FrameBuffer) {
        if frame.is_empty() {
            return;
        }
        self.frame_count += 1;
        if !self.canvas.as_ref().is_some_and(|c| c.matches(frame)) {
            if self.canvas.is_some() {
                tracing::debug!(width = frame.width, height = frame.height, "frame size changed, trail canvas restarted");
            }
            self.canvas = Some(Canvas::new(frame.width, frame.height));
            self.prev_points.clear();
        }

        let detected = track_all_colors(frame, &ColorId::PAINT);
        self.paint(&detected);

        if let Some(canvas) = self.canvas.as_mut() {
            if self.frame_count % DECAY_EVERY == 0 {
                canvas.decay();
            }
            canvas.composite(frame);
        }

        self.sparkles = fx::advance_and_draw(frame, std::mem::take(&mut self.sparkles));
        Self::draw_indicators(frame, &detected);

        let (w, h) = (frame.width as i32, frame.height as i32);
        let c = &self.compositor;
        c.draw_text(frame, "Air Painter", (w / 2, 30), 36, WHITE, true, true);
        c.draw_text(frame, "Wave a colourful toy to paint!  C = clear  ESC = back", (w / 2, h - 30), 20, rgb(180, 180, 180), false, true);
    }

    fn on_key(&mut self, key: u32) {
        if key == 'c' as u32 || key == 'C' as u32 {
            if let Some(canvas) = self.canvas.as_mut() {
                canvas.clear();
            }
            self.prev_points.clear();
            tracing::debug!("trail canvas cleared");
        }
    }

    fn reset(&mut self) {
        self.canvas = None;
        self.prev_points.clear();
        self.sparkles.clear();
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Rect;

    const BG: u32 = rgb(40, 40, 40);

    fn painter() -> AirPainter {
        let ctx = GameContext::new(Rc::new(Compositor::fallback()), Rc::new(ManualClock::new())).with_seed(9);
        AirPainter::new(&ctx)
    }

    /// 640x480 frame with a 60x60 block of `color` centred on (cx, cy).
    fn frame_with(color: ColorId, cx: i32, cy: i32) -> FrameBuffer {
        let mut fb = FrameBuffer::filled(640, 480, BG);
        fb.fill_rect(Rect::new(cx - 30, cy - 30, 60, 60), color.display_rgb());
        fb
    }

    fn empty_scene() -> FrameBuffer {
        FrameBuffer::filled(640, 480, BG)
    }

    #[test]
    fn thickness_follows_object_size() {
        assert_eq!(stroke_thickness(100.0), 4);
        assert_eq!(stroke_thickness(3000.0), 8);
        assert_eq!(stroke_thickness(6000.0), 16);
        assert_eq!(stroke_thickness(100_000.0), 20);
    }

    #[test]
    fn short_moves_draw_a_segment() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Red, 200, 240));
        assert!(p.previous_point(ColorId::Red).is_some());
        assert_eq!(p.coverage_at(275, 240), 0);
        p.on_frame(&mut frame_with(ColorId::Red, 350, 240));
        assert_eq!(p.coverage_at(275, 240), 255);
        assert_eq!(p.trail_color_at(275, 240), ColorId::Red.display_rgb());
    }

    #[test]
    fn long_jumps_are_not_drawn() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Blue, 100, 240));
        p.on_frame(&mut frame_with(ColorId::Blue, 500, 240));
        assert_eq!(p.coverage_at(300, 240), 0);
        let (x, _) = p.previous_point(ColorId::Blue).unwrap();
        assert!((x - 500).abs() <= 3);
    }

    #[test]
    fn losing_a_colour_forgets_its_position() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Green, 200, 240));
        p.on_frame(&mut empty_scene());
        assert_eq!(p.previous_point(ColorId::Green), None);
        p.on_frame(&mut frame_with(ColorId::Green, 300, 240));
        assert_eq!(p.coverage_at(250, 240), 0);
    }

    #[test]
    fn trail_fades_every_fifth_frame() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Yellow, 200, 240));
        p.on_frame(&mut frame_with(ColorId::Yellow, 300, 240));
        assert_eq!(p.coverage_at(250, 240), 255);
        p.on_frame(&mut empty_scene());
        p.on_frame(&mut empty_scene());
        assert_eq!(p.coverage_at(250, 240), 255);
        p.on_frame(&mut empty_scene());
        assert_eq!(p.frame_count(), 5);
        assert_eq!(p.coverage_at(250, 240), 253);
    }

    #[test]
    fn trail_is_blended_over_the_camera() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Red, 200, 240));
        p.on_frame(&mut frame_with(ColorId::Red, 300, 240));
        let mut out = empty_scene();
        p.on_frame(&mut out);
        assert_eq!(out.get(250, 240), Some(mix(BG, ColorId::Red.display_rgb(), 0.8)));
    }

    #[test]
    fn c_clears_immediately() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Red, 200, 240));
        p.on_frame(&mut frame_with(ColorId::Red, 300, 240));
        p.on_key('x' as u32);
        assert_eq!(p.coverage_at(250, 240), 255);
        p.on_key('C' as u32);
        assert_eq!(p.coverage_at(250, 240), 0);
        assert_eq!(p.trail_color_at(250, 240), 0);
        assert_eq!(p.previous_point(ColorId::Red), None);
    }

    #[test]
    fn new_frame_size_restarts_the_canvas() {
        let mut p = painter();
        p.on_frame(&mut frame_with(ColorId::Red, 200, 240));
        p.on_frame(&mut frame_with(ColorId::Red, 300, 240));
        p.on_frame(&mut FrameBuffer::filled(320, 240, BG));
        assert_eq!(p.coverage_at(250, 120), 0);
        assert_eq!(p.coverage_at(500, 400), 0);
    }
}
