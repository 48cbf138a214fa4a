//! UI compositing on top of camera frames: cached text patches, translucent
//! shapes, progress bars, stars, bubbles and full-frame tints.
//!
//! One `Compositor` is shared (behind an `Rc`) by the menu and every game; the
//! glyph cache lives in a `RefCell` because all drawing happens on the single
//! frame-loop thread, one frame at a time.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::draw;
use crate::text::{FontRasterizer, GlyphCache, GlyphKey, GlyphPatch, GlyphRasterizer};
use crate::types::{channels, mix, rgb, FrameBuffer, Rect, BLACK, WHITE};

pub struct Compositor {
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
    cache: RefCell<GlyphCache>,
}

impl Compositor {
    pub fn new(rasterizer: Option<Box<dyn GlyphRasterizer>>, cache_capacity: usize) -> Self {
        Self { rasterizer, cache: RefCell::new(GlyphCache::with_capacity(cache_capacity)) }
    }

    /// No TrueType font: all text uses the built-in 5x7 font.
    pub fn fallback() -> Self {
        Self::new(None, crate::text::DEFAULT_GLYPH_CACHE_CAPACITY)
    }

    /// Use the first candidate that loads; otherwise degrade to the built-in
    /// font for the rest of the session.
    pub fn from_font_paths(paths: &[PathBuf], cache_capacity: usize) -> Self {
        for path in paths.iter().filter(|p| p.exists()) {
            match FontRasterizer::from_path(path) {
                Ok(font) => {
                    tracing::info!(font = %font.path().display(), "text font loaded");
                    return Self::new(Some(Box::new(font)), cache_capacity);
                }
                Err(e) => tracing::warn!(error = %e, "skipping font candidate"),
            }
        }
        tracing::warn!("no usable font found, text falls back to the built-in bitmap font");
        Self::new(None, cache_capacity)
    }

    pub fn has_font(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// (entries, patches built so far)
    pub fn cache_stats(&self) -> (usize, u64) {
        let cache = self.cache.borrow();
        (cache.len(), cache.rasterized())
    }

    /// The cached patch for this label, rasterizing it on first use.
    /// `None` in fallback mode.
    pub fn glyph_patch(&self, text: &str, size: u32, color: u32, shadow: bool) -> Option<Rc<GlyphPatch>> {
        let rasterizer = self.rasterizer.as_deref()?;
        let key = GlyphKey { text: text.to_owned(), size, color, shadow };
        let patch = self
            .cache
            .borrow_mut()
            .get_or_insert_with(key, || GlyphPatch::build(&rasterizer.rasterize(text, size), color, shadow));
        Some(patch)
    }

    // ---------------------------------- text -----------------------------------

    /// Pixel extent of `text` at `size`.
    pub fn measure_text(&self, text: &str, size: u32) -> (i32, i32) {
        match self.rasterizer.as_deref() {
            Some(r) => {
                let (w, h) = r.measure(text, size);
                (w as i32, h as i32)
            }
            None => draw::text_size_5x7(text, draw::scale_for_size(size)),
        }
    }

    /// Draw `text` with its top-left (or its centre, with `center`) at `pos`.
    pub fn draw_text(
        &self,
        frame: &mut FrameBuffer,
        text: &str,
        pos: (i32, i32),
        size: u32,
        color: u32,
        shadow: bool,
        center: bool,
    ) {
        if frame.is_empty() || text.is_empty() {
            return;
        }
        let Some(patch) = self.glyph_patch(text, size, color, shadow) else {
            self.draw_text_fallback(frame, text, pos, size, color, shadow, center);
            return;
        };
        let pad = patch.padding as i32;
        let (mut x, mut y) = pos;
        if center {
            x -= patch.text_width as i32 / 2 + pad;
            y -= patch.text_height as i32 / 2 + pad;
        } else {
            x -= pad;
            y -= pad;
        }
        blit_patch(frame, &patch, x, y);
    }

    fn draw_text_fallback(
        &self,
        frame: &mut FrameBuffer,
        text: &str,
        pos: (i32, i32),
        size: u32,
        color: u32,
        shadow: bool,
        center: bool,
    ) {
        let scale = draw::scale_for_size(size);
        let (tw, th) = draw::text_size_5x7(text, scale);
        let (mut x, mut y) = pos;
        if center {
            x -= tw / 2;
            y -= th / 2;
        }
        if shadow {
            draw::draw_text_5x7(frame, x + 2, y + 2, text, BLACK, scale);
        }
        draw::draw_text_5x7(frame, x, y, text, color, scale);
    }

    // --------------------------------- shapes ----------------------------------

    /// Rounded rectangle, filled when `thickness` is `None`. With `alpha < 1`
    /// the shape is drawn into a copy of its region and blended back.
    pub fn draw_rounded_rect(
        &self,
        frame: &mut FrameBuffer,
        rect: Rect,
        color: u32,
        radius: i32,
        thickness: Option<i32>,
        alpha: f32,
    ) {
        let r = radius.min(rect.w / 2).min(rect.h / 2).max(0);
        let paint = |fb: &mut FrameBuffer, local: Rect| match thickness {
            None => draw::fill_rounded_rect(fb, local, r, color),
            Some(t) => draw::stroke_rounded_rect(fb, local, r, color, t),
        };
        if alpha >= 1.0 {
            paint(frame, rect);
            return;
        }
        if alpha <= 0.0 {
            return;
        }
        let grow = thickness.unwrap_or(0).max(0);
        let area = Rect::new(rect.x - grow, rect.y - grow, rect.w + 1 + 2 * grow, rect.h + 1 + 2 * grow);
        let Some((region, mut roi)) = frame.crop(area) else { return };
        paint(&mut roi, Rect::new(rect.x - region.x, rect.y - region.y, rect.w, rect.h));
        frame.blend_region(region, &roi, alpha);
    }

    /// Rectangle outline made of `dash_len`-pixel dashes with equal gaps.
    pub fn draw_dashed_rect(&self, frame: &mut FrameBuffer, rect: Rect, color: u32, thickness: i32, dash_len: i32) {
        let (x0, y0, x1, y1) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
        for (a, b) in [((x0, y0), (x1, y0)), ((x1, y0), (x1, y1)), ((x1, y1), (x0, y1)), ((x0, y1), (x0, y0))] {
            dashed_line(frame, a, b, color, thickness, dash_len);
        }
    }

    /// Horizontal bar: background, `progress` (clamped to [0,1]) fill, white border.
    pub fn draw_progress_bar(
        &self,
        frame: &mut FrameBuffer,
        progress: f32,
        pos: (i32, i32),
        size: (i32, i32),
        bg_color: u32,
        fg_color: u32,
    ) {
        let (x, y) = pos;
        let (w, h) = size;
        let progress = progress.clamp(0.0, 1.0);
        frame.fill_rect(Rect::new(x, y, w + 1, h + 1), bg_color);
        let fw = (w as f32 * progress) as i32;
        if fw > 0 {
            frame.fill_rect(Rect::new(x, y, fw + 1, h + 1), fg_color);
        }
        draw::stroke_rect(frame, Rect::new(x, y, w, h), WHITE, 1);
    }

    /// Five-pointed star, point up; filled when `thickness` is `None`.
    pub fn draw_star(&self, frame: &mut FrameBuffer, center: (i32, i32), size: i32, color: u32, thickness: Option<i32>) {
        let (cx, cy) = (center.0 as f32, center.1 as f32);
        let outer = size as f32;
        let inner = outer * 0.4;
        let mut pts = Vec::with_capacity(10);
        for i in 0..5 {
            let a = (-90.0 + i as f32 * 72.0).to_radians();
            pts.push(((cx + outer * a.cos()) as i32, (cy + outer * a.sin()) as i32));
            let b = (-90.0 + i as f32 * 72.0 + 36.0).to_radians();
            pts.push(((cx + inner * b.cos()) as i32, (cy + inner * b.sin()) as i32));
        }
        match thickness {
            None => draw::fill_polygon(frame, &pts, color),
            Some(t) => draw::stroke_polygon(frame, &pts, color, t),
        }
    }

    /// Two-stroke tick mark centred near `center`.
    pub fn draw_checkmark(&self, frame: &mut FrameBuffer, center: (i32, i32), size: i32, color: u32, thickness: i32) {
        let (cx, cy) = center;
        let s = size;
        let p1 = (cx - s, cy);
        let p2 = (cx - s / 3, cy + s * 2 / 3);
        let p3 = (cx + s, cy - s * 2 / 3);
        draw::draw_line(frame, p1.0, p1.1, p2.0, p2.1, color, thickness);
        draw::draw_line(frame, p2.0, p2.1, p3.0, p3.1, color, thickness);
    }

    /// Glossy bubble: 40% tinted disc blended through a local region, a 2 px
    /// rim and two white highlights.
    pub fn draw_bubble(&self, frame: &mut FrameBuffer, center: (i32, i32), radius: i32, color: u32) {
        let (cx, cy) = center;
        let r = radius.max(1);
        let area = Rect::new(cx - r - 2, cy - r - 2, 2 * r + 5, 2 * r + 5);
        let Some((region, mut roi)) = frame.crop(area) else { return };
        draw::fill_circle(&mut roi, cx - region.x, cy - region.y, r, color);
        frame.blend_region(region, &roi, 0.4);

        draw::stroke_circle(frame, cx, cy, r, color, 2);
        draw::fill_circle(frame, cx - r / 3, cy - r / 3, (r / 5).max(3), WHITE);
        draw::fill_circle(frame, cx - r / 5, cy - r / 2, (r / 8).max(2), WHITE);
    }

    /// Tint the whole frame: `frame * (1 - alpha) + color * alpha`.
    pub fn draw_overlay(&self, frame: &mut FrameBuffer, alpha: f32, color: u32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let beta = 1.0 - alpha;
        let (r, g, b) = channels(color);
        let add = |c: u8| (c as f32 * alpha) as u16;
        let (ar, ag, ab) = (add(r), add(g), add(b));
        let scale = |c: u8, a: u16| ((c as f32 * beta).round() as u16 + a).min(255) as u8;
        for px in frame.pixels.iter_mut() {
            let (pr, pg, pb) = channels(*px);
            *px = rgb(scale(pr, ar), scale(pg, ag), scale(pb, ab));
        }
    }
}

/// Alpha-blend a patch with its top-left at (x, y), touching only the part
/// that lands inside the frame.
fn blit_patch(frame: &mut FrameBuffer, patch: &GlyphPatch, x: i32, y: i32) {
    let Some(clip) = Rect::new(x, y, patch.width as i32, patch.height as i32).clip(frame.width, frame.height) else {
        return;
    };
    for fy in clip.y..clip.y + clip.h {
        let py = (fy - y) as usize;
        let frame_row = fy as usize * frame.width;
        for fx in clip.x..clip.x + clip.w {
            let pi = py * patch.width + (fx - x) as usize;
            let a = patch.alpha[pi];
            if a <= 0.0 {
                continue;
            }
            let dst = &mut frame.pixels[frame_row + fx as usize];
            *dst = mix(*dst, patch.color[pi], a);
        }
    }
}

fn dashed_line(frame: &mut FrameBuffer, a: (i32, i32), b: (i32, i32), color: u32, thickness: i32, dash_len: i32) {
    let (dx, dy) = ((b.0 - a.0) as f32, (b.1 - a.1) as f32);
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1.0 || dash_len <= 0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let mut i = 0.0f32;
    let mut on = true;
    while i < length {
        let end = (i + dash_len as f32).min(length);
        if on {
            let (sx, sy) = ((a.0 as f32 + ux * i) as i32, (a.1 as f32 + uy * i) as i32);
            let (ex, ey) = ((a.0 as f32 + ux * end) as i32, (a.1 as f32 + uy * end) as i32);
            draw::draw_line(frame, sx, sy, ex, ey, color, thickness);
        }
        on = !on;
        i = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Coverage;
    use std::cell::Cell;

    /// Every character is a solid `size/2` x `size` block.
    struct BlockFont {
        calls: Rc<Cell<usize>>,
    }

    impl GlyphRasterizer for BlockFont {
        fn measure(&self, text: &str, size: u32) -> (u32, u32) {
            (text.chars().count() as u32 * size / 2, size)
        }

        fn rasterize(&self, text: &str, size: u32) -> Coverage {
            self.calls.set(self.calls.get() + 1);
            let (w, h) = self.measure(text, size);
            Coverage { width: w as usize, height: h as usize, alpha: vec![1.0; (w * h) as usize] }
        }
    }

    fn with_block_font() -> (Compositor, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (Compositor::new(Some(Box::new(BlockFont { calls: Rc::clone(&calls) })), 200), calls)
    }

    #[test]
    fn cached_patches_are_reused() {
        let (comp, calls) = with_block_font();
        let a = comp.glyph_patch("Score", 20, WHITE, true).unwrap();
        let b = comp.glyph_patch("Score", 20, WHITE, true).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
        comp.glyph_patch("Score", 20, WHITE, false).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn evicted_labels_are_rasterized_again() {
        let (comp, calls) = with_block_font();
        for i in 0..201 {
            comp.glyph_patch(&format!("{i}"), 10, WHITE, false);
        }
        assert_eq!(comp.cache_stats().0, 101);
        comp.glyph_patch("0", 10, WHITE, false);
        assert_eq!(calls.get(), 202);
        comp.glyph_patch("150", 10, WHITE, false);
        assert_eq!(calls.get(), 202);
    }

    #[test]
    fn text_is_blended_and_clipped() {
        let (comp, _) = with_block_font();
        let mut fb = FrameBuffer::new(40, 20);
        comp.draw_text(&mut fb, "AB", (5, 5), 10, WHITE, false, false);
        assert_eq!(fb.get(5, 5), Some(WHITE));
        assert_eq!(fb.get(14, 14), Some(WHITE));
        assert_eq!(fb.get(15, 5), Some(BLACK));

        // Half off-screen in every direction: must not panic, draws the visible part.
        comp.draw_text(&mut fb, "WIDE LABEL", (-30, -5), 10, rgb(1, 2, 3), true, false);
        comp.draw_text(&mut fb, "WIDE LABEL", (35, 15), 10, rgb(1, 2, 3), true, true);
        assert_eq!(fb.get(0, 0), Some(rgb(1, 2, 3)));
    }

    #[test]
    fn centred_text_straddles_the_anchor() {
        let (comp, _) = with_block_font();
        let mut fb = FrameBuffer::new(60, 40);
        comp.draw_text(&mut fb, "AB", (30, 20), 10, WHITE, false, true);
        assert_eq!(fb.get(25, 15), Some(WHITE));
        assert_eq!(fb.get(34, 24), Some(WHITE));
        assert_eq!(fb.get(36, 20), Some(BLACK));
    }

    #[test]
    fn fallback_font_measures_and_draws() {
        let comp = Compositor::fallback();
        assert!(!comp.has_font());
        assert_eq!(comp.measure_text("HI", 20), (22, 14));
        let mut fb = FrameBuffer::new(80, 40);
        comp.draw_text(&mut fb, "HI", (2, 2), 20, WHITE, true, false);
        assert_eq!(fb.get(2, 2), Some(WHITE));
        assert!(comp.glyph_patch("HI", 20, WHITE, false).is_none());
    }

    #[test]
    fn translucent_rect_blends_only_inside() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::new(50, 50);
        comp.draw_rounded_rect(&mut fb, Rect::new(10, 10, 20, 20), rgb(200, 100, 0), 0, None, 0.5);
        assert_eq!(fb.get(20, 20), Some(rgb(100, 50, 0)));
        assert_eq!(fb.get(40, 40), Some(BLACK));
    }

    #[test]
    fn overlay_tints_every_pixel() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::filled(4, 4, rgb(200, 200, 200));
        comp.draw_overlay(&mut fb, 0.5, rgb(100, 0, 0));
        assert!(fb.pixels.iter().all(|&p| p == rgb(150, 100, 100)));
    }

    #[test]
    fn bubble_stays_in_its_neighbourhood() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::new(200, 200);
        comp.draw_bubble(&mut fb, (100, 100), 40, rgb(100, 200, 250));
        assert_ne!(fb.get(120, 110), Some(BLACK));
        assert_eq!(fb.get(10, 10), Some(BLACK));
        // Partially off-screen bubbles are fine.
        comp.draw_bubble(&mut fb, (-20, 195), 40, rgb(100, 200, 250));
    }

    #[test]
    fn progress_bar_fill_tracks_progress() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::new(120, 30);
        comp.draw_progress_bar(&mut fb, 0.5, (10, 10), (100, 10), rgb(80, 80, 80), rgb(0, 220, 100));
        assert_eq!(fb.get(30, 15), Some(rgb(0, 220, 100)));
        assert_eq!(fb.get(90, 15), Some(rgb(80, 80, 80)));
        assert_eq!(fb.get(10, 10), Some(WHITE));
    }

    #[test]
    fn star_and_checkmark_draw_something() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::new(100, 100);
        comp.draw_star(&mut fb, (50, 50), 22, rgb(255, 220, 0), None);
        assert_eq!(fb.get(50, 50), Some(rgb(255, 220, 0)));
        comp.draw_checkmark(&mut fb, (50, 80), 10, WHITE, 4);
        assert!(fb.pixels.iter().any(|&p| p == WHITE));
    }

    #[test]
    fn dashed_rect_has_gaps() {
        let comp = Compositor::fallback();
        let mut fb = FrameBuffer::new(100, 20);
        comp.draw_dashed_rect(&mut fb, Rect::new(0, 5, 90, 10), WHITE, 1, 15);
        assert_eq!(fb.get(5, 5), Some(WHITE));
        assert_eq!(fb.get(20, 5), Some(BLACK));
        assert_eq!(fb.get(35, 5), Some(WHITE));
    }
}
