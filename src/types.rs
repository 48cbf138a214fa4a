// Core value types shared by detection, games and drawing.

/// Canonical session resolution; the games lay out their UI against the
/// actual frame size but spawn bubbles against this when no frame is known yet.
pub const CANONICAL_WIDTH: usize = 1280;
pub const CANONICAL_HEIGHT: usize = 720;

/// Key code for Escape, as delivered to `Game::on_key`.
pub const KEY_ESCAPE: u32 = 27;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Pack tightly packed RGB8 rows into 0x00RRGGBB pixels, flipped left to
    /// right so the screen behaves like a mirror. `None` if `raw` is too short.
    pub fn from_rgb_mirrored(width: usize, height: usize, raw: &[u8]) -> Option<Self> {
        if width == 0 || height == 0 || raw.len() < width * height * 3 {
            return None;
        }
        let mut pixels = Vec::with_capacity(width * height);
        for row in raw.chunks_exact(width * 3).take(height) {
            pixels.extend(row.chunks_exact(3).rev().map(|p| rgb(p[0], p[1], p[2])));
        }
        Some(Self { width, height, pixels })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.len() < self.width * self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    /// Fill an axis-aligned rectangle (clipped). Mostly useful for building
    /// synthetic frames.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let Some(r) = rect.clip(self.width, self.height) else { return };
        for y in r.y..r.y + r.h {
            let row = y as usize * self.width;
            self.pixels[row + r.x as usize..row + (r.x + r.w) as usize].fill(color);
        }
    }

    /// Copy the part of `rect` that lies inside the frame.
    /// Returns the clipped rectangle together with its pixels.
    pub fn crop(&self, rect: Rect) -> Option<(Rect, FrameBuffer)> {
        let r = rect.clip(self.width, self.height)?;
        let mut out = FrameBuffer::new(r.w as usize, r.h as usize);
        for y in 0..r.h as usize {
            let src = (r.y as usize + y) * self.width + r.x as usize;
            out.pixels[y * out.width..(y + 1) * out.width]
                .copy_from_slice(&self.pixels[src..src + out.width]);
        }
        Some((r, out))
    }

    /// `self[region] = src * alpha + self[region] * (1 - alpha)`.
    /// `region` must be the clipped rect returned by `crop` for `src`.
    pub fn blend_region(&mut self, region: Rect, src: &FrameBuffer, alpha: f32) {
        if region.w as usize != src.width || region.h as usize != src.height {
            return;
        }
        for y in 0..src.height {
            let dst_row = (region.y as usize + y) * self.width + region.x as usize;
            for x in 0..src.width {
                let d = &mut self.pixels[dst_row + x];
                *d = mix(*d, src.pixels[y * src.width + x], alpha);
            }
        }
    }
}

/// One detection result: centroid and area in pixels. Valid for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub center: (i32, i32),
    pub area: f32,
}

/// Axis-aligned rectangle in frame coordinates (x, y, width, height).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Intersection with a `width` x `height` frame, `None` when empty.
    pub fn clip(&self, width: usize, height: usize) -> Option<Rect> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x.saturating_add(self.w)).min(width as i32);
        let y2 = (self.y.saturating_add(self.h)).min(height as i32);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }

    pub fn area(&self) -> i64 {
        self.w.max(0) as i64 * self.h.max(0) as i64
    }
}

// ---------------------------- packed colour helpers ----------------------------

#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub const fn channels(c: u32) -> (u8, u8, u8) {
    (((c >> 16) & 0xFF) as u8, ((c >> 8) & 0xFF) as u8, (c & 0xFF) as u8)
}

/// `src * alpha + dst * (1 - alpha)` per channel, rounded.
#[inline]
pub fn mix(dst: u32, src: u32, alpha: f32) -> u32 {
    if alpha <= 0.0 {
        return dst;
    }
    if alpha >= 1.0 {
        return src;
    }
    let (dr, dg, db) = channels(dst);
    let (sr, sg, sb) = channels(src);
    let inv = 1.0 - alpha;
    let f = |s: u8, d: u8| (s as f32 * alpha + d as f32 * inv).round().clamp(0.0, 255.0) as u8;
    rgb(f(sr, dr), f(sg, dg), f(sb, db))
}

pub const WHITE: u32 = rgb(255, 255, 255);
pub const BLACK: u32 = rgb(0, 0, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_handles_offscreen_and_partial_rects() {
        assert_eq!(Rect::new(-10, -10, 5, 5).clip(100, 100), None);
        assert_eq!(Rect::new(90, -5, 20, 20).clip(100, 100), Some(Rect::new(90, 0, 10, 15)));
        assert_eq!(Rect::new(10, 10, 0, 5).clip(100, 100), None);
    }

    #[test]
    fn mix_is_weighted_average() {
        let out = mix(rgb(0, 0, 0), rgb(200, 100, 50), 0.5);
        assert_eq!(channels(out), (100, 50, 25));
        assert_eq!(mix(rgb(1, 2, 3), WHITE, 0.0), rgb(1, 2, 3));
        assert_eq!(mix(rgb(1, 2, 3), WHITE, 1.0), WHITE);
    }

    #[test]
    fn crop_and_blend_touch_only_the_region() {
        let mut fb = FrameBuffer::filled(8, 8, BLACK);
        let (region, mut roi) = fb.crop(Rect::new(6, 6, 5, 5)).unwrap();
        assert_eq!(region, Rect::new(6, 6, 2, 2));
        roi.pixels.fill(WHITE);
        fb.blend_region(region, &roi, 1.0);
        assert_eq!(fb.get(7, 7), Some(WHITE));
        assert_eq!(fb.get(5, 5), Some(BLACK));
    }

    #[test]
    fn camera_rows_are_mirrored() {
        let raw = [1, 0, 0, 2, 0, 0, 3, 0, 0, 4, 0, 0, 5, 0, 0, 6, 0, 0];
        let fb = FrameBuffer::from_rgb_mirrored(3, 2, &raw).unwrap();
        assert_eq!(fb.pixels, vec![rgb(3, 0, 0), rgb(2, 0, 0), rgb(1, 0, 0), rgb(6, 0, 0), rgb(5, 0, 0), rgb(4, 0, 0)]);
        assert!(FrameBuffer::from_rgb_mirrored(4, 2, &raw).is_none());
    }
}
