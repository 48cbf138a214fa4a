//! Text rasterization and the glyph-patch cache.
//!
//! A [`GlyphRasterizer`] turns a string into an alpha coverage map; the
//! compositor colours that map (optionally with a drop shadow) into a
//! [`GlyphPatch`] and keeps it in a [`GlyphCache`] so the same label is only
//! rasterized once per session.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rusttype::{point, Font, Scale};

use crate::error::{Error, Result};
use crate::types::{channels, rgb};

/// Alpha coverage of a rendered string, row-major, values in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Coverage {
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<f32>,
}

/// Glyph-rendering collaborator.
pub trait GlyphRasterizer {
    /// Text extent in pixels at `size` px.
    fn measure(&self, text: &str, size: u32) -> (u32, u32);
    /// Coverage map exactly `measure(text, size)` in size.
    fn rasterize(&self, text: &str, size: u32) -> Coverage;
}

/// TrueType/OpenType (including the first face of a collection) via rusttype.
pub struct FontRasterizer {
    font: Font<'static>,
    path: PathBuf,
}

impl FontRasterizer {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let font = Font::try_from_vec_and_index(bytes, 0).ok_or_else(|| Error::Font {
            path: path.to_path_buf(),
            reason: "not a usable TrueType/OpenType font".into(),
        })?;
        Ok(Self { font, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        let scale = Scale::uniform(size as f32);
        let v = self.font.v_metrics(scale);
        let width = self
            .font
            .layout(text, scale, point(0.0, v.ascent))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        (width.ceil().max(0.0) as u32, (v.ascent - v.descent).ceil().max(0.0) as u32)
    }

    fn rasterize(&self, text: &str, size: u32) -> Coverage {
        let (w, h) = self.measure(text, size);
        let (w, h) = (w as usize, h as usize);
        let mut alpha = vec![0.0f32; w * h];
        let scale = Scale::uniform(size as f32);
        let v = self.font.v_metrics(scale);

        for g in self.font.layout(text, scale, point(0.0, v.ascent)) {
            let Some(bb) = g.pixel_bounding_box() else { continue };
            g.draw(|x, y, cov| {
                let px = x as i32 + bb.min.x;
                let py = y as i32 + bb.min.y;
                if px >= 0 && py >= 0 && (px as usize) < w && (py as usize) < h {
                    let a = &mut alpha[py as usize * w + px as usize];
                    *a = a.max(cov.min(1.0));
                }
            });
        }
        Coverage { width: w, height: h, alpha }
    }
}

/// Cache key: same text, size, colour and shadow flag always hit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub text: String,
    pub size: u32,
    pub color: u32,
    pub shadow: bool,
}

/// A coloured text image ready for alpha blending. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphPatch {
    pub color: Vec<u32>,
    pub alpha: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// Measured text extent (without padding).
    pub text_width: usize,
    pub text_height: usize,
    pub padding: usize,
}

const SHADOW_OFFSET: usize = 2;
const SHADOW_ALPHA: f32 = 200.0 / 255.0;

impl GlyphPatch {
    /// Colour a coverage map. With `shadow`, a black, semi-opaque copy offset
    /// by 2 px is laid down first and the main glyphs go over it.
    pub fn build(cov: &Coverage, color: u32, shadow: bool) -> Self {
        let pad = if shadow { 4 } else { 2 };
        let (pw, ph) = (cov.width + 2 * pad, cov.height + 2 * pad);
        let mut out_color = vec![color; pw * ph];
        let mut out_alpha = vec![0.0f32; pw * ph];
        let (cr, cg, cb) = channels(color);

        for y in 0..cov.height {
            for x in 0..cov.width {
                let a = cov.alpha[y * cov.width + x];
                if a <= 0.0 {
                    continue;
                }
                let idx = (y + pad) * pw + x + pad;
                out_alpha[idx] = a;
            }
        }

        if shadow {
            for y in 0..cov.height {
                for x in 0..cov.width {
                    let sa = cov.alpha[y * cov.width + x] * SHADOW_ALPHA;
                    if sa <= 0.0 {
                        continue;
                    }
                    let idx = (y + pad + SHADOW_OFFSET) * pw + x + pad + SHADOW_OFFSET;
                    // Main glyph "over" the shadow: colour is premultiplied main
                    // divided by the combined coverage, shadow contributes black.
                    let ma = out_alpha[idx];
                    let oa = ma + sa * (1.0 - ma);
                    let k = if oa > 0.0 { ma / oa } else { 0.0 };
                    out_color[idx] = rgb(
                        (cr as f32 * k).round() as u8,
                        (cg as f32 * k).round() as u8,
                        (cb as f32 * k).round() as u8,
                    );
                    out_alpha[idx] = oa;
                }
            }
        }

        Self {
            color: out_color,
            alpha: out_alpha,
            width: pw,
            height: ph,
            text_width: cov.width,
            text_height: cov.height,
            padding: pad,
        }
    }
}

/// Bounded map of rendered patches. When an insert finds the cache full, the
/// oldest half (by insertion order, not by last use) is dropped in one go.
pub struct GlyphCache {
    capacity: usize,
    entries: HashMap<GlyphKey, Rc<GlyphPatch>>,
    order: VecDeque<GlyphKey>,
    rasterized: u64,
}

pub const DEFAULT_GLYPH_CACHE_CAPACITY: usize = 200;

impl Default for GlyphCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GLYPH_CACHE_CAPACITY)
    }
}

impl GlyphCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            rasterized: 0,
        }
    }

    /// Cached patch for `key`, building it with `make` on a miss.
    pub fn get_or_insert_with(&mut self, key: GlyphKey, make: impl FnOnce() -> GlyphPatch) -> Rc<GlyphPatch> {
        if let Some(hit) = self.entries.get(&key) {
            return Rc::clone(hit);
        }
        if self.entries.len() >= self.capacity {
            let drop_n = self.entries.len() / 2;
            for old in self.order.drain(..drop_n) {
                self.entries.remove(&old);
            }
            tracing::debug!(dropped = drop_n, remaining = self.entries.len(), "glyph cache evicted oldest half");
        }
        let patch = Rc::new(make());
        self.rasterized += 1;
        self.order.push_back(key.clone());
        self.entries.insert(key, Rc::clone(&patch));
        patch
    }

    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many patches have been built (misses) so far.
    pub fn rasterized(&self) -> u64 {
        self.rasterized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WHITE;

    fn key(i: usize) -> GlyphKey {
        GlyphKey { text: format!("label {i}"), size: 24, color: WHITE, shadow: false }
    }

    fn square(n: usize) -> Coverage {
        Coverage { width: n, height: n, alpha: vec![1.0; n * n] }
    }

    #[test]
    fn patch_is_padded_around_the_text() {
        let plain = GlyphPatch::build(&square(3), WHITE, false);
        assert_eq!((plain.width, plain.height, plain.padding), (7, 7, 2));
        assert_eq!(plain.alpha[2 * 7 + 2], 1.0);
        assert_eq!(plain.alpha[0], 0.0);

        let shadowed = GlyphPatch::build(&square(3), WHITE, true);
        assert_eq!((shadowed.width, shadowed.padding), (11, 4));
        // Shadow-only pixel: below-right of the glyph, black and semi-opaque.
        let idx = (4 + 4) * 11 + 4 + 4;
        assert!((shadowed.alpha[idx] - SHADOW_ALPHA).abs() < 1e-6);
        assert_eq!(shadowed.color[idx], 0);
    }

    #[test]
    fn identical_keys_hit_the_same_patch() {
        let mut cache = GlyphCache::default();
        let a = cache.get_or_insert_with(key(1), || GlyphPatch::build(&square(2), WHITE, false));
        let b = cache.get_or_insert_with(key(1), || unreachable!("must be cached"));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.rasterized(), 1);
    }

    #[test]
    fn overflow_drops_the_oldest_half() {
        let mut cache = GlyphCache::with_capacity(200);
        for i in 0..201 {
            cache.get_or_insert_with(key(i), || GlyphPatch::build(&square(1), WHITE, false));
        }
        assert_eq!(cache.len(), 101);
        assert!(!cache.contains(&key(0)));
        assert!(!cache.contains(&key(99)));
        assert!(cache.contains(&key(100)));
        assert!(cache.contains(&key(200)));

        let before = cache.rasterized();
        cache.get_or_insert_with(key(0), || GlyphPatch::build(&square(1), WHITE, false));
        assert_eq!(cache.rasterized(), before + 1);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(FontRasterizer::from_path(Path::new("/definitely/not/here.ttf")).is_err());
    }
}
