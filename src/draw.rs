// Software drawing straight into a FrameBuffer.
// Visual effects provided here:
// 1) Opaque pixels, thick lines, circles, rings and polygons.
// 2) Rounded rectangles (filled or outlined).
// 3) A 5x7 bitmap font, scaled in whole pixels, used when no TrueType font is available.
// Everything clips against the frame edges, so off-screen shapes are simply cut.

use crate::types::{FrameBuffer, Rect};

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Visit every pixel covered by a line of the given thickness.
/// Thin lines are plain Bresenham; thick ones stamp a disc at each step.
/// Pixels may be visited more than once.
pub fn line_footprint(x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, mut plot: impl FnMut(i32, i32)) {
    let r = thickness.max(1) / 2;
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if r == 0 {
            plot(x0, y0);
        } else {
            disc_footprint(x0, y0, r, &mut plot);
        }
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

fn disc_footprint(cx: i32, cy: i32, r: i32, plot: &mut impl FnMut(i32, i32)) {
    let r2 = r * r;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r2 {
                plot(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a line between (x0,y0) and (x1,y1).
/// Visual: a straight stroke `thickness` pixels wide appears on top of the image.
pub fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32, thickness: i32) {
    line_footprint(x0, y0, x1, y1, thickness, |x, y| put_pixel(fb, x, y, color));
}

/// Filled disc. Visual: a solid dot of radius `r`.
pub fn fill_circle(fb: &mut FrameBuffer, cx: i32, cy: i32, r: i32, color: u32) {
    if r < 0 {
        return;
    }
    disc_footprint(cx, cy, r, &mut |x, y| put_pixel(fb, x, y, color));
}

/// Circle outline centred on radius `r`, `thickness` pixels wide.
pub fn stroke_circle(fb: &mut FrameBuffer, cx: i32, cy: i32, r: i32, color: u32, thickness: i32) {
    let half = thickness.max(1) as f32 / 2.0;
    let outer = r as f32 + half;
    let inner = (r as f32 - half).max(0.0);
    let (o2, i2) = (outer * outer, inner * inner);
    let reach = outer.ceil() as i32;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let d2 = (dx * dx + dy * dy) as f32;
            if d2 <= o2 && d2 >= i2 {
                put_pixel(fb, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Scanline fill of a closed polygon (even-odd rule).
pub fn fill_polygon(fb: &mut FrameBuffer, pts: &[(i32, i32)], color: u32) {
    if pts.len() < 3 {
        return;
    }
    let y_min = pts.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let y_max = pts.iter().map(|p| p.1).max().unwrap_or(0).min(fb.height as i32 - 1);
    let mut xs: Vec<f32> = Vec::with_capacity(pts.len());
    for y in y_min..=y_max {
        let yc = y as f32 + 0.5;
        xs.clear();
        for i in 0..pts.len() {
            let (ax, ay) = pts[i];
            let (bx, by) = pts[(i + 1) % pts.len()];
            let (ayf, byf) = (ay as f32, by as f32);
            if (ayf <= yc && byf > yc) || (byf <= yc && ayf > yc) {
                let t = (yc - ayf) / (byf - ayf);
                xs.push(ax as f32 + t * (bx - ax) as f32);
            }
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        for pair in xs.chunks_exact(2) {
            let x_start = pair[0].round() as i32;
            let x_end = pair[1].round() as i32;
            for x in x_start..=x_end {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// Outline of a closed polygon.
pub fn stroke_polygon(fb: &mut FrameBuffer, pts: &[(i32, i32)], color: u32, thickness: i32) {
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[(i + 1) % pts.len()]);
        draw_line(fb, a.0, a.1, b.0, b.1, color, thickness);
    }
}

/// Outline of an axis-aligned rectangle (corners inclusive).
pub fn stroke_rect(fb: &mut FrameBuffer, rect: Rect, color: u32, thickness: i32) {
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
    stroke_polygon(fb, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], color, thickness);
}

/// Is (px,py) inside the rectangle with corners rounded to radius `r`?
/// The rectangle spans `x..=x+w`, `y..=y+h`.
#[inline]
pub fn rounded_rect_contains(px: i32, py: i32, rect: Rect, r: i32) -> bool {
    if !rect.contains(px, py) {
        return false;
    }
    let r = r.min(rect.w / 2).min(rect.h / 2).max(0);
    if r == 0 {
        return true;
    }
    // Nearest point of the inner (unrounded) core rectangle.
    let cx = px.clamp(rect.x + r, rect.x + rect.w - r);
    let cy = py.clamp(rect.y + r, rect.y + rect.h - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

pub fn fill_rounded_rect(fb: &mut FrameBuffer, rect: Rect, r: i32, color: u32) {
    let Some(clip) = Rect::new(rect.x, rect.y, rect.w + 1, rect.h + 1).clip(fb.width, fb.height) else {
        return;
    };
    for y in clip.y..clip.y + clip.h {
        for x in clip.x..clip.x + clip.w {
            if rounded_rect_contains(x, y, rect, r) {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

pub fn stroke_rounded_rect(fb: &mut FrameBuffer, rect: Rect, r: i32, color: u32, thickness: i32) {
    let t = thickness.max(1);
    let half = t / 2;
    let outer = Rect::new(rect.x - half, rect.y - half, rect.w + 2 * half, rect.h + 2 * half);
    let inner = Rect::new(rect.x + (t - half), rect.y + (t - half), rect.w - 2 * (t - half), rect.h - 2 * (t - half));
    let r_outer = r + half;
    let r_inner = (r - (t - half)).max(0);
    let Some(clip) = Rect::new(outer.x, outer.y, outer.w + 1, outer.h + 1).clip(fb.width, fb.height) else {
        return;
    };
    for y in clip.y..clip.y + clip.h {
        for x in clip.x..clip.x + clip.w {
            let in_inner = inner.w > 0 && inner.h > 0 && rounded_rect_contains(x, y, inner, r_inner);
            if rounded_rect_contains(x, y, outer, r_outer) && !in_inner {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/* ---------- 5x7 bitmap font (upper-case ASCII, digits, common punctuation) ---------- */

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;
const ADVANCE: i32 = GLYPH_W + 1;

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
/// Lower-case letters share the upper-case shapes.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '<' => g!(0b00010,0b00100,0b01000,0b10000,0b01000,0b00100,0b00010),
        '>' => g!(0b01000,0b00100,0b00010,0b00001,0b00010,0b00100,0b01000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),

        _ => None,
    }
}

/// Pixel scale that makes the 5x7 font roughly match a TrueType `size`.
pub fn scale_for_size(size: u32) -> i32 {
    ((size as i32 + 5) / 10).max(1)
}

/// Width and height of `text` in the 5x7 font at `scale`.
pub fn text_size_5x7(text: &str, scale: i32) -> (i32, i32) {
    let n = text.chars().count() as i32;
    if n == 0 {
        return (0, GLYPH_H * scale);
    }
    ((n * ADVANCE - 1) * scale, GLYPH_H * scale)
}

/// Draw a single 5x7 character with its top-left at (x,y); each font pixel is a
/// `scale` x `scale` block.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..GLYPH_W {
            if (*rowbits >> (4 - rx)) & 1 == 0 {
                continue;
            }
            let (bx, by) = (x + rx * scale, y + ry as i32 * scale);
            for sy in 0..scale {
                for sx in 0..scale {
                    put_pixel(fb, bx + sx, by + sy, color);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
/// Visual: blocky text; each glyph is 5x7 font pixels with 1 pixel of spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color, scale);
        x += ADVANCE * scale;
    }
}
