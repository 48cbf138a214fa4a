// Image operators shared by the motion detector and the colour tracker.
// Everything works on whole frames in plain loops: grayscale + blur for
// differencing, HSV for colour, binary morphology and blob moments.
// Inner loops walk whole rows so they stay branch-free away from the edges.
use crate::types::{channels, FrameBuffer, Rect};
use image::GrayImage;

/// Luma (BT.601 weights, 14-bit fixed point).
pub fn to_gray(frame: &FrameBuffer) -> GrayImage {
    let data: Vec<u8> = frame
        .pixels
        .iter()
        .take(frame.width * frame.height)
        .map(|&p| {
            let (r, g, b) = channels(p);
            ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14) as u8
        })
        .collect();
    GrayImage::from_raw(frame.width as u32, frame.height as u32, data)
        .unwrap_or_else(|| GrayImage::new(0, 0))
}

/// 1-D Gaussian taps for an odd `ksize`, fixed point summing to 1 << 16.
/// Sigma follows the usual "derive from kernel size" rule.
pub fn gaussian_kernel(ksize: usize) -> Vec<u32> {
    let ksize = ksize.max(1) | 1;
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let r = (ksize / 2) as i32;
    let raw: Vec<f32> = (-r..=r)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = raw.iter().sum();
    let mut taps: Vec<u32> = raw.iter().map(|v| (v / sum * 65536.0).round() as u32).collect();

    // Put the rounding drift on the centre tap so a flat image stays flat.
    let total: i64 = taps.iter().map(|&t| t as i64).sum();
    let c = r as usize;
    taps[c] = (taps[c] as i64 + 65536 - total) as u32;
    taps
}

/// Separable Gaussian blur, edges extended (clamped).
///
/// Both passes accumulate one tap at a time over a whole row in `u32`:
/// the horizontal pass keeps 8.8 fixed point (at most 255 << 8), so the
/// vertical sum stays below `65536 * 65280` and never overflows.
pub fn gaussian_blur(src: &GrayImage, ksize: usize) -> GrayImage {
    let (w, h) = (src.width() as usize, src.height() as usize);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let taps = gaussian_kernel(ksize);
    let r = taps.len() / 2;

    /* ---- Pass 1: horizontal over an edge-extended copy of each row ---- */
    let mut tmp = vec![0u16; w * h];
    let mut padded = vec![0u32; w + 2 * r];
    let mut acc = vec![0u32; w];
    for (row, dst) in src.as_raw().chunks_exact(w).zip(tmp.chunks_exact_mut(w)) {
        padded[..r].fill(row[0] as u32);
        padded[r + w..].fill(row[w - 1] as u32);
        for (p, &v) in padded[r..r + w].iter_mut().zip(row) {
            *p = v as u32;
        }
        acc.fill(0);
        for (k, &t) in taps.iter().enumerate() {
            for (a, &p) in acc.iter_mut().zip(&padded[k..k + w]) {
                *a += t * p;
            }
        }
        for (d, &a) in dst.iter_mut().zip(&acc) {
            *d = ((a + 128) >> 8) as u16;
        }
    }

    /* ---- Pass 2: vertical, whole rows at a time, back to 8 bits ---- */
    let mut out = vec![0u8; w * h];
    for (y, dst) in out.chunks_exact_mut(w).enumerate() {
        acc.fill(0);
        for (k, &t) in taps.iter().enumerate() {
            let sy = (y + k).saturating_sub(r).min(h - 1);
            for (a, &p) in acc.iter_mut().zip(&tmp[sy * w..sy * w + w]) {
                *a += t * p as u32;
            }
        }
        for (d, &a) in dst.iter_mut().zip(&acc) {
            *d = ((a as u64 + (1 << 23)) >> 24).min(255) as u8;
        }
    }
    GrayImage::from_raw(w as u32, h as u32, out).unwrap_or_else(|| GrayImage::new(0, 0))
}

/// `|a - b|` per pixel. Sizes must match; the result has `a`'s size.
pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let data = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&p, &q)| p.abs_diff(q))
        .collect();
    GrayImage::from_raw(a.width(), a.height(), data).unwrap_or_else(|| GrayImage::new(0, 0))
}

/// Binary threshold in place: `> thresh` becomes 255, everything else 0.
pub fn threshold_binary(img: &mut GrayImage, thresh: u8) {
    let data: &mut [u8] = &mut *img;
    for v in data.iter_mut() {
        *v = if *v > thresh { 255 } else { 0 };
    }
}

pub fn count_nonzero(img: &GrayImage) -> usize {
    img.as_raw().iter().filter(|&&v| v != 0).count()
}

// ------------------------------- morphology ----------------------------------

/// Structuring element stored as horizontal spans: one `(dy, half_width)` per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kernel {
    rows: Vec<(i32, i32)>,
}

impl Kernel {
    /// Elliptical element inscribed in a `size` x `size` box.
    pub fn ellipse(size: usize) -> Self {
        let size = size.max(1) | 1;
        let r = (size / 2) as i32;
        if r == 0 {
            return Self { rows: vec![(0, 0)] };
        }
        let inv_r2 = 1.0 / (r * r) as f32;
        let rows = (-r..=r)
            .map(|dy| {
                let dx = (r as f32 * (((r * r - dy * dy) as f32) * inv_r2).sqrt()).round() as i32;
                (dy, dx)
            })
            .collect();
        Self { rows }
    }

    /// Number of cells set in the element.
    pub fn cells(&self) -> usize {
        self.rows.iter().map(|&(_, hw)| (2 * hw + 1) as usize).sum()
    }

    /// Distinct half widths, each needing one horizontal pass.
    fn half_widths(&self) -> Vec<i32> {
        let mut hws: Vec<i32> = self.rows.iter().map(|&(_, hw)| hw).collect();
        hws.sort_unstable();
        hws.dedup();
        hws
    }
}

/// Binary dilation of a 0/255 mask. Outside the image counts as unset.
pub fn dilate(src: &GrayImage, kernel: &Kernel, iterations: usize) -> GrayImage {
    (0..iterations).fold(src.clone(), |cur, _| morph_once(&cur, kernel, 0, u8::max))
}

/// Binary erosion of a 0/255 mask. Outside the image counts as set, so
/// borders do not eat into regions touching the edge.
pub fn erode(src: &GrayImage, kernel: &Kernel, iterations: usize) -> GrayImage {
    (0..iterations).fold(src.clone(), |cur, _| morph_once(&cur, kernel, 255, u8::min))
}

/// One horizontal running max/min per distinct kernel half width, then each
/// output row folds the kernel's rows of those passes together. `pad` is what
/// lies outside the image and leaves `fold` unchanged.
fn morph_once(src: &GrayImage, kernel: &Kernel, pad: u8, fold: impl Fn(u8, u8) -> u8 + Copy) -> GrayImage {
    let (w, h) = (src.width() as usize, src.height() as usize);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let px = src.as_raw();
    let passes: Vec<(i32, Vec<u8>)> = kernel
        .half_widths()
        .into_iter()
        .map(|hw| (hw, running_extreme(px, w, hw.max(0) as usize, pad, fold)))
        .collect();

    let mut out = vec![pad; w * h];
    for (y, dst) in out.chunks_exact_mut(w).enumerate() {
        for &(dy, hw) in &kernel.rows {
            let yy = y as i32 + dy;
            if yy < 0 || yy >= h as i32 {
                continue;
            }
            let Some((_, pass)) = passes.iter().find(|(phw, _)| *phw == hw) else {
                continue;
            };
            let start = yy as usize * w;
            for (d, &s) in dst.iter_mut().zip(&pass[start..start + w]) {
                *d = fold(*d, s);
            }
        }
    }
    GrayImage::from_raw(w as u32, h as u32, out).unwrap_or_else(|| GrayImage::new(0, 0))
}

/// Max (dilate) or min (erode) over the window `[x - hw, x + hw]` of every
/// row, van Herk / Gil-Werman style: block-wise prefix and suffix extremes
/// give each window in two lookups, whatever its width.
fn running_extreme(src: &[u8], w: usize, hw: usize, pad: u8, fold: impl Fn(u8, u8) -> u8) -> Vec<u8> {
    if hw == 0 {
        return src.to_vec();
    }
    let k = 2 * hw + 1;
    let n = w + 2 * hw;
    let mut f = vec![pad; n];
    let mut pre = vec![pad; n];
    let mut suf = vec![pad; n];
    let mut out = vec![pad; src.len()];

    for (row, dst) in src.chunks_exact(w).zip(out.chunks_exact_mut(w)) {
        f[hw..hw + w].copy_from_slice(row);
        for j in 0..n {
            pre[j] = if j % k == 0 { f[j] } else { fold(pre[j - 1], f[j]) };
        }
        for j in (0..n).rev() {
            suf[j] = if j + 1 == n || (j + 1) % k == 0 { f[j] } else { fold(suf[j + 1], f[j]) };
        }
        for (i, d) in dst.iter_mut().enumerate() {
            *d = fold(suf[i], pre[i + k - 1]);
        }
    }
    out
}

// ----------------------------------- HSV -------------------------------------

/// HSV samples on the 8-bit scale: H in [0, 180], S and V in [0, 255].
#[derive(Clone, Debug)]
pub struct HsvImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<[u8; 3]>,
}

/// Integer RGB -> HSV, hue in half degrees, rounding halves up.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);
    if diff == 0 {
        return [0, 0, v as u8];
    }
    let s = (diff * 510 + v) / (2 * v);
    // Hue * diff, already shifted into [0, 180 * diff].
    let num = if v == r {
        30 * (g - b) + if g < b { 180 * diff } else { 0 }
    } else if v == g {
        60 * diff + 30 * (b - r)
    } else {
        120 * diff + 30 * (r - g)
    };
    let hue = ((2 * num + diff) / (2 * diff)).min(180);
    [hue as u8, s as u8, v as u8]
}

/// Convert the part of `rect` inside the frame to HSV. `None` for an empty region.
pub fn to_hsv(frame: &FrameBuffer, rect: Rect) -> Option<HsvImage> {
    let r = rect.clip(frame.width, frame.height)?;
    let mut data = Vec::with_capacity(r.area() as usize);
    for y in r.y..r.y + r.h {
        let start = y as usize * frame.width + r.x as usize;
        data.extend(frame.pixels[start..start + r.w as usize].iter().map(|&p| {
            let (cr, cg, cb) = channels(p);
            rgb_to_hsv(cr, cg, cb)
        }));
    }
    Some(HsvImage { width: r.w as usize, height: r.h as usize, data })
}

// ---------------------------------- blobs ------------------------------------

/// Raw image moments of one region, measured over its outer boundary
/// (holes included).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Blob {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Blob {
    pub fn area(&self) -> f64 {
        self.m00
    }

    /// Integer centroid; `None` for a degenerate (zero-mass) blob.
    pub fn centroid(&self) -> Option<(i32, i32)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(((self.m10 / self.m00) as i32, (self.m01 / self.m00) as i32))
    }
}

/// Horizontal stretch of set (or unset) pixels on row `y`; `x1` exclusive.
#[derive(Clone, Copy, Debug)]
struct Run {
    y: usize,
    x0: usize,
    x1: usize,
}

fn runs_of(mask: &GrayImage, set: bool) -> Vec<Run> {
    let w = mask.width() as usize;
    let mut runs = Vec::new();
    if w == 0 {
        return runs;
    }
    for (y, row) in mask.as_raw().chunks_exact(w).enumerate() {
        let mut x = 0;
        while x < w {
            if (row[x] != 0) != set {
                x += 1;
                continue;
            }
            let x0 = x;
            while x < w && (row[x] != 0) == set {
                x += 1;
            }
            runs.push(Run { y, x0, x1: x });
        }
    }
    runs
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Lower index wins, so every root is the first run of its region.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find_root(parent, a), find_root(parent, b));
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

/// Region root of every run. Touching runs on neighbouring rows are joined;
/// with `eight` set, diagonal contact counts too.
fn connect_runs(runs: &[Run], eight: bool) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..runs.len()).collect();
    let slack = eight as usize;
    let mut prev = 0..0;
    let mut i = 0;
    while i < runs.len() {
        let (start, y) = (i, runs[i].y);
        while i < runs.len() && runs[i].y == y {
            i += 1;
        }
        if !prev.is_empty() && runs[prev.start].y + 1 == y {
            let (mut p, mut c) = (prev.start, start);
            while p < prev.end && c < i {
                let (a, b) = (runs[p], runs[c]);
                if a.x0 < b.x1 + slack && b.x0 < a.x1 + slack {
                    union(&mut parent, p, c);
                }
                if a.x1 < b.x1 {
                    p += 1;
                } else {
                    c += 1;
                }
            }
        }
        prev = start..i;
    }
    (0..runs.len()).map(|r| find_root(&mut parent, r)).collect()
}

/// Set every unset pixel the border cannot reach (4-connected background),
/// so each region covers everything inside its outer boundary.
pub fn fill_holes(mask: &GrayImage) -> GrayImage {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut out = mask.clone();
    if w == 0 || h == 0 {
        return out;
    }
    let gaps = runs_of(mask, false);
    let roots = connect_runs(&gaps, false);
    let mut open = vec![false; gaps.len()];
    for (run, &root) in gaps.iter().zip(&roots) {
        if run.y == 0 || run.y + 1 == h || run.x0 == 0 || run.x1 == w {
            open[root] = true;
        }
    }
    let data: &mut [u8] = &mut *out;
    for (run, &root) in gaps.iter().zip(&roots) {
        if !open[root] {
            data[run.y * w + run.x0..run.y * w + run.x1].fill(255);
        }
    }
    out
}

/// Outer regions of a binary mask (8-connected, holes filled), in raster
/// discovery order. Anything lying inside another region's hole belongs to
/// that region.
pub fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
    let filled = fill_holes(mask);
    let runs = runs_of(&filled, true);
    let roots = connect_runs(&runs, true);
    let mut slot = vec![usize::MAX; runs.len()];
    let mut blobs: Vec<Blob> = Vec::new();
    for (run, &root) in runs.iter().zip(&roots) {
        if slot[root] == usize::MAX {
            slot[root] = blobs.len();
            blobs.push(Blob::default());
        }
        let blob = &mut blobs[slot[root]];
        let len = (run.x1 - run.x0) as f64;
        blob.m00 += len;
        blob.m10 += len * (run.x0 + run.x1 - 1) as f64 * 0.5;
        blob.m01 += len * run.y as f64;
    }
    blobs
}
