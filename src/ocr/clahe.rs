//! Contrast-limited adaptive histogram equalization.
//!
//! The image is split into a grid of tiles. Each tile gets its own
//! equalization lookup table built from a clipped histogram, and every pixel
//! is mapped by bilinear interpolation between the four nearest tile tables,
//! so tile seams do not show.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Applies CLAHE to a grayscale image.
///
/// `clip_limit` is relative to a uniform histogram: a bin may hold at most
/// `clip_limit * tile_area / 256` pixels before the excess is redistributed.
/// `grid` is (columns, rows); it is reduced when the image is smaller than
/// the grid so every tile holds at least one pixel.
pub fn apply_clahe(image: &GrayImage, clip_limit: f32, grid: (u32, u32)) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tiles_x = grid.0.clamp(1, width);
    let tiles_y = grid.1.clamp(1, height);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, x1) = tile_span(tx, tiles_x, width);
            let (y0, y1) = tile_span(ty, tiles_y, height);
            luts.push(tile_lut(image, (x0, x1), (y0, y1), clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;
    let lut_at = |tx: usize, ty: usize, v: usize| luts[ty * tiles_x as usize + tx][v] as f32;

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let v = pixel[0] as usize;

        let (tx1, tx2, wx) = neighbours(x as f32 / tile_w - 0.5, tiles_x);
        let (ty1, ty2, wy) = neighbours(y as f32 / tile_h - 0.5, tiles_y);

        let top = lut_at(tx1, ty1, v) * (1.0 - wx) + lut_at(tx2, ty1, v) * wx;
        let bottom = lut_at(tx1, ty2, v) * (1.0 - wx) + lut_at(tx2, ty2, v) * wx;
        let value = top * (1.0 - wy) + bottom * wy;

        output.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    output
}

/// Half-open pixel range covered by tile `index` of `count` along a side of `len`.
fn tile_span(index: u32, count: u32, len: u32) -> (u32, u32) {
    let start = (index as u64 * len as u64 / count as u64) as u32;
    let end = ((index as u64 + 1) * len as u64 / count as u64) as u32;
    (start, end)
}

/// Two tile indices to interpolate between and the weight of the second.
fn neighbours(position: f32, count: u32) -> (usize, usize, f32) {
    let floor = position.floor();
    let weight = position - floor;
    let last = count as i64 - 1;
    let first = (floor as i64).clamp(0, last) as usize;
    let second = (floor as i64 + 1).clamp(0, last) as usize;
    (first, second, weight)
}

/// Builds the clipped-equalization lookup table for one tile.
fn tile_lut(image: &GrayImage, xs: (u32, u32), ys: (u32, u32), clip_limit: f32) -> [u8; BINS] {
    let mut histogram = [0u32; BINS];
    for y in ys.0..ys.1 {
        for x in xs.0..xs.1 {
            histogram[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let area = (xs.1 - xs.0) * (ys.1 - ys.0);
    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
    clip_histogram(&mut histogram, limit);

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (value, &count) in histogram.iter().enumerate() {
        sum += count;
        lut[value] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Caps every bin at `limit` and spreads the excess evenly over all bins.
fn clip_histogram(histogram: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    if excess == 0 {
        return;
    }

    let batch = excess / BINS as u32;
    let residual = (excess % BINS as u32) as usize;
    for count in histogram.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for count in histogram.iter_mut().step_by(step).take(residual) {
            *count += 1;
        }
    }
}
