//! Fixed-point plane resampling kernels
//!
//! All kernels use 16.16 fixed-point positions. The step between
//! destination samples is `(src << 16) / dst`, and the first sample sits
//! half a step in, pulled back by half a source pixel when downscaling so
//! the sampling window stays centered.

use super::plane::{PlaneMut, SourceRows};

/// Widest source luma row the bilinear path can filter
pub const MAX_SCALE_WIDTH: usize = 2560;

/// Largest dimension representable in the 16.16 position arithmetic
pub const MAX_SCALE_DIMENSION: usize = 16384;

const ROW_PADDING: usize = 16;

/// 16.16 step between consecutive destination samples
#[inline]
pub(crate) fn fixed_step(src: usize, dst: usize) -> i32 {
    ((src as i32) << 16) / dst as i32
}

/// 16.16 position of the first destination sample
#[inline]
pub(crate) fn initial_position(step: i32) -> i32 {
    if step >= 65536 {
        (step >> 1) - 32768
    } else {
        step >> 1
    }
}

/// Blend two source rows into one: `(a * (256 - f) + b * f) >> 8`
fn blend_rows(out: &mut [u8], top: &[u8], bottom: &[u8], fraction: i32) {
    let f1 = fraction;
    let f0 = 256 - f1;
    for ((out, &a), &b) in out.iter_mut().zip(top).zip(bottom) {
        *out = ((a as i32 * f0 + b as i32 * f1) >> 8) as u8;
    }
}

/// Resample one row horizontally with a two-tap blend around `x`
///
/// `row` must hold one sample past the last source column.
fn blend_columns(out: &mut [u8], row: &[u8], mut x: i32, dx: i32) {
    for out in out.iter_mut() {
        let xi = (x >> 16) as usize;
        let a = row[xi] as i32;
        let b = row[xi + 1] as i32;
        // (1-f)a + fb == a + f(b-a)
        *out = (a + (((x & 0xffff) * (b - a)) >> 16)) as u8;
        x += dx;
    }
}

/// Bilinear scale of one plane (used for luma)
///
/// The vertical blend runs once per destination row into a stack scratch
/// row, then the horizontal pass samples that row. Callers guarantee
/// `src_width <= MAX_SCALE_WIDTH`.
pub(crate) fn scale_plane_bilinear(
    src: SourceRows<'_>,
    src_width: usize,
    src_height: usize,
    dst: &mut PlaneMut<'_>,
    dst_width: usize,
    dst_height: usize,
) {
    let mut row = [0u8; MAX_SCALE_WIDTH + ROW_PADDING];

    let dx = fixed_step(src_width, dst_width);
    let dy = fixed_step(src_height, dst_height);
    let x = initial_position(dx);
    let mut y = initial_position(dy);
    let max_y = if src_height > 1 {
        (((src_height - 1) as i32) << 16) - 1
    } else {
        0
    };

    for j in 0..dst_height {
        if y > max_y {
            y = max_y;
        }

        let yi = (y >> 16) as usize;
        let yf = (y >> 8) & 255;

        // A zero fraction is 100% of the top row; never touch the row below,
        // which may not exist on the last source row.
        if yf == 0 {
            row[..src_width].copy_from_slice(src.row(yi, src_width));
        } else {
            blend_rows(
                &mut row[..src_width],
                src.row(yi, src_width),
                src.row(yi + 1, src_width),
                yf,
            );
        }
        row[src_width] = row[src_width - 1];

        blend_columns(dst.row_mut(j, dst_width), &row[..=src_width], x, dx);
        y += dy;
    }
}

/// Point-sampled scale of one plane (used for chroma)
pub(crate) fn scale_plane_simple(
    src: SourceRows<'_>,
    src_width: usize,
    src_height: usize,
    dst: &mut PlaneMut<'_>,
    dst_width: usize,
    dst_height: usize,
) {
    let dx = fixed_step(src_width, dst_width);
    let dy = fixed_step(src_height, dst_height);
    let x0 = initial_position(dx);
    let mut y = initial_position(dy);

    for j in 0..dst_height {
        let src_row = src.row((y >> 16) as usize, src_width);
        let mut x = x0;
        for out in dst.row_mut(j, dst_width).iter_mut() {
            *out = src_row[(x >> 16) as usize];
            x += dx;
        }
        y += dy;
    }
}

/// Row-for-row copy of one plane, honouring both strides
pub(crate) fn copy_plane(src: SourceRows<'_>, dst: &mut PlaneMut<'_>, width: usize, height: usize) {
    for j in 0..height {
        dst.row_mut(j, width).copy_from_slice(src.row(j, width));
    }
}
