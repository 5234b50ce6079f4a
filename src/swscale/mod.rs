//! I420 scaling and copying
//!
//! Converts an arbitrary-resolution planar YUV 4:2:0 image into the exact
//! resolution an encoder expects, writing directly into caller-owned
//! buffers (typically the slots of an encoder input buffer).
//!
//! - Luma is resampled with a two-pass bilinear filter.
//! - Chroma is point sampled per row and per column.
//! - A negative source height means the image is stored bottom-up and is
//!   flipped while scaling.
//!
//! Neither path allocates. The luma path uses one stack scratch row, which
//! bounds the source width to [`MAX_SCALE_WIDTH`].

mod filter;
mod plane;

pub use filter::{MAX_SCALE_DIMENSION, MAX_SCALE_WIDTH};
pub use plane::{half_dim, i420_frame_size, I420Planes, I420PlanesMut, Plane, PlaneMut};

use crate::error::{Error, Result};
use filter::{copy_plane, scale_plane_bilinear, scale_plane_simple};
use plane::SourceRows;

/// Scale an I420 image to a new size
///
/// `src_height` may be negative to flip a bottom-up source. Every argument
/// is validated before any destination byte is written.
pub fn scale_i420(
    src: &I420Planes<'_>,
    src_width: i32,
    src_height: i32,
    dst: &mut I420PlanesMut<'_>,
    dst_width: i32,
    dst_height: i32,
) -> Result<()> {
    if src_width <= 0 || src_height == 0 || dst_width <= 0 || dst_height <= 0 {
        return Err(Error::invalid_argument(format!(
            "invalid scale geometry {}x{} -> {}x{}",
            src_width, src_height, dst_width, dst_height
        )));
    }

    let flip = src_height < 0;
    let src_w = src_width as usize;
    let src_h = src_height.unsigned_abs() as usize;
    let dst_w = dst_width as usize;
    let dst_h = dst_height as usize;

    check_scale_limits(src_w, src_h, dst_w, dst_h)?;
    validate_source(src, src_w, src_h)?;

    let (src_cw, src_ch) = (half_dim(src_w), half_dim(src_h));
    let (dst_cw, dst_ch) = (half_dim(dst_w), half_dim(dst_h));
    dst.y.validate("destination Y", dst_w, dst_h)?;
    dst.u.validate("destination U", dst_cw, dst_ch)?;
    dst.v.validate("destination V", dst_cw, dst_ch)?;

    scale_plane_bilinear(
        SourceRows::new(&src.y, src_h, flip),
        src_w,
        src_h,
        &mut dst.y,
        dst_w,
        dst_h,
    );
    scale_plane_simple(
        SourceRows::new(&src.u, src_ch, flip),
        src_cw,
        src_ch,
        &mut dst.u,
        dst_cw,
        dst_ch,
    );
    scale_plane_simple(
        SourceRows::new(&src.v, src_ch, flip),
        src_cw,
        src_ch,
        &mut dst.v,
        dst_cw,
        dst_ch,
    );

    Ok(())
}

/// Copy an I420 image of identical size, plane by plane
///
/// This is a stride-aware straight copy; despite being the "mirror" path of
/// the encoder it performs no mirroring. A negative `height` flips the
/// image vertically.
pub fn copy_i420(
    src: &I420Planes<'_>,
    dst: &mut I420PlanesMut<'_>,
    width: i32,
    height: i32,
) -> Result<()> {
    if width <= 0 || height == 0 {
        return Err(Error::invalid_argument(format!(
            "invalid copy geometry {}x{}",
            width, height
        )));
    }

    let flip = height < 0;
    let w = width as usize;
    let h = height.unsigned_abs() as usize;
    let (cw, ch) = (half_dim(w), half_dim(h));

    validate_source(src, w, h)?;
    dst.y.validate("destination Y", w, h)?;
    dst.u.validate("destination U", cw, ch)?;
    dst.v.validate("destination V", cw, ch)?;

    copy_plane(SourceRows::new(&src.y, h, flip), &mut dst.y, w, h);
    copy_plane(SourceRows::new(&src.u, ch, flip), &mut dst.u, cw, ch);
    copy_plane(SourceRows::new(&src.v, ch, flip), &mut dst.v, cw, ch);

    Ok(())
}

fn check_scale_limits(src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Result<()> {
    if src_w > MAX_SCALE_WIDTH {
        return Err(Error::invalid_argument(format!(
            "source width {} exceeds the supported maximum of {}",
            src_w, MAX_SCALE_WIDTH
        )));
    }
    if src_h > MAX_SCALE_DIMENSION || dst_w > MAX_SCALE_DIMENSION || dst_h > MAX_SCALE_DIMENSION
    {
        return Err(Error::invalid_argument(format!(
            "scale dimensions exceed the supported maximum of {}",
            MAX_SCALE_DIMENSION
        )));
    }
    Ok(())
}

fn validate_source(src: &I420Planes<'_>, width: usize, height: usize) -> Result<()> {
    let (cw, ch) = (half_dim(width), half_dim(height));
    src.y.validate("source Y", width, height)?;
    src.u.validate("source U", cw, ch)?;
    src.v.validate("source V", cw, ch)
}

/// Scaler context for a fixed source and destination geometry
///
/// Picks the copy path when the sizes match and the scale path otherwise,
/// the way an encoder input stage does.
#[derive(Debug, Clone, Copy)]
pub struct ScalerContext {
    src_width: i32,
    src_height: i32,
    dst_width: i32,
    dst_height: i32,
}

impl ScalerContext {
    /// Create a new scaler context
    pub fn new(src_width: i32, src_height: i32, dst_width: i32, dst_height: i32) -> Result<Self> {
        if src_width <= 0 || src_height == 0 || dst_width <= 0 || dst_height <= 0 {
            return Err(Error::invalid_argument(format!(
                "invalid scaler geometry {}x{} -> {}x{}",
                src_width, src_height, dst_width, dst_height
            )));
        }

        Ok(ScalerContext {
            src_width,
            src_height,
            dst_width,
            dst_height,
        })
    }

    /// Whether frames pass through the copy path
    ///
    /// A bottom-up source (negative height) never matches and is flipped by
    /// the scale path.
    pub fn is_passthrough(&self) -> bool {
        self.src_width == self.dst_width && self.src_height == self.dst_height
    }

    /// Check a source image without touching any destination
    ///
    /// Applies the same source checks as [`run`](Self::run), so a picture
    /// that passes here only fails in `run` because of its destination.
    pub fn validate_source(&self, src: &I420Planes<'_>) -> Result<()> {
        let w = self.src_width as usize;
        let h = self.src_height.unsigned_abs() as usize;
        if !self.is_passthrough() {
            check_scale_limits(w, h, self.dst_width as usize, self.dst_height as usize)?;
        }
        validate_source(src, w, h)
    }

    /// Scale or copy one frame
    pub fn run(&self, src: &I420Planes<'_>, dst: &mut I420PlanesMut<'_>) -> Result<()> {
        if self.is_passthrough() {
            copy_i420(src, dst, self.dst_width, self.dst_height)
        } else {
            scale_i420(
                src,
                self.src_width,
                self.src_height,
                dst,
                self.dst_width,
                self.dst_height,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(width: usize, height: usize, fill: impl Fn(usize) -> u8) -> Vec<u8> {
        (0..i420_frame_size(width, height)).map(fill).collect()
    }

    #[test]
    fn test_scale_rejects_bad_geometry() {
        let src = packed(4, 4, |_| 0);
        let mut out = vec![0u8; i420_frame_size(2, 2)];
        let planes = I420Planes::from_packed(&src, 4, 4).unwrap();
        let mut dst = I420PlanesMut::from_packed(&mut out, 2, 2).unwrap();

        for (sw, sh, dw, dh) in [(0, 4, 2, 2), (4, 0, 2, 2), (4, 4, 0, 2), (4, 4, 2, -2)] {
            assert!(matches!(
                scale_i420(&planes, sw, sh, &mut dst, dw, dh),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_scale_rejects_wide_source() {
        let width = MAX_SCALE_WIDTH + 2;
        let src = packed(width, 2, |_| 0);
        let mut out = vec![0u8; i420_frame_size(2, 2)];
        let planes = I420Planes::from_packed(&src, width, 2).unwrap();
        let mut dst = I420PlanesMut::from_packed(&mut out, 2, 2).unwrap();

        let result = scale_i420(&planes, width as i32, 2, &mut dst, 2, 2);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_scale_no_partial_write_on_short_destination() {
        let src = packed(4, 4, |_| 9);
        let mut y = vec![0u8; 4];
        let mut u = vec![0u8; 1];
        let mut v = vec![0u8; 0];
        let planes = I420Planes::from_packed(&src, 4, 4).unwrap();
        let mut dst = I420PlanesMut::new(
            PlaneMut::new(&mut y, 2),
            PlaneMut::new(&mut u, 1),
            PlaneMut::new(&mut v, 1),
        );

        assert!(scale_i420(&planes, 4, 4, &mut dst, 2, 2).is_err());
        assert_eq!(y, vec![0u8; 4]);
        assert_eq!(u, vec![0u8; 1]);
    }

    #[test]
    fn test_scale_chroma_point_sampling() {
        // 4x4 source: chroma planes are 2x2
        let mut src = packed(4, 4, |_| 0);
        src[16..20].copy_from_slice(&[10, 20, 30, 40]);
        src[20..24].copy_from_slice(&[50, 60, 70, 80]);
        let mut out = vec![0u8; i420_frame_size(8, 8)];

        let planes = I420Planes::from_packed(&src, 4, 4).unwrap();
        let mut dst = I420PlanesMut::from_packed(&mut out, 8, 8).unwrap();
        scale_i420(&planes, 4, 4, &mut dst, 8, 8).unwrap();

        let u = &out[64..80];
        assert_eq!(&u[0..4], &[10, 10, 20, 20]);
        assert_eq!(&u[8..12], &[30, 30, 40, 40]);
        let v = &out[80..96];
        assert_eq!(&v[12..16], &[70, 70, 80, 80]);
    }

    #[test]
    fn test_copy_flips_all_planes() {
        let src = packed(2, 4, |i| i as u8);
        let mut out = vec![0u8; i420_frame_size(2, 4)];
        let planes = I420Planes::from_packed(&src, 2, 4).unwrap();
        let mut dst = I420PlanesMut::from_packed(&mut out, 2, 4).unwrap();

        copy_i420(&planes, &mut dst, 2, -4).unwrap();

        assert_eq!(&out[0..8], &[6, 7, 4, 5, 2, 3, 0, 1]);
        // chroma planes are 1x2
        assert_eq!(&out[8..10], &[9, 8]);
        assert_eq!(&out[10..12], &[11, 10]);
    }

    #[test]
    fn test_copy_respects_strides() {
        // source rows padded to 6 bytes
        let y = [1u8, 2, 3, 4, 0, 0, 5, 6, 7, 8, 0, 0];
        let c = [9u8, 8, 0];
        let planes = I420Planes::new(Plane::new(&y, 6), Plane::new(&c, 3), Plane::new(&c, 3));
        let mut out = vec![0u8; i420_frame_size(4, 2)];
        let mut dst = I420PlanesMut::from_packed(&mut out, 4, 2).unwrap();

        copy_i420(&planes, &mut dst, 4, 2).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 8, 9, 8]);
    }

    #[test]
    fn test_scaler_context_paths() {
        let ctx = ScalerContext::new(4, 4, 4, 4).unwrap();
        assert!(ctx.is_passthrough());

        let flipped = ScalerContext::new(4, -4, 4, 4).unwrap();
        assert!(!flipped.is_passthrough());

        assert!(ScalerContext::new(4, 4, 0, 4).is_err());
    }

    #[test]
    fn test_scaler_context_validate_source() {
        let src = packed(4, 4, |_| 0);
        let planes = I420Planes::from_packed(&src, 4, 4).unwrap();

        let copy = ScalerContext::new(4, 4, 4, 4).unwrap();
        assert!(copy.validate_source(&planes).is_ok());
        let scale = ScalerContext::new(4, -4, 2, 2).unwrap();
        assert!(scale.validate_source(&planes).is_ok());

        let short = I420Planes::new(Plane::new(&src[..3], 4), planes.u, planes.v);
        assert!(matches!(
            copy.validate_source(&short),
            Err(Error::InvalidArgument(_))
        ));

        let taller = ScalerContext::new(4, 8, 2, 2).unwrap();
        assert!(taller.validate_source(&planes).is_err());

        let wide = ScalerContext::new(MAX_SCALE_WIDTH as i32 + 2, 2, 2, 2).unwrap();
        assert!(wide.validate_source(&planes).is_err());
    }
}
