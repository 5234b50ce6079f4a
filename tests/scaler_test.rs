//! I420 scaler integration tests
//!
//! Exercises the public scaling entry points on whole frames: exact
//! fixed-point results on small images, the flip path, and the
//! copy/scale selection done by the scaler context.

#[path = "common/mod.rs"]
mod common;

use common::*;
use svcenc_lib::swscale::{
    copy_i420, i420_frame_size, scale_i420, I420Planes, I420PlanesMut, Plane, PlaneMut,
    ScalerContext,
};
use svcenc_lib::Error;

fn scale_packed(src: &[u8], sw: usize, sh: i32, dw: usize, dh: usize) -> Vec<u8> {
    let planes = I420Planes::from_packed(src, sw, sh.unsigned_abs() as usize).unwrap();
    let mut out = vec![0u8; i420_frame_size(dw, dh)];
    let mut dst = I420PlanesMut::from_packed(&mut out, dw, dh).unwrap();
    scale_i420(&planes, sw as i32, sh, &mut dst, dw as i32, dh as i32).unwrap();
    out
}

// ============================================================================
// Exact Results
// ============================================================================

#[test]
fn test_horizontal_edge_downscale_to_three() {
    // left half black, right half white
    let src = i420_frame(4, 4, |x, _| if x < 2 { 0 } else { 255 }, |_, _| 128, |_, _| 128);
    let out = scale_packed(&src, 4, 4, 3, 4);

    for row in plane_rows(&out[..12], 3) {
        assert_eq!(row, &[0, 127, 255]);
    }
}

#[test]
fn test_horizontal_edge_downscale_to_two() {
    let src = i420_frame(4, 4, |x, _| if x < 2 { 0 } else { 255 }, |_, _| 128, |_, _| 128);
    let out = scale_packed(&src, 4, 4, 2, 4);

    for row in plane_rows(&out[..8], 2) {
        assert_eq!(row, &[0, 255]);
    }
}

#[test]
fn test_vertical_edge_downscale_to_three() {
    // top half black, bottom half white
    let src = i420_frame(4, 4, |_, y| if y < 2 { 0 } else { 255 }, |_, _| 128, |_, _| 128);
    let out = scale_packed(&src, 4, 4, 4, 3);

    let rows = plane_rows(&out[..12], 4);
    assert_eq!(rows[0], &[0, 0, 0, 0]);
    assert_eq!(rows[1], &[126, 126, 126, 126]);
    assert_eq!(rows[2], &[255, 255, 255, 255]);
}

#[test]
fn test_uniform_planes_stay_uniform() {
    let src = flat_frame(64, 48, 91, 17, 230);
    for (dw, dh) in [(32, 24), (100, 60), (7, 5), (64, 48)] {
        let out = scale_packed(&src, 64, 48, dw, dh);
        let y_size = dw * dh;
        let c_size = (dw + 1) / 2 * ((dh + 1) / 2);
        assert!(out[..y_size].iter().all(|&b| b == 91), "{}x{}", dw, dh);
        assert!(out[y_size..y_size + c_size].iter().all(|&b| b == 17));
        assert!(out[y_size + c_size..].iter().all(|&b| b == 230));
    }
}

#[test]
fn test_identity_scale_has_no_drift() {
    let src = gradient_frame(40, 30);
    let out = scale_packed(&src, 40, 30, 40, 30);

    let y_size = 40 * 30;
    for (a, b) in out[..y_size].iter().zip(&src[..y_size]) {
        assert!((*a as i32 - *b as i32).abs() <= 1);
    }
    // every luma row but the clamped last one is exact
    assert_eq!(&out[..y_size - 40], &src[..y_size - 40]);
    assert_eq!(&out[y_size..], &src[y_size..]);
}

#[test]
fn test_chroma_is_point_sampled() {
    // chroma of a 8x8 frame is 4x4; halving picks every other sample
    let src = i420_frame(8, 8, |_, _| 0, |x, y| (x + y * 4) as u8, |x, y| (100 + x + y * 4) as u8);
    let out = scale_packed(&src, 8, 8, 4, 4);

    let u = &out[16..20];
    let v = &out[20..24];
    assert_eq!(u, &[0, 2, 8, 10]);
    assert_eq!(v, &[100, 102, 108, 110]);
}

// ============================================================================
// Flip
// ============================================================================

#[test]
fn test_negative_height_matches_flipped_source() {
    let src = gradient_frame(24, 16);
    let flipped = flip_i420(&src, 24, 16);

    let from_negative = scale_packed(&src, 24, -16, 12, 10);
    let from_flipped = scale_packed(&flipped, 24, 16, 12, 10);
    assert_eq!(from_negative, from_flipped);
}

#[test]
fn test_copy_with_negative_height_flips() {
    let src = gradient_frame(10, 6);
    let planes = I420Planes::from_packed(&src, 10, 6).unwrap();
    let mut out = vec![0u8; src.len()];
    let mut dst = I420PlanesMut::from_packed(&mut out, 10, 6).unwrap();

    copy_i420(&planes, &mut dst, 10, -6).unwrap();
    assert_eq!(out, flip_i420(&src, 10, 6));
}

// ============================================================================
// Scaler Context
// ============================================================================

#[test]
fn test_context_same_size_is_a_copy() {
    let src = gradient_frame(16, 12);
    let planes = I420Planes::from_packed(&src, 16, 12).unwrap();

    let ctx = ScalerContext::new(16, 12, 16, 12).unwrap();
    assert!(ctx.is_passthrough());

    let mut out = vec![0u8; src.len()];
    let mut dst = I420PlanesMut::from_packed(&mut out, 16, 12).unwrap();
    ctx.run(&planes, &mut dst).unwrap();
    assert_eq!(out, src);
}

#[test]
fn test_context_different_size_scales() {
    let src = gradient_frame(32, 16);
    let planes = I420Planes::from_packed(&src, 32, 16).unwrap();

    let ctx = ScalerContext::new(32, 16, 16, 8).unwrap();
    assert!(!ctx.is_passthrough());

    let mut via_context = vec![0u8; i420_frame_size(16, 8)];
    let mut dst = I420PlanesMut::from_packed(&mut via_context, 16, 8).unwrap();
    ctx.run(&planes, &mut dst).unwrap();

    assert_eq!(via_context, scale_packed(&src, 32, 16, 16, 8));
}

#[test]
fn test_context_rejects_zero_size() {
    assert!(matches!(
        ScalerContext::new(0, 16, 16, 16),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        ScalerContext::new(16, 0, 16, 16),
        Err(Error::InvalidArgument(_))
    ));
}

// ============================================================================
// Strides and Validation
// ============================================================================

#[test]
fn test_scale_into_padded_destination() {
    let src = flat_frame(8, 8, 200, 50, 60);
    let planes = I420Planes::from_packed(&src, 8, 8).unwrap();

    // destination rows are padded; padding must stay untouched
    let mut y = vec![0xEEu8; 8 * 4];
    let mut u = vec![0xEEu8; 4 * 2];
    let mut v = vec![0xEEu8; 4 * 2];
    let mut dst = I420PlanesMut::new(
        PlaneMut::new(&mut y, 8),
        PlaneMut::new(&mut u, 4),
        PlaneMut::new(&mut v, 4),
    );
    scale_i420(&planes, 8, 8, &mut dst, 4, 4).unwrap();

    for row in y.chunks_exact(8) {
        assert_eq!(&row[..4], &[200; 4]);
        assert_eq!(&row[4..], &[0xEE; 4]);
    }
    for row in u.chunks_exact(4) {
        assert_eq!(&row[..2], &[50, 50]);
        assert_eq!(&row[2..], &[0xEE, 0xEE]);
    }
    assert_eq!(&v[..2], &[60, 60]);
}

#[test]
fn test_scale_from_strided_source() {
    let y: Vec<u8> = (0..4).flat_map(|_| [10u8, 10, 10, 10, 0xFF, 0xFF]).collect();
    let u = [20u8, 20, 0xFF, 20, 20, 0xFF];
    let v = [30u8, 30, 0xFF, 30, 30, 0xFF];
    let planes = I420Planes::new(Plane::new(&y, 6), Plane::new(&u, 3), Plane::new(&v, 3));

    let mut out = vec![0u8; i420_frame_size(2, 2)];
    let mut dst = I420PlanesMut::from_packed(&mut out, 2, 2).unwrap();
    scale_i420(&planes, 4, 4, &mut dst, 2, 2).unwrap();

    assert_eq!(out, vec![10, 10, 10, 10, 20, 30]);
}

#[test]
fn test_short_source_rejected_without_writing() {
    let src = vec![1u8; i420_frame_size(16, 16)];
    let planes = I420Planes::from_packed(&src, 16, 16).unwrap();

    let mut out = vec![0u8; i420_frame_size(8, 8)];
    let mut dst = I420PlanesMut::from_packed(&mut out, 8, 8).unwrap();
    // claims a taller source than the buffer holds
    let result = scale_i420(&planes, 16, 32, &mut dst, 8, 8);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(out.iter().all(|&b| b == 0));
}
