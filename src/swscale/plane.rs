//! Borrowed views over 8-bit planar image data
//!
//! Planes never own their samples. A view is a slice plus a row stride, and
//! is only valid for the duration of one scaler call. Bottom-up images are
//! expressed by the caller through a negative picture height; internally the
//! source rows are then walked with a negated stride starting at the last row.

use crate::error::{Error, Result};

/// Number of chroma samples covering `dim` luma samples in 4:2:0 (rounded up)
#[inline]
pub fn half_dim(dim: usize) -> usize {
    (dim + 1) >> 1
}

/// Size in bytes of a tightly packed I420 image
pub fn i420_frame_size(width: usize, height: usize) -> usize {
    width * height + 2 * half_dim(width) * half_dim(height)
}

/// Read-only view over one plane of 8-bit samples
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    stride: usize,
}

impl<'a> Plane<'a> {
    /// Create a plane view with the given row stride in bytes
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Plane { data, stride }
    }

    /// Underlying samples
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub(crate) fn validate(&self, name: &str, width: usize, height: usize) -> Result<()> {
        validate_geometry(name, self.data.len(), self.stride, width, height)
    }
}

/// Writable view over one plane of 8-bit samples
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    /// Create a writable plane view with the given row stride in bytes
    pub fn new(data: &'a mut [u8], stride: usize) -> Self {
        PlaneMut { data, stride }
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub(crate) fn validate(&self, name: &str, width: usize, height: usize) -> Result<()> {
        validate_geometry(name, self.data.len(), self.stride, width, height)
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, index: usize, width: usize) -> &mut [u8] {
        let start = index * self.stride;
        &mut self.data[start..start + width]
    }
}

/// The three planes of a source I420 image
#[derive(Debug, Clone, Copy)]
pub struct I420Planes<'a> {
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl<'a> I420Planes<'a> {
    /// Create from three independent plane views
    pub fn new(y: Plane<'a>, u: Plane<'a>, v: Plane<'a>) -> Self {
        I420Planes { y, u, v }
    }

    /// Split a tightly packed I420 buffer (Y, then U, then V) into planes
    pub fn from_packed(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        let (y_size, c_stride, c_size) = packed_layout(width, height);
        let need = y_size + 2 * c_size;
        if data.len() < need {
            return Err(Error::invalid_argument(format!(
                "packed I420 {}x{} needs {} bytes, got {}",
                width,
                height,
                need,
                data.len()
            )));
        }

        let (y, rest) = data.split_at(y_size);
        let (u, v) = rest.split_at(c_size);
        Ok(I420Planes {
            y: Plane::new(y, width),
            u: Plane::new(u, c_stride),
            v: Plane::new(&v[..c_size], c_stride),
        })
    }
}

/// The three planes of a destination I420 image
#[derive(Debug)]
pub struct I420PlanesMut<'a> {
    pub y: PlaneMut<'a>,
    pub u: PlaneMut<'a>,
    pub v: PlaneMut<'a>,
}

impl<'a> I420PlanesMut<'a> {
    /// Create from three independent writable plane views
    pub fn new(y: PlaneMut<'a>, u: PlaneMut<'a>, v: PlaneMut<'a>) -> Self {
        I420PlanesMut { y, u, v }
    }

    /// Split a tightly packed I420 buffer (Y, then U, then V) into writable planes
    pub fn from_packed(data: &'a mut [u8], width: usize, height: usize) -> Result<Self> {
        let (y_size, c_stride, c_size) = packed_layout(width, height);
        let need = y_size + 2 * c_size;
        if data.len() < need {
            return Err(Error::BufferTooSmall {
                need,
                have: data.len(),
            });
        }

        let (y, rest) = data.split_at_mut(y_size);
        let (u, rest) = rest.split_at_mut(c_size);
        let (v, _) = rest.split_at_mut(c_size);
        Ok(I420PlanesMut {
            y: PlaneMut::new(y, width),
            u: PlaneMut::new(u, c_stride),
            v: PlaneMut::new(v, c_stride),
        })
    }
}

fn packed_layout(width: usize, height: usize) -> (usize, usize, usize) {
    let c_stride = half_dim(width);
    (width * height, c_stride, c_stride * half_dim(height))
}

fn validate_geometry(
    name: &str,
    len: usize,
    stride: usize,
    width: usize,
    height: usize,
) -> Result<()> {
    if len == 0 {
        return Err(Error::invalid_argument(format!("{} plane is empty", name)));
    }
    if width == 0 || height == 0 {
        return Err(Error::invalid_argument(format!(
            "{} plane has zero-sized geometry {}x{}",
            name, width, height
        )));
    }
    if stride < width {
        return Err(Error::invalid_argument(format!(
            "{} plane stride {} is smaller than width {}",
            name, stride, width
        )));
    }
    let need = (height - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(width))
        .ok_or_else(|| Error::invalid_argument(format!("{} plane geometry overflows", name)))?;
    if len < need {
        return Err(Error::invalid_argument(format!(
            "{} plane holds {} bytes, {}x{} with stride {} needs {}",
            name, len, width, height, stride, need
        )));
    }
    Ok(())
}

/// Row addressing for a source plane
///
/// `origin` is the byte offset of logical row 0. For bottom-up sources it
/// points at the last stored row and `stride` is negative, so iterating
/// rows forward reads the image upside down.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceRows<'a> {
    data: &'a [u8],
    origin: usize,
    stride: isize,
}

impl<'a> SourceRows<'a> {
    pub(crate) fn new(plane: &Plane<'a>, rows: usize, flip: bool) -> Self {
        if flip {
            SourceRows {
                data: plane.data,
                origin: (rows - 1) * plane.stride,
                stride: -(plane.stride as isize),
            }
        } else {
            SourceRows {
                data: plane.data,
                origin: 0,
                stride: plane.stride as isize,
            }
        }
    }

    #[inline]
    pub(crate) fn row(&self, index: usize, width: usize) -> &'a [u8] {
        let start = (self.origin as isize + index as isize * self.stride) as usize;
        &self.data[start..start + width]
    }
}
