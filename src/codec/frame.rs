//! Frame representation for the encoder input and output sides

use crate::error::Result;
use crate::swscale::I420Planes;
use std::fmt;

/// A source picture handed to the encoder pipeline
///
/// Planes are borrowed for the duration of one `encode_frame` call. A
/// negative `height` marks a bottom-up image that is flipped on its way
/// into the encoder.
#[derive(Debug, Clone, Copy)]
pub struct SourcePicture<'a> {
    /// Y, U and V planes
    pub planes: I420Planes<'a>,

    /// Width in pixels
    pub width: i32,

    /// Height in pixels, negative for bottom-up storage
    pub height: i32,

    /// Presentation timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl<'a> SourcePicture<'a> {
    /// Create a new source picture
    pub fn new(planes: I420Planes<'a>, width: i32, height: i32, timestamp_ms: u64) -> Self {
        SourcePicture {
            planes,
            width,
            height,
            timestamp_ms,
        }
    }

    /// Wrap a tightly packed top-down I420 buffer
    pub fn from_packed(data: &'a [u8], width: u32, height: u32, timestamp_ms: u64) -> Result<Self> {
        let planes = I420Planes::from_packed(data, width as usize, height as usize)?;
        Ok(SourcePicture::new(
            planes,
            width as i32,
            height as i32,
            timestamp_ms,
        ))
    }

    /// Check if the picture is stored bottom-up
    pub fn is_bottom_up(&self) -> bool {
        self.height < 0
    }
}

/// Frame type of an emitted layer bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FrameType {
    /// Instantaneous decoder refresh (key frame)
    Idr,
    /// Predicted frame
    P,
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::Idr => write!(f, "IDR"),
            FrameType::P => write!(f, "P"),
        }
    }
}
