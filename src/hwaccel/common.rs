//! Common types for hardware encoder sessions
//!
//! Configuration, statistics and the encoder input buffer layout shared by
//! the session, the replay service and the C ABI.

use crate::error::{Error, Result};
use crate::swscale::{i420_frame_size, I420PlanesMut, MAX_SCALE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Planar I420 color format identifier understood by media encoders
pub const COLOR_FORMAT_YUV420_PLANAR: i32 = 19;

/// Highest spatial layer id an encoder session may be configured for
pub const MAX_SESSION_SPATIAL_ID: u8 = 3;

/// Hardware encoder configuration
///
/// Fields missing from a JSON document take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Encoded picture width
    pub width: u32,
    /// Encoded picture height
    pub height: u32,
    /// Target bitrate in kbit/s
    pub target_kbps: u32,
    /// Target frame rate
    pub frame_rate: u32,
    /// Number of temporal layers
    pub temporal_layers: u32,
    /// Spatial layer id stamped on every emitted layer (0-3)
    pub spatial_id: u8,
    /// Memory type of frame surfaces, passed through to the device
    pub mem_type: u32,
    /// Seconds between encoder-initiated key frames
    pub key_frame_interval: u32,
    /// Input color format identifier; only planar I420 is written
    pub color_format: i32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            width: 1280,
            height: 720,
            target_kbps: 1500,
            frame_rate: 30,
            temporal_layers: 1,
            spatial_id: 0,
            mem_type: 0,
            key_frame_interval: 5,
            color_format: COLOR_FORMAT_YUV420_PLANAR,
        }
    }
}

impl EncoderConfig {
    /// Create a config for the given picture size with default rate settings
    pub fn new(width: u32, height: u32) -> Self {
        EncoderConfig {
            width,
            height,
            ..Default::default()
        }
    }

    /// Builder-style bitrate and frame rate override
    pub fn with_rate(mut self, target_kbps: u32, frame_rate: u32) -> Self {
        self.target_kbps = target_kbps;
        self.frame_rate = frame_rate;
        self
    }

    /// Builder-style spatial id override
    pub fn with_spatial_id(mut self, spatial_id: u8) -> Self {
        self.spatial_id = spatial_id;
        self
    }

    /// Parse a config from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EncoderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_argument("Width and height must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::invalid_argument(
                "Width and height must be even for YUV formats",
            ));
        }
        if self.width as usize > MAX_SCALE_DIMENSION || self.height as usize > MAX_SCALE_DIMENSION
        {
            return Err(Error::invalid_argument(format!(
                "Width and height must not exceed {}",
                MAX_SCALE_DIMENSION
            )));
        }
        if self.target_kbps == 0 {
            return Err(Error::invalid_argument("Target bitrate must be non-zero"));
        }
        if self.frame_rate == 0 {
            return Err(Error::invalid_argument("Invalid framerate"));
        }
        if self.temporal_layers == 0 {
            return Err(Error::invalid_argument(
                "At least one temporal layer is required",
            ));
        }
        if self.spatial_id > MAX_SESSION_SPATIAL_ID {
            return Err(Error::invalid_argument(format!(
                "Spatial id must be 0-{}",
                MAX_SESSION_SPATIAL_ID
            )));
        }
        if self.color_format != COLOR_FORMAT_YUV420_PLANAR {
            return Err(Error::invalid_argument(format!(
                "Unsupported color format {}, expected planar I420 ({})",
                self.color_format, COLOR_FORMAT_YUV420_PLANAR
            )));
        }
        Ok(())
    }

    /// Layout of one encoder input buffer for this config
    pub fn input_layout(&self) -> InputLayout {
        InputLayout::new(self.width as usize, self.height as usize)
    }
}

/// Placement of an I420 picture inside an encoder input buffer
///
/// Y at offset 0 with stride `width`, U at `width * height`, V right after
/// U, both chroma planes with stride `width / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLayout {
    pub width: usize,
    pub height: usize,
}

impl InputLayout {
    pub fn new(width: usize, height: usize) -> Self {
        InputLayout { width, height }
    }

    /// Offset of the U plane
    pub fn u_offset(&self) -> usize {
        self.width * self.height
    }

    /// Offset of the V plane
    pub fn v_offset(&self) -> usize {
        self.u_offset() + (self.width / 2) * (self.height / 2)
    }

    /// Bytes occupied by one picture
    pub fn frame_size(&self) -> usize {
        i420_frame_size(self.width, self.height)
    }

    /// Split an input buffer into writable planes
    ///
    /// Fails with `BufferTooSmall` if the buffer cannot hold one picture.
    pub fn planes_mut<'a>(&self, buffer: &'a mut [u8]) -> Result<I420PlanesMut<'a>> {
        I420PlanesMut::from_packed(buffer, self.width, self.height)
    }
}

/// Statistics from an encoder session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderStats {
    /// Frames submitted to the encoder
    pub frames_submitted: u64,
    /// Layer bitstreams returned to the caller
    pub layers_emitted: u64,
    /// IDR layers emitted
    pub idr_frames: u64,
    /// P layers emitted
    pub p_frames: u64,
    /// Total bytes written to caller buffers
    pub bytes_output: u64,
    /// Parameter set buffers cached
    pub parameter_sets_cached: u64,
    /// Encoder restarts for key frames and rate updates
    pub reopen_count: u64,
}
