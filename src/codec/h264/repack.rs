//! Encoder output repacking into SVC-tagged layer bitstreams
//!
//! Hardware encoders emit SPS+PPS as a separate output buffer ahead of the
//! first IDR slice. The repacker caches that buffer and splices it in front
//! of every IDR it sees, followed by an SVC prefix NAL unit. Non-IDR slices
//! only get the prefix.
//!
//! Output layout for an IDR access unit:
//!
//! ```text
//! | SPS+PPS (no start code) | 00 00 00 01 prefix | raw IDR buffer |
//! |<-------- nal 0 -------->|<------------ nal 1 ------------->|
//! ```

use super::nal::{nal_type_of, NAL_TYPE_IDR, NAL_TYPE_SPS, START_CODE_LEN};
use super::svc::{SvcPrefix, MAX_SPATIAL_ID, SVC_PREFIX_LEN};
use crate::codec::frame::FrameType;
use crate::error::{Error, Result};
use std::fmt;
use tracing::trace;

/// Maximum size of a cached SPS+PPS buffer, start code included
pub const PARAM_SET_CAPACITY: usize = 256;

/// Last SPS+PPS buffer seen from the encoder
///
/// Fixed capacity, no heap storage. Reset whenever the encoder is
/// (re)opened so parameter sets never leak across encoder instances.
#[derive(Clone)]
pub struct ParamSetCache {
    data: [u8; PARAM_SET_CAPACITY],
    len: usize,
}

impl ParamSetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        ParamSetCache {
            data: [0; PARAM_SET_CAPACITY],
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cached length including the start code
    pub fn len(&self) -> usize {
        self.len
    }

    /// Cached buffer including the start code
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Cached buffer without its leading start code
    pub fn payload(&self) -> &[u8] {
        &self.data[START_CODE_LEN.min(self.len)..self.len]
    }

    /// Replace the cached parameter sets
    pub fn store(&mut self, buffer: &[u8]) -> Result<()> {
        if buffer.len() > PARAM_SET_CAPACITY {
            return Err(Error::BufferTooSmall {
                need: buffer.len(),
                have: PARAM_SET_CAPACITY,
            });
        }
        self.data[..buffer.len()].copy_from_slice(buffer);
        self.len = buffer.len();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }
}

impl Default for ParamSetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParamSetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSetCache")
            .field("len", &self.len)
            .finish()
    }
}

/// Layer type of an emitted bitstream
///
/// Every repacked layer carries slice data, so only the VCL value is ever
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LayerType {
    VideoCodingLayer = 1,
}

/// Description of one repacked layer written into the caller's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBitstream {
    nal_lengths: [usize; 2],
    nal_count: usize,
    pub frame_type: FrameType,
    pub temporal_id: u8,
    pub quality_id: u8,
    pub spatial_id: u8,
    pub layer_type: LayerType,
}

impl LayerBitstream {
    fn new(nal_lengths: &[usize], frame_type: FrameType, prefix: &SvcPrefix) -> Self {
        let mut lengths = [0; 2];
        lengths[..nal_lengths.len()].copy_from_slice(nal_lengths);
        LayerBitstream {
            nal_lengths: lengths,
            nal_count: nal_lengths.len(),
            frame_type,
            temporal_id: prefix.temporal_id(),
            quality_id: prefix.quality_id(),
            spatial_id: prefix.spatial_id(),
            layer_type: LayerType::VideoCodingLayer,
        }
    }

    /// Number of NAL units written (1 or 2)
    pub fn nal_count(&self) -> usize {
        self.nal_count
    }

    /// Length of each NAL unit in write order
    pub fn nal_lengths(&self) -> &[usize] {
        &self.nal_lengths[..self.nal_count]
    }

    /// Total bytes written
    pub fn total_len(&self) -> usize {
        self.nal_lengths().iter().sum()
    }

    pub fn is_key_frame(&self) -> bool {
        self.frame_type == FrameType::Idr
    }
}

/// Result of repacking one encoder output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepackOutcome {
    /// The buffer held SPS+PPS and was cached; nothing was written and the
    /// caller should fetch the next buffer
    ParameterSetsCached,
    /// A layer was written to the destination
    Layer(LayerBitstream),
}

/// Worst-case output size for a raw buffer of `raw_len` bytes
pub fn required_output_capacity(raw_len: usize, cache: &ParamSetCache) -> usize {
    cache.payload().len() + SVC_PREFIX_LEN + raw_len
}

/// Repack one Annex-B encoder output buffer into `dst`
///
/// `raw` must begin with a 4-byte start code. The NAL type is read from
/// byte 4:
///
/// - SPS (7): cached, nothing written.
/// - IDR (5): cached parameter sets, key prefix, then `raw`. Fails with a
///   protocol error if no parameter sets were seen yet.
/// - anything else: prefix without its start code, then `raw`.
///
/// `dst` is left untouched on any error.
pub fn repack_access_unit(
    raw: &[u8],
    spatial_id: u8,
    cache: &mut ParamSetCache,
    dst: &mut [u8],
) -> Result<RepackOutcome> {
    let nal_type = match nal_type_of(raw) {
        Some(t) => t,
        None => {
            return Err(Error::invalid_argument(format!(
                "encoder output of {} bytes has no NAL header",
                raw.len()
            )))
        }
    };
    if spatial_id > MAX_SPATIAL_ID {
        return Err(Error::invalid_argument(format!(
            "spatial id {} exceeds {}",
            spatial_id, MAX_SPATIAL_ID
        )));
    }

    match nal_type {
        NAL_TYPE_SPS => {
            cache.store(raw)?;
            trace!("Cached {} bytes of parameter sets", raw.len());
            Ok(RepackOutcome::ParameterSetsCached)
        }
        NAL_TYPE_IDR => {
            if cache.is_empty() {
                return Err(Error::protocol("IDR slice before any parameter sets"));
            }

            let prefix = SvcPrefix::new(nal_type, spatial_id);
            let params = cache.payload();
            let need = params.len() + SVC_PREFIX_LEN + raw.len();
            if dst.len() < need {
                return Err(Error::BufferTooSmall {
                    need,
                    have: dst.len(),
                });
            }

            let (head, tail) = dst.split_at_mut(params.len());
            head.copy_from_slice(params);
            tail[..SVC_PREFIX_LEN].copy_from_slice(prefix.as_bytes());
            tail[SVC_PREFIX_LEN..SVC_PREFIX_LEN + raw.len()].copy_from_slice(raw);

            Ok(RepackOutcome::Layer(LayerBitstream::new(
                &[params.len(), SVC_PREFIX_LEN + raw.len()],
                FrameType::Idr,
                &prefix,
            )))
        }
        _ => {
            let prefix = SvcPrefix::new(nal_type, spatial_id);
            let header = prefix.without_start_code();
            let need = header.len() + raw.len();
            if dst.len() < need {
                return Err(Error::BufferTooSmall {
                    need,
                    have: dst.len(),
                });
            }

            dst[..header.len()].copy_from_slice(header);
            dst[header.len()..need].copy_from_slice(raw);

            Ok(RepackOutcome::Layer(LayerBitstream::new(
                &[need],
                FrameType::P,
                &prefix,
            )))
        }
    }
}

/// Repacker bound to one spatial layer
///
/// Owns the parameter set cache for one encoder instance.
#[derive(Debug, Clone, Default)]
pub struct Repacker {
    cache: ParamSetCache,
    spatial_id: u8,
}

impl Repacker {
    pub fn new(spatial_id: u8) -> Result<Self> {
        if spatial_id > MAX_SPATIAL_ID {
            return Err(Error::invalid_argument(format!(
                "spatial id {} exceeds {}",
                spatial_id, MAX_SPATIAL_ID
            )));
        }
        Ok(Repacker {
            cache: ParamSetCache::new(),
            spatial_id,
        })
    }

    /// Repack one encoder output buffer
    pub fn repack(&mut self, raw: &[u8], dst: &mut [u8]) -> Result<RepackOutcome> {
        repack_access_unit(raw, self.spatial_id, &mut self.cache, dst)
    }

    /// Drop the cached parameter sets
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    pub fn cache(&self) -> &ParamSetCache {
        &self.cache
    }

    pub fn spatial_id(&self) -> u8 {
        self.spatial_id
    }
}
