//! H.264/AVC elementary stream handling
//!
//! Hardware encoders hand back one Annex-B buffer per output dequeue. This
//! module turns those buffers into SVC-tagged layer bitstreams:
//!
//! - `nal`: NAL unit types and Annex-B scanning
//! - `svc`: the 9-byte SVC prefix NAL unit
//! - `repack`: parameter set caching and per-buffer repacking

pub mod nal;
pub mod repack;
pub mod svc;

pub use nal::{
    find_nal_units_annex_b, nal_type_of, NalUnit, NAL_TYPE_IDR, NAL_TYPE_PPS, NAL_TYPE_SLICE,
    NAL_TYPE_SPS, START_CODE, START_CODE_LEN,
};
pub use repack::{
    repack_access_unit, required_output_capacity, LayerBitstream, LayerType, ParamSetCache,
    RepackOutcome, Repacker, PARAM_SET_CAPACITY,
};
pub use svc::{SvcPrefix, SVC_PREFIX_LEN, SVC_PREFIX_TEMPLATE};
