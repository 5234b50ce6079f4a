//! Codec-side types: source pictures and the H.264 bitstream repacker

pub mod frame;
pub mod h264;

pub use frame::{FrameType, SourcePicture};
pub use h264::{
    repack_access_unit, LayerBitstream, LayerType, ParamSetCache, RepackOutcome, Repacker,
    SvcPrefix,
};
