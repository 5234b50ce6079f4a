//! Hardware encoder integration
//!
//! A hardware encoder is driven through a buffer-queue contract: the caller
//! dequeues an input buffer, fills it with a picture, queues it back, then
//! dequeues output buffers holding Annex-B bitstream. [`EncoderService`]
//! captures that contract; [`EncoderFactory`] configures and starts one.
//!
//! - `session`: the frame pipeline ([`EncoderSession`]) over any service
//! - `replay`: a software service that replays a captured H.264 stream
//! - `common`: configuration, statistics and input layout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svcenc_lib::hwaccel::{EncoderConfig, EncoderSession, ReplayEncoderFactory};
//!
//! let factory = ReplayEncoderFactory::from_annex_b(&stream)?;
//! let mut session = EncoderSession::new(factory);
//! session.open(EncoderConfig::new(640, 480))?;
//! session.encode_frame(&picture)?;
//! let layer = session.get_bitstream(&mut out)?;
//! ```

pub mod common;
pub mod replay;
pub mod session;

pub use common::{
    EncoderConfig, EncoderStats, InputLayout, COLOR_FORMAT_YUV420_PLANAR, MAX_SESSION_SPATIAL_ID,
};
pub use replay::{ReplayEncoder, ReplayEncoderFactory};
pub use session::EncoderSession;

use crate::codec::{LayerBitstream, SourcePicture};
use crate::error::Result;

/// Timeout value that blocks until a buffer is available
pub const INFINITE_TIMEOUT: i64 = -1;

/// Result of dequeuing an output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// A buffer holding `size` bytes of bitstream is ready at `index`
    Ready { index: usize, size: usize },
    /// The encoder changed its output format; no buffer was dequeued
    FormatChanged,
}

/// Buffer-queue contract of a started hardware encoder
///
/// Dropping the service stops the encoder and releases it.
pub trait EncoderService {
    /// Dequeue an input buffer, waiting up to `timeout_us` (-1 blocks)
    fn acquire_input_buffer(&mut self, timeout_us: i64) -> Result<usize>;

    /// Writable view of an input buffer; its length is the buffer capacity
    fn input_buffer(&mut self, index: usize) -> Result<&mut [u8]>;

    /// Queue a filled input buffer for encoding
    fn submit_input_buffer(
        &mut self,
        index: usize,
        size: usize,
        timestamp_us: u64,
        flags: u32,
    ) -> Result<()>;

    /// Hand back an acquired input buffer that will not be filled
    ///
    /// The default queues it with no payload.
    fn discard_input_buffer(&mut self, index: usize) -> Result<()> {
        self.submit_input_buffer(index, 0, 0, 0)
    }

    /// Dequeue an output buffer, waiting up to `timeout_us` (-1 blocks)
    fn acquire_output_buffer(&mut self, timeout_us: i64) -> Result<OutputStatus>;

    /// Read-only view of an output buffer
    fn output_buffer(&self, index: usize) -> Result<&[u8]>;

    /// Give an output buffer back to the encoder
    fn release_output_buffer(&mut self, index: usize, render: bool) -> Result<()>;
}

/// Creates configured and started encoder services
pub trait EncoderFactory {
    type Service: EncoderService;

    /// Configure and start a new encoder for `config`
    fn create_encoder(&mut self, config: &EncoderConfig) -> Result<Self::Service>;
}

/// Capability interface of an SVC layer encoder
///
/// Adapters (the C ABI, the CLI) drive encoding only through this trait.
pub trait VideoEncoder {
    /// Scale or copy a picture into the encoder and queue it
    fn encode_frame(&mut self, picture: &SourcePicture<'_>) -> Result<()>;

    /// Fetch the next layer bitstream into `dst`
    fn get_bitstream(&mut self, dst: &mut [u8]) -> Result<LayerBitstream>;

    /// Force the next emitted layer to be an IDR
    fn insert_key_frame(&mut self) -> Result<()>;

    /// Change the target bitrate (kbit/s) and frame rate; zero keeps a value
    fn update_bitrate(&mut self, target_kbps: u32, frame_rate: u32) -> Result<()>;

    /// Stop the encoder
    fn close(&mut self) -> Result<()>;
}
