//! Replay encoder service
//!
//! A software [`EncoderService`] that hands back a captured H.264 Annex-B
//! stream instead of encoding. It behaves like a hardware encoder's buffer
//! queues:
//!
//! - SPS and the PPS units that follow it come out as one codec-config
//!   buffer, ahead of the first slice.
//! - Each slice comes out as its own buffer, one per submitted frame.
//! - An optional format change is reported before the first buffer.
//! - Every new encoder restarts from the beginning of the stream, so a
//!   restart always opens with parameter sets and an IDR.
//!
//! Useful for driving the full frame pipeline without a device.

use super::common::EncoderConfig;
use super::{EncoderFactory, EncoderService, OutputStatus};
use crate::codec::h264::{
    find_nal_units_annex_b, NAL_TYPE_PPS, NAL_TYPE_SPS, START_CODE,
};
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

/// Default number of input buffers per encoder
pub const DEFAULT_INPUT_BUFFERS: usize = 2;

/// Split an Annex-B stream into encoder output buffers
///
/// Each buffer starts with a 4-byte start code. Units other than parameter
/// sets and slices are dropped, as are PPS units with no preceding SPS.
pub fn split_output_units(stream: &[u8]) -> Vec<Bytes> {
    let mut units = Vec::new();
    let mut config: Option<BytesMut> = None;

    for nal in find_nal_units_annex_b(stream) {
        match nal.nal_type {
            NAL_TYPE_SPS => {
                if let Some(done) = config.take() {
                    units.push(done.freeze());
                }
                let mut buf = BytesMut::with_capacity(64);
                buf.put_slice(&START_CODE);
                buf.put_slice(nal.data);
                config = Some(buf);
            }
            NAL_TYPE_PPS => match config.as_mut() {
                Some(buf) => {
                    buf.put_slice(&START_CODE);
                    buf.put_slice(nal.data);
                }
                None => trace!("Dropping PPS without SPS"),
            },
            _ if nal.is_slice() => {
                if let Some(done) = config.take() {
                    units.push(done.freeze());
                }
                let mut buf = BytesMut::with_capacity(START_CODE.len() + nal.data.len());
                buf.put_slice(&START_CODE);
                buf.put_slice(nal.data);
                units.push(buf.freeze());
            }
            other => trace!("Dropping NAL unit of type {}", other),
        }
    }

    if let Some(done) = config.take() {
        units.push(done.freeze());
    }
    units
}

fn is_config_unit(unit: &[u8]) -> bool {
    unit.get(4).map(|h| h & 0x1F) == Some(NAL_TYPE_SPS)
}

/// Factory for [`ReplayEncoder`] instances over one captured stream
#[derive(Debug, Clone)]
pub struct ReplayEncoderFactory {
    units: Vec<Bytes>,
    format_change: bool,
    input_buffers: usize,
    created: usize,
}

impl ReplayEncoderFactory {
    /// Build a factory from an Annex-B stream
    pub fn from_annex_b(stream: &[u8]) -> Result<Self> {
        let units = split_output_units(stream);
        if !units.iter().any(|unit| !is_config_unit(unit)) {
            return Err(Error::invalid_argument("stream contains no slices"));
        }
        Ok(Self::from_units(units))
    }

    /// Build a factory from pre-split output buffers
    pub fn from_units(units: Vec<Bytes>) -> Self {
        ReplayEncoderFactory {
            units,
            format_change: false,
            input_buffers: DEFAULT_INPUT_BUFFERS,
            created: 0,
        }
    }

    /// Report an output format change before the first buffer
    pub fn with_format_change(mut self, enabled: bool) -> Self {
        self.format_change = enabled;
        self
    }

    /// Number of input buffers each encoder exposes
    pub fn with_input_buffers(mut self, count: usize) -> Self {
        self.input_buffers = count.max(1);
        self
    }

    /// Output buffers replayed by every encoder
    pub fn units(&self) -> &[Bytes] {
        &self.units
    }

    /// Number of encoders created so far
    pub fn created(&self) -> usize {
        self.created
    }
}

impl EncoderFactory for ReplayEncoderFactory {
    type Service = ReplayEncoder;

    fn create_encoder(&mut self, config: &EncoderConfig) -> Result<ReplayEncoder> {
        config.validate()?;
        self.created += 1;
        debug!(
            "Starting replay encoder #{} with {} output units",
            self.created,
            self.units.len()
        );
        Ok(ReplayEncoder::new(
            self.units.clone(),
            config,
            self.input_buffers,
            self.format_change,
        ))
    }
}

/// Started replay encoder
#[derive(Debug)]
pub struct ReplayEncoder {
    units: Vec<Bytes>,
    cursor: usize,
    inputs: Vec<Vec<u8>>,
    input_acquired: Vec<bool>,
    outputs_acquired: Vec<usize>,
    pending_frames: usize,
    format_change: bool,
    frames_received: u64,
    last_timestamp_us: Option<u64>,
}

impl ReplayEncoder {
    fn new(
        units: Vec<Bytes>,
        config: &EncoderConfig,
        input_buffers: usize,
        format_change: bool,
    ) -> Self {
        let capacity = config.input_layout().frame_size();
        ReplayEncoder {
            units,
            cursor: 0,
            inputs: vec![vec![0u8; capacity]; input_buffers],
            input_acquired: vec![false; input_buffers],
            outputs_acquired: Vec::new(),
            pending_frames: 0,
            format_change,
            frames_received: 0,
            last_timestamp_us: None,
        }
    }

    /// Frames submitted to this encoder
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Timestamp of the most recent submitted frame
    pub fn last_timestamp_us(&self) -> Option<u64> {
        self.last_timestamp_us
    }

    /// Contents of an input buffer as last written
    pub fn input_contents(&self, index: usize) -> Option<&[u8]> {
        self.inputs.get(index).map(|buf| buf.as_slice())
    }

    /// Output buffers still held by the caller
    pub fn outstanding_outputs(&self) -> usize {
        self.outputs_acquired.len()
    }
}

impl EncoderService for ReplayEncoder {
    fn acquire_input_buffer(&mut self, _timeout_us: i64) -> Result<usize> {
        let index = self
            .input_acquired
            .iter()
            .position(|acquired| !acquired)
            .ok_or_else(|| Error::device("no input buffer available"))?;
        self.input_acquired[index] = true;
        Ok(index)
    }

    fn input_buffer(&mut self, index: usize) -> Result<&mut [u8]> {
        if !self.input_acquired.get(index).copied().unwrap_or(false) {
            return Err(Error::device(format!("input buffer {} not acquired", index)));
        }
        Ok(self.inputs[index].as_mut_slice())
    }

    fn submit_input_buffer(
        &mut self,
        index: usize,
        size: usize,
        timestamp_us: u64,
        _flags: u32,
    ) -> Result<()> {
        if !self.input_acquired.get(index).copied().unwrap_or(false) {
            return Err(Error::device(format!("input buffer {} not acquired", index)));
        }
        if size > self.inputs[index].len() {
            return Err(Error::BufferTooSmall {
                need: size,
                have: self.inputs[index].len(),
            });
        }

        self.input_acquired[index] = false;
        self.pending_frames += 1;
        self.frames_received += 1;
        self.last_timestamp_us = Some(timestamp_us);
        trace!("Replay encoder received frame at {} us", timestamp_us);
        Ok(())
    }

    fn discard_input_buffer(&mut self, index: usize) -> Result<()> {
        match self.input_acquired.get_mut(index) {
            Some(acquired) if *acquired => {
                *acquired = false;
                Ok(())
            }
            _ => Err(Error::device(format!("input buffer {} not acquired", index))),
        }
    }

    fn acquire_output_buffer(&mut self, _timeout_us: i64) -> Result<OutputStatus> {
        if self.format_change {
            self.format_change = false;
            return Ok(OutputStatus::FormatChanged);
        }

        let unit = self
            .units
            .get(self.cursor)
            .ok_or_else(|| Error::device("replay stream exhausted"))?;
        if self.pending_frames == 0 {
            return Err(Error::device("no output buffer available"));
        }
        if !is_config_unit(unit) {
            self.pending_frames -= 1;
        }

        let index = self.cursor;
        let size = unit.len();
        self.cursor += 1;
        self.outputs_acquired.push(index);
        Ok(OutputStatus::Ready { index, size })
    }

    fn output_buffer(&self, index: usize) -> Result<&[u8]> {
        if !self.outputs_acquired.contains(&index) {
            return Err(Error::device(format!("output buffer {} not acquired", index)));
        }
        Ok(&self.units[index][..])
    }

    fn release_output_buffer(&mut self, index: usize, _render: bool) -> Result<()> {
        let pos = self
            .outputs_acquired
            .iter()
            .position(|&held| held == index)
            .ok_or_else(|| Error::device(format!("output buffer {} not acquired", index)))?;
        self.outputs_acquired.swap_remove(pos);
        Ok(())
    }
}

impl Drop for ReplayEncoder {
    fn drop(&mut self) {
        debug!(
            "Stopping replay encoder after {} frames",
            self.frames_received
        );
    }
}
