//! Common test utilities for svcenc integration tests
//!
//! This module provides helpers for building raw I420 frames, canned H.264
//! encoder output, and a scripted encoder service that records everything
//! the session does to it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use svcenc_lib::codec::h264::{LayerBitstream, RepackOutcome};
use svcenc_lib::hwaccel::{EncoderConfig, EncoderFactory, EncoderService, OutputStatus};
use svcenc_lib::swscale::{half_dim, i420_frame_size};
use svcenc_lib::{Error, Result};

// ============================================================================
// Frame Generation
// ============================================================================

/// Build a packed I420 frame from per-plane sample functions
///
/// Each function receives `(x, y)` in the coordinates of its own plane.
pub fn i420_frame(
    width: usize,
    height: usize,
    luma: impl Fn(usize, usize) -> u8,
    cb: impl Fn(usize, usize) -> u8,
    cr: impl Fn(usize, usize) -> u8,
) -> Vec<u8> {
    let (cw, ch) = (half_dim(width), half_dim(height));
    let mut frame = Vec::with_capacity(i420_frame_size(width, height));

    for y in 0..height {
        for x in 0..width {
            frame.push(luma(x, y));
        }
    }
    for y in 0..ch {
        for x in 0..cw {
            frame.push(cb(x, y));
        }
    }
    for y in 0..ch {
        for x in 0..cw {
            frame.push(cr(x, y));
        }
    }
    frame
}

/// Frame with every plane set to a single value
pub fn flat_frame(width: usize, height: usize, y: u8, u: u8, v: u8) -> Vec<u8> {
    i420_frame(width, height, |_, _| y, |_, _| u, |_, _| v)
}

/// Frame with a distinct value at nearly every position
pub fn gradient_frame(width: usize, height: usize) -> Vec<u8> {
    i420_frame(
        width,
        height,
        |x, y| (x * 7 + y * 13) as u8,
        |x, y| (64 + x * 3 + y * 5) as u8,
        |x, y| (200 + x * 2 + y * 3) as u8,
    )
}

/// Flip every plane of a packed I420 frame upside down
pub fn flip_i420(frame: &[u8], width: usize, height: usize) -> Vec<u8> {
    let (cw, ch) = (half_dim(width), half_dim(height));
    let mut out = Vec::with_capacity(frame.len());

    let y_size = width * height;
    let c_size = cw * ch;
    let planes = [
        (&frame[..y_size], width, height),
        (&frame[y_size..y_size + c_size], cw, ch),
        (&frame[y_size + c_size..y_size + 2 * c_size], cw, ch),
    ];
    for (plane, w, h) in planes {
        for row in plane.chunks_exact(w).rev().take(h) {
            out.extend_from_slice(row);
        }
    }
    out
}

/// Rows of one plane of a packed frame
pub fn plane_rows(plane: &[u8], width: usize) -> Vec<&[u8]> {
    plane.chunks_exact(width).collect()
}

// ============================================================================
// Encoder Output
// ============================================================================

/// SPS followed by PPS, as one encoder output buffer
pub const SPS_PPS: [u8; 14] = [
    0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0xC0, 0x1E, 0xDA, // SPS
    0x00, 0x00, 0x00, 0x01, 0x68, // PPS
];

/// A second, different parameter set buffer
pub const SPS_PPS_ALT: [u8; 14] = [
    0x00, 0x00, 0x00, 0x01, 0x67, 0x4D, 0x40, 0x28, 0x95, // SPS
    0x00, 0x00, 0x00, 0x01, 0x68, // PPS
];

/// IDR slice buffer
pub const IDR_SLICE: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21];

/// Non-IDR slice buffer
pub const P_SLICE: [u8; 7] = [0x00, 0x00, 0x00, 0x01, 0x41, 0x9A, 0x02];

/// Concatenate buffers into one Annex-B stream
pub fn annex_b_stream(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Unwrap a written layer, failing the test on any other outcome
pub fn expect_layer(outcome: RepackOutcome) -> LayerBitstream {
    match outcome {
        RepackOutcome::Layer(layer) => layer,
        other => panic!("expected a layer, got {:?}", other),
    }
}

// ============================================================================
// Scripted Encoder Service
// ============================================================================

/// One scripted answer to an output dequeue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Hand out a buffer holding these bytes
    Output(Vec<u8>),
    /// Report an output format change
    FormatChanged,
    /// Fail the dequeue
    Fail,
}

/// Everything queued into an input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub index: usize,
    pub size: usize,
    pub timestamp_us: u64,
    pub flags: u32,
    pub contents: Vec<u8>,
}

/// Calls observed across every encoder a factory created
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub configs: Vec<EncoderConfig>,
    pub input_acquires: usize,
    pub submissions: Vec<Submission>,
    pub discarded: Vec<usize>,
    pub released: Vec<(usize, bool)>,
    pub output_dequeues: usize,
    pub stopped: usize,
    /// Input buffer size override, read on every input buffer access
    pub input_capacity: Option<usize>,
}

pub type SharedLog = Rc<RefCell<EncoderLog>>;

/// Factory handing out encoders that replay a fixed output script
///
/// Every created encoder starts from a fresh copy of its script. Encoder
/// `n` uses the `n`th script, or the last one once they run out.
pub struct ScriptedFactory {
    scripts: Vec<Vec<ScriptStep>>,
    create_limit: Option<usize>,
    log: SharedLog,
}

impl ScriptedFactory {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        ScriptedFactory {
            scripts: vec![script],
            create_limit: None,
            log: SharedLog::default(),
        }
    }

    /// Script for the next encoder created after the ones already scripted
    pub fn then_script(mut self, script: Vec<ScriptStep>) -> Self {
        self.scripts.push(script);
        self
    }

    /// Use input buffers of `capacity` bytes instead of one frame
    pub fn with_input_capacity(self, capacity: usize) -> Self {
        self.log.borrow_mut().input_capacity = Some(capacity);
        self
    }

    /// Fail every create after the first `limit`
    pub fn with_create_limit(mut self, limit: usize) -> Self {
        self.create_limit = Some(limit);
        self
    }

    pub fn log(&self) -> SharedLog {
        Rc::clone(&self.log)
    }
}

impl EncoderFactory for ScriptedFactory {
    type Service = ScriptedEncoder;

    fn create_encoder(&mut self, config: &EncoderConfig) -> Result<ScriptedEncoder> {
        let mut log = self.log.borrow_mut();
        if let Some(limit) = self.create_limit {
            if log.configs.len() >= limit {
                return Err(Error::device("encoder could not be created"));
            }
        }
        let script = &self.scripts[log.configs.len().min(self.scripts.len() - 1)];
        log.configs.push(config.clone());

        Ok(ScriptedEncoder {
            script: script.iter().cloned().collect(),
            frame_size: config.input_layout().frame_size(),
            input: Vec::new(),
            input_held: false,
            outputs: Vec::new(),
            log: Rc::clone(&self.log),
        })
    }
}

/// Encoder service driven by a [`ScriptedFactory`] script
///
/// Exposes a single input buffer that must be queued or discarded before
/// it can be acquired again.
pub struct ScriptedEncoder {
    script: VecDeque<ScriptStep>,
    frame_size: usize,
    input: Vec<u8>,
    input_held: bool,
    outputs: Vec<Vec<u8>>,
    log: SharedLog,
}

impl EncoderService for ScriptedEncoder {
    fn acquire_input_buffer(&mut self, _timeout_us: i64) -> Result<usize> {
        self.log.borrow_mut().input_acquires += 1;
        if self.input_held {
            return Err(Error::device("no input buffer available"));
        }
        self.input_held = true;
        Ok(0)
    }

    fn input_buffer(&mut self, index: usize) -> Result<&mut [u8]> {
        if index != 0 || !self.input_held {
            return Err(Error::invalid_argument(format!("no input buffer {}", index)));
        }
        let capacity = self.log.borrow().input_capacity.unwrap_or(self.frame_size);
        self.input.resize(capacity, 0);
        Ok(&mut self.input[..])
    }

    fn submit_input_buffer(
        &mut self,
        index: usize,
        size: usize,
        timestamp_us: u64,
        flags: u32,
    ) -> Result<()> {
        if index != 0 || !self.input_held {
            return Err(Error::device(format!("input buffer {} not acquired", index)));
        }
        self.input_held = false;
        let contents = self.input[..size.min(self.input.len())].to_vec();
        self.log.borrow_mut().submissions.push(Submission {
            index,
            size,
            timestamp_us,
            flags,
            contents,
        });
        Ok(())
    }

    fn discard_input_buffer(&mut self, index: usize) -> Result<()> {
        if index != 0 || !self.input_held {
            return Err(Error::device(format!("input buffer {} not acquired", index)));
        }
        self.input_held = false;
        self.log.borrow_mut().discarded.push(index);
        Ok(())
    }

    fn acquire_output_buffer(&mut self, _timeout_us: i64) -> Result<OutputStatus> {
        self.log.borrow_mut().output_dequeues += 1;
        match self.script.pop_front() {
            Some(ScriptStep::Output(bytes)) => {
                let size = bytes.len();
                self.outputs.push(bytes);
                Ok(OutputStatus::Ready {
                    index: self.outputs.len() - 1,
                    size,
                })
            }
            Some(ScriptStep::FormatChanged) => Ok(OutputStatus::FormatChanged),
            Some(ScriptStep::Fail) => Err(Error::device("scripted dequeue failure")),
            None => Err(Error::device("output script exhausted")),
        }
    }

    fn output_buffer(&self, index: usize) -> Result<&[u8]> {
        self.outputs
            .get(index)
            .map(|b| &b[..])
            .ok_or_else(|| Error::invalid_argument(format!("no output buffer {}", index)))
    }

    fn release_output_buffer(&mut self, index: usize, render: bool) -> Result<()> {
        self.log.borrow_mut().released.push((index, render));
        Ok(())
    }
}

impl Drop for ScriptedEncoder {
    fn drop(&mut self) {
        self.log.borrow_mut().stopped += 1;
    }
}

/// The script a well-behaved encoder produces: parameter sets, an IDR,
/// then `p_frames` non-IDR slices
pub fn idr_then_p(p_frames: usize) -> Vec<ScriptStep> {
    let mut script = vec![
        ScriptStep::Output(SPS_PPS.to_vec()),
        ScriptStep::Output(IDR_SLICE.to_vec()),
    ];
    script.extend((0..p_frames).map(|_| ScriptStep::Output(P_SLICE.to_vec())));
    script
}
