//! Encoder session: the frame pipeline in front of a hardware encoder
//!
//! A session owns its factory and at most one started service. Pictures go
//! in through [`EncoderSession::encode_frame`], which scales or copies them
//! straight into the encoder's input buffer. Layers come out through
//! [`EncoderSession::get_bitstream`], which dequeues encoder output and
//! repacks it with SVC prefixes and cached parameter sets.
//!
//! Only one session may be open per process. Opening claims the encoder
//! device and closing (or dropping) the session gives it back.

use super::common::{EncoderConfig, EncoderStats};
use super::{EncoderFactory, EncoderService, OutputStatus, VideoEncoder, INFINITE_TIMEOUT};
use crate::codec::{LayerBitstream, RepackOutcome, Repacker, SourcePicture};
use crate::error::{Error, Result};
use crate::swscale::ScalerContext;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

static DEVICE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the encoder device, released on drop
#[derive(Debug)]
struct DeviceClaim {
    _private: (),
}

impl DeviceClaim {
    fn acquire() -> Result<Self> {
        DEVICE_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| DeviceClaim { _private: () })
            .map_err(|_| Error::AlreadyOpen)
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        DEVICE_CLAIMED.store(false, Ordering::Release);
    }
}

/// Frame pipeline over one encoder factory
///
/// States are closed (no service) and open (one started service). The
/// parameter set cache, the statistics and the timestamp guard are reset
/// on every [`open`](Self::open). An open session holds the process-wide
/// device claim, so opening a second session fails with `AlreadyOpen`.
pub struct EncoderSession<F: EncoderFactory> {
    factory: F,
    // dropped before the claim, so the device is stopped first
    service: Option<F::Service>,
    claim: Option<DeviceClaim>,
    config: EncoderConfig,
    repacker: Repacker,
    stats: EncoderStats,
    last_timestamp_ms: Option<u64>,
}

impl<F: EncoderFactory> EncoderSession<F> {
    /// Create a closed session
    pub fn new(factory: F) -> Self {
        EncoderSession {
            factory,
            service: None,
            claim: None,
            config: EncoderConfig::default(),
            repacker: Repacker::default(),
            stats: EncoderStats::default(),
            last_timestamp_ms: None,
        }
    }

    /// Validate `config`, then create and start an encoder for it
    pub fn open(&mut self, config: EncoderConfig) -> Result<()> {
        if self.service.is_some() {
            return Err(Error::AlreadyOpen);
        }
        config.validate()?;
        let claim = DeviceClaim::acquire()?;

        self.start(config)?;
        self.claim = Some(claim);
        self.stats = EncoderStats::default();
        self.last_timestamp_ms = None;
        Ok(())
    }

    /// Stop and release the encoder
    pub fn close(&mut self) -> Result<()> {
        match self.service.take() {
            Some(service) => {
                drop(service);
                self.claim = None;
                debug!(
                    "Closed encoder session after {} frames",
                    self.stats.frames_submitted
                );
                Ok(())
            }
            None => Err(Error::NotOpen),
        }
    }

    pub fn is_open(&self) -> bool {
        self.service.is_some()
    }

    /// Configuration of the current (or last) encoder
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The started service, if the session is open
    pub fn service(&self) -> Option<&F::Service> {
        self.service.as_ref()
    }

    fn start(&mut self, config: EncoderConfig) -> Result<()> {
        let repacker = Repacker::new(config.spatial_id)?;
        let service = self.factory.create_encoder(&config)?;

        info!(
            "Opened encoder session {}x{} @ {} kbps, {} fps, spatial id {}",
            config.width, config.height, config.target_kbps, config.frame_rate, config.spatial_id
        );

        self.service = Some(service);
        self.repacker = repacker;
        self.config = config;
        Ok(())
    }

    /// Close and start a fresh encoder with `config`
    ///
    /// The device claim is kept across the restart. The session is left
    /// closed, and the claim released, if the new encoder fails to start.
    fn reopen(&mut self, config: EncoderConfig) -> Result<()> {
        let service = self.service.take().ok_or(Error::NotOpen)?;
        drop(service);
        debug!("Stopped encoder for restart");

        if let Err(err) = self.start(config) {
            self.claim = None;
            return Err(err);
        }
        self.stats.reopen_count += 1;
        Ok(())
    }

    /// Scale or copy `picture` into an encoder input buffer and queue it
    ///
    /// The picture is copied when its size matches the encoder and scaled
    /// otherwise; bottom-up pictures always take the scale path. Timestamps
    /// must not go backwards within a session.
    ///
    /// The picture is checked before an input buffer is acquired. If the
    /// buffer cannot be filled it is handed back to the encoder.
    pub fn encode_frame(&mut self, picture: &SourcePicture<'_>) -> Result<()> {
        let service = self.service.as_mut().ok_or(Error::NotOpen)?;

        if let Some(last) = self.last_timestamp_ms {
            if picture.timestamp_ms < last {
                return Err(Error::invalid_argument(format!(
                    "timestamp {} ms precedes previous frame at {} ms",
                    picture.timestamp_ms, last
                )));
            }
        }
        let timestamp_us = picture.timestamp_ms.checked_mul(1000).ok_or_else(|| {
            Error::invalid_argument(format!(
                "timestamp {} ms overflows microseconds",
                picture.timestamp_ms
            ))
        })?;

        let scaler = ScalerContext::new(
            picture.width,
            picture.height,
            self.config.width as i32,
            self.config.height as i32,
        )?;
        scaler.validate_source(&picture.planes)?;
        let layout = self.config.input_layout();

        let index = service.acquire_input_buffer(INFINITE_TIMEOUT)?;
        let filled = service.input_buffer(index).and_then(|buffer| {
            let mut planes = layout.planes_mut(buffer)?;
            scaler.run(&picture.planes, &mut planes)
        });
        if let Err(err) = filled {
            if let Err(discard) = service.discard_input_buffer(index) {
                debug!("Could not hand back input buffer {}: {}", index, discard);
            }
            return Err(err);
        }

        service.submit_input_buffer(index, layout.frame_size(), timestamp_us, 0)?;

        trace!(
            "Queued frame {}x{} at {} us into input buffer {} ({})",
            picture.width,
            picture.height,
            timestamp_us,
            index,
            if scaler.is_passthrough() { "copy" } else { "scale" }
        );

        self.last_timestamp_ms = Some(picture.timestamp_ms);
        self.stats.frames_submitted += 1;
        Ok(())
    }

    /// Dequeue the next encoded layer and repack it into `dst`
    ///
    /// One output format change and one parameter-set-only buffer are
    /// absorbed per call. Every dequeued output buffer is released before
    /// returning.
    pub fn get_bitstream(&mut self, dst: &mut [u8]) -> Result<LayerBitstream> {
        let service = self.service.as_mut().ok_or(Error::NotOpen)?;

        let (index, size) = acquire_ready(service)?;
        let mut outcome = repack_output(service, &mut self.repacker, index, size, dst)?;

        if outcome == RepackOutcome::ParameterSetsCached {
            self.stats.parameter_sets_cached += 1;
            debug!(
                "Cached {} bytes of parameter sets, fetching next buffer",
                self.repacker.cache().len()
            );

            let (index, size) = match service.acquire_output_buffer(INFINITE_TIMEOUT)? {
                OutputStatus::Ready { index, size } => (index, size),
                OutputStatus::FormatChanged => {
                    return Err(Error::device(
                        "output format changed after parameter sets",
                    ))
                }
            };
            outcome = repack_output(service, &mut self.repacker, index, size, dst)?;
        }

        let layer = match outcome {
            RepackOutcome::Layer(layer) => layer,
            RepackOutcome::ParameterSetsCached => {
                return Err(Error::protocol(
                    "encoder emitted parameter sets twice in a row",
                ))
            }
        };

        self.stats.layers_emitted += 1;
        self.stats.bytes_output += layer.total_len() as u64;
        if layer.is_key_frame() {
            self.stats.idr_frames += 1;
        } else {
            self.stats.p_frames += 1;
        }

        trace!(
            "Emitted {} layer with {} NAL units, {} bytes",
            layer.frame_type,
            layer.nal_count(),
            layer.total_len()
        );
        Ok(layer)
    }

    /// Restart the encoder so the next layer is an IDR
    pub fn insert_key_frame(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        debug!("Restarting encoder for key frame");
        self.reopen(self.config.clone())
    }

    /// Restart the encoder with a new bitrate and frame rate
    ///
    /// A zero argument keeps the current value; both zero is rejected.
    pub fn update_bitrate(&mut self, target_kbps: u32, frame_rate: u32) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        if target_kbps == 0 && frame_rate == 0 {
            return Err(Error::invalid_argument(
                "bitrate and frame rate cannot both be zero",
            ));
        }

        let mut config = self.config.clone();
        if target_kbps != 0 {
            config.target_kbps = target_kbps;
        }
        if frame_rate != 0 {
            config.frame_rate = frame_rate;
        }

        debug!(
            "Updating encoder rate to {} kbps, {} fps",
            config.target_kbps, config.frame_rate
        );
        self.reopen(config)
    }
}

impl<F: EncoderFactory> VideoEncoder for EncoderSession<F> {
    fn encode_frame(&mut self, picture: &SourcePicture<'_>) -> Result<()> {
        EncoderSession::encode_frame(self, picture)
    }

    fn get_bitstream(&mut self, dst: &mut [u8]) -> Result<LayerBitstream> {
        EncoderSession::get_bitstream(self, dst)
    }

    fn insert_key_frame(&mut self) -> Result<()> {
        EncoderSession::insert_key_frame(self)
    }

    fn update_bitrate(&mut self, target_kbps: u32, frame_rate: u32) -> Result<()> {
        EncoderSession::update_bitrate(self, target_kbps, frame_rate)
    }

    fn close(&mut self) -> Result<()> {
        EncoderSession::close(self)
    }
}

/// Dequeue an output buffer, absorbing at most one format change
fn acquire_ready<S: EncoderService>(service: &mut S) -> Result<(usize, usize)> {
    match service.acquire_output_buffer(INFINITE_TIMEOUT)? {
        OutputStatus::Ready { index, size } => Ok((index, size)),
        OutputStatus::FormatChanged => {
            debug!("Encoder output format changed");
            match service.acquire_output_buffer(INFINITE_TIMEOUT)? {
                OutputStatus::Ready { index, size } => Ok((index, size)),
                OutputStatus::FormatChanged => {
                    Err(Error::device("output format changed twice in a row"))
                }
            }
        }
    }
}

/// Repack one dequeued output buffer, then release it
fn repack_output<S: EncoderService>(
    service: &mut S,
    repacker: &mut Repacker,
    index: usize,
    size: usize,
    dst: &mut [u8],
) -> Result<RepackOutcome> {
    let result = if size == 0 {
        Err(Error::device("encoder returned an empty output buffer"))
    } else {
        service.output_buffer(index).and_then(|buffer| {
            let raw = buffer.get(..size).ok_or_else(|| {
                Error::device(format!(
                    "output buffer {} holds {} bytes, {} reported",
                    index,
                    buffer.len(),
                    size
                ))
            })?;
            repacker.repack(raw, dst)
        })
    };

    let released = service.release_output_buffer(index, false);
    let outcome = result?;
    released?;
    Ok(outcome)
}
