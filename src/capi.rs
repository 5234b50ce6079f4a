//! svcenc C API
//!
//! Thin `extern "C"` wrappers over the scaler, the repacker and the encoder
//! session, for hosts that embed the library from C or through a scripting
//! bridge on top of C.
//!
//! The hardware encoder itself is supplied by the host as a table of
//! callbacks ([`SvcencEncoderCallbacks`]) that implement the buffer-queue
//! contract.
//!
//! # Safety
//!
//! All functions are designed to be called from C code. They check for null
//! pointers and report failures as [`SvcencStatus`] codes. Plane pointers
//! must address at least `(rows - 1) * stride + width` readable (or
//! writable) bytes, and source and destination must not overlap.
//!
//! # Example Usage (C)
//!
//! ```c
//! SvcencEncoder* enc = NULL;
//! if (svcenc_encoder_create(&callbacks, &config, &enc) != SVCENC_SUCCESS) {
//!     return 1;
//! }
//!
//! svcenc_encode_frame(enc, &picture);
//! SvcencLayerInfo layer;
//! svcenc_get_bitstream(enc, out, sizeof(out), &layer);
//!
//! svcenc_encoder_delete(enc);
//! ```

use crate::codec::{FrameType, LayerBitstream, ParamSetCache, RepackOutcome, SourcePicture};
use crate::error::{Error, Result};
use crate::hwaccel::{
    EncoderConfig, EncoderFactory, EncoderService, EncoderSession, OutputStatus,
};
use crate::swscale::{self, half_dim, I420Planes, I420PlanesMut, Plane, PlaneMut};
use std::ffi::{c_char, c_void};
use std::slice;

// ============================================================================
// Status Codes
// ============================================================================

/// Status codes returned by svcenc functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcencStatus {
    /// A parameter set buffer was cached; fetch the next buffer
    ParameterSetsCached = 1,
    /// Operation completed successfully
    Success = 0,
    /// Invalid argument provided
    InvalidArgument = -1,
    /// Null pointer provided where non-null was expected
    NullPointer = -2,
    /// Encoder session is not open
    NotOpen = -3,
    /// Encoder session is already open
    AlreadyOpen = -4,
    /// Encoder device failed
    DeviceError = -5,
    /// Encoder output violated the expected protocol
    ProtocolError = -6,
    /// Buffer too small for operation
    BufferTooSmall = -7,
    /// Configuration error
    ConfigError = -8,
    /// I/O error
    IoError = -9,
}

impl From<&Error> for SvcencStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidArgument(_) => SvcencStatus::InvalidArgument,
            Error::NotOpen => SvcencStatus::NotOpen,
            Error::AlreadyOpen => SvcencStatus::AlreadyOpen,
            Error::Device(_) => SvcencStatus::DeviceError,
            Error::Protocol(_) => SvcencStatus::ProtocolError,
            Error::BufferTooSmall { .. } => SvcencStatus::BufferTooSmall,
            Error::Config(_) => SvcencStatus::ConfigError,
            Error::Io(_) => SvcencStatus::IoError,
        }
    }
}

fn status_of(result: Result<()>) -> SvcencStatus {
    match result {
        Ok(()) => SvcencStatus::Success,
        Err(err) => SvcencStatus::from(&err),
    }
}

/// Value returned by `dequeue_output` when the output format changed
pub const SVCENC_INFO_FORMAT_CHANGED: isize = -2;

// ============================================================================
// Images and Layers
// ============================================================================

/// Read-only I420 image: Y, U, V plane pointers and strides
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SvcencI420 {
    pub planes: [*const u8; 3],
    pub strides: [i32; 3],
}

/// Writable I420 image: Y, U, V plane pointers and strides
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SvcencI420Mut {
    pub planes: [*mut u8; 3],
    pub strides: [i32; 3],
}

/// Source picture for `svcenc_encode_frame`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SvcencSourcePicture {
    pub image: SvcencI420,
    pub width: i32,
    /// Negative for bottom-up images
    pub height: i32,
    pub timestamp_ms: u64,
}

/// Frame type of an emitted layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcencFrameType {
    Invalid = 0,
    Idr = 1,
    P = 3,
}

/// Description of one emitted layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvcencLayerInfo {
    pub nal_count: u32,
    pub nal_lengths: [u32; 2],
    pub frame_type: SvcencFrameType,
    pub temporal_id: u8,
    pub quality_id: u8,
    pub spatial_id: u8,
    pub layer_type: u8,
}

impl Default for SvcencLayerInfo {
    fn default() -> Self {
        SvcencLayerInfo {
            nal_count: 0,
            nal_lengths: [0; 2],
            frame_type: SvcencFrameType::Invalid,
            temporal_id: 0,
            quality_id: 0,
            spatial_id: 0,
            layer_type: 0,
        }
    }
}

impl From<&LayerBitstream> for SvcencLayerInfo {
    fn from(layer: &LayerBitstream) -> Self {
        let mut nal_lengths = [0u32; 2];
        for (out, &len) in nal_lengths.iter_mut().zip(layer.nal_lengths()) {
            *out = len as u32;
        }
        SvcencLayerInfo {
            nal_count: layer.nal_count() as u32,
            nal_lengths,
            frame_type: match layer.frame_type {
                FrameType::Idr => SvcencFrameType::Idr,
                FrameType::P => SvcencFrameType::P,
            },
            temporal_id: layer.temporal_id,
            quality_id: layer.quality_id,
            spatial_id: layer.spatial_id,
            layer_type: layer.layer_type as u8,
        }
    }
}

/// Length of a plane region: `(rows - 1) * stride + width`
fn plane_len(stride: i32, width: usize, rows: usize, name: &str) -> Result<(usize, usize)> {
    if stride <= 0 || (stride as usize) < width {
        return Err(Error::invalid_argument(format!(
            "{} stride {} is less than width {}",
            name, stride, width
        )));
    }
    let stride = stride as usize;
    let len = rows
        .checked_sub(1)
        .and_then(|r| r.checked_mul(stride))
        .and_then(|n| n.checked_add(width))
        .ok_or_else(|| Error::invalid_argument(format!("{} geometry overflows", name)))?;
    Ok((stride, len))
}

unsafe fn source_planes<'a>(image: &SvcencI420, width: usize, rows: usize) -> Result<I420Planes<'a>> {
    let dims = [
        (width, rows),
        (half_dim(width), half_dim(rows)),
        (half_dim(width), half_dim(rows)),
    ];
    let mut planes = [Plane::new(&[], 0); 3];
    for (i, &(w, h)) in dims.iter().enumerate() {
        if image.planes[i].is_null() {
            return Err(Error::invalid_argument("null source plane"));
        }
        let (stride, len) = plane_len(image.strides[i], w, h, "source")?;
        planes[i] = Plane::new(slice::from_raw_parts(image.planes[i], len), stride);
    }
    let [y, u, v] = planes;
    Ok(I420Planes::new(y, u, v))
}

unsafe fn destination_planes<'a>(
    image: &SvcencI420Mut,
    width: usize,
    rows: usize,
) -> Result<I420PlanesMut<'a>> {
    let dims = [
        (width, rows),
        (half_dim(width), half_dim(rows)),
        (half_dim(width), half_dim(rows)),
    ];
    let mut lens = [(0usize, 0usize); 3];
    for (i, &(w, h)) in dims.iter().enumerate() {
        if image.planes[i].is_null() {
            return Err(Error::invalid_argument("null destination plane"));
        }
        lens[i] = plane_len(image.strides[i], w, h, "destination")?;
    }
    let plane = |i: usize| {
        let (stride, len) = lens[i];
        PlaneMut::new(slice::from_raw_parts_mut(image.planes[i], len), stride)
    };
    Ok(I420PlanesMut::new(plane(0), plane(1), plane(2)))
}

fn positive_dims(width: i32, height: i32) -> Result<(usize, usize)> {
    if width <= 0 || height == 0 {
        return Err(Error::invalid_argument(format!(
            "invalid geometry {}x{}",
            width, height
        )));
    }
    Ok((width as usize, height.unsigned_abs() as usize))
}

// ============================================================================
// Scaler
// ============================================================================

/// Scale an I420 image; a negative `src_height` flips a bottom-up source.
///
/// # Safety
///
/// `src` and `dst` must point to valid image descriptors whose planes cover
/// the given geometry. Nothing is written unless every check passes.
#[no_mangle]
pub unsafe extern "C" fn svcenc_scale_i420(
    src: *const SvcencI420,
    src_width: i32,
    src_height: i32,
    dst: *mut SvcencI420Mut,
    dst_width: i32,
    dst_height: i32,
) -> SvcencStatus {
    if src.is_null() || dst.is_null() {
        return SvcencStatus::NullPointer;
    }

    status_of((|| {
        let (sw, sh) = positive_dims(src_width, src_height)?;
        if dst_height < 0 {
            return Err(Error::invalid_argument("destination height must be positive"));
        }
        let (dw, dh) = positive_dims(dst_width, dst_height)?;
        let src_planes = source_planes(&*src, sw, sh)?;
        let mut dst_planes = destination_planes(&*dst, dw, dh)?;
        swscale::scale_i420(
            &src_planes,
            src_width,
            src_height,
            &mut dst_planes,
            dst_width,
            dst_height,
        )
    })())
}

/// Copy an I420 image of identical size; a negative `height` flips it.
///
/// # Safety
///
/// `src` and `dst` must point to valid image descriptors whose planes cover
/// the given geometry.
#[no_mangle]
pub unsafe extern "C" fn svcenc_copy_i420(
    src: *const SvcencI420,
    dst: *mut SvcencI420Mut,
    width: i32,
    height: i32,
) -> SvcencStatus {
    if src.is_null() || dst.is_null() {
        return SvcencStatus::NullPointer;
    }

    status_of((|| {
        let (w, h) = positive_dims(width, height)?;
        let src_planes = source_planes(&*src, w, h)?;
        let mut dst_planes = destination_planes(&*dst, w, h)?;
        swscale::copy_i420(&src_planes, &mut dst_planes, width, height)
    })())
}

// ============================================================================
// Repacker
// ============================================================================

/// Allocate an empty parameter set cache. Free with `svcenc_param_cache_free`.
#[no_mangle]
pub extern "C" fn svcenc_param_cache_new() -> *mut ParamSetCache {
    Box::into_raw(Box::new(ParamSetCache::new()))
}

/// Free a parameter set cache.
///
/// # Safety
///
/// `cache` must come from `svcenc_param_cache_new` and not be used again.
#[no_mangle]
pub unsafe extern "C" fn svcenc_param_cache_free(cache: *mut ParamSetCache) {
    if !cache.is_null() {
        drop(Box::from_raw(cache));
    }
}

/// Drop the cached parameter sets.
///
/// # Safety
///
/// `cache` must be null or come from `svcenc_param_cache_new`.
#[no_mangle]
pub unsafe extern "C" fn svcenc_param_cache_reset(cache: *mut ParamSetCache) {
    if let Some(cache) = cache.as_mut() {
        cache.reset();
    }
}

/// Repack one Annex-B encoder output buffer.
///
/// Returns `SVCENC_PARAMETER_SETS_CACHED` when the buffer only held
/// parameter sets; `layer` is then left zeroed.
///
/// # Safety
///
/// `raw` must address `raw_len` readable bytes and `dst` `dst_len` writable
/// bytes; `cache` must come from `svcenc_param_cache_new`.
#[no_mangle]
pub unsafe extern "C" fn svcenc_repack_access_unit(
    raw: *const u8,
    raw_len: usize,
    spatial_id: u8,
    cache: *mut ParamSetCache,
    dst: *mut u8,
    dst_len: usize,
    layer: *mut SvcencLayerInfo,
) -> SvcencStatus {
    if raw.is_null() || cache.is_null() || dst.is_null() || layer.is_null() {
        return SvcencStatus::NullPointer;
    }

    let raw = slice::from_raw_parts(raw, raw_len);
    let dst = slice::from_raw_parts_mut(dst, dst_len);
    *layer = SvcencLayerInfo::default();

    match crate::codec::repack_access_unit(raw, spatial_id, &mut *cache, dst) {
        Ok(RepackOutcome::ParameterSetsCached) => SvcencStatus::ParameterSetsCached,
        Ok(RepackOutcome::Layer(bitstream)) => {
            *layer = SvcencLayerInfo::from(&bitstream);
            SvcencStatus::Success
        }
        Err(err) => SvcencStatus::from(&err),
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Encoder configuration
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvcencConfig {
    pub width: u32,
    pub height: u32,
    pub target_kbps: u32,
    pub frame_rate: u32,
    pub temporal_layers: u32,
    /// Spatial layer id, 0-3
    pub spatial_id: u32,
    pub mem_type: u32,
    pub key_frame_interval: u32,
    pub color_format: i32,
}

impl From<&EncoderConfig> for SvcencConfig {
    fn from(config: &EncoderConfig) -> Self {
        SvcencConfig {
            width: config.width,
            height: config.height,
            target_kbps: config.target_kbps,
            frame_rate: config.frame_rate,
            temporal_layers: config.temporal_layers,
            spatial_id: config.spatial_id as u32,
            mem_type: config.mem_type,
            key_frame_interval: config.key_frame_interval,
            color_format: config.color_format,
        }
    }
}

impl TryFrom<&SvcencConfig> for EncoderConfig {
    type Error = Error;

    fn try_from(config: &SvcencConfig) -> Result<Self> {
        let spatial_id = u8::try_from(config.spatial_id).map_err(|_| {
            Error::invalid_argument(format!("spatial id {} out of range", config.spatial_id))
        })?;
        Ok(EncoderConfig {
            width: config.width,
            height: config.height,
            target_kbps: config.target_kbps,
            frame_rate: config.frame_rate,
            temporal_layers: config.temporal_layers,
            spatial_id,
            mem_type: config.mem_type,
            key_frame_interval: config.key_frame_interval,
            color_format: config.color_format,
        })
    }
}

/// Host-supplied hardware encoder
///
/// `create` configures and starts a codec and returns its handle (null on
/// failure); `destroy` stops and frees it. The remaining callbacks receive
/// that handle. Negative return values report failure, except
/// [`SVCENC_INFO_FORMAT_CHANGED`] from `dequeue_output`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SvcencEncoderCallbacks {
    pub user_data: *mut c_void,
    pub create:
        Option<unsafe extern "C" fn(user_data: *mut c_void, config: *const SvcencConfig) -> *mut c_void>,
    pub destroy: Option<unsafe extern "C" fn(user_data: *mut c_void, codec: *mut c_void)>,
    pub dequeue_input: Option<unsafe extern "C" fn(codec: *mut c_void, timeout_us: i64) -> isize>,
    pub get_input_buffer:
        Option<unsafe extern "C" fn(codec: *mut c_void, index: usize, capacity: *mut usize) -> *mut u8>,
    pub queue_input: Option<
        unsafe extern "C" fn(
            codec: *mut c_void,
            index: usize,
            size: usize,
            timestamp_us: u64,
            flags: u32,
        ) -> i32,
    >,
    pub dequeue_output: Option<
        unsafe extern "C" fn(codec: *mut c_void, size: *mut usize, timeout_us: i64) -> isize,
    >,
    pub get_output_buffer: Option<
        unsafe extern "C" fn(codec: *mut c_void, index: usize, capacity: *mut usize) -> *const u8,
    >,
    pub release_output:
        Option<unsafe extern "C" fn(codec: *mut c_void, index: usize, render: bool) -> i32>,
}

/// Callbacks with every entry checked present
#[derive(Clone, Copy)]
struct Callbacks {
    user_data: *mut c_void,
    create: unsafe extern "C" fn(*mut c_void, *const SvcencConfig) -> *mut c_void,
    destroy: unsafe extern "C" fn(*mut c_void, *mut c_void),
    dequeue_input: unsafe extern "C" fn(*mut c_void, i64) -> isize,
    get_input_buffer: unsafe extern "C" fn(*mut c_void, usize, *mut usize) -> *mut u8,
    queue_input: unsafe extern "C" fn(*mut c_void, usize, usize, u64, u32) -> i32,
    dequeue_output: unsafe extern "C" fn(*mut c_void, *mut usize, i64) -> isize,
    get_output_buffer: unsafe extern "C" fn(*mut c_void, usize, *mut usize) -> *const u8,
    release_output: unsafe extern "C" fn(*mut c_void, usize, bool) -> i32,
}

impl Callbacks {
    fn from_table(table: &SvcencEncoderCallbacks) -> Result<Self> {
        let missing = || Error::invalid_argument("encoder callback table is incomplete");
        Ok(Callbacks {
            user_data: table.user_data,
            create: table.create.ok_or_else(missing)?,
            destroy: table.destroy.ok_or_else(missing)?,
            dequeue_input: table.dequeue_input.ok_or_else(missing)?,
            get_input_buffer: table.get_input_buffer.ok_or_else(missing)?,
            queue_input: table.queue_input.ok_or_else(missing)?,
            dequeue_output: table.dequeue_output.ok_or_else(missing)?,
            get_output_buffer: table.get_output_buffer.ok_or_else(missing)?,
            release_output: table.release_output.ok_or_else(missing)?,
        })
    }
}

/// Factory that creates encoders through host callbacks
pub struct CallbackEncoderFactory {
    callbacks: Callbacks,
}

impl EncoderFactory for CallbackEncoderFactory {
    type Service = CallbackEncoder;

    fn create_encoder(&mut self, config: &EncoderConfig) -> Result<CallbackEncoder> {
        let c_config = SvcencConfig::from(config);
        let codec = unsafe { (self.callbacks.create)(self.callbacks.user_data, &c_config) };
        if codec.is_null() {
            return Err(Error::device("host failed to create encoder"));
        }
        Ok(CallbackEncoder {
            callbacks: self.callbacks,
            codec,
        })
    }
}

/// Started host encoder
pub struct CallbackEncoder {
    callbacks: Callbacks,
    codec: *mut c_void,
}

impl EncoderService for CallbackEncoder {
    fn acquire_input_buffer(&mut self, timeout_us: i64) -> Result<usize> {
        let index = unsafe { (self.callbacks.dequeue_input)(self.codec, timeout_us) };
        if index < 0 {
            return Err(Error::device(format!("dequeue input failed ({})", index)));
        }
        Ok(index as usize)
    }

    fn input_buffer(&mut self, index: usize) -> Result<&mut [u8]> {
        let mut capacity = 0usize;
        let ptr = unsafe { (self.callbacks.get_input_buffer)(self.codec, index, &mut capacity) };
        if ptr.is_null() {
            return Err(Error::device(format!("no input buffer at index {}", index)));
        }
        Ok(unsafe { slice::from_raw_parts_mut(ptr, capacity) })
    }

    fn submit_input_buffer(
        &mut self,
        index: usize,
        size: usize,
        timestamp_us: u64,
        flags: u32,
    ) -> Result<()> {
        let rc =
            unsafe { (self.callbacks.queue_input)(self.codec, index, size, timestamp_us, flags) };
        if rc < 0 {
            return Err(Error::device(format!("queue input failed ({})", rc)));
        }
        Ok(())
    }

    fn acquire_output_buffer(&mut self, timeout_us: i64) -> Result<OutputStatus> {
        let mut size = 0usize;
        let index = unsafe { (self.callbacks.dequeue_output)(self.codec, &mut size, timeout_us) };
        match index {
            SVCENC_INFO_FORMAT_CHANGED => Ok(OutputStatus::FormatChanged),
            i if i < 0 => Err(Error::device(format!("dequeue output failed ({})", i))),
            i => Ok(OutputStatus::Ready {
                index: i as usize,
                size,
            }),
        }
    }

    fn output_buffer(&self, index: usize) -> Result<&[u8]> {
        let mut capacity = 0usize;
        let ptr = unsafe { (self.callbacks.get_output_buffer)(self.codec, index, &mut capacity) };
        if ptr.is_null() {
            return Err(Error::device(format!("no output buffer at index {}", index)));
        }
        Ok(unsafe { slice::from_raw_parts(ptr, capacity) })
    }

    fn release_output_buffer(&mut self, index: usize, render: bool) -> Result<()> {
        let rc = unsafe { (self.callbacks.release_output)(self.codec, index, render) };
        if rc < 0 {
            return Err(Error::device(format!("release output failed ({})", rc)));
        }
        Ok(())
    }
}

impl Drop for CallbackEncoder {
    fn drop(&mut self) {
        unsafe { (self.callbacks.destroy)(self.callbacks.user_data, self.codec) };
    }
}

/// Opaque encoder handle
pub struct SvcencEncoder {
    session: EncoderSession<CallbackEncoderFactory>,
}

/// Create and open an encoder.
///
/// # Safety
///
/// `callbacks` and `config` must point to valid structures; the callbacks
/// must stay valid until `svcenc_encoder_delete`.
#[no_mangle]
pub unsafe extern "C" fn svcenc_encoder_create(
    callbacks: *const SvcencEncoderCallbacks,
    config: *const SvcencConfig,
    encoder: *mut *mut SvcencEncoder,
) -> SvcencStatus {
    if callbacks.is_null() || config.is_null() || encoder.is_null() {
        return SvcencStatus::NullPointer;
    }
    *encoder = std::ptr::null_mut();

    let created = (|| -> Result<SvcencEncoder> {
        let callbacks = Callbacks::from_table(&*callbacks)?;
        let config = EncoderConfig::try_from(&*config)?;
        let mut session = EncoderSession::new(CallbackEncoderFactory { callbacks });
        session.open(config)?;
        Ok(SvcencEncoder { session })
    })();

    match created {
        Ok(handle) => {
            *encoder = Box::into_raw(Box::new(handle));
            SvcencStatus::Success
        }
        Err(err) => SvcencStatus::from(&err),
    }
}

/// Close and free an encoder.
///
/// # Safety
///
/// `encoder` must be null or come from `svcenc_encoder_create`, and must not
/// be used again.
#[no_mangle]
pub unsafe extern "C" fn svcenc_encoder_delete(encoder: *mut SvcencEncoder) {
    if encoder.is_null() {
        return;
    }
    let mut handle = Box::from_raw(encoder);
    if handle.session.is_open() {
        let _ = handle.session.close();
    }
}

/// Scale or copy a picture into the encoder and queue it.
///
/// # Safety
///
/// `encoder` must come from `svcenc_encoder_create`; `picture` must describe
/// valid planes.
#[no_mangle]
pub unsafe extern "C" fn svcenc_encode_frame(
    encoder: *mut SvcencEncoder,
    picture: *const SvcencSourcePicture,
) -> SvcencStatus {
    let (handle, picture) = match (encoder.as_mut(), picture.as_ref()) {
        (Some(h), Some(p)) => (h, p),
        _ => return SvcencStatus::NullPointer,
    };

    status_of((|| {
        let (w, h) = positive_dims(picture.width, picture.height)?;
        let planes = source_planes(&picture.image, w, h)?;
        let source = SourcePicture::new(planes, picture.width, picture.height, picture.timestamp_ms);
        handle.session.encode_frame(&source)
    })())
}

/// Fetch the next encoded layer into `dst`.
///
/// # Safety
///
/// `encoder` must come from `svcenc_encoder_create`; `dst` must address
/// `dst_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn svcenc_get_bitstream(
    encoder: *mut SvcencEncoder,
    dst: *mut u8,
    dst_len: usize,
    layer: *mut SvcencLayerInfo,
) -> SvcencStatus {
    if encoder.is_null() || dst.is_null() || layer.is_null() {
        return SvcencStatus::NullPointer;
    }

    let handle = &mut *encoder;
    let dst = slice::from_raw_parts_mut(dst, dst_len);
    *layer = SvcencLayerInfo::default();

    match handle.session.get_bitstream(dst) {
        Ok(bitstream) => {
            *layer = SvcencLayerInfo::from(&bitstream);
            SvcencStatus::Success
        }
        Err(err) => SvcencStatus::from(&err),
    }
}

/// Restart the encoder with a new bitrate (kbit/s) and frame rate.
///
/// # Safety
///
/// `encoder` must come from `svcenc_encoder_create`.
#[no_mangle]
pub unsafe extern "C" fn svcenc_update_bitrate(
    encoder: *mut SvcencEncoder,
    target_kbps: u32,
    frame_rate: u32,
) -> SvcencStatus {
    match encoder.as_mut() {
        Some(handle) => status_of(handle.session.update_bitrate(target_kbps, frame_rate)),
        None => SvcencStatus::NullPointer,
    }
}

/// Restart the encoder so the next layer is an IDR.
///
/// # Safety
///
/// `encoder` must come from `svcenc_encoder_create`.
#[no_mangle]
pub unsafe extern "C" fn svcenc_insert_key_frame(encoder: *mut SvcencEncoder) -> SvcencStatus {
    match encoder.as_mut() {
        Some(handle) => status_of(handle.session.insert_key_frame()),
        None => SvcencStatus::NullPointer,
    }
}

/// Get a human-readable message for a status code.
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn svcenc_error_string(status: SvcencStatus) -> *const c_char {
    let msg: &'static [u8] = match status {
        SvcencStatus::ParameterSetsCached => b"Parameter sets cached\0",
        SvcencStatus::Success => b"Success\0",
        SvcencStatus::InvalidArgument => b"Invalid argument\0",
        SvcencStatus::NullPointer => b"Null pointer\0",
        SvcencStatus::NotOpen => b"Encoder not open\0",
        SvcencStatus::AlreadyOpen => b"Encoder already open\0",
        SvcencStatus::DeviceError => b"Device error\0",
        SvcencStatus::ProtocolError => b"Protocol error\0",
        SvcencStatus::BufferTooSmall => b"Buffer too small\0",
        SvcencStatus::ConfigError => b"Configuration error\0",
        SvcencStatus::IoError => b"I/O error\0",
    };
    msg.as_ptr() as *const c_char
}
