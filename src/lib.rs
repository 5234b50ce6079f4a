//! svcenc - SVC layer encoding front end for hardware H.264 encoders
//!
//! svcenc sits between a video source and a hardware H.264 encoder that
//! speaks a buffer-queue protocol. It scales incoming I420 frames into the
//! encoder's input buffers and turns the encoder's Annex-B output into
//! SVC-tagged layer bitstreams.
//!
//! # Architecture
//!
//! svcenc is organized into several key modules:
//!
//! - `swscale`: I420 scaling and copying into caller-owned buffers
//! - `codec`: source pictures, H.264 NAL helpers and the SVC repacker
//! - `hwaccel`: encoder service contract, the encoder session and a replay
//!   service for running without a device
//! - `capi`: C ABI over all of the above (feature `capi`)

pub mod codec;
pub mod error;
pub mod hwaccel;
pub mod swscale;

#[cfg(feature = "capi")]
pub mod capi;

pub use error::{Error, Result};

/// svcenc version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Configuration for the svcenc library
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize the svcenc library with the given configuration
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .try_init()
            .map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))?;
    }

    Ok(())
}
