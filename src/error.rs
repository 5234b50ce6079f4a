//! Error types for svcenc

use thiserror::Error;

/// Result type alias for svcenc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for svcenc
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed, empty or zero-sized input, rejected before any buffer is touched
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation invoked outside an active encoder session
    #[error("Encoder session is not open")]
    NotOpen,

    /// A session is already open on this encoder
    #[error("Encoder session is already open")]
    AlreadyOpen,

    /// The external encoder service failed
    #[error("Device error: {0}")]
    Device(String),

    /// Bitstream violates the expected encoder output protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Destination cannot hold the composed output
    #[error("Buffer too small: need {need}, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a device error
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Error::Device(msg.into())
    }

    /// Create a protocol error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
