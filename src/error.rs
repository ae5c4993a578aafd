//! Error types for the Hermes bridge

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound frame validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame length {0} bytes, expected {expected}", expected = crate::protocol::INBOUND_FRAME_LEN)]
    BadLength(usize),

    #[error("Sub-frame {subframe} failed sync check: {bytes:02X?}")]
    SyncMismatch { subframe: usize, bytes: [u8; 3] },
}

/// Configuration and operator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Pool size {0} is not a non-zero power of two")]
    PoolSize(usize),

    #[error("Receive buffer length {0} is not a non-zero multiple of 4")]
    BufferLength(usize),

    #[error("Unsupported receiver count: {0}")]
    ReceiverCount(u8),

    #[error("Unsupported receive sample rate: {0}")]
    SampleRate(u32),

    #[error("Invalid control register bank: {0}")]
    InvalidBank(u8),

    #[error("Receiver index {0} out of range")]
    ReceiverIndex(usize),

    #[error("Attenuator setting {0} dB out of range (0..=31)")]
    Attenuator(u8),

    #[error("Malformed MAC address: {0}")]
    MacAddress(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Transport collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Send to endpoint {endpoint} failed: {reason}")]
    SendFailed { endpoint: u8, reason: String },

    #[error("Receive stream control failed: {0}")]
    StreamControl(String),

    #[error("Transport closed")]
    Closed,
}

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;
