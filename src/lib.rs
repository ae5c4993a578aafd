//! # Hermes Bridge
//!
//! Frame codec and buffering engine for HPSDR Hermes/Metis radios
//! (Protocol 1).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           HERMES / METIS                              │
//! │        EP6: 1032-byte frames          EP2: 2 x 512-byte frames        │
//! └──────────────┬───────────────────────────────────▲───────────────────┘
//!                │ UDP                               │ UDP
//!                ▼                                   │
//! ┌──────────────────────────────────────────────────┴───────────────────┐
//! │  Network thread (owns the socket, network::Transport)                 │
//! │                                                                       │
//! │   engine::HermesEngine::on_inbound_frame                              │
//! │     ├─ protocol::frame     sequence + sync validation                 │
//! │     ├─ protocol::status    ADC overload, firmware, AIN1..AIN6         │
//! │     ├─ scheduler           Rx frame count → Tx opportunity            │
//! │     │      └─ buffer::tx   drain 2 frames → Transport::send           │
//! │     └─ codec::decoder      24-bit IQ → f32 → buffer::rx               │
//! └──────────────┬───────────────────────────────────▲───────────────────┘
//!                │ pull_decoded_buffer               │ push_samples_to_encode
//!                ▼                                   │
//! ┌──────────────────────────────────────────────────┴───────────────────┐
//! │  Consumer (DSP / flowgraph)                                           │
//! │     codec::encoder + protocol::control + ptt  → buffer::tx            │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod network;
pub mod protocol;
pub mod ptt;
pub mod scheduler;
#[cfg(feature = "sim")]
pub mod sim;

pub use engine::{Disposition, FrameOutcome, HermesEngine};
pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Receive buffers in the pool (power of two)
    pub const DEFAULT_RX_POOL_SIZE: usize = 128;

    /// Floats per receive buffer (128 complex samples)
    pub const DEFAULT_RX_BUFFER_LEN: usize = 256;

    /// Transmit frames in the pool (power of two)
    pub const DEFAULT_TX_POOL_SIZE: usize = 128;

    /// Default network interface used for discovery
    pub const DEFAULT_INTERFACE: &str = "eth0";

    /// Wire rate of inbound frames per second for a given sample rate and receiver count
    pub const fn inbound_frames_per_second(sample_rate: u32, receivers: u32) -> u32 {
        // 126 complex samples per frame with one receiver, 72 with two
        let samples_per_frame = if receivers == 1 { 126 } else { 72 };
        sample_rate / samples_per_frame
    }
}
