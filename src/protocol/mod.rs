//! HPSDR Protocol 1 wire definitions
//!
//! ```text
//! Inbound (EP6, 1032 bytes):
//! ┌──────────────┬────────────────────────────┬────────────────────────────┐
//! │ EF FE 01 06  │ sub-frame 0 (512)          │ sub-frame 1 (512)          │
//! │ seq (u32 BE) │ 7F 7F 7F C0 C1 C2 C3 C4    │ 7F 7F 7F C0 C1 C2 C3 C4    │
//! │              │ rows: 63 x 8  (1 Rx)       │ rows: 63 x 8  (1 Rx)       │
//! │              │       36 x 14 (2 Rx)       │       36 x 14 (2 Rx)       │
//! └──────────────┴────────────────────────────┴────────────────────────────┘
//!
//! Outbound (EP2, sent as pairs of 512-byte frames):
//! ┌─────────────────────────────┬──────────────────────────────────────────┐
//! │ 7F 7F 7F C0 C1 C2 C3 C4     │ 63 rows: L1 L0 R1 R0 | I1 I0 Q1 Q0       │
//! └─────────────────────────────┴──────────────────────────────────────────┘
//! ```

pub mod control;
pub mod frame;
pub mod status;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use control::{BankCycler, ControlBank, RadioSettings};
pub use frame::{InboundFrame, SequenceTracker};
pub use status::StatusSnapshot;

/// Sync byte repeated three times at the start of every sub-frame
pub const SYNC: u8 = 0x7f;

/// Size of one USB-style sub-frame
pub const SUBFRAME_LEN: usize = 512;

/// Transport header preceding the sub-frames of an inbound payload
pub const TRANSPORT_HEADER_LEN: usize = 8;

/// Offset of the big-endian sequence number inside the transport header
pub const SEQUENCE_OFFSET: usize = 4;

/// Full inbound payload: header plus two sub-frames
pub const INBOUND_FRAME_LEN: usize = TRANSPORT_HEADER_LEN + 2 * SUBFRAME_LEN;

/// Sync plus C0..C4 at the head of each sub-frame
pub const CONTROL_BLOCK_LEN: usize = 8;

/// Endpoint that receives all outbound frames
pub const TX_ENDPOINT: u8 = 0x02;

/// Bytes per outbound sample row (muted audio + IQ)
pub const TX_ROW_LEN: usize = 8;

/// IQ samples carried by one outbound frame
pub const TX_SAMPLES_PER_FRAME: usize = (SUBFRAME_LEN - CONTROL_BLOCK_LEN) / TX_ROW_LEN;

/// Fixed transmit sample rate
pub const TX_SAMPLE_RATE: u32 = 48_000;

/// C0 bit keying the transmitter
pub const MOX_BIT: u8 = 0x01;

/// Receive sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleRate {
    Hz48000,
    Hz96000,
    Hz192000,
    Hz384000,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Hz48000 => 48_000,
            SampleRate::Hz96000 => 96_000,
            SampleRate::Hz192000 => 192_000,
            SampleRate::Hz384000 => 384_000,
        }
    }

    /// Speed bits for C1 of bank 0
    pub fn speed_bits(self) -> u8 {
        match self {
            SampleRate::Hz48000 => 0x00,
            SampleRate::Hz96000 => 0x01,
            SampleRate::Hz192000 => 0x02,
            SampleRate::Hz384000 => 0x03,
        }
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = ConfigError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        match hz {
            48_000 => Ok(SampleRate::Hz48000),
            96_000 => Ok(SampleRate::Hz96000),
            192_000 => Ok(SampleRate::Hz192000),
            384_000 => Ok(SampleRate::Hz384000),
            other => Err(ConfigError::SampleRate(other)),
        }
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.hz()
    }
}

/// Number of active receivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Receivers {
    Single,
    Dual,
}

impl Receivers {
    pub fn count(self) -> usize {
        match self {
            Receivers::Single => 1,
            Receivers::Dual => 2,
        }
    }

    /// Bytes per inbound sample row, mic sample included
    pub fn row_len(self) -> usize {
        self.count() * 6 + 2
    }

    /// Complete rows that fit after the control block of a sub-frame
    pub fn rows_per_subframe(self) -> usize {
        (SUBFRAME_LEN - CONTROL_BLOCK_LEN) / self.row_len()
    }

    /// Floats produced per row (I and Q per receiver)
    pub fn floats_per_row(self) -> usize {
        self.count() * 2
    }
}

impl TryFrom<u8> for Receivers {
    type Error = ConfigError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Receivers::Single),
            2 => Ok(Receivers::Dual),
            other => Err(ConfigError::ReceiverCount(other)),
        }
    }
}

impl From<Receivers> for u8 {
    fn from(receivers: Receivers) -> Self {
        receivers.count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(INBOUND_FRAME_LEN, 1032);
        assert_eq!(TX_SAMPLES_PER_FRAME, 63);
        assert_eq!(Receivers::Single.row_len(), 8);
        assert_eq!(Receivers::Dual.row_len(), 14);
        assert_eq!(Receivers::Single.rows_per_subframe(), 63);
        assert_eq!(Receivers::Dual.rows_per_subframe(), 36);
    }

    #[test]
    fn test_sample_rate_conversion() {
        assert_eq!(SampleRate::try_from(96_000), Ok(SampleRate::Hz96000));
        assert_eq!(SampleRate::try_from(44_100), Err(ConfigError::SampleRate(44_100)));
        assert_eq!(u32::from(SampleRate::Hz384000), 384_000);
        assert_eq!(SampleRate::Hz192000.speed_bits(), 0x02);
    }

    #[test]
    fn test_receivers_conversion() {
        assert_eq!(Receivers::try_from(2), Ok(Receivers::Dual));
        assert_eq!(Receivers::try_from(0), Err(ConfigError::ReceiverCount(0)));
        assert_eq!(u8::from(Receivers::Single), 1);
    }
}
