//! PTT/VOX keying and mute policy
//!
//! Keying is evaluated per frame: there is no hang time, so a VOX frame
//! that carries signal keys the transmitter for that frame only.

use serde::{Deserialize, Serialize};

use crate::protocol::{CONTROL_BLOCK_LEN, MOX_BIT, TX_ROW_LEN};

/// Operator-selected PTT mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PttMode {
    /// Receiving
    #[default]
    Off,
    /// Transmitting
    On,
    /// Keyed by signal activity in each outbound frame
    Vox,
}

/// PTT mode plus the two mute policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PttPolicy {
    pub mode: PttMode,
    /// Zero transmit samples and drive while PTT is Off
    pub off_mutes_tx: bool,
    /// Zero decoded receive samples while PTT is On
    pub on_mutes_rx: bool,
}

impl PttPolicy {
    /// MOX bit from the static mode alone
    #[inline]
    pub fn mox(&self) -> bool {
        self.mode == PttMode::On
    }

    #[inline]
    pub fn mutes_tx(&self) -> bool {
        self.off_mutes_tx && self.mode == PttMode::Off
    }

    #[inline]
    pub fn mutes_rx(&self) -> bool {
        self.on_mutes_rx && self.mode == PttMode::On
    }

    /// Set the MOX bit of an encoded frame if VOX detects activity
    ///
    /// `samples` is the number of rows actually encoded. Returns whether
    /// the frame was keyed by VOX.
    pub fn apply_vox(&self, frame: &mut [u8], samples: usize) -> bool {
        if self.mode != PttMode::Vox {
            return false;
        }

        let active = frame[CONTROL_BLOCK_LEN..]
            .chunks_exact(TX_ROW_LEN)
            .take(samples)
            .any(|row| row[4..8].iter().any(|&b| b != 0));

        if active {
            frame[3] |= MOX_BIT;
        }
        active
    }
}
