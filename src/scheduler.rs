//! Transmit rate scheduling
//!
//! The radio has no flow control, so transmit timing is derived from the
//! receive stream: the transmitter consumes frames at a fixed 48 kHz while
//! receive frames arrive at a rate set by the sample rate and receiver
//! count.
//!
//! | Rx rate | Receivers | Rx frames per Tx frame | Fires when        |
//! |---------|-----------|------------------------|-------------------|
//! |  48000  | 1         | 1                      | always            |
//! |  96000  | 1         | 2                      | N % 2 == 0        |
//! | 192000  | 1         | 4                      | N % 4 == 0        |
//! | 384000  | 1         | 8                      | N % 8 == 0        |
//! |  48000  | 2         | 1.75                   | (N % 7) % 2 == 0  |
//! |  96000  | 2         | 3.5                    | (N % 7) % 4 == 0  |
//! | 192000  | 2         | 7                      | N % 7 == 0        |
//! | 384000  | 2         | 14                     | N % 14 == 0       |

use crate::protocol::{Receivers, SampleRate};

/// Decides, per received frame, whether a transmit opportunity occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxScheduler {
    rate: SampleRate,
    receivers: Receivers,
}

impl TxScheduler {
    pub fn new(rate: SampleRate, receivers: Receivers) -> Self {
        Self { rate, receivers }
    }

    /// Whether receive frame `count` (0-based since stream start) triggers a send
    pub fn should_transmit(&self, count: u64) -> bool {
        use Receivers::*;
        use SampleRate::*;

        match (self.receivers, self.rate) {
            (Single, Hz48000) => true,
            (Single, Hz96000) => count & 0x1 == 0,
            (Single, Hz192000) => count & 0x3 == 0,
            (Single, Hz384000) => count & 0x7 == 0,
            // 4 of every 7: 0, 2, 4, 6
            (Dual, Hz48000) => (count % 7) & 0x1 == 0,
            // 2 of every 7: 0, 4
            (Dual, Hz96000) => (count % 7) & 0x3 == 0,
            (Dual, Hz192000) => count % 7 == 0,
            (Dual, Hz384000) => count % 14 == 0,
        }
    }
}
