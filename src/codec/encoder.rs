//! Transmit frame encoding
//!
//! Fills one outbound 512-byte frame: control registers, then 63 rows of
//! muted audio (4 zero bytes) followed by 16-bit big-endian I and Q.

use num_complex::Complex32;

use crate::codec::decoder::FULL_SCALE_24;
use crate::protocol::control::{build_control_registers, ControlBank, RadioSettings};
use crate::protocol::{CONTROL_BLOCK_LEN, SUBFRAME_LEN, TX_ROW_LEN, TX_SAMPLES_PER_FRAME};

/// Scale factor for 16-bit transmit samples
pub const FULL_SCALE_16: f64 = 32_767.0;

/// Encode a normalized float as 16-bit two's complement, big-endian
///
/// Input is clamped to [-1, 1], scaled in double precision and truncated
/// toward zero.
#[inline]
pub fn encode_sample16(value: f32) -> [u8; 2] {
    let scaled = (f64::from(value).clamp(-1.0, 1.0) * FULL_SCALE_16) as i16;
    scaled.to_be_bytes()
}

/// Pack the low 24 bits of a sample, big-endian
#[inline]
pub fn encode_sample24(value: i32) -> [u8; 3] {
    let [_, b0, b1, b2] = value.to_be_bytes();
    [b0, b1, b2]
}

/// Nearest 24-bit integer for a normalized float
#[inline]
pub fn quantize24(value: f32) -> i32 {
    (f64::from(value) * FULL_SCALE_24)
        .round()
        .clamp(-FULL_SCALE_24 - 1.0, FULL_SCALE_24) as i32
}

/// Outcome of encoding one transmit frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bank: ControlBank,
    pub samples: usize,
    /// MOX set by VOX activity in this frame
    pub vox_keyed: bool,
}

/// Encode up to 63 samples plus the control registers for `bank`
///
/// The radio swaps I and Q on transmit, so the imaginary part goes into
/// the I field and the real part into the Q field. Rows past `samples`
/// are zeroed. Transmit-mute zeroes the IQ fields of every row.
pub fn encode_tx_frame(
    out: &mut [u8],
    bank: ControlBank,
    settings: &RadioSettings,
    samples: &[Complex32],
) -> EncodedFrame {
    let out = &mut out[..SUBFRAME_LEN];
    let samples = &samples[..samples.len().min(TX_SAMPLES_PER_FRAME)];

    build_control_registers(bank, settings, out);

    let muted = settings.ptt.mutes_tx();
    let body = &mut out[CONTROL_BLOCK_LEN..];
    body.fill(0);

    if !muted {
        for (row, sample) in body.chunks_exact_mut(TX_ROW_LEN).zip(samples) {
            // row[0..4]: left/right audio, not implemented by the radio path
            row[4..6].copy_from_slice(&encode_sample16(sample.im));
            row[6..8].copy_from_slice(&encode_sample16(sample.re));
        }
    }

    let vox_keyed = settings.ptt.apply_vox(out, samples.len());

    EncodedFrame { bank, samples: samples.len(), vox_keyed }
}
