//! Receive sample decoding
//!
//! Inbound IQ samples are 24-bit two's complement, big-endian, three bytes
//! per component. Each row ends with a 16-bit microphone sample that is
//! not decoded.

use crate::protocol::Receivers;

/// Largest positive 24-bit magnitude, the normalization divisor
pub const FULL_SCALE_24: f64 = 8_388_607.0;

/// Sign-extend one 24-bit big-endian field
#[inline]
pub fn decode_sample24_raw(bytes: &[u8]) -> i32 {
    i32::from_be_bytes([bytes[0], bytes[1], bytes[2], 0]) >> 8
}

/// Scale a 24-bit integer into [-1.0, +1.0]
///
/// The division happens in double precision before rounding to f32; the
/// one value below -full-scale (-8 388 608) is clamped to -1.0.
#[inline]
pub fn normalize24(raw: i32) -> f32 {
    (f64::from(raw) / FULL_SCALE_24).max(-1.0) as f32
}

/// Decode one 24-bit field straight to a normalized float
#[inline]
pub fn decode_sample24(bytes: &[u8]) -> f32 {
    normalize24(decode_sample24_raw(bytes))
}

/// Unpacks inbound sample rows for a fixed receiver count
#[derive(Debug, Clone, Copy)]
pub struct RowDecoder {
    receivers: Receivers,
}

impl RowDecoder {
    pub fn new(receivers: Receivers) -> Self {
        Self { receivers }
    }

    pub fn receivers(&self) -> Receivers {
        self.receivers
    }

    /// Floats written per row
    pub fn floats_per_row(&self) -> usize {
        self.receivers.floats_per_row()
    }

    /// Decode one row into `out` as interleaved I/Q per receiver
    ///
    /// When `muted`, `out` is zeroed and the row bytes are never read.
    pub fn decode_row(&self, row: &[u8], muted: bool, out: &mut [f32]) {
        let out = &mut out[..self.floats_per_row()];
        if muted {
            out.fill(0.0);
            return;
        }

        for (value, field) in out.iter_mut().zip(row.chunks_exact(3)) {
            *value = decode_sample24(field);
        }
    }
}
