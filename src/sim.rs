//! Synthetic Hermes board
//!
//! Generates well-formed inbound payloads for the bench harness and the
//! integration tests: incrementing sequence numbers, cycling status
//! registers, a test signal, and injectable faults.

use std::f64::consts::TAU;

use crate::codec::encoder::{encode_sample24, quantize24};
use crate::protocol::{
    Receivers, SampleRate, CONTROL_BLOCK_LEN, INBOUND_FRAME_LEN, SUBFRAME_LEN, SYNC,
    TRANSPORT_HEADER_LEN,
};

/// Metis EP6 data packet prefix
const EP6_HEADER: [u8; 4] = [0xEF, 0xFE, 0x01, 0x06];

/// Status addresses reported in rotation
const STATUS_ADDRESSES: [u8; 4] = [0x00, 0x08, 0x10, 0x18];

/// Sample content of generated rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Complex tone at `frequency` Hz offset, `amplitude` of full scale
    Tone { frequency: f64, amplitude: f64 },
    /// Fixed raw 24-bit I and Q on every row and receiver
    Constant { i: i32, q: i32 },
}

pub struct SyntheticRadio {
    receivers: Receivers,
    sample_rate: SampleRate,
    signal: Signal,
    phase: f64,
    sequence: u32,
    status_cursor: usize,
    firmware_version: u8,
    forward: u16,
    reverse: u16,
    adc_overload: bool,
    corrupt_next: Option<usize>,
}

impl SyntheticRadio {
    pub fn new(receivers: Receivers, sample_rate: SampleRate) -> Self {
        Self {
            receivers,
            sample_rate,
            signal: Signal::Tone { frequency: 1_000.0, amplitude: 0.5 },
            phase: 0.0,
            sequence: 0,
            status_cursor: 0,
            firmware_version: 25,
            forward: 0,
            reverse: 0,
            adc_overload: false,
            corrupt_next: None,
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_firmware_version(mut self, version: u8) -> Self {
        self.firmware_version = version;
        self
    }

    /// Raw AIN1 (forward) and AIN2 (reverse) detector readings
    pub fn set_power(&mut self, forward: u16, reverse: u16) {
        self.forward = forward;
        self.reverse = reverse;
    }

    pub fn set_adc_overload(&mut self, overload: bool) {
        self.adc_overload = overload;
    }

    /// Sequence number the next frame will carry
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Pretend `frames` frames were lost on the wire
    pub fn skip(&mut self, frames: u32) {
        self.sequence = self.sequence.wrapping_add(frames);
    }

    /// Break the sync pattern of `subframe` (0 or 1) in the next frame
    pub fn corrupt_next(&mut self, subframe: usize) {
        self.corrupt_next = Some(subframe.min(1));
    }

    /// Produce the next inbound payload
    pub fn next_frame(&mut self) -> Vec<u8> {
        let mut out = vec![0u8; INBOUND_FRAME_LEN];
        self.fill_frame(&mut out);
        out
    }

    /// Write the next inbound payload into `out` (at least 1032 bytes)
    pub fn fill_frame(&mut self, out: &mut [u8]) {
        let out = &mut out[..INBOUND_FRAME_LEN];
        out.fill(0);
        out[..4].copy_from_slice(&EP6_HEADER);
        out[4..8].copy_from_slice(&self.sequence.to_be_bytes());
        self.sequence = self.sequence.wrapping_add(1);

        let corrupt = self.corrupt_next.take();
        for (index, sub) in out[TRANSPORT_HEADER_LEN..].chunks_exact_mut(SUBFRAME_LEN).enumerate() {
            sub[..3].copy_from_slice(&[SYNC; 3]);
            if corrupt == Some(index) {
                sub[2] = 0x7E;
            }
            self.write_status(&mut sub[3..CONTROL_BLOCK_LEN]);
            self.write_rows(&mut sub[CONTROL_BLOCK_LEN..]);
        }
    }

    fn write_status(&mut self, block: &mut [u8]) {
        let address = STATUS_ADDRESSES[self.status_cursor];
        self.status_cursor = (self.status_cursor + 1) % STATUS_ADDRESSES.len();

        block[0] = address;
        match address {
            0x00 => {
                block[1] = u8::from(self.adc_overload);
                block[4] = self.firmware_version;
            }
            0x08 => block[3..5].copy_from_slice(&self.forward.to_be_bytes()),
            0x10 => block[1..3].copy_from_slice(&self.reverse.to_be_bytes()),
            _ => {}
        }
    }

    fn write_rows(&mut self, body: &mut [u8]) {
        let row_len = self.receivers.row_len();
        let rows = self.receivers.rows_per_subframe();
        let step = match self.signal {
            Signal::Tone { frequency, .. } => TAU * frequency / f64::from(self.sample_rate.hz()),
            Signal::Constant { .. } => 0.0,
        };

        for row in body[..rows * row_len].chunks_exact_mut(row_len) {
            let (i, q) = match self.signal {
                Signal::Tone { amplitude, .. } => {
                    let (sin, cos) = self.phase.sin_cos();
                    (quantize24((amplitude * cos) as f32), quantize24((amplitude * sin) as f32))
                }
                Signal::Constant { i, q } => (i, q),
            };
            self.phase = (self.phase + step) % TAU;

            for rx in 0..self.receivers.count() {
                let base = rx * 6;
                row[base..base + 3].copy_from_slice(&encode_sample24(i));
                row[base + 3..base + 6].copy_from_slice(&encode_sample24(q));
            }
        }
    }
}
