//! Device telemetry carried in inbound status registers

use serde::Serialize;

use crate::protocol::frame::ControlBlock;

/// Latest telemetry reported by the radio
///
/// Updated opportunistically from whichever status address each valid
/// sub-frame carries. Nothing on the data path depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub adc_overload: bool,
    pub firmware_version: u8,
    /// Analog inputs AIN1..AIN6 (AIN1 forward power, AIN2 reverse power)
    pub ain: [u16; 6],
    /// Status blocks applied since construction
    pub updates: u64,
}

impl StatusSnapshot {
    /// Fold one sub-frame's control block into the snapshot
    pub fn apply(&mut self, block: &ControlBlock) {
        let hi = u16::from_be_bytes([block.c1, block.c2]);
        let lo = u16::from_be_bytes([block.c3, block.c4]);

        match block.c0 & 0xF8 {
            0x00 => {
                self.adc_overload = block.c1 & 0x01 != 0;
                self.firmware_version = block.c4;
            }
            0x08 => {
                self.ain[4] = hi;
                self.ain[0] = lo;
            }
            0x10 => {
                self.ain[1] = hi;
                self.ain[2] = lo;
            }
            0x18 => {
                self.ain[3] = hi;
                self.ain[5] = lo;
            }
            _ => {}
        }
        self.updates += 1;
    }

    /// Alex forward power in raw detector units
    pub fn forward_power(&self) -> f32 {
        let v = f32::from(self.ain[0]);
        v * v / 145_000.0
    }

    pub fn reverse_power(&self) -> f32 {
        let v = f32::from(self.ain[1]);
        v * v / 145_000.0
    }

    /// Standing wave ratio, 99.9 when the ratio is not a normal number
    pub fn swr(&self) -> f64 {
        let ratio = (f64::from(self.reverse_power()) / f64::from(self.forward_power())).sqrt();
        let swr = (1.0 + ratio) / (1.0 - ratio);
        if swr.is_normal() {
            swr
        } else {
            99.9
        }
    }

    /// Emit the power/SWR summary line
    pub fn log_telemetry(&self) {
        let fwd = self.forward_power();
        if fwd as i32 != 0 {
            tracing::info!(
                "AlexFwdPwr = {:4.0}  AlexRevPwr = {:4.0}  SWR = {:.2}:1  ADCOver: {}  HermesVersion: {} ({:#X})",
                fwd,
                self.reverse_power(),
                self.swr(),
                self.adc_overload,
                self.firmware_version,
                self.firmware_version
            );
        } else {
            tracing::info!(
                "AlexFwdPwr = {:4.0}  AlexRevPwr = {:4.0}  ADCOver: {}  HermesVersion: {} ({:#X})",
                fwd,
                self.reverse_power(),
                self.adc_overload,
                self.firmware_version,
                self.firmware_version
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(c0: u8, c1: u8, c2: u8, c3: u8, c4: u8) -> ControlBlock {
        ControlBlock { c0, c1, c2, c3, c4 }
    }

    #[test]
    fn test_overload_and_version() {
        let mut status = StatusSnapshot::default();
        status.apply(&block(0x00, 0x01, 0, 0, 31));
        assert!(status.adc_overload);
        assert_eq!(status.firmware_version, 31);

        // PTT/dot/dash bits in C0 do not change the address
        status.apply(&block(0x05, 0x00, 0, 0, 32));
        assert!(!status.adc_overload);
        assert_eq!(status.firmware_version, 32);
        assert_eq!(status.updates, 2);
    }

    #[test]
    fn test_analog_inputs() {
        let mut status = StatusSnapshot::default();
        status.apply(&block(0x08, 0x00, 0x05, 0x01, 0x00));
        status.apply(&block(0x10, 0x00, 0x80, 0x00, 0x03));
        status.apply(&block(0x18, 0x12, 0x34, 0xAB, 0xCD));

        assert_eq!(status.ain, [0x0100, 0x0080, 0x0003, 0x1234, 0x0005, 0xABCD]);
    }

    #[test]
    fn test_unknown_address_ignored() {
        let mut status = StatusSnapshot::default();
        status.apply(&block(0x20, 0xFF, 0xFF, 0xFF, 0xFF));
        assert_eq!(status.ain, [0; 6]);
        assert!(!status.adc_overload);
    }

    #[test]
    fn test_swr() {
        let mut status = StatusSnapshot::default();
        // no forward power: 0/0 is NaN
        assert_eq!(status.swr(), 99.9);

        status.ain[0] = 1000;
        status.ain[1] = 0;
        assert_eq!(status.swr(), 1.0);

        status.ain[1] = 500;
        // sqrt(r/f) = 0.5
        assert!((status.swr() - 3.0).abs() < 1e-4);
    }
}
