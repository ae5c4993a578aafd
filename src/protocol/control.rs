//! Outbound control register banks
//!
//! Every outbound frame opens with sync plus C0..C4. C0 carries the bank
//! address (even) and the MOX bit; C1..C4 carry the bank payload. The
//! radio only learns about configuration changes through this cycle.

use crate::config::{AlexConfig, EngineConfig};
use crate::error::ConfigError;
use crate::protocol::{Receivers, SampleRate, CONTROL_BLOCK_LEN, MOX_BIT, SYNC};
use crate::ptt::PttPolicy;

/// Addressable control register bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlBank {
    /// Clock source, sample rate, ADC flags, receiver count, duplex, antennas
    Config,
    /// Transmit NCO frequency
    TxFrequency,
    /// Receiver 0 NCO frequency
    Rx0Frequency,
    /// Receiver 1 NCO frequency
    Rx1Frequency,
    /// Receivers 2..6, zero-filled
    Rx2Frequency,
    Rx3Frequency,
    Rx4Frequency,
    Rx5Frequency,
    Rx6Frequency,
    /// Drive level and Alex filter selection
    DriveFilters,
    /// Input attenuator
    Attenuator,
    /// Undocumented, zero-filled
    Spare,
}

impl ControlBank {
    /// Map a C0 bank address to its bank
    pub fn from_address(address: u8) -> Result<Self, ConfigError> {
        match address {
            0 => Ok(ControlBank::Config),
            2 => Ok(ControlBank::TxFrequency),
            4 => Ok(ControlBank::Rx0Frequency),
            6 => Ok(ControlBank::Rx1Frequency),
            8 => Ok(ControlBank::Rx2Frequency),
            10 => Ok(ControlBank::Rx3Frequency),
            12 => Ok(ControlBank::Rx4Frequency),
            14 => Ok(ControlBank::Rx5Frequency),
            16 => Ok(ControlBank::Rx6Frequency),
            18 => Ok(ControlBank::DriveFilters),
            20 => Ok(ControlBank::Attenuator),
            22 => Ok(ControlBank::Spare),
            other => Err(ConfigError::InvalidBank(other)),
        }
    }

    /// C0 bank address
    pub fn address(self) -> u8 {
        match self {
            ControlBank::Config => 0,
            ControlBank::TxFrequency => 2,
            ControlBank::Rx0Frequency => 4,
            ControlBank::Rx1Frequency => 6,
            ControlBank::Rx2Frequency => 8,
            ControlBank::Rx3Frequency => 10,
            ControlBank::Rx4Frequency => 12,
            ControlBank::Rx5Frequency => 14,
            ControlBank::Rx6Frequency => 16,
            ControlBank::DriveFilters => 18,
            ControlBank::Attenuator => 20,
            ControlBank::Spare => 22,
        }
    }
}

/// Bank cursor advanced once per encoded transmit frame
///
/// Cycles 2, 4, ..., 20, 0, 2, ...; the spare bank is never visited.
#[derive(Debug, Default)]
pub struct BankCycler {
    address: u8,
}

impl BankCycler {
    const LAST: u8 = 20;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self) -> ControlBank {
        self.address += 2;
        if self.address > Self::LAST {
            self.address = 0;
        }
        ControlBank::from_address(self.address).unwrap_or(ControlBank::Config)
    }
}

/// Radio state reflected into the control registers
///
/// Copied out of the engine's shared state for each frame so that the
/// register builder never holds a lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioSettings {
    pub rx_frequencies: [u32; 2],
    pub tx_frequency: u32,
    pub sample_rate: SampleRate,
    pub receivers: Receivers,
    pub clock_source: u8,
    pub preamp: bool,
    pub dither: bool,
    pub random: bool,
    pub duplex: bool,
    pub attenuator: u8,
    pub tx_drive: u8,
    pub alex: AlexConfig,
    pub ptt: PttPolicy,
}

impl RadioSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        let radio = &config.radio;
        Self {
            rx_frequencies: radio.rx_frequencies,
            tx_frequency: radio.tx_frequency,
            sample_rate: radio.sample_rate,
            receivers: radio.receivers,
            clock_source: radio.clock_source,
            preamp: radio.preamp,
            dither: radio.dither,
            random: radio.random,
            duplex: radio.duplex,
            attenuator: radio.attenuator,
            tx_drive: radio.tx_drive,
            alex: config.alex,
            ptt: config.ptt,
        }
    }
}

/// Write sync, C0 and the bank payload into the first 8 bytes of `out`
pub fn build_control_registers(bank: ControlBank, settings: &RadioSettings, out: &mut [u8]) {
    let regs = &mut out[..CONTROL_BLOCK_LEN];
    regs[..3].fill(SYNC);

    regs[3] = bank.address();
    if settings.ptt.mox() {
        regs[3] |= MOX_BIT;
    }

    let payload: [u8; 4] = match bank {
        ControlBank::Config => {
            let speed = (settings.clock_source & 0xFC) | settings.sample_rate.speed_bits();

            let mut rx_ctrl = 0u8;
            if settings.preamp {
                rx_ctrl |= 0x04;
            }
            if settings.dither {
                rx_ctrl |= 0x08;
            }
            if settings.random {
                rx_ctrl |= 0x10;
            }

            let mut ctrl4 = 0u8;
            if settings.receivers == Receivers::Dual {
                ctrl4 |= 0x08;
            }
            if settings.duplex {
                ctrl4 |= 0x04;
            }

            [
                speed,
                0x00,
                rx_ctrl | settings.alex.rx_antenna,
                ctrl4 | settings.alex.tx_antenna,
            ]
        }
        ControlBank::TxFrequency => settings.tx_frequency.to_be_bytes(),
        ControlBank::Rx0Frequency => settings.rx_frequencies[0].to_be_bytes(),
        ControlBank::Rx1Frequency => settings.rx_frequencies[1].to_be_bytes(),
        ControlBank::Rx2Frequency
        | ControlBank::Rx3Frequency
        | ControlBank::Rx4Frequency
        | ControlBank::Rx5Frequency
        | ControlBank::Rx6Frequency
        | ControlBank::Spare => [0; 4],
        ControlBank::DriveFilters => {
            let drive = if settings.ptt.mutes_tx() { 0 } else { settings.tx_drive };

            let hpf = match settings.alex.rx_hpf {
                0 => autotrack_rx_hpf(settings.rx_frequencies[0]),
                manual => manual,
            };
            let lpf = match settings.alex.tx_lpf {
                0 => autotrack_tx_lpf(settings.tx_frequency),
                manual => manual,
            };

            // C2 0x40: Alex manual filter control
            [drive, 0x40, hpf & 0x7f, lpf & 0x7f]
        }
        ControlBank::Attenuator => [0x00, 0x17, 0x00, settings.attenuator],
    };

    regs[4..].copy_from_slice(&payload);
}

/// Build registers for a raw C0 address
///
/// An address outside the bank table is an operator error: it is logged,
/// returned, and `out` is left as it was.
pub fn build_control_registers_at(
    address: u8,
    settings: &RadioSettings,
    out: &mut [u8],
) -> Result<(), ConfigError> {
    match ControlBank::from_address(address) {
        Ok(bank) => {
            build_control_registers(bank, settings, out);
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Invalid Hermes/Metis register selection: {}", address);
            Err(e)
        }
    }
}

/// Alex receive high-pass filter for a receive frequency
pub fn autotrack_rx_hpf(frequency: u32) -> u8 {
    match frequency {
        f if f < 1_500_000 => 0x20,  // bypass
        f if f < 6_500_000 => 0x10,  // 1.5 MHz HPF
        f if f < 9_500_000 => 0x08,  // 6.5 MHz HPF
        f if f < 13_000_000 => 0x04, // 9.5 MHz HPF
        f if f < 20_000_000 => 0x01, // 13 MHz HPF
        f if f < 50_000_000 => 0x02, // 20 MHz HPF
        _ => 0x40,                   // 6 m BPF + LNA
    }
}

/// Alex transmit low-pass filter for a transmit frequency
pub fn autotrack_tx_lpf(frequency: u32) -> u8 {
    match frequency {
        f if f > 30_000_000 => 0x10, // 6 m
        f if f > 19_000_000 => 0x20, // 10/12 m
        f if f > 14_900_000 => 0x40, // 15/17 m
        f if f > 9_900_000 => 0x01,  // 30/20 m
        f if f > 4_900_000 => 0x02,  // 60/40 m
        f if f > 3_400_000 => 0x04,  // 80 m
        _ => 0x08,                   // 160 m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptt::PttMode;

    fn settings() -> RadioSettings {
        RadioSettings::from_config(&EngineConfig::default())
    }

    fn build(bank: ControlBank, settings: &RadioSettings) -> [u8; 8] {
        let mut out = [0u8; 8];
        build_control_registers(bank, settings, &mut out);
        out
    }

    #[test]
    fn test_bank_addresses_roundtrip() {
        for address in (0..=22).step_by(2) {
            let bank = ControlBank::from_address(address).unwrap();
            assert_eq!(bank.address(), address);
        }
        assert_eq!(ControlBank::from_address(3), Err(ConfigError::InvalidBank(3)));
        assert_eq!(ControlBank::from_address(24), Err(ConfigError::InvalidBank(24)));
    }

    #[test]
    fn test_every_bank_has_one_address() {
        use ControlBank::*;

        let banks = [
            Config,
            TxFrequency,
            Rx0Frequency,
            Rx1Frequency,
            Rx2Frequency,
            Rx3Frequency,
            Rx4Frequency,
            Rx5Frequency,
            Rx6Frequency,
            DriveFilters,
            Attenuator,
            Spare,
        ];
        let addresses: Vec<u8> = banks.iter().map(|bank| bank.address()).collect();
        assert_eq!(addresses, (0..=22).step_by(2).collect::<Vec<u8>>());
        for bank in banks {
            assert_eq!(ControlBank::from_address(bank.address()), Ok(bank));
        }
    }

    #[test]
    fn test_cycler_sequence() {
        let mut cycler = BankCycler::new();
        let addresses: Vec<u8> = (0..13).map(|_| cycler.advance().address()).collect();
        assert_eq!(addresses, vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 0, 2, 4]);
    }

    #[test]
    fn test_config_bank() {
        let mut s = settings();
        s.sample_rate = SampleRate::Hz192000;
        s.receivers = Receivers::Dual;
        s.preamp = true;
        s.random = true;
        s.alex.rx_antenna = 0x20;
        s.alex.tx_antenna = 0x01;

        let regs = build(ControlBank::Config, &s);
        assert_eq!(&regs[..3], &[0x7f, 0x7f, 0x7f]);
        assert_eq!(regs[3], 0x00);
        assert_eq!(regs[4], 0xF8 | 0x02);
        assert_eq!(regs[5], 0x00);
        assert_eq!(regs[6], 0x04 | 0x10 | 0x20);
        assert_eq!(regs[7], 0x08 | 0x04 | 0x01);
    }

    #[test]
    fn test_clock_source_low_bits_masked() {
        let mut s = settings();
        s.clock_source = 0xFF;
        s.sample_rate = SampleRate::Hz48000;
        assert_eq!(build(ControlBank::Config, &s)[4], 0xFC);
    }

    #[test]
    fn test_frequency_banks() {
        let mut s = settings();
        s.tx_frequency = 0x0123_4567;
        s.rx_frequencies = [14_074_000, 0x89AB_CDEF];

        assert_eq!(build(ControlBank::TxFrequency, &s)[3..], [0x02, 0x01, 0x23, 0x45, 0x67]);
        assert_eq!(build(ControlBank::Rx0Frequency, &s)[4..], 14_074_000u32.to_be_bytes());
        assert_eq!(build(ControlBank::Rx1Frequency, &s)[3..], [0x06, 0x89, 0xAB, 0xCD, 0xEF]);

        for address in [8, 10, 12, 14, 16, 22] {
            let bank = ControlBank::from_address(address).unwrap();
            let regs = build(bank, &s);
            assert_eq!(regs[3], address);
            assert_eq!(regs[4..], [0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_mox_bit() {
        let mut s = settings();
        s.ptt.mode = PttMode::On;
        assert_eq!(build(ControlBank::TxFrequency, &s)[3], 0x03);

        s.ptt.mode = PttMode::Vox;
        assert_eq!(build(ControlBank::TxFrequency, &s)[3], 0x02);
    }

    #[test]
    fn test_drive_and_autotrack_filters() {
        let mut s = settings();
        s.tx_drive = 200;
        s.rx_frequencies[0] = 7_100_000;
        s.tx_frequency = 14_200_000;

        let regs = build(ControlBank::DriveFilters, &s);
        assert_eq!(regs[3], 18);
        assert_eq!(regs[4], 200);
        assert_eq!(regs[5], 0x40);
        assert_eq!(regs[6], 0x08);
        assert_eq!(regs[7], 0x01);

        s.alex.rx_hpf = 0x81;
        s.alex.tx_lpf = 0x02;
        let regs = build(ControlBank::DriveFilters, &s);
        assert_eq!(regs[6], 0x01);
        assert_eq!(regs[7], 0x02);
    }

    #[test]
    fn test_drive_muted_when_unkeyed() {
        let mut s = settings();
        s.tx_drive = 255;
        s.ptt.off_mutes_tx = true;
        assert_eq!(build(ControlBank::DriveFilters, &s)[4], 0);

        s.ptt.mode = PttMode::On;
        assert_eq!(build(ControlBank::DriveFilters, &s)[4], 255);
    }

    #[test]
    fn test_attenuator_bank() {
        let mut s = settings();
        s.attenuator = 20;
        assert_eq!(build(ControlBank::Attenuator, &s)[3..], [20, 0x00, 0x17, 0x00, 20]);
    }

    #[test]
    fn test_filter_ladders() {
        assert_eq!(autotrack_rx_hpf(1_000_000), 0x20);
        assert_eq!(autotrack_rx_hpf(1_500_000), 0x10);
        assert_eq!(autotrack_rx_hpf(9_499_999), 0x08);
        assert_eq!(autotrack_rx_hpf(10_000_000), 0x04);
        assert_eq!(autotrack_rx_hpf(14_000_000), 0x01);
        assert_eq!(autotrack_rx_hpf(28_000_000), 0x02);
        assert_eq!(autotrack_rx_hpf(50_000_000), 0x40);

        assert_eq!(autotrack_tx_lpf(50_100_000), 0x10);
        assert_eq!(autotrack_tx_lpf(28_000_000), 0x20);
        assert_eq!(autotrack_tx_lpf(21_000_000), 0x20);
        assert_eq!(autotrack_tx_lpf(18_100_000), 0x40);
        assert_eq!(autotrack_tx_lpf(14_900_000), 0x01);
        assert_eq!(autotrack_tx_lpf(7_000_000), 0x02);
        assert_eq!(autotrack_tx_lpf(3_500_000), 0x04);
        assert_eq!(autotrack_tx_lpf(1_800_000), 0x08);
    }

    #[test]
    fn test_invalid_address_leaves_output() {
        let mut out = [0xAAu8; 8];
        assert_eq!(
            build_control_registers_at(5, &settings(), &mut out),
            Err(ConfigError::InvalidBank(5))
        );
        assert_eq!(out, [0xAA; 8]);

        assert!(build_control_registers_at(4, &settings(), &mut out).is_ok());
        assert_eq!(out[3], 4);
    }
}
