//! Engine configuration
//!
//! Construction parameters for [`HermesEngine`](crate::engine::HermesEngine),
//! loadable from TOML. Every section has defaults, so an empty file is a
//! valid single-receiver 48 kHz configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_INTERFACE, DEFAULT_RX_BUFFER_LEN, DEFAULT_RX_POOL_SIZE, DEFAULT_TX_POOL_SIZE,
};
use crate::error::{ConfigError, Error, Result};
use crate::protocol::{Receivers, SampleRate};
use crate::ptt::PttPolicy;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Periodically log power/SWR telemetry from the status registers
    pub verbose: bool,
    pub radio: RadioConfig,
    pub alex: AlexConfig,
    pub ptt: PttPolicy,
    pub buffers: BufferConfig,
    pub device: DeviceConfig,
}

/// Receiver, transmitter and ADC settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// NCO frequencies for receivers 0 and 1 in Hz
    pub rx_frequencies: [u32; 2],
    pub tx_frequency: u32,
    pub sample_rate: SampleRate,
    pub receivers: Receivers,
    /// Clock source selection; only bits 2..7 are sent
    pub clock_source: u8,
    pub preamp: bool,
    pub dither: bool,
    pub random: bool,
    /// Program the transmit NCO independently of receiver 0
    pub duplex: bool,
    /// Input attenuator in dB (0..=31)
    pub attenuator: u8,
    /// Transmit drive level (0 = almost off)
    pub tx_drive: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            rx_frequencies: [7_100_000, 7_100_000],
            tx_frequency: 7_100_000,
            sample_rate: SampleRate::Hz48000,
            receivers: Receivers::Single,
            clock_source: 0xF8,
            preamp: false,
            dither: false,
            random: false,
            duplex: true,
            attenuator: 0,
            tx_drive: 0,
        }
    }
}

/// Alex filter and antenna selection
///
/// A filter value of zero selects automatic tracking from the current
/// receive/transmit frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlexConfig {
    pub rx_antenna: u8,
    pub tx_antenna: u8,
    pub rx_hpf: u8,
    pub tx_lpf: u8,
}

/// Ring buffer pool dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Number of receive sample buffers (power of two)
    pub rx_pool_size: usize,
    /// Floats per receive buffer (interleaved I/Q)
    pub rx_buffer_len: usize,
    /// Number of transmit frame buffers (power of two)
    pub tx_pool_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            rx_pool_size: DEFAULT_RX_POOL_SIZE,
            rx_buffer_len: DEFAULT_RX_BUFFER_LEN,
            tx_pool_size: DEFAULT_TX_POOL_SIZE,
        }
    }
}

/// Device selection, passed through to the transport collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Network interface used for discovery
    pub interface: String,
    /// Fully qualified MAC (`HH:HH:HH:HH:HH:HH`); `None` takes the first radio found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            mac: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
        Self::from_toml_str(&text)
    }

    /// Per-user config file location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "hpsdr", "hermes-bridge")
            .map(|dirs| dirs.config_dir().join("hermes.toml"))
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for size in [self.buffers.rx_pool_size, self.buffers.tx_pool_size] {
            if !size.is_power_of_two() {
                return Err(ConfigError::PoolSize(size));
            }
        }

        let len = self.buffers.rx_buffer_len;
        if len == 0 || len % 4 != 0 {
            return Err(ConfigError::BufferLength(len));
        }

        if self.radio.attenuator > 31 {
            return Err(ConfigError::Attenuator(self.radio.attenuator));
        }

        if let Some(mac) = &self.device.mac {
            if !is_valid_mac(mac) {
                return Err(ConfigError::MacAddress(mac.clone()));
            }
        }

        Ok(())
    }
}

fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptt::PttMode;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.radio.sample_rate, SampleRate::Hz48000);
        assert_eq!(config.radio.receivers, Receivers::Single);
        assert!(config.radio.duplex);
        assert_eq!(config.ptt.mode, PttMode::Off);
    }

    #[test]
    fn test_parse_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            verbose = true

            [radio]
            rx_frequencies = [14_074_000, 7_074_000]
            tx_frequency = 14_074_000
            sample_rate = 192000
            receivers = 2
            tx_drive = 128

            [ptt]
            mode = "vox"
            off_mutes_tx = true

            [buffers]
            rx_pool_size = 64

            [device]
            mac = "04:7F:3D:0F:28:5A"
            "#,
        )
        .unwrap();

        assert!(config.verbose);
        assert_eq!(config.radio.rx_frequencies, [14_074_000, 7_074_000]);
        assert_eq!(config.radio.sample_rate, SampleRate::Hz192000);
        assert_eq!(config.radio.receivers, Receivers::Dual);
        assert_eq!(config.ptt.mode, PttMode::Vox);
        assert!(config.ptt.off_mutes_tx);
        assert!(!config.ptt.on_mutes_rx);
        assert_eq!(config.buffers.rx_pool_size, 64);
        assert_eq!(config.buffers.tx_pool_size, DEFAULT_TX_POOL_SIZE);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(EngineConfig::from_toml_str("[radio]\nsample_rate = 44100").is_err());
        assert!(EngineConfig::from_toml_str("[radio]\nreceivers = 3").is_err());

        let mut config = EngineConfig::default();
        config.buffers.rx_pool_size = 100;
        assert_eq!(config.validate(), Err(ConfigError::PoolSize(100)));

        let mut config = EngineConfig::default();
        config.buffers.tx_pool_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::PoolSize(0)));

        let mut config = EngineConfig::default();
        config.buffers.rx_buffer_len = 254;
        assert_eq!(config.validate(), Err(ConfigError::BufferLength(254)));

        let mut config = EngineConfig::default();
        config.radio.attenuator = 32;
        assert_eq!(config.validate(), Err(ConfigError::Attenuator(32)));

        let mut config = EngineConfig::default();
        config.device.mac = Some("04:7F:3D:0F:28".into());
        assert!(matches!(config.validate(), Err(ConfigError::MacAddress(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = EngineConfig::default();
        config.radio.receivers = Receivers::Dual;
        config.radio.sample_rate = SampleRate::Hz96000;
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
