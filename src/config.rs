//! Configuration management for switch-latency
//!
//! Two layers: an optional config file with defaults for the measurement and
//! the wiring, and the validated [`RunConfig`] built from that file plus the
//! command line. Validation happens before any hardware is touched.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/switch-latency/config.toml` |
//! | macOS | `~/Library/Application Support/switch-latency/config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use switch_latency::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.measurement.iterations = 250;
//! config.save().expect("Failed to save config");
//! ```

use crate::cli::Cli;
use crate::delay::DEFAULT_SEED;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Value must be greater than zero
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    /// Value must not be negative
    #[error("{0} must not be negative")]
    Negative(&'static str),
    /// Value does not fit the target type
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: i64 },
    /// Delay bounds are inverted
    #[error("delaymin ({min}) must be smaller than or equal to delaymax ({max})")]
    InvertedDelays { min: u64, max: u64 },
    /// No command selected
    #[error("Must pass one of: pin, usb, events")]
    NoCommand,
    /// More than one command selected
    #[error("Passed conflicting mutually exclusive commands: pin, usb, events")]
    ConflictingCommands,
    /// Evdev measurement without a key code
    #[error("Must pass --key when using usb measurement")]
    MissingKey,
}

/// Returns the path to the config file.
///
/// Unlike saving, this does not create the directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("switch-latency").join("config.toml"))
}

/// File configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Measurement defaults
    #[serde(default)]
    pub measurement: MeasurementConfig,
    /// GPIO wiring
    #[serde(default)]
    pub gpio: GpioConfig,
    /// Evdev device lookup
    #[serde(default)]
    pub evdev: EvdevConfig,
}

/// Measurement defaults, overridden by command-line flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementConfig {
    /// Number of trials
    pub iterations: u32,
    /// Minimum inter-trial delay in microseconds
    pub delay_min_us: u64,
    /// Maximum inter-trial delay in microseconds
    pub delay_max_us: u64,
    /// Delay generator seed; keep fixed so runs stay comparable
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            delay_min_us: 10_000,
            delay_max_us: 20_000,
            seed: DEFAULT_SEED,
        }
    }
}

/// GPIO pin assignment (BCM numbering)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GpioConfig {
    /// Pin driving the device under test
    pub output_pin: u8,
    /// Pin reading the switch, active low with pull-up
    pub input_pin: u8,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            output_pin: 27,
            input_pin: 17,
        }
    }
}

/// Evdev device location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvdevConfig {
    /// Directory holding `event<N>` nodes
    pub device_dir: PathBuf,
    /// Number of event ids probed when listing devices
    pub max_devices: u32,
}

impl Default for EvdevConfig {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from("/dev/input"),
            max_devices: 256,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Detection backend selected for a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Second GPIO pin, busy-polled
    Pin,
    /// Evdev key events from `event<device>`
    Usb { device: u32, key: u16 },
}

/// What the run does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Measure(Backend),
    ListDevices,
}

/// Validated configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub iterations: u32,
    pub delay_min_us: u64,
    pub delay_max_us: u64,
    pub seed: u64,
    pub mode: Mode,
    pub summary: bool,
    pub gpio: GpioConfig,
    pub evdev: EvdevConfig,
}

impl RunConfig {
    /// Merge command-line flags over file defaults and validate the result
    pub fn resolve(cli: &Cli, file: &Config) -> Result<Self, ConfigError> {
        let iterations = match cli.iterations {
            Some(n) if n <= 0 => return Err(ConfigError::NotPositive("iterations")),
            Some(n) => u32::try_from(n).map_err(|_| ConfigError::OutOfRange {
                name: "iterations",
                value: n,
            })?,
            None if file.measurement.iterations == 0 => {
                return Err(ConfigError::NotPositive("iterations"))
            }
            None => file.measurement.iterations,
        };

        let delay_min_us = non_negative("delaymin", cli.delay_min)?
            .unwrap_or(file.measurement.delay_min_us);
        let delay_max_us = non_negative("delaymax", cli.delay_max)?
            .unwrap_or(file.measurement.delay_max_us);

        if delay_max_us < delay_min_us {
            return Err(ConfigError::InvertedDelays {
                min: delay_min_us,
                max: delay_max_us,
            });
        }

        let selected = [cli.pin, cli.usb.is_some(), cli.events]
            .iter()
            .filter(|&&s| s)
            .count();
        match selected {
            0 => return Err(ConfigError::NoCommand),
            1 => {}
            _ => return Err(ConfigError::ConflictingCommands),
        }

        let mode = if cli.events {
            Mode::ListDevices
        } else if cli.pin {
            Mode::Measure(Backend::Pin)
        } else {
            let device = cli.usb.unwrap_or_default();
            let device = u32::try_from(device).map_err(|_| ConfigError::OutOfRange {
                name: "usb",
                value: device,
            })?;
            let key = cli.key.ok_or(ConfigError::MissingKey)?;
            let key = u16::try_from(key).map_err(|_| ConfigError::OutOfRange {
                name: "key",
                value: key,
            })?;
            Mode::Measure(Backend::Usb { device, key })
        };

        Ok(Self {
            iterations,
            delay_min_us,
            delay_max_us,
            seed: file.measurement.seed,
            mode,
            summary: cli.summary,
            gpio: file.gpio.clone(),
            evdev: file.evdev.clone(),
        })
    }

    /// Selected backend, if this run measures
    pub fn backend(&self) -> Option<Backend> {
        match self.mode {
            Mode::Measure(backend) => Some(backend),
            Mode::ListDevices => None,
        }
    }
}

fn non_negative(name: &'static str, value: Option<i64>) -> Result<Option<u64>, ConfigError> {
    match value {
        Some(v) if v < 0 => Err(ConfigError::Negative(name)),
        Some(v) => Ok(Some(v as u64)),
        None => Ok(None),
    }
}
