use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default address of the XA1110 on the bus.
pub const GPS_ADDRESS: u8 = 0x10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// I2C device file.
    pub device: PathBuf,
    pub address: u8,

    /// Bytes requested per I2C read.
    pub chunk_size: usize,

    /// Chunks are collected for this long before they are parsed (ms).
    pub aggregate_ms: u32,

    /// Delay between two chunk reads (ms).
    pub poll_ms: u32,

    /// Delay after a failed read (ms).
    pub backoff_ms: u32,

    /// Clear the buffer if no sentence has been seen for this long (s).
    pub watchdog_secs: u64,

    /// The buffer is trimmed to `overflow_trim` bytes when it grows past this.
    pub overflow_ceiling: usize,
    pub overflow_trim: usize,

    /// Trace every raw chunk.
    pub raw_debug: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(&'static str),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "could not parse config file: {}", e),
            ConfigError::Invalid(what) => write!(f, "invalid config: {}", what),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Config {
        Config {
            device: PathBuf::from("/dev/i2c-1"),
            address: GPS_ADDRESS,
            chunk_size: 128,
            aggregate_ms: 1000,
            poll_ms: 50,
            backoff_ms: 200,
            watchdog_secs: 10,
            overflow_ceiling: 4096,
            overflow_trim: 1024,
            raw_debug: false,
        }
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(p: P) -> Result<Config, ConfigError> {
        let f = fs::read_to_string(p.as_ref())?;
        Config::from_toml(&f)
    }

    pub fn from_toml(s: &str) -> Result<Config, ConfigError> {
        let c: Config = toml::from_str(s)?;
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive"));
        }

        if self.poll_ms == 0 {
            return Err(ConfigError::Invalid("poll_ms must be positive"));
        }

        if self.overflow_trim > self.overflow_ceiling {
            return Err(ConfigError::Invalid(
                "overflow_trim must not exceed overflow_ceiling",
            ));
        }

        Ok(())
    }

    /// Number of chunk reads in one aggregation window.
    pub fn polls_per_window(&self) -> u32 {
        (self.aggregate_ms / self.poll_ms.max(1)).max(1)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}
