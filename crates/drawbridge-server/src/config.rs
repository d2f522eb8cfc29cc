//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ADDR_VAR: &str = "DRAWBRIDGE_ADDR";
pub const SCRATCH_DIR_VAR: &str = "DRAWBRIDGE_SCRATCH_DIR";
pub const CONVERTER_VAR: &str = "DRAWBRIDGE_CONVERTER";
pub const CONVERTER_TIMEOUT_VAR: &str = "DRAWBRIDGE_CONVERTER_TIMEOUT_SECS";

pub const DEFAULT_ADDR: &str = "0.0.0.0:3031";
pub const DEFAULT_CONVERTER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} is not a whole number of seconds: {value}")]
    InvalidTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    /// `None` means the platform default scratch directory.
    pub scratch_dir: Option<PathBuf>,
    /// Converter program followed by its arguments.
    pub converter: Option<Vec<String>>,
    pub converter_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr_value = get(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr {
                var: ADDR_VAR,
                value: addr_value.clone(),
            })?;

        let converter_timeout = match get(CONVERTER_TIMEOUT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout {
                    var: CONVERTER_TIMEOUT_VAR,
                    value,
                })?,
            None => Duration::from_secs(DEFAULT_CONVERTER_TIMEOUT_SECS),
        };

        let converter = get(CONVERTER_VAR)
            .map(|line| line.split_whitespace().map(str::to_string).collect());

        Ok(Self {
            addr,
            scratch_dir: get(SCRATCH_DIR_VAR).map(PathBuf::from),
            converter,
            converter_timeout,
        })
    }
}
