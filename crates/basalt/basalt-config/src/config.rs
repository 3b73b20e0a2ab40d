use basalt_util::parse::{parse_size, ParseError};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct BusConfig {
    #[serde(default = "defaults::shm_file_path")]
    pub shm_file_path: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Data region size as a human-readable value ("64k", "1m", "2g").
    /// Coerced to bytes through [`BusConfig::data_capacity`].
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid buffer_size")]
    Size(#[from] ParseError),
}

mod defaults {
    pub fn shm_file_path() -> String {
        "/tmp/basalt_bus".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn buffer_size() -> String {
        "1m".into()
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            shm_file_path: defaults::shm_file_path(),
            log_level: defaults::log_level(),
            buffer_size: defaults::buffer_size(),
        }
    }
}

impl BusConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let bus_config: BusConfig = toml::from_str(&toml_to_str)?;
        Ok(bus_config)
    }

    /// The configured `buffer_size` coerced to bytes.
    pub fn data_capacity(&self) -> Result<usize, ConfigError> {
        Ok(parse_size(&self.buffer_size)? as usize)
    }
}
