//! Error types for the fallible edges of the simulation (configuration loading).
//!
//! The tick loop itself never fails: out-of-range writes are clamped and
//! unavailable subsystems are skipped.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
