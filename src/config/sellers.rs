//! Seed seller configuration loading from config.toml
//!
//! Sellers listed in config.toml are created on start when no seller with the same
//! email exists yet. Existing sellers are never modified by seeding.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Flat shipping fee charged by `create_exit_note_with_default_fee`
    #[serde(default)]
    pub default_shipping_fee: f64,
    /// Sellers to seed
    #[serde(default)]
    pub sellers: Vec<SellerConfig>,
}

/// Configuration for a single seed seller
#[derive(Debug, Deserialize, Clone)]
pub struct SellerConfig {
    /// Full name of the seller
    pub name: String,
    /// Contact email, used as the seeding identity
    pub email: String,
}

/// Loads seller configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads seller configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
