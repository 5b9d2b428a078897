/// Database configuration and connection management
pub mod database;

/// Seed seller configuration loading from config.toml
pub mod sellers;
