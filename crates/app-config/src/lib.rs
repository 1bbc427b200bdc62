// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{RawSettings, RawSizingSettings, RawStrategyParams, Settings, StrategyParams};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads the given TOML file, if any (every section is optional).
/// 2. Merges settings from environment variables
///    (e.g., `SCALPER_STRATEGY__VOLATILITY_PERIOD=14`).
/// 3. Validates the result as a whole.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        // `SCALPER_` prefix, `__` between nested keys.
        .add_source(
            Environment::with_prefix("SCALPER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let raw: RawSettings = config.try_deserialize()?;
    Settings::try_from(raw)
}

/// Parses and validates settings from a TOML document, without consulting the environment.
pub fn settings_from_toml_str(toml: &str) -> Result<Settings> {
    let config = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    let raw: RawSettings = config.try_deserialize()?;
    Settings::try_from(raw)
}
