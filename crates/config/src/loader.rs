//! Configuration loading utilities

use crate::settings::ConfigValidationError;
use crate::Settings;
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config/config";
pub const ENV_PREFIX: &str = "GATEWAY";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Source(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Invalid(#[from] ConfigValidationError),
}

/// Load settings from `CONFIG_PATH` (or `config/config`) plus `GATEWAY__*` overrides
///
/// The file is optional; with neither file nor overrides the defaults apply.
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
	load_config_from(&path)
}

pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	debug!(path, "loading configuration");

	let settings: Settings = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix(ENV_PREFIX)
				.prefix_separator("__")
				.separator("__")
				.try_parsing(true),
		)
		.build()?
		.try_deserialize()?;

	settings.validate()?;
	Ok(settings)
}
