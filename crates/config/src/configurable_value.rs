//! Values that are either written inline or read from an environment variable

use gateway_types::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration value resolved at startup
///
/// Accepted forms in configuration files:
/// - shorthand string: `"env:QX_API_KEY"` or `"plain-value"`
/// - table: `{ type = "env", value = "QX_API_KEY" }`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "ConfigurableValueRepr")]
pub struct ConfigurableValue {
	/// Type of value: "env" for environment variable, "plain" for direct value
	#[serde(rename = "type")]
	pub value_type: ValueType,
	/// The value: either environment variable name or the actual value
	pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	/// Load value from environment variable (name specified in `value` field)
	Env,
	/// Use the value directly from the `value` field
	Plain,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigurableValueRepr {
	Table {
		#[serde(rename = "type")]
		value_type: ValueType,
		value: String,
	},
	Shorthand(String),
}

impl From<ConfigurableValueRepr> for ConfigurableValue {
	fn from(repr: ConfigurableValueRepr) -> Self {
		match repr {
			ConfigurableValueRepr::Table { value_type, value } => Self { value_type, value },
			ConfigurableValueRepr::Shorthand(raw) => Self::from(raw),
		}
	}
}

/// Errors that can occur when resolving configurable values
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigurableValueError {
	#[error("Environment variable '{0}' not found")]
	EnvironmentVariableNotFound(String),

	#[error("Value from {0} is empty")]
	Empty(String),
}

impl ConfigurableValue {
	pub fn from_env(env_var_name: &str) -> Self {
		Self {
			value_type: ValueType::Env,
			value: env_var_name.to_string(),
		}
	}

	pub fn from_plain(plain_value: &str) -> Self {
		Self {
			value_type: ValueType::Plain,
			value: plain_value.to_string(),
		}
	}

	/// Resolve the actual value based on the type
	pub fn resolve(&self) -> Result<String, ConfigurableValueError> {
		let resolved = match self.value_type {
			ValueType::Env => std::env::var(&self.value).map_err(|_| {
				ConfigurableValueError::EnvironmentVariableNotFound(self.value.clone())
			})?,
			ValueType::Plain => self.value.clone(),
		};

		if resolved.trim().is_empty() {
			return Err(ConfigurableValueError::Empty(self.description()));
		}
		Ok(resolved)
	}

	pub fn resolve_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		self.resolve().map(SecretString::from)
	}

	/// Inline secrets end up in config files and process listings
	pub fn is_inline(&self) -> bool {
		matches!(self.value_type, ValueType::Plain)
	}

	/// Get a description of this configurable value for logging
	pub fn description(&self) -> String {
		match self.value_type {
			ValueType::Env => format!("environment variable '{}'", self.value),
			ValueType::Plain => "inline value".to_string(),
		}
	}
}

// Never print inline values
impl fmt::Display for ConfigurableValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.value_type {
			ValueType::Env => write!(f, "env:{}", self.value),
			ValueType::Plain => write!(f, "plain:[REDACTED]"),
		}
	}
}

impl From<&str> for ConfigurableValue {
	fn from(value: &str) -> Self {
		if let Some(env_var) = value.strip_prefix("env:") {
			Self::from_env(env_var.trim())
		} else {
			Self::from_plain(value)
		}
	}
}

impl From<String> for ConfigurableValue {
	fn from(value: String) -> Self {
		ConfigurableValue::from(value.as_str())
	}
}
