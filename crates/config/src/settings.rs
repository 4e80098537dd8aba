//! Configuration settings structures

use std::collections::BTreeMap;
use std::time::Duration;

use gateway_types::{
	FederationEnvironment, FederationProduct, PartnerConfig, PartnerCredentials,
	PartnerRetrySettings, SecretString,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::configurable_value::ConfigurableValue;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
	#[serde(default)]
	pub logging: LoggingSettings,
	#[serde(default)]
	pub audit: AuditSettings,
	#[serde(default)]
	pub aggregation: AggregationSettings,
	/// Keyed by partner id (`quote-exchange`, `carrier-direct`, `annuity-hub`)
	#[serde(default)]
	pub partners: BTreeMap<String, PartnerSettings>,
	#[serde(default)]
	pub federation: FederationSettings,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuditSinkKind {
	/// Structured events on the `audit` tracing target
	Tracing,
	/// In-process buffer, for diagnostics and tests
	Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditSettings {
	pub sink: AuditSinkKind,
	pub queue_capacity: usize,
}

impl Default for AuditSettings {
	fn default() -> Self {
		Self {
			sink: AuditSinkKind::Tracing,
			queue_capacity: 1024,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AggregationSettings {
	/// Budget per provider task; unset waits for every provider
	pub provider_timeout_ms: Option<u64>,
}

impl AggregationSettings {
	pub fn provider_timeout(&self) -> Option<Duration> {
		self.provider_timeout_ms.map(Duration::from_millis)
	}
}

fn default_true() -> bool {
	true
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_health_endpoint() -> String {
	"health".to_string()
}

/// Retry knobs in milliseconds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
	pub max_attempts: u32,
	pub initial_delay_ms: u64,
	pub max_delay_ms: u64,
	pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_delay_ms: 1000,
			max_delay_ms: 10_000,
			backoff_multiplier: 2.0,
		}
	}
}

impl From<&RetrySettings> for PartnerRetrySettings {
	fn from(settings: &RetrySettings) -> Self {
		Self {
			max_attempts: settings.max_attempts,
			initial_delay: Duration::from_millis(settings.initial_delay_ms),
			max_delay: Duration::from_millis(settings.max_delay_ms),
			backoff_multiplier: settings.backoff_multiplier,
		}
	}
}

/// One partner as written in the configuration file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PartnerSettings {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub base_url: String,
	pub api_key: Option<ConfigurableValue>,
	pub api_secret: Option<ConfigurableValue>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub retry: RetrySettings,
	#[serde(default = "default_health_endpoint")]
	pub health_endpoint: String,
}

impl PartnerSettings {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			enabled: true,
			base_url: base_url.into(),
			api_key: None,
			api_secret: None,
			timeout_ms: default_timeout_ms(),
			retry: RetrySettings::default(),
			health_endpoint: default_health_endpoint(),
		}
	}

	/// Resolve credentials; anything unresolvable leaves the partner offline
	fn credentials(&self, partner_id: &str) -> Option<PartnerCredentials> {
		let api_key = self.api_key.as_ref()?;
		let key = match api_key.resolve_secret() {
			Ok(key) => key,
			Err(e) => {
				warn!(partner = partner_id, "partner credentials unavailable: {}", e);
				return None;
			},
		};
		if api_key.is_inline() {
			warn!(partner = partner_id, "partner API key is configured inline");
		}

		let mut credentials = PartnerCredentials::new(key);
		if let Some(api_secret) = &self.api_secret {
			match api_secret.resolve_secret() {
				Ok(secret) => credentials = credentials.with_secret(secret),
				Err(e) => {
					warn!(partner = partner_id, "partner API secret unavailable: {}", e);
					return None;
				},
			}
		}
		Some(credentials)
	}

	pub fn to_partner_config(&self, partner_id: &str) -> PartnerConfig {
		let mut config = PartnerConfig::new(partner_id, self.base_url.clone())
			.with_enabled(self.enabled)
			.with_timeout(Duration::from_millis(self.timeout_ms))
			.with_retry(PartnerRetrySettings::from(&self.retry))
			.with_health_endpoint(self.health_endpoint.clone());
		config.credentials = self.credentials(partner_id);
		config
	}
}

/// Destination and relay states for one environment
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FederationTargetSettings {
	pub destination_url: String,
	/// Keyed by product name (`life_application`, ...)
	#[serde(default)]
	pub relay_states: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FederationSettings {
	pub issuer: String,
	pub audience: String,
	pub environment: FederationEnvironment,
	pub company_id: String,
	pub channel_id: String,
	pub group_id: String,
	pub private_key: Option<ConfigurableValue>,
	pub certificate: Option<ConfigurableValue>,
	/// Keyed by environment name (`staging`, `production`)
	#[serde(default)]
	pub targets: BTreeMap<String, FederationTargetSettings>,
}

impl Default for FederationSettings {
	fn default() -> Self {
		Self {
			issuer: String::new(),
			audience: String::new(),
			environment: FederationEnvironment::Staging,
			company_id: String::new(),
			channel_id: String::new(),
			group_id: String::new(),
			private_key: None,
			certificate: None,
			targets: BTreeMap::new(),
		}
	}
}

/// Signing material resolved from the federation settings
#[derive(Debug, Clone)]
pub struct SigningMaterial {
	pub private_key_pem: SecretString,
	pub certificate_pem: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
	#[error("Unknown federation environment '{0}'")]
	UnknownEnvironment(String),

	#[error("Unknown federation product '{product}' in environment '{environment}'")]
	UnknownProduct { environment: String, product: String },

	#[error("Partner '{0}' has an empty base URL")]
	EmptyBaseUrl(String),

	#[error("Partner '{0}' must allow at least one attempt")]
	NoAttempts(String),
}

impl FederationSettings {
	/// Key and certificate, or `None` when either cannot be resolved
	pub fn signing_material(&self) -> Option<SigningMaterial> {
		let (key, certificate) = match (&self.private_key, &self.certificate) {
			(Some(key), Some(certificate)) => (key, certificate),
			_ => return None,
		};

		match (key.resolve_secret(), certificate.resolve()) {
			(Ok(private_key_pem), Ok(certificate_pem)) => Some(SigningMaterial {
				private_key_pem,
				certificate_pem,
			}),
			(Err(e), _) | (_, Err(e)) => {
				warn!("federation signing material unavailable: {}", e);
				None
			},
		}
	}

	/// Targets with typed environment and product keys
	pub fn typed_targets(
		&self,
	) -> Result<
		Vec<(FederationEnvironment, String, Vec<(FederationProduct, String)>)>,
		ConfigValidationError,
	> {
		self.targets
			.iter()
			.map(|(environment, target)| {
				let env = environment
					.parse::<FederationEnvironment>()
					.map_err(|_| ConfigValidationError::UnknownEnvironment(environment.clone()))?;
				let relay_states = target
					.relay_states
					.iter()
					.map(|(product, relay_state)| {
						product
							.parse::<FederationProduct>()
							.map(|p| (p, relay_state.clone()))
							.map_err(|_| ConfigValidationError::UnknownProduct {
								environment: environment.clone(),
								product: product.clone(),
							})
					})
					.collect::<Result<Vec<_>, _>>()?;
				Ok((env, target.destination_url.clone(), relay_states))
			})
			.collect()
	}
}

impl Settings {
	/// Resolved configuration for every partner, in id order
	pub fn partner_configs(&self) -> Vec<PartnerConfig> {
		self.partners
			.iter()
			.map(|(id, partner)| partner.to_partner_config(id))
			.collect()
	}

	pub fn enabled_partners(&self) -> Vec<&str> {
		self.partners
			.iter()
			.filter(|(_, partner)| partner.enabled)
			.map(|(id, _)| id.as_str())
			.collect()
	}

	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		for (id, partner) in &self.partners {
			if partner.base_url.trim().is_empty() {
				return Err(ConfigValidationError::EmptyBaseUrl(id.clone()));
			}
			if partner.retry.max_attempts == 0 {
				return Err(ConfigValidationError::NoAttempts(id.clone()));
			}
		}
		self.federation.typed_targets().map(|_| ())
	}
}
