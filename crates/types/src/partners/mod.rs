//! Partner configuration and call error domain

use std::time::Duration;

pub mod errors;
pub mod retry;

pub use errors::{
	CallError, IntegrationError, IntegrationErrorKind, RetrySignal, Retryable, TransportCode,
};
pub use retry::{default_retryable_signals, RetryPolicy};

use crate::SecretString;

/// Partner API credentials
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerCredentials {
	pub api_key: SecretString,
	pub api_secret: Option<SecretString>,
}

impl PartnerCredentials {
	pub fn new(api_key: impl Into<SecretString>) -> Self {
		Self {
			api_key: api_key.into(),
			api_secret: None,
		}
	}

	pub fn with_secret(mut self, api_secret: impl Into<SecretString>) -> Self {
		self.api_secret = Some(api_secret.into());
		self
	}
}

/// Retry knobs supplied per partner
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRetrySettings {
	pub max_attempts: u32,
	pub initial_delay: Duration,
	pub max_delay: Duration,
	pub backoff_multiplier: f64,
}

impl Default for PartnerRetrySettings {
	fn default() -> Self {
		let policy = RetryPolicy::default();
		Self {
			max_attempts: policy.max_attempts,
			initial_delay: policy.initial_delay,
			max_delay: policy.max_delay,
			backoff_multiplier: policy.backoff_multiplier,
		}
	}
}

/// Resolved, immutable configuration of one partner gateway
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerConfig {
	pub partner_id: String,
	pub enabled: bool,
	pub credentials: Option<PartnerCredentials>,
	pub base_url: String,
	pub timeout: Duration,
	pub retry: PartnerRetrySettings,
	/// Path probed by health checks, relative to `base_url`
	pub health_endpoint: String,
}

/// Whether a gateway may touch the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerMode {
	Live,
	Disabled,
	MissingCredentials,
}

impl PartnerConfig {
	pub fn new(partner_id: impl Into<String>, base_url: impl Into<String>) -> Self {
		Self {
			partner_id: partner_id.into(),
			enabled: true,
			credentials: None,
			base_url: base_url.into(),
			timeout: Duration::from_secs(10),
			retry: PartnerRetrySettings::default(),
			health_endpoint: "health".to_string(),
		}
	}

	pub fn with_credentials(mut self, credentials: PartnerCredentials) -> Self {
		self.credentials = Some(credentials);
		self
	}

	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_retry(mut self, retry: PartnerRetrySettings) -> Self {
		self.retry = retry;
		self
	}

	pub fn with_health_endpoint(mut self, health_endpoint: impl Into<String>) -> Self {
		self.health_endpoint = health_endpoint.into();
		self
	}

	pub fn mode(&self) -> PartnerMode {
		if !self.enabled {
			return PartnerMode::Disabled;
		}
		match &self.credentials {
			Some(credentials) if !credentials.api_key.is_blank() => PartnerMode::Live,
			_ => PartnerMode::MissingCredentials,
		}
	}

	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy::default()
			.with_max_attempts(self.retry.max_attempts)
			.with_delays(self.retry.initial_delay, self.retry.max_delay)
			.with_multiplier(self.retry.backoff_multiplier)
	}
}
