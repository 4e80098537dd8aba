//! Agency Integration Gateway Library
//!
//! Outbound integration layer for an insurance-agency platform: resilient,
//! audited calls to partner APIs, multi-partner quote aggregation and signed
//! SAML handoff to partner application platforms.

use std::collections::HashMap;
use std::sync::Arc;

use gateway_adapters::{ProviderDeps, RedactingAuditor, ReqwestTransport};
use gateway_service::{FederationConfig, FederationTarget, SigningConfig};
use thiserror::Error;
use tracing::{debug, info};

// Core domain types
pub use gateway_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	AggregationResult,
	Applicant,
	AuditRecord,
	AuditSink,
	Auditor,
	// Error types
	CallError,
	FederationEnvironment,
	FederationProduct,
	Gender,
	HealthCheckResult,
	HealthClass,
	IntegrationError,
	IntegrationErrorKind,
	PartnerConfig,
	PartnerMode,
	ProductFamily,
	ProductType,
	ProfileFields,
	ProviderStatus,
	// Provider traits
	QuoteContext,
	QuoteProvider,
	QuoteSimulator,
	RetryPolicy,
	SecretString,
	SignedAssertion,
	SsoAssertionRequest,
	UnifiedQuote,
	UnifiedQuoteRequest,
};

// Service layer
pub use gateway_service::{AggregationError, FederationError, FederationSigner, QuoteAggregator};

// Adapters
pub use gateway_adapters::{
	HttpMethod, MemoryAuditSink, OutboundRequest, PartnerGateway, ProviderRegistry, RegistryError,
	RequestOptions, TracingAuditSink, Transport, TransportResponse,
};

// Config
pub use gateway_config::{
	load_config, log_partner_summary, log_service_info, log_service_shutdown, ConfigLoadError,
	Settings,
};

use gateway_config::{
	AuditSinkKind, ConfigValidationError, FederationSettings, LogFormat, LoggingSettings,
};

// Module aliases for advanced usage
pub mod models {
	pub use gateway_types::*;
}

pub mod adapters {
	pub use gateway_adapters::*;
}

pub mod config {
	pub use gateway_config::*;
}

#[derive(Error, Debug)]
pub enum GatewayError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigValidationError),

	#[error("Provider registry error: {0}")]
	Registry(#[from] RegistryError),

	#[error("Federation error: {0}")]
	Federation(#[from] FederationError),

	#[error("HTTP client error: {0}")]
	Transport(String),
}

/// Initialize the global tracing subscriber from logging settings
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init_tracing_from_settings(logging: &LoggingSettings) {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	let result = match logging.format {
		LogFormat::Json => tracing_subscriber::fmt()
			.json()
			.with_env_filter(env_filter)
			.with_target(true)
			.try_init(),
		LogFormat::Pretty => tracing_subscriber::fmt()
			.pretty()
			.with_env_filter(env_filter)
			.try_init(),
		LogFormat::Compact => tracing_subscriber::fmt()
			.compact()
			.with_env_filter(env_filter)
			.try_init(),
	};

	match result {
		Ok(()) => info!(
			"Logging configuration applied: level={}, format={:?}",
			logging.level, logging.format
		),
		Err(e) => debug!("tracing subscriber already installed: {}", e),
	}
}

/// Convert federation settings into the signer's configuration
pub fn federation_config(settings: &FederationSettings) -> Result<FederationConfig, GatewayError> {
	let targets = settings
		.typed_targets()?
		.into_iter()
		.map(|(environment, destination_url, relay_states)| {
			let target = FederationTarget {
				destination_url,
				relay_states: relay_states.into_iter().collect::<HashMap<_, _>>(),
			};
			(environment, target)
		})
		.collect();

	let signing = settings.signing_material().map(|material| SigningConfig {
		private_key_pem: material.private_key_pem,
		certificate_pem: material.certificate_pem,
	});

	Ok(FederationConfig {
		issuer: settings.issuer.clone(),
		audience: settings.audience.clone(),
		environment: settings.environment,
		company_id: settings.company_id.clone(),
		channel_id: settings.channel_id.clone(),
		group_id: settings.group_id.clone(),
		signing,
		targets,
	})
}

/// Builder wiring settings, transport, auditing and providers together
#[derive(Debug, Default)]
pub struct GatewayBuilder {
	settings: Option<Settings>,
	transport: Option<Arc<dyn Transport>>,
	audit_sink: Option<Arc<dyn AuditSink>>,
	simulator: Option<Arc<dyn QuoteSimulator>>,
}

impl GatewayBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Replace the HTTP transport (tests, proxies)
	pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Write audit records to this sink instead of the configured one
	pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
		self.audit_sink = Some(sink);
		self
	}

	/// Offline quote source for partners that are not live
	pub fn with_simulator(mut self, simulator: Arc<dyn QuoteSimulator>) -> Self {
		self.simulator = Some(simulator);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Build the gateway; must be called inside a Tokio runtime
	pub fn build(self) -> Result<Gateway, GatewayError> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;

		let sink: Arc<dyn AuditSink> = match self.audit_sink {
			Some(sink) => sink,
			None => match settings.audit.sink {
				AuditSinkKind::Tracing => Arc::new(TracingAuditSink),
				AuditSinkKind::Memory => Arc::new(MemoryAuditSink::new()),
			},
		};
		let auditor = Arc::new(RedactingAuditor::spawn(sink, settings.audit.queue_capacity));

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(
				ReqwestTransport::new().map_err(|e| GatewayError::Transport(e.to_string()))?,
			),
		};

		let deps = ProviderDeps {
			transport,
			auditor: auditor.clone() as Arc<dyn Auditor>,
			simulator: self.simulator,
		};
		let partner_configs = settings.partner_configs();
		let registry = ProviderRegistry::from_configs(partner_configs.clone(), &deps)?;
		info!("Initialized {} quote provider(s)", registry.len());

		let aggregator = QuoteAggregator::new(registry.providers().to_vec())
			.with_provider_timeout(settings.aggregation.provider_timeout());

		let signer = FederationSigner::new(federation_config(&settings.federation)?)?;

		Ok(Gateway {
			settings,
			partner_configs,
			registry,
			aggregator: Arc::new(aggregator),
			signer: Arc::new(signer),
			auditor,
		})
	}
}

/// Assembled gateway components
#[derive(Debug)]
pub struct Gateway {
	settings: Settings,
	partner_configs: Vec<PartnerConfig>,
	registry: ProviderRegistry,
	aggregator: Arc<QuoteAggregator>,
	signer: Arc<FederationSigner>,
	auditor: Arc<RedactingAuditor>,
}

impl Gateway {
	pub fn builder() -> GatewayBuilder {
		GatewayBuilder::new()
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Resolved partner configuration the providers were built from
	pub fn partner_configs(&self) -> &[PartnerConfig] {
		&self.partner_configs
	}

	pub fn registry(&self) -> &ProviderRegistry {
		&self.registry
	}

	pub fn aggregator(&self) -> Arc<QuoteAggregator> {
		Arc::clone(&self.aggregator)
	}

	pub fn signer(&self) -> Arc<FederationSigner> {
		Arc::clone(&self.signer)
	}

	pub fn auditor(&self) -> Arc<dyn Auditor> {
		self.auditor.clone()
	}

	/// Wait for queued audit records to reach the sink; call before exiting
	pub async fn flush_audit(&self) {
		self.auditor.flush().await;
	}
}
