//! Provider registry
//!
//! Builds the partner quote providers from resolved partner configuration and
//! the shared transport, auditor and simulator.

use std::sync::Arc;

use gateway_types::{Auditor, PartnerConfig, QuoteProvider, QuoteSimulator};
use thiserror::Error;
use tracing::{debug, info};

use crate::gateway::PartnerGateway;
use crate::partners::{
	annuity_hub, carrier_direct, quote_exchange, AnnuityHubProvider, CarrierDirectProvider,
	QuoteExchangeProvider,
};
use crate::transport::Transport;

/// Partner ids this crate has a provider for
pub const SUPPORTED_PARTNERS: [&str; 3] = [
	quote_exchange::PROVIDER_NAME,
	carrier_direct::PROVIDER_NAME,
	annuity_hub::PROVIDER_NAME,
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
	#[error("no provider implementation for partner '{0}'")]
	UnsupportedPartner(String),

	#[error("partner '{0}' registered twice")]
	DuplicatePartner(String),
}

/// Collaborators shared by every provider
#[derive(Debug, Clone)]
pub struct ProviderDeps {
	pub transport: Arc<dyn Transport>,
	pub auditor: Arc<dyn Auditor>,
	pub simulator: Option<Arc<dyn QuoteSimulator>>,
}

/// Ordered set of quote providers, looked up by name
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
	providers: Vec<Arc<dyn QuoteProvider>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build the provider for one partner configuration
	pub fn create_provider(
		config: PartnerConfig,
		deps: &ProviderDeps,
	) -> Result<Arc<dyn QuoteProvider>, RegistryError> {
		let partner_id = config.partner_id.clone();
		let gateway = PartnerGateway::new(config, deps.transport.clone(), deps.auditor.clone());
		debug!(partner = %partner_id, mode = ?gateway.mode(), "creating provider");

		let simulator = deps.simulator.clone();
		let provider: Arc<dyn QuoteProvider> = match partner_id.as_str() {
			quote_exchange::PROVIDER_NAME => Arc::new(QuoteExchangeProvider::new(gateway, simulator)),
			carrier_direct::PROVIDER_NAME => Arc::new(CarrierDirectProvider::new(gateway, simulator)),
			annuity_hub::PROVIDER_NAME => Arc::new(AnnuityHubProvider::new(gateway, simulator)),
			other => return Err(RegistryError::UnsupportedPartner(other.to_string())),
		};
		Ok(provider)
	}

	/// Build a registry from every configured partner
	pub fn from_configs(
		configs: impl IntoIterator<Item = PartnerConfig>,
		deps: &ProviderDeps,
	) -> Result<Self, RegistryError> {
		let mut registry = Self::new();
		for config in configs {
			registry.register(Self::create_provider(config, deps)?)?;
		}
		info!(providers = ?registry.names(), "provider registry ready");
		Ok(registry)
	}

	pub fn register(&mut self, provider: Arc<dyn QuoteProvider>) -> Result<(), RegistryError> {
		if self.get(provider.name()).is_some() {
			return Err(RegistryError::DuplicatePartner(provider.name().to_string()));
		}
		self.providers.push(provider);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn QuoteProvider>> {
		self.providers.iter().find(|p| p.name() == name)
	}

	pub fn providers(&self) -> &[Arc<dyn QuoteProvider>] {
		&self.providers
	}

	pub fn names(&self) -> Vec<&str> {
		self.providers.iter().map(|p| p.name()).collect()
	}

	pub fn len(&self) -> usize {
		self.providers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}
}
