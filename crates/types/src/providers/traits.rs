//! Core provider traits for partner implementations

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
	HealthCheckResult, IntegrationError, ProductFamily, UnifiedQuote, UnifiedQuoteRequest,
};

/// Everything a provider needs to price one request
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteContext {
	pub request_id: String,
	/// Applicant age derived from the date of birth
	pub age: u32,
	pub request: UnifiedQuoteRequest,
}

/// A partner able to return quotes in the unified shape
///
/// Implementations own their wire format and normalization; the aggregator
/// only sees [`UnifiedQuote`]s.
#[async_trait]
pub trait QuoteProvider: Send + Sync + Debug {
	/// Stable provider name used as the key in aggregation results
	fn name(&self) -> &str;

	/// Whether this provider prices the given product family
	fn supports(&self, family: ProductFamily) -> bool;

	async fn fetch_quotes(
		&self,
		context: &QuoteContext,
	) -> Result<Vec<UnifiedQuote>, IntegrationError>;

	async fn health_check(&self) -> HealthCheckResult;
}

/// Offline quote source used when a partner is disabled or unconfigured
///
/// Returns a provider-shaped JSON payload (the same shape the live partner
/// would answer with) or `None` when it has nothing for this provider.
pub trait QuoteSimulator: Send + Sync + Debug {
	fn simulate(&self, provider: &str, context: &QuoteContext) -> Option<serde_json::Value>;
}
