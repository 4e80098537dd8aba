//! Aggregation result returned to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::UnifiedQuote;

/// Outcome of one provider within an aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
	pub success: bool,
	pub count: usize,
	pub error: Option<String>,
	pub error_code: Option<String>,
}

impl ProviderStatus {
	pub fn succeeded(count: usize) -> Self {
		Self {
			success: true,
			count,
			error: None,
			error_code: None,
		}
	}

	pub fn failed(error: impl Into<String>, error_code: impl Into<String>) -> Self {
		Self {
			success: false,
			count: 0,
			error: Some(error.into()),
			error_code: Some(error_code.into()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
	/// True whenever the aggregation itself completed, even with zero quotes
	pub success: bool,
	pub quotes: Vec<UnifiedQuote>,
	pub provider_status: BTreeMap<String, ProviderStatus>,
	pub best_quote: Option<UnifiedQuote>,
	pub average_premium: Option<f64>,
	pub elapsed_ms: u64,
	pub request_id: String,
	pub timestamp: DateTime<Utc>,
}

impl AggregationResult {
	/// Providers that failed, with their error message
	pub fn failed_providers(&self) -> Vec<(&str, &str)> {
		self.provider_status
			.iter()
			.filter(|(_, status)| !status.success)
			.map(|(name, status)| (name.as_str(), status.error.as_deref().unwrap_or_default()))
			.collect()
	}

	pub fn is_degraded(&self) -> bool {
		self.provider_status.values().any(|status| !status.success)
	}
}
