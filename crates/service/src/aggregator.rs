//! Quote aggregation across partner providers

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use gateway_types::{
	AggregationResult, HealthCheckResult, ProviderStatus, QuoteContext, QuoteProvider,
	QuoteValidationError, UnifiedQuote, UnifiedQuoteRequest,
};
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const PROVIDER_TIMEOUT_CODE: &str = "PROVIDER_TIMEOUT";
pub const PROVIDER_PANIC_CODE: &str = "PROVIDER_PANIC";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
	#[error("Invalid quote request: {0}")]
	InvalidRequest(#[from] QuoteValidationError),
}

/// Fans a quote request out to every applicable provider
#[derive(Debug, Clone)]
pub struct QuoteAggregator {
	providers: Vec<Arc<dyn QuoteProvider>>,
	/// Per-provider budget; `None` waits for every provider
	provider_timeout: Option<Duration>,
}

impl QuoteAggregator {
	pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
		Self {
			providers,
			provider_timeout: None,
		}
	}

	pub fn with_provider_timeout(mut self, provider_timeout: Option<Duration>) -> Self {
		self.provider_timeout = provider_timeout;
		self
	}

	pub fn providers(&self) -> &[Arc<dyn QuoteProvider>] {
		&self.providers
	}

	pub async fn aggregate(
		&self,
		request: UnifiedQuoteRequest,
	) -> Result<AggregationResult, AggregationError> {
		self.aggregate_on(request, Utc::now().date_naive()).await
	}

	/// Aggregate with an explicit "today" used for validation and age
	pub async fn aggregate_on(
		&self,
		request: UnifiedQuoteRequest,
		today: NaiveDate,
	) -> Result<AggregationResult, AggregationError> {
		let started = Instant::now();
		request.validate_on(today)?;

		let age = request.applicant.age_on(today).ok_or_else(|| {
			QuoteValidationError::InvalidDateOfBirth {
				reason: format!("{} is in the future", request.applicant.date_of_birth),
			}
		})?;
		let request_id = request
			.request_id
			.clone()
			.unwrap_or_else(|| format!("agg-{}", Uuid::new_v4()));

		let family = request.family();
		let selected: Vec<Arc<dyn QuoteProvider>> = self
			.providers
			.iter()
			.filter(|p| p.supports(family))
			.cloned()
			.collect();

		info!(
			request_id = %request_id,
			product_type = %request.product_type,
			providers = selected.len(),
			"aggregating quotes"
		);

		let context = Arc::new(QuoteContext {
			request_id: request_id.clone(),
			age,
			request,
		});

		let names: Vec<String> = selected.iter().map(|p| p.name().to_string()).collect();
		let tasks = selected.into_iter().map(|provider| {
			let context = Arc::clone(&context);
			let provider_timeout = self.provider_timeout;

			tokio::spawn(async move {
				debug!(provider = provider.name(), "fetching quotes");
				let fetch = provider.fetch_quotes(&context);
				match provider_timeout {
					Some(limit) => match timeout(limit, fetch).await {
						Ok(result) => result.map_err(|e| (e.message, e.code)),
						Err(_) => Err((
							format!("no answer within {}ms", limit.as_millis()),
							PROVIDER_TIMEOUT_CODE.to_string(),
						)),
					},
					None => fetch.await.map_err(|e| (e.message, e.code)),
				}
			})
		});

		let results = join_all(tasks).await;

		let mut quotes = Vec::new();
		let mut provider_status = BTreeMap::new();
		for (name, joined) in names.into_iter().zip(results) {
			let status = match joined {
				Ok(Ok(provider_quotes)) => {
					debug!(provider = %name, count = provider_quotes.len(), "provider answered");
					let status = ProviderStatus::succeeded(provider_quotes.len());
					quotes.extend(provider_quotes);
					status
				},
				Ok(Err((message, code))) => {
					warn!(provider = %name, code = %code, error = %message, "provider failed");
					ProviderStatus::failed(message, code)
				},
				Err(join_error) => {
					warn!(provider = %name, error = %join_error, "provider task aborted");
					ProviderStatus::failed(
						format!("provider task failed: {}", join_error),
						PROVIDER_PANIC_CODE,
					)
				},
			};
			provider_status.insert(name, status);
		}

		let mut quotes = apply_filters(quotes, &context.request);
		rank_quotes(&mut quotes);

		let result = AggregationResult {
			success: true,
			best_quote: quotes.first().cloned(),
			average_premium: average_premium(&quotes),
			quotes,
			provider_status,
			elapsed_ms: started.elapsed().as_millis() as u64,
			request_id,
			timestamp: Utc::now(),
		};

		info!(
			request_id = %result.request_id,
			quotes = result.quotes.len(),
			failed = result.failed_providers().len(),
			elapsed_ms = result.elapsed_ms,
			"aggregation completed"
		);

		Ok(result)
	}

	/// Health of every provider, checked concurrently
	pub async fn providers_health(&self) -> BTreeMap<String, HealthCheckResult> {
		let checks = self.providers.iter().map(|provider| async move {
			(provider.name().to_string(), provider.health_check().await)
		});
		join_all(checks).await.into_iter().collect()
	}
}

/// Carrier allow-list and monthly premium ceiling
pub fn apply_filters(quotes: Vec<UnifiedQuote>, request: &UnifiedQuoteRequest) -> Vec<UnifiedQuote> {
	let carriers = request
		.carrier_ids
		.as_ref()
		.filter(|ids| !ids.is_empty());

	quotes
		.into_iter()
		.filter(|quote| match carriers {
			Some(ids) => ids.iter().any(|id| id.eq_ignore_ascii_case(&quote.carrier_id)),
			None => true,
		})
		.filter(|quote| match (request.max_premium, quote.monthly_premium) {
			(Some(ceiling), Some(premium)) => premium <= ceiling,
			_ => true,
		})
		.collect()
}

fn rank_key(quote: &UnifiedQuote) -> (u8, f64) {
	match (quote.monthly_premium, quote.rate) {
		(Some(premium), _) => (0, premium),
		(None, Some(rate)) => (1, -rate),
		(None, None) => (2, 0.0),
	}
}

/// Stable ranking: premiums ascending, then rates descending, then the rest
pub fn rank_quotes(quotes: &mut [UnifiedQuote]) {
	quotes.sort_by(|a, b| {
		let (class_a, value_a) = rank_key(a);
		let (class_b, value_b) = rank_key(b);
		match class_a.cmp(&class_b) {
			Ordering::Equal => value_a.total_cmp(&value_b),
			other => other,
		}
	});
}

/// Mean monthly premium rounded to cents
pub fn average_premium(quotes: &[UnifiedQuote]) -> Option<f64> {
	let premiums: Vec<f64> = quotes.iter().filter_map(|q| q.monthly_premium).collect();
	if premiums.is_empty() {
		return None;
	}
	let mean = premiums.iter().sum::<f64>() / premiums.len() as f64;
	Some((mean * 100.0).round() / 100.0)
}
