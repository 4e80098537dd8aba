//! Quote Exchange: multi-carrier term life marketplace
//!
//! Bearer-authenticated, `POST quotes/term`. Answers with one quote per
//! carrier in camelCase JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_types::{
	CarrierRating, Gender, HealthCheckResult, HealthClass, IntegrationError, ProductFamily,
	ProductType, QuoteContext, QuoteProvider, QuoteSimulator, UnifiedQuote,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{expiry_or_default, feature_value, fetch_raw, quote_id, round_money};
use crate::auth::AuthScheme;
use crate::gateway::PartnerGateway;

pub const PROVIDER_NAME: &str = "quote-exchange";
pub const QUOTE_ENDPOINT: &str = "quotes/term";
pub const DEFAULT_RATING_AGENCY: &str = "A.M. Best";

// ================================
// QUOTE EXCHANGE API MODELS
// ================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QxTermRequest {
	pub age: u32,
	/// "M" or "F"
	pub gender: String,
	pub state: String,
	pub tobacco: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub health_class: Option<String>,
	pub face_amount: f64,
	pub term_years: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QxQuoteResponse {
	#[serde(default)]
	pub quotes: Vec<QxQuote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QxQuote {
	pub quote_id: String,
	pub carrier_code: String,
	pub carrier_name: String,
	pub product_code: String,
	pub product_name: String,
	pub term_years: Option<u32>,
	pub face_amount: Option<f64>,
	pub monthly_premium: Option<f64>,
	pub annual_premium: Option<f64>,
	pub rating: Option<QxRating>,
	#[serde(default)]
	pub features: BTreeMap<String, Value>,
	pub apply_url: Option<String>,
	pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QxRating {
	pub agency: Option<String>,
	pub grade: String,
}

// ================================
// NORMALIZATION
// ================================

fn health_class_code(class: HealthClass) -> &'static str {
	match class {
		HealthClass::PreferredPlus => "PP",
		HealthClass::Preferred => "P",
		HealthClass::StandardPlus => "SP",
		HealthClass::Standard => "S",
	}
}

/// Marketplace feature names mapped onto unified feature keys
fn feature_key(raw: &str) -> String {
	match raw {
		"accelUW" => "accelerated_underwriting".to_string(),
		"conversion" => "convertible".to_string(),
		"returnOfPremium" => "return_of_premium".to_string(),
		other => other.to_string(),
	}
}

pub fn build_request(context: &QuoteContext) -> QxTermRequest {
	let request = &context.request;
	QxTermRequest {
		age: context.age,
		gender: match request.applicant.gender {
			Gender::Male => "M".to_string(),
			Gender::Female => "F".to_string(),
		},
		state: request.applicant.state.to_ascii_uppercase(),
		tobacco: request.applicant.tobacco_use,
		health_class: request
			.applicant
			.health_class
			.map(|c| health_class_code(c).to_string()),
		face_amount: request.face_amount.unwrap_or_default(),
		term_years: request.term_years.unwrap_or_default(),
		carrier_ids: request.carrier_ids.clone(),
	}
}

/// Map a marketplace answer into unified quotes
pub fn normalize(response: &QxQuoteResponse, now: DateTime<Utc>) -> Vec<UnifiedQuote> {
	response
		.quotes
		.iter()
		.map(|quote| {
			let monthly = quote.monthly_premium.map(round_money);
			let annual = quote
				.annual_premium
				.or_else(|| quote.monthly_premium.map(|m| m * 12.0))
				.map(round_money);

			UnifiedQuote {
				id: quote_id(PROVIDER_NAME, &quote.quote_id),
				provider: PROVIDER_NAME.to_string(),
				carrier_id: quote.carrier_code.clone(),
				carrier_name: quote.carrier_name.clone(),
				product_id: quote.product_code.clone(),
				product_name: quote.product_name.clone(),
				product_type: ProductType::Term,
				monthly_premium: monthly,
				annual_premium: annual,
				rate: None,
				face_amount: quote.face_amount,
				term: quote.term_years,
				carrier_rating: quote.rating.as_ref().map(|rating| CarrierRating {
					agency: rating
						.agency
						.clone()
						.filter(|a| !a.trim().is_empty())
						.unwrap_or_else(|| DEFAULT_RATING_AGENCY.to_string()),
					grade: rating.grade.clone(),
				}),
				features: quote
					.features
					.iter()
					.filter_map(|(k, v)| feature_value(v).map(|fv| (feature_key(k), fv)))
					.collect(),
				quote_date: now,
				expiration_date: expiry_or_default(quote.expires_at.as_deref(), now),
				application_url: quote.apply_url.clone(),
			}
		})
		.collect()
}

// ================================
// PROVIDER
// ================================

#[derive(Debug)]
pub struct QuoteExchangeProvider {
	gateway: PartnerGateway,
	simulator: Option<Arc<dyn QuoteSimulator>>,
}

impl QuoteExchangeProvider {
	pub fn new(gateway: PartnerGateway, simulator: Option<Arc<dyn QuoteSimulator>>) -> Self {
		Self {
			gateway: gateway.with_auth(AuthScheme::Bearer),
			simulator,
		}
	}

	pub fn gateway(&self) -> &PartnerGateway {
		&self.gateway
	}
}

#[async_trait]
impl QuoteProvider for QuoteExchangeProvider {
	fn name(&self) -> &str {
		PROVIDER_NAME
	}

	fn supports(&self, family: ProductFamily) -> bool {
		family == ProductFamily::Life
	}

	async fn fetch_quotes(
		&self,
		context: &QuoteContext,
	) -> Result<Vec<UnifiedQuote>, IntegrationError> {
		// Term-only marketplace
		if context.request.product_type != ProductType::Term {
			debug!(
				request_id = %context.request_id,
				product_type = %context.request.product_type,
				"quote exchange only prices term"
			);
			return Ok(Vec::new());
		}

		let body = build_request(context);
		let response: Option<QxQuoteResponse> = fetch_raw(
			&self.gateway,
			self.simulator.as_ref(),
			QUOTE_ENDPOINT,
			&body,
			context,
		)
		.await?;

		Ok(response
			.map(|r| normalize(&r, Utc::now()))
			.unwrap_or_default())
	}

	async fn health_check(&self) -> HealthCheckResult {
		self.gateway.health_check().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::partners::test_support::context;
	use crate::transport::{MockTransport, TransportResponse};
	use gateway_types::{
		AuditRecord, Auditor, FeatureValue, PartnerConfig, PartnerCredentials,
	};
	use serde_json::json;

	#[derive(Debug)]
	struct NullAuditor;

	impl Auditor for NullAuditor {
		fn record(&self, _entry: AuditRecord) {}
	}

	#[derive(Debug)]
	struct FixedSimulator(Value);

	impl QuoteSimulator for FixedSimulator {
		fn simulate(&self, provider: &str, _context: &QuoteContext) -> Option<Value> {
			(provider == PROVIDER_NAME).then(|| self.0.clone())
		}
	}

	fn sample_response() -> Value {
		json!({
			"quotes": [{
				"quoteId": "Q1",
				"carrierCode": "PRU",
				"carrierName": "Prudent Life",
				"productCode": "T20",
				"productName": "Term 20",
				"termYears": 20,
				"faceAmount": 500000.0,
				"monthlyPremium": 42.5,
				"rating": {"grade": "A+"},
				"features": {"accelUW": true, "conversion": true, "returnOfPremium": false, "waiverAge": 60},
				"applyUrl": "https://apply.example.com/Q1"
			}]
		})
	}

	#[test]
	fn test_normalize_maps_features_and_rating() {
		let response: QxQuoteResponse = serde_json::from_value(sample_response()).unwrap();
		let now = Utc::now();
		let quotes = normalize(&response, now);

		assert_eq!(quotes.len(), 1);
		let quote = &quotes[0];
		assert_eq!(quote.id, "quote-exchange-Q1");
		assert_eq!(quote.provider, PROVIDER_NAME);
		assert_eq!(quote.monthly_premium, Some(42.5));
		assert_eq!(quote.annual_premium, Some(510.0));
		assert_eq!(quote.term, Some(20));

		let rating = quote.carrier_rating.as_ref().unwrap();
		assert_eq!(rating.agency, DEFAULT_RATING_AGENCY);
		assert_eq!(rating.grade, "A+");

		assert_eq!(
			quote.features.get("accelerated_underwriting"),
			Some(&FeatureValue::Flag(true))
		);
		assert_eq!(quote.features.get("convertible"), Some(&FeatureValue::Flag(true)));
		assert_eq!(
			quote.features.get("return_of_premium"),
			Some(&FeatureValue::Flag(false))
		);
		assert_eq!(quote.features.get("waiverAge"), Some(&FeatureValue::Number(60.0)));
		assert!(!quote.features.contains_key("accelUW"));
		assert_eq!(quote.expiration_date, now + chrono::Duration::days(30));
	}

	#[test]
	fn test_build_request_shape() {
		let body = serde_json::to_value(build_request(&context(ProductType::Term))).unwrap();
		assert_eq!(body["gender"], "F");
		assert_eq!(body["healthClass"], "PP");
		assert_eq!(body["faceAmount"], 500000.0);
		assert_eq!(body["termYears"], 20);
		assert!(body.get("carrierIds").is_none());
	}

	#[tokio::test]
	async fn test_offline_uses_simulator() {
		let mut transport = MockTransport::new();
		transport.expect_send().times(0);
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://qx.example.com"),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider =
			QuoteExchangeProvider::new(gateway, Some(Arc::new(FixedSimulator(sample_response()))));

		let quotes = provider.fetch_quotes(&context(ProductType::Term)).await.unwrap();
		assert_eq!(quotes.len(), 1);
		assert_eq!(quotes[0].carrier_id, "PRU");
	}

	#[tokio::test]
	async fn test_offline_without_simulator_is_empty() {
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://qx.example.com").with_enabled(false),
			Arc::new(MockTransport::new()),
			Arc::new(NullAuditor),
		);
		let provider = QuoteExchangeProvider::new(gateway, None);

		let quotes = provider.fetch_quotes(&context(ProductType::Term)).await.unwrap();
		assert!(quotes.is_empty());
	}

	#[tokio::test]
	async fn test_live_posts_to_term_endpoint() {
		let mut transport = MockTransport::new();
		transport
			.expect_send()
			.times(1)
			.withf(|request| {
				request.url == "https://qx.example.com/api/quotes/term"
					&& request.header("Authorization") == Some("Bearer qx-key")
					&& request.body.as_ref().map(|b| b["age"] == 41).unwrap_or(false)
			})
			.returning(|_| Ok(TransportResponse::new(200, sample_response().to_string())));
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://qx.example.com/api")
				.with_credentials(PartnerCredentials::new("qx-key")),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider = QuoteExchangeProvider::new(gateway, None);

		let quotes = provider.fetch_quotes(&context(ProductType::Term)).await.unwrap();
		assert_eq!(quotes.len(), 1);
	}

	#[tokio::test]
	async fn test_whole_life_is_skipped() {
		let mut transport = MockTransport::new();
		transport.expect_send().times(0);
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://qx.example.com")
				.with_credentials(PartnerCredentials::new("qx-key")),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider = QuoteExchangeProvider::new(gateway, None);

		let quotes = provider
			.fetch_quotes(&context(ProductType::WholeLife))
			.await
			.unwrap();
		assert!(quotes.is_empty());
		assert!(provider.supports(ProductFamily::Life));
		assert!(!provider.supports(ProductFamily::Annuity));
	}
}
