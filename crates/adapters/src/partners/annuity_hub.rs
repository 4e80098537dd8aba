//! Annuity Hub: annuity rate desk
//!
//! HTTP Basic auth, `POST rates/search`. Returns guaranteed crediting rates
//! rather than premiums, so its quotes rank by rate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_types::{
	CarrierRating, FeatureValue, HealthCheckResult, IntegrationError, ProductFamily, ProductType,
	QuoteContext, QuoteProvider, QuoteSimulator, UnifiedQuote,
};
use serde::{Deserialize, Serialize};

use super::{expiry_or_default, fetch_raw, quote_id};
use crate::auth::AuthScheme;
use crate::gateway::PartnerGateway;

pub const PROVIDER_NAME: &str = "annuity-hub";
pub const QUOTE_ENDPOINT: &str = "rates/search";

// ================================
// ANNUITY HUB API MODELS
// ================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhRateSearch {
	pub premium: f64,
	pub issue_age: u32,
	pub state: String,
	/// FIXED, INDEXED or MYGA
	pub product_class: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub guarantee_period: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub issuers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhRateResponse {
	#[serde(default)]
	pub rates: Vec<AhRate>,
	pub valid_until: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhRate {
	pub rate_id: String,
	pub issuer: AhIssuer,
	pub product: AhProduct,
	/// Annual guaranteed rate in percent
	pub guaranteed_rate: f64,
	pub guarantee_period_years: Option<u32>,
	pub surrender_years: Option<u32>,
	pub minimum_premium: Option<f64>,
	pub free_withdrawal_pct: Option<f64>,
	pub application_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhIssuer {
	pub code: String,
	pub name: String,
	pub rating: Option<AhIssuerRating>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhIssuerRating {
	pub agency: String,
	pub grade: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AhProduct {
	pub code: String,
	pub name: String,
	pub class: String,
}

// ================================
// NORMALIZATION
// ================================

fn product_class(product_type: ProductType) -> &'static str {
	match product_type {
		ProductType::IndexedAnnuity => "INDEXED",
		ProductType::Myga => "MYGA",
		_ => "FIXED",
	}
}

fn product_type_for(class: &str, requested: ProductType) -> ProductType {
	match class.to_ascii_uppercase().as_str() {
		"FIXED" => ProductType::FixedAnnuity,
		"INDEXED" => ProductType::IndexedAnnuity,
		"MYGA" => ProductType::Myga,
		_ => requested,
	}
}

pub fn build_request(context: &QuoteContext) -> AhRateSearch {
	let request = &context.request;
	AhRateSearch {
		premium: request.premium_amount.unwrap_or_default(),
		issue_age: context.age,
		state: request.applicant.state.to_ascii_uppercase(),
		product_class: product_class(request.product_type).to_string(),
		guarantee_period: request.term_years,
		issuers: request.carrier_ids.clone(),
	}
}

/// Map a rate search answer into rate-style unified quotes
pub fn normalize(
	response: &AhRateResponse,
	requested: ProductType,
	now: DateTime<Utc>,
) -> Vec<UnifiedQuote> {
	let expiration = expiry_or_default(response.valid_until.as_deref(), now);

	response
		.rates
		.iter()
		.map(|rate| {
			let mut features = std::collections::BTreeMap::new();
			if let Some(years) = rate.surrender_years {
				features.insert(
					"surrender_years".to_string(),
					FeatureValue::Number(f64::from(years)),
				);
			}
			if let Some(minimum) = rate.minimum_premium {
				features.insert("minimum_premium".to_string(), FeatureValue::Number(minimum));
			}
			if let Some(pct) = rate.free_withdrawal_pct {
				features.insert("free_withdrawal_pct".to_string(), FeatureValue::Number(pct));
			}

			UnifiedQuote {
				id: quote_id(PROVIDER_NAME, &rate.rate_id),
				provider: PROVIDER_NAME.to_string(),
				carrier_id: rate.issuer.code.clone(),
				carrier_name: rate.issuer.name.clone(),
				product_id: rate.product.code.clone(),
				product_name: rate.product.name.clone(),
				product_type: product_type_for(&rate.product.class, requested),
				monthly_premium: None,
				annual_premium: None,
				rate: Some(rate.guaranteed_rate),
				face_amount: None,
				term: rate.guarantee_period_years,
				carrier_rating: rate.issuer.rating.as_ref().map(|r| CarrierRating {
					agency: r.agency.clone(),
					grade: r.grade.clone(),
				}),
				features,
				quote_date: now,
				expiration_date: expiration,
				application_url: rate.application_url.clone(),
			}
		})
		.collect()
}

// ================================
// PROVIDER
// ================================

#[derive(Debug)]
pub struct AnnuityHubProvider {
	gateway: PartnerGateway,
	simulator: Option<Arc<dyn QuoteSimulator>>,
}

impl AnnuityHubProvider {
	pub fn new(gateway: PartnerGateway, simulator: Option<Arc<dyn QuoteSimulator>>) -> Self {
		Self {
			gateway: gateway.with_auth(AuthScheme::Basic),
			simulator,
		}
	}

	pub fn gateway(&self) -> &PartnerGateway {
		&self.gateway
	}
}

#[async_trait]
impl QuoteProvider for AnnuityHubProvider {
	fn name(&self) -> &str {
		PROVIDER_NAME
	}

	fn supports(&self, family: ProductFamily) -> bool {
		family == ProductFamily::Annuity
	}

	async fn fetch_quotes(
		&self,
		context: &QuoteContext,
	) -> Result<Vec<UnifiedQuote>, IntegrationError> {
		let body = build_request(context);
		let response: Option<AhRateResponse> = fetch_raw(
			&self.gateway,
			self.simulator.as_ref(),
			QUOTE_ENDPOINT,
			&body,
			context,
		)
		.await?;

		Ok(response
			.map(|r| normalize(&r, context.request.product_type, Utc::now()))
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
	use gateway_types::{AuditRecord, Auditor, PartnerConfig, PartnerCredentials};
	use serde_json::json;

	#[derive(Debug)]
	struct NullAuditor;

	impl Auditor for NullAuditor {
		fn record(&self, _entry: AuditRecord) {}
	}

	fn sample_response() -> serde_json::Value {
		json!({
			"rates": [
				{
					"rateId": "R-5",
					"issuer": {"code": "SUN", "name": "Sunrise Annuity", "rating": {"agency": "S&P", "grade": "AA-"}},
					"product": {"code": "SG5", "name": "SecureGrowth 5", "class": "MYGA"},
					"guaranteedRate": 5.15,
					"guaranteePeriodYears": 5,
					"surrenderYears": 5,
					"minimumPremium": 10000.0
				},
				{
					"rateId": "R-7",
					"issuer": {"code": "HAR", "name": "Harbor Mutual"},
					"product": {"code": "HF7", "name": "Harbor Fixed 7", "class": "unknown"},
					"guaranteedRate": 4.8
				}
			]
		})
	}

	#[test]
	fn test_normalize_produces_rate_quotes() {
		let response: AhRateResponse = serde_json::from_value(sample_response()).unwrap();
		let quotes = normalize(&response, ProductType::FixedAnnuity, Utc::now());

		assert_eq!(quotes.len(), 2);
		assert!(quotes.iter().all(|q| q.is_rate_quote()));
		assert!(quotes.iter().all(|q| q.monthly_premium.is_none()));

		assert_eq!(quotes[0].product_type, ProductType::Myga);
		assert_eq!(quotes[0].rate, Some(5.15));
		assert_eq!(quotes[0].term, Some(5));
		assert_eq!(
			quotes[0].features.get("surrender_years"),
			Some(&FeatureValue::Number(5.0))
		);
		assert_eq!(quotes[0].carrier_rating.as_ref().unwrap().agency, "S&P");

		assert_eq!(quotes[1].product_type, ProductType::FixedAnnuity);
		assert!(quotes[1].carrier_rating.is_none());
	}

	#[tokio::test]
	async fn test_live_call_uses_basic_auth() {
		let mut transport = MockTransport::new();
		transport
			.expect_send()
			.times(1)
			.withf(|request| {
				request.url == "https://annuity.example.com/rates/search"
					&& request
						.header("Authorization")
						.map(|h| h.starts_with("Basic "))
						.unwrap_or(false)
					&& request.body.as_ref().map(|b| b["productClass"] == "MYGA").unwrap_or(false)
			})
			.returning(|_| Ok(TransportResponse::new(200, sample_response().to_string())));
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://annuity.example.com")
				.with_credentials(PartnerCredentials::new("ah-user").with_secret("ah-pass")),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider = AnnuityHubProvider::new(gateway, None);

		let quotes = provider.fetch_quotes(&context(ProductType::Myga)).await.unwrap();
		assert_eq!(quotes.len(), 2);
		assert!(provider.supports(ProductFamily::Annuity));
		assert!(!provider.supports(ProductFamily::Life));
	}
}
