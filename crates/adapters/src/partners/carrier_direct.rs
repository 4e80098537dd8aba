//! Carrier Direct: single-carrier life illustration API
//!
//! Authenticates with `X-Api-Key` / `X-Api-Secret` headers and prices term,
//! whole life and universal life through `POST v2/illustrations/quote`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_types::{
	CarrierRating, FeatureValue, Gender, HealthCheckResult, HealthClass, IntegrationError,
	ProductFamily, ProductType, QuoteContext, QuoteProvider, QuoteSimulator, UnifiedQuote,
};
use serde::{Deserialize, Serialize};

use super::{expiry_or_default, fetch_raw, flag_key, quote_id, round_money};
use crate::auth::AuthScheme;
use crate::gateway::PartnerGateway;

pub const PROVIDER_NAME: &str = "carrier-direct";
pub const QUOTE_ENDPOINT: &str = "v2/illustrations/quote";
const RATING_AGENCY: &str = "A.M. Best";

// ================================
// CARRIER DIRECT API MODELS
// ================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdIllustrationRequest {
	pub illustration: CdIllustration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdIllustration {
	pub insured: CdInsured,
	pub coverage: CdCoverage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdInsured {
	pub issue_age: u32,
	/// "MALE" or "FEMALE"
	pub sex: String,
	pub residence_state: String,
	/// "Y" or "N"
	pub tobacco: String,
	pub risk_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdCoverage {
	/// TERM, WHOLE_LIFE, UL or IUL
	pub product_type: String,
	pub face_amount: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub level_period: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdIllustrationResponse {
	pub carrier: CdCarrier,
	#[serde(default)]
	pub offers: Vec<CdOffer>,
	pub valid_through: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdCarrier {
	pub id: String,
	pub name: String,
	pub am_best_rating: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdOffer {
	pub offer_id: String,
	pub plan_code: String,
	pub plan_name: String,
	pub premium: CdPremium,
	pub level_period: Option<u32>,
	pub face_amount: Option<f64>,
	#[serde(default)]
	pub flags: Vec<String>,
	pub e_app_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdPremium {
	pub monthly: Option<f64>,
	pub annual: Option<f64>,
}

// ================================
// NORMALIZATION
// ================================

fn coverage_code(product_type: ProductType) -> &'static str {
	match product_type {
		ProductType::WholeLife => "WHOLE_LIFE",
		ProductType::UniversalLife => "UL",
		ProductType::IndexedUniversalLife => "IUL",
		_ => "TERM",
	}
}

fn risk_class(class: Option<HealthClass>, tobacco: bool) -> String {
	let base = match class.unwrap_or(HealthClass::Standard) {
		HealthClass::PreferredPlus => "PREFERRED_PLUS",
		HealthClass::Preferred => "PREFERRED",
		HealthClass::StandardPlus => "STANDARD_PLUS",
		HealthClass::Standard => "STANDARD",
	};
	if tobacco {
		format!("{}_TOBACCO", base)
	} else {
		base.to_string()
	}
}

pub fn build_request(context: &QuoteContext) -> CdIllustrationRequest {
	let request = &context.request;
	let applicant = &request.applicant;
	CdIllustrationRequest {
		illustration: CdIllustration {
			insured: CdInsured {
				issue_age: context.age,
				sex: match applicant.gender {
					Gender::Male => "MALE".to_string(),
					Gender::Female => "FEMALE".to_string(),
				},
				residence_state: applicant.state.to_ascii_uppercase(),
				tobacco: if applicant.tobacco_use { "Y" } else { "N" }.to_string(),
				risk_class: risk_class(applicant.health_class, applicant.tobacco_use),
			},
			coverage: CdCoverage {
				product_type: coverage_code(request.product_type).to_string(),
				face_amount: request.face_amount.unwrap_or_default(),
				level_period: request
					.term_years
					.filter(|_| request.product_type == ProductType::Term),
			},
		},
	}
}

/// Map an illustration answer into unified quotes
///
/// The carrier answers for the product type that was requested, so the
/// requested type is carried onto every offer.
pub fn normalize(
	response: &CdIllustrationResponse,
	product_type: ProductType,
	now: DateTime<Utc>,
) -> Vec<UnifiedQuote> {
	let rating = response
		.carrier
		.am_best_rating
		.as_ref()
		.filter(|grade| !grade.trim().is_empty())
		.map(|grade| CarrierRating {
			agency: RATING_AGENCY.to_string(),
			grade: grade.clone(),
		});
	let expiration = expiry_or_default(response.valid_through.as_deref(), now);

	response
		.offers
		.iter()
		.map(|offer| UnifiedQuote {
			id: quote_id(PROVIDER_NAME, &offer.offer_id),
			provider: PROVIDER_NAME.to_string(),
			carrier_id: response.carrier.id.clone(),
			carrier_name: response.carrier.name.clone(),
			product_id: offer.plan_code.clone(),
			product_name: offer.plan_name.clone(),
			product_type,
			monthly_premium: offer.premium.monthly.map(round_money),
			annual_premium: offer
				.premium
				.annual
				.or_else(|| offer.premium.monthly.map(|m| m * 12.0))
				.map(round_money),
			rate: None,
			face_amount: offer.face_amount,
			term: offer.level_period,
			carrier_rating: rating.clone(),
			features: offer
				.flags
				.iter()
				.map(|flag| (flag_key(flag), FeatureValue::Flag(true)))
				.collect(),
			quote_date: now,
			expiration_date: expiration,
			application_url: offer.e_app_link.clone(),
		})
		.collect()
}

// ================================
// PROVIDER
// ================================

#[derive(Debug)]
pub struct CarrierDirectProvider {
	gateway: PartnerGateway,
	simulator: Option<Arc<dyn QuoteSimulator>>,
}

impl CarrierDirectProvider {
	pub fn new(gateway: PartnerGateway, simulator: Option<Arc<dyn QuoteSimulator>>) -> Self {
		Self {
			gateway: gateway.with_auth(AuthScheme::api_key_headers()),
			simulator,
		}
	}

	pub fn gateway(&self) -> &PartnerGateway {
		&self.gateway
	}
}

#[async_trait]
impl QuoteProvider for CarrierDirectProvider {
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
		let body = build_request(context);
		let response: Option<CdIllustrationResponse> = fetch_raw(
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
	use gateway_types::{AuditRecord, Auditor, IntegrationErrorKind, PartnerConfig, PartnerCredentials};
	use serde_json::json;

	#[derive(Debug)]
	struct NullAuditor;

	impl Auditor for NullAuditor {
		fn record(&self, _entry: AuditRecord) {}
	}

	fn sample_response() -> serde_json::Value {
		json!({
			"carrier": {"id": "NWL", "name": "Northwind Life", "amBestRating": "A"},
			"offers": [
				{
					"offerId": "O-1",
					"planCode": "NW-T20",
					"planName": "Northwind Term 20",
					"premium": {"monthly": 38.125},
					"levelPeriod": 20,
					"faceAmount": 500000.0,
					"flags": ["LIVING_BENEFITS", "CONVERSION_OPTION"],
					"eAppLink": "https://nwl.example.com/app/O-1"
				},
				{
					"offerId": "O-2",
					"planCode": "NW-T20X",
					"planName": "Northwind Term 20 Express",
					"premium": {"monthly": 44.0, "annual": 515.0}
				}
			],
			"validThrough": "2026-12-01T00:00:00Z"
		})
	}

	#[test]
	fn test_normalize_flags_become_features() {
		let response: CdIllustrationResponse = serde_json::from_value(sample_response()).unwrap();
		let quotes = normalize(&response, ProductType::Term, Utc::now());

		assert_eq!(quotes.len(), 2);
		let first = &quotes[0];
		assert_eq!(first.id, "carrier-direct-O-1");
		assert_eq!(first.carrier_id, "NWL");
		assert_eq!(first.monthly_premium, Some(38.13));
		assert_eq!(first.annual_premium, Some(457.5));
		assert_eq!(
			first.features.get("living_benefits"),
			Some(&FeatureValue::Flag(true))
		);
		assert_eq!(
			first.features.get("conversion_option"),
			Some(&FeatureValue::Flag(true))
		);
		assert_eq!(
			first.carrier_rating,
			Some(CarrierRating {
				agency: "A.M. Best".to_string(),
				grade: "A".to_string()
			})
		);
		assert_eq!(first.expiration_date.to_rfc3339(), "2026-12-01T00:00:00+00:00");

		let second = &quotes[1];
		assert_eq!(second.annual_premium, Some(515.0));
		assert!(second.features.is_empty());
	}

	#[test]
	fn test_build_request_for_whole_life() {
		let body =
			serde_json::to_value(build_request(&context(ProductType::WholeLife))).unwrap();
		let coverage = &body["illustration"]["coverage"];
		assert_eq!(coverage["productType"], "WHOLE_LIFE");
		assert!(coverage.get("levelPeriod").is_none());
		assert_eq!(body["illustration"]["insured"]["riskClass"], "PREFERRED_PLUS");
		assert_eq!(body["illustration"]["insured"]["tobacco"], "N");
	}

	#[tokio::test]
	async fn test_live_call_uses_api_key_headers() {
		let mut transport = MockTransport::new();
		transport
			.expect_send()
			.times(1)
			.withf(|request| {
				request.url == "https://cd.example.com/v2/illustrations/quote"
					&& request.header("X-Api-Key") == Some("cd-key")
					&& request.header("X-Api-Secret") == Some("cd-secret")
					&& request.header("Authorization").is_none()
			})
			.returning(|_| Ok(TransportResponse::new(200, sample_response().to_string())));
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://cd.example.com")
				.with_credentials(PartnerCredentials::new("cd-key").with_secret("cd-secret")),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider = CarrierDirectProvider::new(gateway, None);

		let quotes = provider.fetch_quotes(&context(ProductType::Term)).await.unwrap();
		assert_eq!(quotes.len(), 2);
	}

	#[tokio::test]
	async fn test_unexpected_shape_is_invalid_response() {
		let mut transport = MockTransport::new();
		transport
			.expect_send()
			.returning(|_| Ok(TransportResponse::new(200, r#"{"offers": "nope"}"#)));
		let gateway = PartnerGateway::new(
			PartnerConfig::new(PROVIDER_NAME, "https://cd.example.com")
				.with_credentials(PartnerCredentials::new("cd-key")),
			Arc::new(transport),
			Arc::new(NullAuditor),
		);
		let provider = CarrierDirectProvider::new(gateway, None);

		let error = provider
			.fetch_quotes(&context(ProductType::Term))
			.await
			.unwrap_err();
		assert_eq!(error.kind, IntegrationErrorKind::InvalidResponse);
		assert_eq!(error.partner, PROVIDER_NAME);
	}
}
