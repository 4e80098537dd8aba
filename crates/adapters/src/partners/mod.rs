//! Partner quote providers
//!
//! Each partner module owns its wire models and a pure `normalize` function
//! mapping the partner answer into [`UnifiedQuote`]s. Calls go through a
//! shared [`PartnerGateway`]; when the gateway is not live the provider asks
//! the configured [`QuoteSimulator`] for a partner-shaped payload instead.

pub mod annuity_hub;
pub mod carrier_direct;
pub mod quote_exchange;

pub use annuity_hub::AnnuityHubProvider;
pub use carrier_direct::CarrierDirectProvider;
pub use quote_exchange::QuoteExchangeProvider;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gateway_types::{FeatureValue, IntegrationError, QuoteContext, QuoteSimulator};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::gateway::{PartnerGateway, RequestOptions};

/// Quotes without an explicit expiry are valid this long
pub const DEFAULT_QUOTE_VALIDITY_DAYS: i64 = 30;

/// Fetch a partner answer live, or from the simulator when offline
///
/// Returns `None` when the partner is offline and nothing is simulated.
pub(crate) async fn fetch_raw<Req, Resp>(
	gateway: &PartnerGateway,
	simulator: Option<&Arc<dyn QuoteSimulator>>,
	endpoint: &str,
	body: &Req,
	context: &QuoteContext,
) -> Result<Option<Resp>, IntegrationError>
where
	Req: Serialize,
	Resp: DeserializeOwned,
{
	let partner = gateway.partner_id();

	if gateway.is_live() {
		let body = serde_json::to_value(body).map_err(|e| {
			IntegrationError::invalid_response(partner, format!("failed to encode request: {}", e), 0)
		})?;
		let options = RequestOptions::post(body).for_user(context.request.user_id.clone());
		return gateway.request(endpoint, options).await.map(Some);
	}

	let Some(simulator) = simulator else {
		debug!(partner, mode = ?gateway.mode(), "partner offline and no simulator configured");
		return Ok(None);
	};

	match simulator.simulate(partner, context) {
		Some(payload) => serde_json::from_value(payload).map(Some).map_err(|e| {
			IntegrationError::invalid_response(
				partner,
				format!("simulated payload has unexpected shape: {}", e),
				0,
			)
		}),
		None => Ok(None),
	}
}

/// Convert a loose JSON feature value into a typed one
pub(crate) fn feature_value(value: &Value) -> Option<FeatureValue> {
	match value {
		Value::Bool(b) => Some(FeatureValue::Flag(*b)),
		Value::Number(n) => n.as_f64().map(FeatureValue::Number),
		Value::String(s) => Some(FeatureValue::Text(s.clone())),
		_ => None,
	}
}

/// Parse an RFC 3339 expiry, falling back to the default validity window
pub(crate) fn expiry_or_default(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
	raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
		.map(|dt| dt.with_timezone(&Utc))
		.unwrap_or_else(|| now + Duration::days(DEFAULT_QUOTE_VALIDITY_DAYS))
}

/// Lowercase snake_case form of an upper-snake flag (`LIVING_BENEFITS`)
pub(crate) fn flag_key(flag: &str) -> String {
	flag.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Stable quote id scoped by provider
pub(crate) fn quote_id(provider: &str, partner_id: &str) -> String {
	format!("{}-{}", provider, partner_id)
}

/// Round to cents
pub(crate) fn round_money(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}


#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_feature_value_conversion() {
		assert_eq!(feature_value(&json!(true)), Some(FeatureValue::Flag(true)));
		assert_eq!(feature_value(&json!(2.5)), Some(FeatureValue::Number(2.5)));
		assert_eq!(
			feature_value(&json!("10 years")),
			Some(FeatureValue::Text("10 years".to_string()))
		);
		assert_eq!(feature_value(&json!(null)), None);
		assert_eq!(feature_value(&json!([1])), None);
	}

	#[test]
	fn test_expiry_fallback() {
		let now = Utc::now();
		assert_eq!(expiry_or_default(None, now), now + Duration::days(30));
		assert_eq!(expiry_or_default(Some("garbage"), now), now + Duration::days(30));

		let parsed = expiry_or_default(Some("2026-11-30T00:00:00Z"), now);
		assert_eq!(parsed.to_rfc3339(), "2026-11-30T00:00:00+00:00");
	}

	#[test]
	fn test_flag_key() {
		assert_eq!(flag_key("LIVING_BENEFITS"), "living_benefits");
		assert_eq!(flag_key(" Conversion-Option "), "conversion_option");
	}
}
