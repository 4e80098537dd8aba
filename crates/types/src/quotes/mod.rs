//! Unified quote domain model
//!
//! Every partner answers in its own shape; providers normalize those shapes
//! into [`UnifiedQuote`] so ranking and presentation never see partner quirks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod errors;
pub mod request;
pub mod response;

pub use errors::QuoteValidationError;
pub use request::{Applicant, Gender, HealthClass, UnifiedQuoteRequest};
pub use response::{AggregationResult, ProviderStatus};

/// Product family used to route a request to applicable providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
	Life,
	Annuity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
	Term,
	WholeLife,
	UniversalLife,
	IndexedUniversalLife,
	FixedAnnuity,
	IndexedAnnuity,
	/// Multi-year guaranteed annuity
	Myga,
}

impl ProductType {
	pub fn family(&self) -> ProductFamily {
		match self {
			ProductType::Term
			| ProductType::WholeLife
			| ProductType::UniversalLife
			| ProductType::IndexedUniversalLife => ProductFamily::Life,
			ProductType::FixedAnnuity | ProductType::IndexedAnnuity | ProductType::Myga => {
				ProductFamily::Annuity
			},
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ProductType::Term => "term",
			ProductType::WholeLife => "whole_life",
			ProductType::UniversalLife => "universal_life",
			ProductType::IndexedUniversalLife => "indexed_universal_life",
			ProductType::FixedAnnuity => "fixed_annuity",
			ProductType::IndexedAnnuity => "indexed_annuity",
			ProductType::Myga => "myga",
		}
	}
}

impl fmt::Display for ProductType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Scalar value of a quote feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
	Flag(bool),
	Number(f64),
	Text(String),
}

impl From<bool> for FeatureValue {
	fn from(value: bool) -> Self {
		FeatureValue::Flag(value)
	}
}

impl From<f64> for FeatureValue {
	fn from(value: f64) -> Self {
		FeatureValue::Number(value)
	}
}

impl From<&str> for FeatureValue {
	fn from(value: &str) -> Self {
		FeatureValue::Text(value.to_string())
	}
}

impl From<String> for FeatureValue {
	fn from(value: String) -> Self {
		FeatureValue::Text(value)
	}
}

/// Financial strength rating of the issuing carrier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierRating {
	pub agency: String,
	pub grade: String,
}

/// Provider-agnostic quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedQuote {
	pub id: String,
	pub provider: String,
	pub carrier_id: String,
	pub carrier_name: String,
	pub product_id: String,
	pub product_name: String,
	pub product_type: ProductType,
	pub monthly_premium: Option<f64>,
	pub annual_premium: Option<f64>,
	/// Credited/guaranteed rate in percent, for annuity-style quotes
	pub rate: Option<f64>,
	pub face_amount: Option<f64>,
	/// Term or guarantee period in years
	pub term: Option<u32>,
	pub carrier_rating: Option<CarrierRating>,
	pub features: BTreeMap<String, FeatureValue>,
	pub quote_date: DateTime<Utc>,
	pub expiration_date: DateTime<Utc>,
	pub application_url: Option<String>,
}

impl UnifiedQuote {
	/// True for quotes ranked by rate rather than premium
	pub fn is_rate_quote(&self) -> bool {
		self.product_type.family() == ProductFamily::Annuity && self.rate.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_product_family() {
		assert_eq!(ProductType::Term.family(), ProductFamily::Life);
		assert_eq!(ProductType::IndexedUniversalLife.family(), ProductFamily::Life);
		assert_eq!(ProductType::Myga.family(), ProductFamily::Annuity);
	}

	#[test]
	fn test_feature_value_serialization() {
		let mut features = BTreeMap::new();
		features.insert("convertible".to_string(), FeatureValue::from(true));
		features.insert("free_withdrawal_pct".to_string(), FeatureValue::from(10.0));
		features.insert("riders".to_string(), FeatureValue::from("waiver,child"));

		let json = serde_json::to_value(&features).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"convertible": true,
				"free_withdrawal_pct": 10.0,
				"riders": "waiver,child"
			})
		);
	}

	#[test]
	fn test_product_type_serde() {
		let json = serde_json::to_string(&ProductType::WholeLife).unwrap();
		assert_eq!(json, "\"whole_life\"");
		assert_eq!(ProductType::WholeLife.to_string(), "whole_life");
	}
}
