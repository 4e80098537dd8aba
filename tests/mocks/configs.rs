//! Settings and request builders for tests

#![allow(dead_code)]

use agency_gateway::chrono::NaiveDate;
use agency_gateway::config::{ConfigurableValue, PartnerSettings, RetrySettings};
use agency_gateway::{Applicant, Gender, HealthClass, ProductType, Settings, UnifiedQuoteRequest};

/// Configuration builders for tests
pub struct MockConfigs;

impl MockConfigs {
	/// Fast retries so live-path tests finish quickly
	pub fn fast_retry(max_attempts: u32) -> RetrySettings {
		RetrySettings {
			max_attempts,
			initial_delay_ms: 10,
			max_delay_ms: 50,
			backoff_multiplier: 2.0,
		}
	}

	/// A live partner with inline credentials
	pub fn live_partner(base_url: &str, max_attempts: u32) -> PartnerSettings {
		let mut partner = PartnerSettings::new(base_url);
		partner.api_key = Some(ConfigurableValue::from_plain("test-api-key"));
		partner.api_secret = Some(ConfigurableValue::from_plain("test-api-secret"));
		partner.timeout_ms = 2_000;
		partner.retry = Self::fast_retry(max_attempts);
		partner
	}

	/// A configured partner that is switched off
	pub fn disabled_partner(base_url: &str) -> PartnerSettings {
		let mut partner = Self::live_partner(base_url, 3);
		partner.enabled = false;
		partner
	}

	/// A partner whose key points at an unset environment variable
	pub fn unresolved_partner(base_url: &str) -> PartnerSettings {
		let mut partner = PartnerSettings::new(base_url);
		partner.api_key = Some(ConfigurableValue::from_env(
			"AGENCY_GATEWAY_TEST_KEY_THAT_IS_NEVER_SET",
		));
		partner
	}

	/// Settings with all three partners live against `base_url`
	pub fn all_live(base_url: &str, max_attempts: u32) -> Settings {
		let mut settings = Settings::default();
		for id in ["quote-exchange", "carrier-direct", "annuity-hub"] {
			settings
				.partners
				.insert(id.to_string(), Self::live_partner(base_url, max_attempts));
		}
		settings
	}
}

pub fn term_request() -> UnifiedQuoteRequest {
	UnifiedQuoteRequest {
		request_id: Some("req-e2e".to_string()),
		product_type: ProductType::Term,
		applicant: Applicant {
			date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15).unwrap(),
			gender: Gender::Female,
			state: "TX".to_string(),
			tobacco_use: false,
			health_class: Some(HealthClass::PreferredPlus),
		},
		face_amount: Some(500_000.0),
		term_years: Some(20),
		premium_amount: None,
		carrier_ids: None,
		max_premium: None,
		user_id: Some("agent-7".to_string()),
	}
}

pub fn myga_request() -> UnifiedQuoteRequest {
	UnifiedQuoteRequest {
		product_type: ProductType::Myga,
		face_amount: None,
		term_years: Some(5),
		premium_amount: Some(100_000.0),
		..term_request()
	}
}
