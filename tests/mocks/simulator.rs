//! Canned offline quote source

#![allow(dead_code)]

use std::collections::HashMap;

use agency_gateway::{QuoteContext, QuoteSimulator};
use serde_json::{json, Value};

/// Returns a fixed provider-shaped payload per provider name
#[derive(Debug, Clone, Default)]
pub struct StaticSimulator {
	payloads: HashMap<String, Value>,
}

impl StaticSimulator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_payload(mut self, provider: &str, payload: Value) -> Self {
		self.payloads.insert(provider.to_string(), payload);
		self
	}

	/// One canned payload for each built-in partner
	pub fn all_partners() -> Self {
		Self::new()
			.with_payload("quote-exchange", quote_exchange_payload(&[("QX-1", "ACME", 42.0)]))
			.with_payload("carrier-direct", carrier_direct_payload(&[("CD-1", 31.5)]))
			.with_payload("annuity-hub", annuity_hub_payload(&[("AH-1", 4.85)]))
	}
}

impl QuoteSimulator for StaticSimulator {
	fn simulate(&self, provider: &str, _context: &QuoteContext) -> Option<Value> {
		self.payloads.get(provider).cloned()
	}
}

/// Quote Exchange body with `(quote id, carrier code, monthly premium)` rows
pub fn quote_exchange_payload(rows: &[(&str, &str, f64)]) -> Value {
	let quotes: Vec<Value> = rows
		.iter()
		.map(|(id, carrier, monthly)| {
			json!({
				"quoteId": id,
				"carrierCode": carrier,
				"carrierName": format!("{} Life", carrier),
				"productCode": "TERM20",
				"productName": "Term 20",
				"termYears": 20,
				"faceAmount": 500000.0,
				"monthlyPremium": monthly,
				"rating": { "grade": "A+" },
				"features": { "conversion": true },
				"applyUrl": format!("https://apply.example.com/{}", id)
			})
		})
		.collect();
	json!({ "quotes": quotes })
}

/// Carrier Direct body with `(offer id, monthly premium)` rows
pub fn carrier_direct_payload(rows: &[(&str, f64)]) -> Value {
	let offers: Vec<Value> = rows
		.iter()
		.map(|(id, monthly)| {
			json!({
				"offerId": id,
				"planCode": "DT20",
				"planName": "Direct Term 20",
				"premium": { "monthly": monthly },
				"levelPeriod": 20,
				"faceAmount": 500000.0,
				"flags": ["ACCELERATED_UW"]
			})
		})
		.collect();
	json!({
		"carrier": { "id": "CDL", "name": "Carrier Direct Life", "amBestRating": "A" },
		"offers": offers
	})
}

/// Annuity Hub body with `(rate id, guaranteed rate)` rows
pub fn annuity_hub_payload(rows: &[(&str, f64)]) -> Value {
	let rates: Vec<Value> = rows
		.iter()
		.map(|(id, rate)| {
			json!({
				"rateId": id,
				"issuer": { "code": "SEC", "name": "Secure Annuity Co" },
				"product": { "code": "MYGA5", "name": "Secure 5", "class": "MYGA" },
				"guaranteedRate": rate,
				"guaranteePeriodYears": 5,
				"surrenderYears": 5
			})
		})
		.collect();
	json!({ "rates": rates })
}
