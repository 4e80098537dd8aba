//! SSO handoff request and result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Partner platform product the agent is being handed off to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FederationProduct {
	LifeApplication,
	AnnuityApplication,
	Illustration,
}

impl fmt::Display for FederationProduct {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let value = match self {
			FederationProduct::LifeApplication => "life_application",
			FederationProduct::AnnuityApplication => "annuity_application",
			FederationProduct::Illustration => "illustration",
		};
		f.write_str(value)
	}
}

impl FromStr for FederationProduct {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"life_application" => Ok(FederationProduct::LifeApplication),
			"annuity_application" => Ok(FederationProduct::AnnuityApplication),
			"illustration" => Ok(FederationProduct::Illustration),
			other => Err(format!("unknown federation product '{}'", other)),
		}
	}
}

/// Partner environment an assertion targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FederationEnvironment {
	Staging,
	Production,
}

impl fmt::Display for FederationEnvironment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FederationEnvironment::Staging => f.write_str("staging"),
			FederationEnvironment::Production => f.write_str("production"),
		}
	}
}

/// Optional agent profile fields forwarded to the partner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub address_line1: Option<String>,
	pub address_line2: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub postal_code: Option<String>,
}

impl ProfileFields {
	/// Fields in the order the receiving platform expects them
	pub fn ordered(&self) -> [(&'static str, Option<&str>); 9] {
		[
			("FirstName", self.first_name.as_deref()),
			("LastName", self.last_name.as_deref()),
			("Email", self.email.as_deref()),
			("Phone", self.phone.as_deref()),
			("AddressLine1", self.address_line1.as_deref()),
			("AddressLine2", self.address_line2.as_deref()),
			("City", self.city.as_deref()),
			("State", self.state.as_deref()),
			("PostalCode", self.postal_code.as_deref()),
		]
	}
}

impl FromStr for FederationEnvironment {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"staging" => Ok(FederationEnvironment::Staging),
			"production" => Ok(FederationEnvironment::Production),
			other => Err(format!("unknown federation environment '{}'", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoAssertionRequest {
	pub user_id: String,
	pub product: FederationProduct,
	#[serde(default)]
	pub profile: ProfileFields,
}

/// Signed, base64-encoded SAML response ready to be form-posted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAssertion {
	pub base64_document: String,
	pub relay_state: String,
	pub destination_url: String,
}
