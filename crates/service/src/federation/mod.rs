//! SAML 2.0 assertion signing for single sign-on handoff
//!
//! Produces a `samlp:Response` wrapping one `saml:Assertion` signed with
//! RSA-SHA256 over exclusive-canonical XML, base64-encoded for an HTTP-POST
//! binding, together with the relay state and destination for the product.

pub mod assertion;
pub mod xml;

use std::collections::HashMap;
use std::fmt;

use base64::prelude::*;
use chrono::{DateTime, Utc};
use gateway_types::{
	FederationEnvironment, FederationProduct, SecretString, SignedAssertion, SsoAssertionRequest,
};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use assertion::{
	build_assertion, build_response, build_signature, build_signed_info, profile_blob,
	AssertionParams,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FederationError {
	#[error("Federation configuration error: {0}")]
	Configuration(String),

	#[error("XML construction failed: {0}")]
	Xml(String),

	#[error("Signing failed: {0}")]
	Signing(String),
}

/// PEM-encoded signing material
#[derive(Debug, Clone)]
pub struct SigningConfig {
	/// PKCS#8 or PKCS#1 RSA private key
	pub private_key_pem: SecretString,
	pub certificate_pem: String,
}

/// Where assertions for one environment are posted
#[derive(Debug, Clone, Default)]
pub struct FederationTarget {
	pub destination_url: String,
	pub relay_states: HashMap<FederationProduct, String>,
}

#[derive(Debug, Clone)]
pub struct FederationConfig {
	/// Our entity id
	pub issuer: String,
	/// The partner's entity id
	pub audience: String,
	pub environment: FederationEnvironment,
	pub company_id: String,
	pub channel_id: String,
	pub group_id: String,
	pub signing: Option<SigningConfig>,
	pub targets: HashMap<FederationEnvironment, FederationTarget>,
}

struct SigningCredentials {
	key: SigningKey<Sha256>,
	certificate_b64: String,
}

impl fmt::Debug for SigningCredentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningCredentials")
			.field("key", &"[REDACTED]")
			.field("certificate_len", &self.certificate_b64.len())
			.finish()
	}
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, FederationError> {
	RsaPrivateKey::from_pkcs8_pem(pem)
		.or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
		.map_err(|e| FederationError::Configuration(format!("invalid private key PEM: {}", e)))
}

/// Strip the PEM armor and whitespace, keeping the base64 DER body
fn certificate_body(pem: &str) -> Result<String, FederationError> {
	let body: String = pem
		.lines()
		.map(str::trim)
		.filter(|line| !line.starts_with("-----"))
		.collect();

	if body.is_empty() {
		return Err(FederationError::Configuration(
			"certificate PEM has no content".to_string(),
		));
	}
	BASE64_STANDARD.decode(&body).map_err(|e| {
		FederationError::Configuration(format!("certificate PEM is not valid base64: {}", e))
	})?;
	Ok(body)
}

impl SigningCredentials {
	fn from_config(signing: &SigningConfig) -> Result<Option<Self>, FederationError> {
		let key_pem = signing.private_key_pem.expose_secret();
		if key_pem.trim().is_empty() || signing.certificate_pem.trim().is_empty() {
			return Ok(None);
		}

		let key = parse_private_key(key_pem)?;
		Ok(Some(Self {
			key: SigningKey::<Sha256>::new(key),
			certificate_b64: certificate_body(&signing.certificate_pem)?,
		}))
	}
}

#[derive(Debug)]
pub struct FederationSigner {
	config: FederationConfig,
	credentials: Option<SigningCredentials>,
}

impl FederationSigner {
	/// Parse signing material up front; bad PEM fails here
	pub fn new(config: FederationConfig) -> Result<Self, FederationError> {
		let credentials = match &config.signing {
			Some(signing) => SigningCredentials::from_config(signing)?,
			None => None,
		};

		if credentials.is_none() {
			info!("federation signer has no signing key; assertions are disabled");
		}

		Ok(Self {
			config,
			credentials,
		})
	}

	pub fn is_configured(&self) -> bool {
		self.credentials.is_some()
	}

	pub fn config(&self) -> &FederationConfig {
		&self.config
	}

	pub fn generate_assertion(
		&self,
		request: &SsoAssertionRequest,
	) -> Result<SignedAssertion, FederationError> {
		self.generate_assertion_at(request, Utc::now())
	}

	/// Relay state and destination for a product in the active environment
	pub fn resolve_target(
		&self,
		product: FederationProduct,
	) -> Result<(String, String), FederationError> {
		let environment = self.config.environment;
		let target = self.config.targets.get(&environment).ok_or_else(|| {
			FederationError::Configuration(format!(
				"no federation target for environment '{}'",
				environment
			))
		})?;
		let relay_state = target.relay_states.get(&product).ok_or_else(|| {
			FederationError::Configuration(format!(
				"no relay state for product '{}' in '{}'",
				product, environment
			))
		})?;
		Ok((relay_state.clone(), target.destination_url.clone()))
	}

	/// Build and sign an assertion issued at `now`
	pub fn generate_assertion_at(
		&self,
		request: &SsoAssertionRequest,
		now: DateTime<Utc>,
	) -> Result<SignedAssertion, FederationError> {
		let credentials = self.credentials.as_ref().ok_or_else(|| {
			FederationError::Configuration(
				"signing key and certificate are not configured".to_string(),
			)
		})?;
		let (relay_state, destination_url) = self.resolve_target(request.product)?;

		let response_id = format!("_{}", Uuid::new_v4());
		let assertion_id = format!("_{}", Uuid::new_v4());

		let attributes = vec![
			("CompanyIdentifier", self.config.company_id.clone()),
			("ChannelIdentifier", self.config.channel_id.clone()),
			("Action", "CREATE".to_string()),
			("GroupIdentifier", self.config.group_id.clone()),
			("ProfileData", profile_blob(&request.profile)?),
		];
		debug!(assertion_id = %assertion_id, attributes = attributes.len(), "attributes built");

		let mut assertion = build_assertion(&AssertionParams {
			assertion_id: &assertion_id,
			issuer: &self.config.issuer,
			audience: &self.config.audience,
			recipient: &destination_url,
			user_id: &request.user_id,
			now,
			attributes: &attributes,
		});

		let canonical_assertion = assertion.to_canonical_string()?;
		let digest = BASE64_STANDARD.encode(Sha256::digest(canonical_assertion.as_bytes()));
		debug!(assertion_id = %assertion_id, "assertion digest computed");

		let signed_info = build_signed_info(&assertion_id, &digest);
		let canonical_signed_info = signed_info.to_canonical_string()?;
		let signature = credentials
			.key
			.try_sign(canonical_signed_info.as_bytes())
			.map_err(|e| FederationError::Signing(e.to_string()))?;
		let signature_b64 = BASE64_STANDARD.encode(signature.to_bytes());

		assertion.insert_after(
			"saml:Issuer",
			build_signature(signed_info, &signature_b64, &credentials.certificate_b64),
		)?;

		let response = build_response(
			&response_id,
			&self.config.issuer,
			&destination_url,
			now,
			assertion,
		);
		let document = response.to_canonical_string()?;

		info!(
			product = %request.product,
			environment = %self.config.environment,
			"signed SSO assertion generated"
		);

		Ok(SignedAssertion {
			base64_document: BASE64_STANDARD.encode(document.as_bytes()),
			relay_state,
			destination_url,
		})
	}
}
