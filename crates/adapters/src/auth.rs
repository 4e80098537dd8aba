//! Partner authentication schemes

use base64::prelude::*;
use gateway_types::PartnerCredentials;

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const API_SECRET_HEADER: &str = "X-Api-Secret";

/// How a partner expects its credentials on each request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthScheme {
	/// `Authorization: Bearer <api_key>`
	#[default]
	Bearer,
	/// Key and optional secret in dedicated headers
	ApiKeyHeaders {
		key_header: String,
		secret_header: String,
	},
	/// `Authorization: Basic base64(api_key:api_secret)`
	Basic,
}

impl AuthScheme {
	pub fn api_key_headers() -> Self {
		Self::ApiKeyHeaders {
			key_header: API_KEY_HEADER.to_string(),
			secret_header: API_SECRET_HEADER.to_string(),
		}
	}

	/// Headers to attach for the given credentials
	pub fn headers(&self, credentials: &PartnerCredentials) -> Vec<(String, String)> {
		let key = credentials.api_key.expose_secret();
		match self {
			AuthScheme::Bearer => vec![("Authorization".to_string(), format!("Bearer {}", key))],
			AuthScheme::ApiKeyHeaders {
				key_header,
				secret_header,
			} => {
				let mut headers = vec![(key_header.clone(), key.to_string())];
				if let Some(secret) = &credentials.api_secret {
					headers.push((secret_header.clone(), secret.expose_secret().to_string()));
				}
				headers
			},
			AuthScheme::Basic => {
				let secret = credentials
					.api_secret
					.as_ref()
					.map(|s| s.expose_secret())
					.unwrap_or_default();
				let encoded = BASE64_STANDARD.encode(format!("{}:{}", key, secret));
				vec![("Authorization".to_string(), format!("Basic {}", encoded))]
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_bearer_is_default() {
		let credentials = PartnerCredentials::new("key-123");
		let headers = AuthScheme::default().headers(&credentials);
		assert_eq!(
			headers,
			vec![("Authorization".to_string(), "Bearer key-123".to_string())]
		);
	}

	#[test]
	fn test_api_key_headers_skip_missing_secret() {
		let scheme = AuthScheme::api_key_headers();

		let headers = scheme.headers(&PartnerCredentials::new("key-123"));
		assert_eq!(headers.len(), 1);
		assert_eq!(headers[0].0, "X-Api-Key");

		let headers = scheme.headers(&PartnerCredentials::new("key-123").with_secret("s3cret"));
		assert_eq!(headers.len(), 2);
		assert_eq!(
			headers[1],
			("X-Api-Secret".to_string(), "s3cret".to_string())
		);
	}

	#[test]
	fn test_basic_encodes_key_and_secret() {
		let credentials = PartnerCredentials::new("agent").with_secret("hunter2");
		let headers = AuthScheme::Basic.headers(&credentials);
		// base64("agent:hunter2")
		assert_eq!(headers[0].1, "Basic YWdlbnQ6aHVudGVyMg==");
	}
}
