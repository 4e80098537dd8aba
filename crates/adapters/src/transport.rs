//! HTTP transport seam used by partner gateways

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use gateway_types::{CallError, TransportCode};
use reqwest::{
	header::{HeaderMap, HeaderName, HeaderValue},
	Client,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
	Get,
	Post,
	Put,
	Delete,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
		}
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A fully resolved request for one attempt
#[derive(Clone, PartialEq)]
pub struct OutboundRequest {
	pub method: HttpMethod,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<serde_json::Value>,
	pub timeout: Duration,
}

impl OutboundRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Encode the headers for the wire; values are left out of the error
	pub fn header_map(&self) -> Result<HeaderMap, CallError> {
		let mut headers = HeaderMap::new();
		for (key, value) in &self.headers {
			let name = HeaderName::from_bytes(key.as_bytes())
				.map_err(|_| CallError::invalid_request(format!("invalid header name '{}'", key)))?;
			let value = HeaderValue::from_str(value).map_err(|_| {
				CallError::invalid_request(format!("header '{}' has an invalid value", key))
			})?;
			headers.insert(name, value);
		}
		Ok(headers)
	}
}

// Header values carry credentials; only names are printed
impl fmt::Debug for OutboundRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
		f.debug_struct("OutboundRequest")
			.field("method", &self.method)
			.field("url", &self.url)
			.field("headers", &header_names)
			.field("has_body", &self.body.is_some())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw partner answer; any status is returned as-is
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
	pub status: u16,
	pub body: String,
}

impl TransportResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
	/// Send one request; only connection-level failures are errors
	async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, CallError>;
}

/// reqwest-backed transport with a pooled client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub fn new() -> Result<Self, reqwest::Error> {
		let mut headers = HeaderMap::new();
		headers.insert("Content-Type", HeaderValue::from_static("application/json"));
		headers.insert("Accept", HeaderValue::from_static("application/json"));
		headers.insert("User-Agent", HeaderValue::from_static("Agency-Gateway/1.0"));

		let client = Client::builder()
			.default_headers(headers)
			.pool_max_idle_per_host(10)
			.pool_idle_timeout(Duration::from_secs(90))
			.build()?;

		Ok(Self { client })
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

fn classify_reqwest_error(error: &reqwest::Error) -> CallError {
	let code = if error.is_timeout() {
		TransportCode::TimedOut
	} else if error.is_connect() {
		TransportCode::ConnectionRefused
	} else {
		TransportCode::ConnectionReset
	};
	CallError::transport(code, error.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, CallError> {
		let method = match request.method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Delete => reqwest::Method::DELETE,
		};

		let headers = request.header_map()?;

		let mut builder = self
			.client
			.request(method, &request.url)
			.headers(headers)
			.timeout(request.timeout);
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| classify_reqwest_error(&e))?;
		let status = response.status().as_u16();
		let body = response
			.text()
			.await
			.map_err(|e| classify_reqwest_error(&e))?;

		debug!(
			"{} {} answered {} with {} bytes",
			request.method,
			request.url,
			status,
			body.len()
		);

		Ok(TransportResponse { status, body })
	}
}
