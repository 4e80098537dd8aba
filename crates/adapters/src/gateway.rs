//! Partner gateway
//!
//! One gateway per partner. It owns the partner's resolved configuration,
//! injects authentication, bounds every attempt with the partner timeout,
//! runs attempts through the backoff executor and mirrors every call to the
//! auditor. Failures leave as a single [`IntegrationError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway_types::{
	AuditRecord, Auditor, CallError, HealthCheckResult, IntegrationError, PartnerConfig,
	PartnerCredentials, PartnerMode, RetryPolicy, Retryable, TransportCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::audit::{sanitize, start_timer};
use crate::auth::AuthScheme;
use crate::retry::run_with_retry_counted;
use crate::transport::{HttpMethod, OutboundRequest, Transport, TransportResponse};

/// Per-call options for [`PartnerGateway::request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
	pub method: HttpMethod,
	pub query: Vec<(String, String)>,
	pub body: Option<Value>,
	pub headers: Vec<(String, String)>,
	/// End user on whose behalf the call is made, for the audit trail
	pub user_id: Option<String>,
}

impl Default for RequestOptions {
	fn default() -> Self {
		Self::get()
	}
}

impl RequestOptions {
	pub fn get() -> Self {
		Self {
			method: HttpMethod::Get,
			query: Vec::new(),
			body: None,
			headers: Vec::new(),
			user_id: None,
		}
	}

	pub fn post(body: Value) -> Self {
		Self {
			method: HttpMethod::Post,
			body: Some(body),
			..Self::get()
		}
	}

	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));
		self
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn for_user(mut self, user_id: Option<String>) -> Self {
		self.user_id = user_id;
		self
	}
}

#[derive(Debug, Clone)]
pub struct PartnerGateway {
	config: PartnerConfig,
	auth: AuthScheme,
	policy: RetryPolicy,
	transport: Arc<dyn Transport>,
	auditor: Arc<dyn Auditor>,
}

impl PartnerGateway {
	pub fn new(
		config: PartnerConfig,
		transport: Arc<dyn Transport>,
		auditor: Arc<dyn Auditor>,
	) -> Self {
		let policy = config.retry_policy();
		Self {
			config,
			auth: AuthScheme::default(),
			policy,
			transport,
			auditor,
		}
	}

	pub fn with_auth(mut self, auth: AuthScheme) -> Self {
		self.auth = auth;
		self
	}

	pub fn partner_id(&self) -> &str {
		&self.config.partner_id
	}

	pub fn config(&self) -> &PartnerConfig {
		&self.config
	}

	pub fn auth(&self) -> &AuthScheme {
		&self.auth
	}

	pub fn mode(&self) -> PartnerMode {
		self.config.mode()
	}

	/// True when calls will actually reach the partner
	pub fn is_live(&self) -> bool {
		self.mode() == PartnerMode::Live
	}

	/// Join the base URL and an endpoint, treating the base as a directory
	pub fn build_url(&self, endpoint: &str, query: &[(String, String)]) -> Result<String, IntegrationError> {
		let partner = self.partner_id();
		let mut base = Url::parse(&self.config.base_url).map_err(|e| {
			IntegrationError::unavailable(
				partner,
				"INVALID_URL",
				format!("invalid base URL '{}': {}", self.config.base_url, e),
			)
		})?;

		if !base.path().ends_with('/') {
			base.set_path(&format!("{}/", base.path()));
		}

		let mut joined = base
			.join(endpoint.trim_start_matches('/'))
			.map_err(|e| {
				IntegrationError::unavailable(
					partner,
					"INVALID_URL",
					format!("failed to join '{}' to '{}': {}", endpoint, self.config.base_url, e),
				)
			})?;

		if !query.is_empty() {
			joined
				.query_pairs_mut()
				.extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(joined.to_string())
	}

	fn live_credentials(&self) -> Result<&PartnerCredentials, IntegrationError> {
		let partner = self.partner_id();
		match (self.mode(), &self.config.credentials) {
			(PartnerMode::Live, Some(credentials)) => Ok(credentials),
			(PartnerMode::Disabled, _) => Err(IntegrationError::unavailable(
				partner,
				"PARTNER_DISABLED",
				"partner integration is disabled",
			)),
			_ => Err(IntegrationError::unavailable(
				partner,
				"MISSING_CREDENTIALS",
				"partner credentials are not configured",
			)),
		}
	}

	/// One attempt, bounded by the partner timeout
	async fn send_once(&self, request: OutboundRequest) -> Result<TransportResponse, CallError> {
		request.header_map()?;

		let timeout = self.config.timeout;
		let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
			Ok(result) => result?,
			Err(_) => {
				return Err(CallError::transport(
					TransportCode::TimedOut,
					format!("no response within {}ms", timeout.as_millis()),
				))
			},
		};

		if response.is_success() {
			Ok(response)
		} else {
			let body = Some(response.body).filter(|b| !b.trim().is_empty());
			Err(CallError::from_status(response.status, body))
		}
	}

	/// Call `endpoint` and decode the JSON answer into `T`
	///
	/// An empty 2xx body decodes as JSON `null`.
	pub async fn request<T: DeserializeOwned>(
		&self,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<T, IntegrationError> {
		let partner = self.partner_id();
		let credentials = self.live_credentials()?;
		let url = self.build_url(endpoint, &options.query)?;

		let stopwatch = start_timer();
		let query: BTreeMap<&str, &str> = options
			.query
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_str()))
			.collect();
		// Query values are only recorded through the sanitized map
		let audited_url = url.split_once('?').map_or(url.as_str(), |(path, _)| path);
		let request_summary = sanitize(&json!({
			"method": options.method.as_str(),
			"url": audited_url,
			"query": query,
			"body": options.body,
		}));

		let mut headers = self.auth.headers(credentials);
		headers.extend(options.headers.iter().cloned());
		let outbound = OutboundRequest {
			method: options.method,
			url: url.clone(),
			headers,
			body: options.body.clone(),
			timeout: self.config.timeout,
		};

		debug!(partner, method = %options.method, endpoint, "calling partner");

		let outcome = run_with_retry_counted(&self.policy, || self.send_once(outbound.clone())).await;
		let attempts = outcome.attempts;

		let result = match outcome.result {
			Ok(response) => match decode_body(&response.body) {
				Ok(value) => match serde_json::from_value::<T>(value.clone()) {
					Ok(decoded) => Ok((decoded, value)),
					Err(e) => Err(IntegrationError::invalid_response(
						partner,
						format!("unexpected response shape: {}", e),
						attempts,
					)),
				},
				Err(e) => Err(IntegrationError::invalid_response(
					partner,
					format!("response is not valid JSON: {}", e),
					attempts,
				)),
			},
			Err(retry_error) => {
				let exhausted = retry_error.is_exhausted();
				let last_error = retry_error.last_error();
				let retryable = self.policy.is_retryable(last_error.retry_signal());
				Err(IntegrationError::from_call_error(
					partner, last_error, attempts, exhausted, retryable,
				))
			},
		};

		let duration_ms = stopwatch.stop();
		match result {
			Ok((decoded, raw)) => {
				self.audit(
					endpoint,
					options.method,
					request_summary,
					Some(sanitize(&raw)),
					None,
					duration_ms,
					options.user_id,
				);
				debug!(partner, endpoint, attempts, duration_ms, "partner call succeeded");
				Ok(decoded)
			},
			Err(error) => {
				self.audit(
					endpoint,
					options.method,
					request_summary,
					None,
					Some(error.to_string()),
					duration_ms,
					options.user_id,
				);
				warn!(
					partner,
					endpoint,
					attempts,
					code = %error.code,
					"partner call failed"
				);
				Err(error)
			},
		}
	}

	/// Probe the partner's health endpoint with a single attempt
	pub async fn health_check(&self) -> HealthCheckResult {
		let credentials = match self.mode() {
			PartnerMode::Disabled => return HealthCheckResult::unhealthy("partner disabled", None),
			PartnerMode::MissingCredentials => {
				return HealthCheckResult::unhealthy("missing credentials", None)
			},
			PartnerMode::Live => match self.live_credentials() {
				Ok(credentials) => credentials,
				Err(error) => return HealthCheckResult::unhealthy(error.message, None),
			},
		};

		let stopwatch = start_timer();
		let endpoint = self.config.health_endpoint.as_str();
		let url = match self.build_url(endpoint, &[]) {
			Ok(url) => url,
			Err(error) => return HealthCheckResult::unhealthy(error.message, Some(stopwatch.stop())),
		};

		let request = OutboundRequest {
			method: HttpMethod::Get,
			url: url.clone(),
			headers: self.auth.headers(credentials),
			body: None,
			timeout: self.config.timeout,
		};
		let result = self.send_once(request).await;
		let elapsed = stopwatch.stop();
		let request_summary = json!({ "method": "GET", "url": url });

		match result {
			Ok(_) => {
				self.audit(endpoint, HttpMethod::Get, request_summary, None, None, elapsed, None);
				info!(partner = self.partner_id(), elapsed_ms = elapsed, "partner healthy");
				HealthCheckResult::healthy(format!("{} is reachable", self.partner_id()), elapsed)
			},
			Err(error) => {
				let message = error.to_string();
				self.audit(
					endpoint,
					HttpMethod::Get,
					request_summary,
					None,
					Some(message.clone()),
					elapsed,
					None,
				);
				warn!(partner = self.partner_id(), error = %message, "partner health check failed");
				HealthCheckResult::unhealthy(message, Some(elapsed))
			},
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn audit(
		&self,
		endpoint: &str,
		method: HttpMethod,
		sanitized_request: Value,
		sanitized_response: Option<Value>,
		error: Option<String>,
		duration_ms: u64,
		user_id: Option<String>,
	) {
		self.auditor.record(AuditRecord {
			partner_name: self.config.partner_id.clone(),
			endpoint: endpoint.to_string(),
			method: method.to_string(),
			sanitized_request,
			sanitized_response,
			error,
			duration_ms,
			timestamp: chrono::Utc::now(),
			user_id,
		});
	}
}

fn decode_body(body: &str) -> Result<Value, serde_json::Error> {
	if body.trim().is_empty() {
		return Ok(Value::Null);
	}
	serde_json::from_str(body)
}
