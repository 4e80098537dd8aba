//! Error types for outbound partner calls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Named transport failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportCode {
	#[serde(rename = "ETIMEDOUT")]
	TimedOut,
	#[serde(rename = "ECONNRESET")]
	ConnectionReset,
	#[serde(rename = "ECONNREFUSED")]
	ConnectionRefused,
}

impl TransportCode {
	pub fn as_str(&self) -> &'static str {
		match self {
			TransportCode::TimedOut => "ETIMEDOUT",
			TransportCode::ConnectionReset => "ECONNRESET",
			TransportCode::ConnectionRefused => "ECONNREFUSED",
		}
	}
}

impl fmt::Display for TransportCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A failure signal a retry policy can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetrySignal {
	/// Numeric HTTP status returned by the partner
	Status(u16),
	/// Named transport error
	Transport(TransportCode),
}

impl fmt::Display for RetrySignal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RetrySignal::Status(status) => write!(f, "HTTP_{}", status),
			RetrySignal::Transport(code) => write!(f, "{}", code),
		}
	}
}

/// Anything the backoff executor can classify
pub trait Retryable {
	/// The signal carried by this failure, if it has one
	fn retry_signal(&self) -> Option<RetrySignal>;
}

/// Failure of a single call attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
	#[error("{code}: {message}")]
	Transport { code: TransportCode, message: String },

	#[error("HTTP {status}: {reason}")]
	Status {
		status: u16,
		reason: String,
		body: Option<String>,
	},

	/// The request could not be put on the wire (e.g. an unencodable header)
	#[error("invalid request: {message}")]
	InvalidRequest { message: String },
}

impl CallError {
	pub fn transport(code: TransportCode, message: impl Into<String>) -> Self {
		Self::Transport {
			code,
			message: message.into(),
		}
	}

	pub fn invalid_request(message: impl Into<String>) -> Self {
		Self::InvalidRequest {
			message: message.into(),
		}
	}

	/// Build a status error with the standard reason phrase
	pub fn from_status(status: u16, body: Option<String>) -> Self {
		let reason = match status {
			400 => "Bad Request".to_string(),
			401 => "Unauthorized".to_string(),
			403 => "Forbidden".to_string(),
			404 => "Not Found".to_string(),
			408 => "Request Timeout".to_string(),
			422 => "Unprocessable Entity".to_string(),
			429 => "Too Many Requests".to_string(),
			500 => "Internal Server Error".to_string(),
			502 => "Bad Gateway".to_string(),
			503 => "Service Unavailable".to_string(),
			504 => "Gateway Timeout".to_string(),
			_ => format!("HTTP Error {}", status),
		};

		Self::Status {
			status,
			reason,
			body,
		}
	}

	pub fn status_code(&self) -> Option<u16> {
		match self {
			CallError::Status { status, .. } => Some(*status),
			CallError::Transport { .. } | CallError::InvalidRequest { .. } => None,
		}
	}
}

impl Retryable for CallError {
	fn retry_signal(&self) -> Option<RetrySignal> {
		match self {
			CallError::Transport { code, .. } => Some(RetrySignal::Transport(*code)),
			CallError::Status { status, .. } => Some(RetrySignal::Status(*status)),
			CallError::InvalidRequest { .. } => None,
		}
	}
}

/// Broad class of a terminal integration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationErrorKind {
	/// Timeout, connection reset or refused
	Transport,
	/// 429 or retryable 5xx returned without exhausting retries
	RateLimitOrServer,
	/// Any other non-2xx status; never retried
	Client,
	/// Every attempt hit a retryable failure
	RetryExhausted,
	/// The partner answered 2xx with a body we could not decode
	InvalidResponse,
	/// Partner disabled or missing credentials; no call was made
	Unavailable,
}

/// Terminal error surfaced to callers of a partner gateway
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("[{partner}] {code}: {message}")]
pub struct IntegrationError {
	pub partner: String,
	pub kind: IntegrationErrorKind,
	pub code: String,
	pub message: String,
	pub retryable: bool,
	pub status: Option<u16>,
	pub attempts: u32,
	pub details: Option<serde_json::Value>,
	pub timestamp: DateTime<Utc>,
}

impl IntegrationError {
	pub fn new(
		partner: impl Into<String>,
		kind: IntegrationErrorKind,
		code: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			partner: partner.into(),
			kind,
			code: code.into(),
			message: message.into(),
			retryable: false,
			status: None,
			attempts: 0,
			details: None,
			timestamp: Utc::now(),
		}
	}

	/// Classify the error left over after the retry loop gave up
	///
	/// `exhausted` is true when every attempt failed with a retryable signal.
	/// The retryable flag is recomputed from the terminal error itself.
	pub fn from_call_error(
		partner: &str,
		error: &CallError,
		attempts: u32,
		exhausted: bool,
		retryable: bool,
	) -> Self {
		let signal = error.retry_signal();
		let code = match (signal, error) {
			(Some(signal), _) => signal.to_string(),
			(None, CallError::InvalidRequest { .. }) => "INVALID_REQUEST".to_string(),
			(None, _) => "UNKNOWN".to_string(),
		};

		let kind = match (exhausted, error) {
			(true, _) => IntegrationErrorKind::RetryExhausted,
			(false, CallError::Transport { .. }) => IntegrationErrorKind::Transport,
			(false, CallError::Status { .. }) if retryable => {
				IntegrationErrorKind::RateLimitOrServer
			},
			(false, CallError::Status { .. }) => IntegrationErrorKind::Client,
			(false, CallError::InvalidRequest { .. }) => IntegrationErrorKind::Client,
		};

		let message = if exhausted {
			format!("gave up after {} attempts: {}", attempts, error)
		} else {
			error.to_string()
		};

		let details = match error {
			CallError::Status {
				body: Some(body), ..
			} => Some(serde_json::Value::String(body.clone())),
			_ => None,
		};

		Self {
			partner: partner.to_string(),
			kind,
			code,
			message,
			retryable,
			status: error.status_code(),
			attempts,
			details,
			timestamp: Utc::now(),
		}
	}

	pub fn invalid_response(partner: &str, reason: impl Into<String>, attempts: u32) -> Self {
		let mut error = Self::new(
			partner,
			IntegrationErrorKind::InvalidResponse,
			"INVALID_RESPONSE",
			reason,
		);
		error.attempts = attempts;
		error
	}

	pub fn unavailable(partner: &str, code: &str, reason: impl Into<String>) -> Self {
		Self::new(partner, IntegrationErrorKind::Unavailable, code, reason)
	}

	pub fn with_details(mut self, details: serde_json::Value) -> Self {
		self.details = Some(details);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_reason_mapping() {
		let error = CallError::from_status(503, None);
		assert_eq!(error.status_code(), Some(503));
		assert!(error.to_string().contains("Service Unavailable"));

		let error = CallError::from_status(418, None);
		assert!(error.to_string().contains("HTTP Error 418"));
	}

	#[test]
	fn test_signal_display() {
		assert_eq!(RetrySignal::Status(429).to_string(), "HTTP_429");
		assert_eq!(
			RetrySignal::Transport(TransportCode::ConnectionReset).to_string(),
			"ECONNRESET"
		);
	}

	#[test]
	fn test_exhausted_classification() {
		let last = CallError::from_status(503, Some("down".to_string()));
		let error = IntegrationError::from_call_error("quote-exchange", &last, 3, true, true);

		assert_eq!(error.kind, IntegrationErrorKind::RetryExhausted);
		assert_eq!(error.code, "HTTP_503");
		assert_eq!(error.status, Some(503));
		assert_eq!(error.attempts, 3);
		assert!(error.retryable);
		assert!(error.message.contains("3 attempts"));
		assert_eq!(error.details, Some(serde_json::json!("down")));
	}

	#[test]
	fn test_client_classification() {
		let last = CallError::from_status(401, None);
		let error = IntegrationError::from_call_error("carrier-direct", &last, 1, false, false);

		assert_eq!(error.kind, IntegrationErrorKind::Client);
		assert!(!error.retryable);
		assert!(error.to_string().starts_with("[carrier-direct] HTTP_401"));
	}

	#[test]
	fn test_invalid_request_is_terminal_client_error() {
		let last = CallError::invalid_request("header 'Authorization' is not a valid value");
		assert_eq!(last.retry_signal(), None);

		let error = IntegrationError::from_call_error("quote-exchange", &last, 1, false, false);
		assert_eq!(error.kind, IntegrationErrorKind::Client);
		assert_eq!(error.code, "INVALID_REQUEST");
		assert_eq!(error.status, None);
	}

	#[test]
	fn test_transport_code_serde() {
		let json = serde_json::to_string(&TransportCode::TimedOut).unwrap();
		assert_eq!(json, "\"ETIMEDOUT\"");
	}
}
