use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of probing a partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
	pub healthy: bool,
	pub message: String,
	pub last_checked: DateTime<Utc>,
	/// Absent when no probe was sent
	pub response_time_ms: Option<u64>,
}

impl HealthCheckResult {
	pub fn healthy(message: impl Into<String>, response_time_ms: u64) -> Self {
		Self {
			healthy: true,
			message: message.into(),
			last_checked: Utc::now(),
			response_time_ms: Some(response_time_ms),
		}
	}

	pub fn unhealthy(message: impl Into<String>, response_time_ms: Option<u64>) -> Self {
		Self {
			healthy: false,
			message: message.into(),
			last_checked: Utc::now(),
			response_time_ms,
		}
	}
}
