//! Audit trail of outbound partner calls

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// One completed or failed outbound call
///
/// Request and response payloads are already redacted when the record is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
	pub partner_name: String,
	pub endpoint: String,
	pub method: String,
	pub sanitized_request: serde_json::Value,
	pub sanitized_response: Option<serde_json::Value>,
	pub error: Option<String>,
	pub duration_ms: u64,
	pub timestamp: DateTime<Utc>,
	pub user_id: Option<String>,
}

impl AuditRecord {
	pub fn is_failure(&self) -> bool {
		self.error.is_some()
	}
}

/// Fire-and-forget recorder used on the call path
///
/// Implementations must return promptly and must never panic or surface
/// their own failures to the caller.
pub trait Auditor: Send + Sync + Debug {
	fn record(&self, entry: AuditRecord);
}

/// Failure of an audit sink; handled inside the auditor
#[derive(Error, Debug)]
pub enum AuditSinkError {
	#[error("audit sink unavailable: {0}")]
	Unavailable(String),

	#[error("failed to serialize audit record: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Destination of audit records (log stream, durable store, ...)
#[async_trait]
pub trait AuditSink: Send + Sync + Debug {
	async fn write(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}
