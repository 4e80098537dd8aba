//! Redacting auditor for outbound partner calls
//!
//! Records are pushed onto a bounded queue and written to an [`AuditSink`] by a
//! background worker, so audit latency and audit failures never reach the
//! caller that made the partner call.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use gateway_types::{AuditRecord, AuditSink, AuditSinkError, Auditor};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Replacement value for sensitive fields
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Lowercase key fragments whose values are always masked
pub const SENSITIVE_KEY_TERMS: &[&str] = &[
	"password",
	"apikey",
	"api_key",
	"apisecret",
	"api_secret",
	"token",
	"accesstoken",
	"access_token",
	"refreshtoken",
	"refresh_token",
	"ssn",
	"socialsecuritynumber",
	"creditcard",
	"credit_card",
	"cvv",
	"pin",
];

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

fn is_sensitive_key(key: &str) -> bool {
	let key = key.to_lowercase();
	SENSITIVE_KEY_TERMS.iter().any(|term| key.contains(term))
}

/// Deep copy of `value` with every sensitive object field masked
pub fn sanitize(value: &Value) -> Value {
	match value {
		Value::Object(map) => {
			let sanitized: Map<String, Value> = map
				.iter()
				.map(|(key, inner)| {
					let inner = if is_sensitive_key(key) {
						Value::String(REDACTION_MARKER.to_string())
					} else {
						sanitize(inner)
					};
					(key.clone(), inner)
				})
				.collect();
			Value::Object(sanitized)
		},
		Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
		primitive => primitive.clone(),
	}
}

/// Monotonic stopwatch for call durations
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
	started: Instant,
}

impl Stopwatch {
	/// Milliseconds elapsed since [`start_timer`]
	pub fn stop(&self) -> u64 {
		self.started.elapsed().as_millis() as u64
	}
}

pub fn start_timer() -> Stopwatch {
	Stopwatch {
		started: Instant::now(),
	}
}

#[derive(Debug)]
enum AuditCommand {
	Write(AuditRecord),
	/// Acknowledged once everything queued before it has been written
	Flush(oneshot::Sender<()>),
}

/// Queue-backed auditor
#[derive(Debug)]
pub struct RedactingAuditor {
	sender: mpsc::Sender<AuditCommand>,
}

impl RedactingAuditor {
	/// Spawn the writer task; must be called inside a Tokio runtime
	pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
		let (sender, mut receiver) = mpsc::channel::<AuditCommand>(capacity.max(1));

		tokio::spawn(async move {
			while let Some(command) = receiver.recv().await {
				match command {
					AuditCommand::Write(record) => {
						if let Err(e) = sink.write(&record).await {
							warn!(
								partner = %record.partner_name,
								endpoint = %record.endpoint,
								"failed to write audit record: {}",
								e
							);
						}
					},
					AuditCommand::Flush(done) => {
						let _ = done.send(());
					},
				}
			}
			debug!("audit queue closed, writer task exiting");
		});

		Self { sender }
	}

	/// Wait until every record queued so far has reached the sink
	///
	/// Unlike [`Auditor::record`] this waits for queue capacity.
	pub async fn flush(&self) {
		let (done, written) = oneshot::channel();
		if self.sender.send(AuditCommand::Flush(done)).await.is_err() {
			debug!("audit queue closed, nothing to flush");
			return;
		}
		if written.await.is_err() {
			warn!("audit writer stopped before the flush completed");
		}
	}

	pub fn with_default_capacity(sink: Arc<dyn AuditSink>) -> Self {
		Self::spawn(sink, DEFAULT_QUEUE_CAPACITY)
	}
}

impl Auditor for RedactingAuditor {
	fn record(&self, entry: AuditRecord) {
		if let Err(e) = self.sender.try_send(AuditCommand::Write(entry)) {
			let (reason, command) = match e {
				mpsc::error::TrySendError::Full(command) => ("queue full", command),
				mpsc::error::TrySendError::Closed(command) => ("queue closed", command),
			};
			if let AuditCommand::Write(record) = command {
				warn!(
					partner = %record.partner_name,
					endpoint = %record.endpoint,
					"dropping audit record: {}",
					reason
				);
			}
		}
	}
}

/// Writes each record as a structured `audit` tracing event
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
	async fn write(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
		let request = serde_json::to_string(&record.sanitized_request)?;
		let response = record
			.sanitized_response
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?;

		info!(
			target: "audit",
			partner = %record.partner_name,
			endpoint = %record.endpoint,
			method = %record.method,
			duration_ms = record.duration_ms,
			user_id = record.user_id.as_deref().unwrap_or("-"),
			error = record.error.as_deref().unwrap_or("-"),
			request = %request,
			response = response.as_deref().unwrap_or("-"),
			timestamp = %record.timestamp.to_rfc3339(),
			"partner call"
		);
		Ok(())
	}
}

/// Keeps records in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
	records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn records(&self) -> Vec<AuditRecord> {
		match self.records.lock() {
			Ok(records) => records.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	pub fn len(&self) -> usize {
		self.records().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
	async fn write(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
		let mut records = self
			.records
			.lock()
			.map_err(|e| AuditSinkError::Unavailable(e.to_string()))?;
		records.push(record.clone());
		Ok(())
	}
}
