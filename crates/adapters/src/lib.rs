//! Gateway Adapters
//!
//! Outbound partner plumbing: backoff executor, redacting auditor, HTTP
//! transport, per-partner gateways and the partner quote providers.

pub mod audit;
pub mod auth;
pub mod gateway;
pub mod partners;
pub mod registry;
pub mod retry;
pub mod transport;

pub use audit::{
	sanitize, start_timer, MemoryAuditSink, RedactingAuditor, Stopwatch, TracingAuditSink,
	REDACTION_MARKER,
};
pub use auth::AuthScheme;
pub use gateway::{PartnerGateway, RequestOptions};
pub use partners::{AnnuityHubProvider, CarrierDirectProvider, QuoteExchangeProvider};
pub use registry::{ProviderDeps, ProviderRegistry, RegistryError, SUPPORTED_PARTNERS};
pub use retry::{run_with_retry, run_with_retry_counted, RetryError, RetryOutcome};
pub use transport::{HttpMethod, OutboundRequest, ReqwestTransport, Transport, TransportResponse};
