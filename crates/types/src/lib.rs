//! Gateway Types
//!
//! Shared models and traits for the agency integration gateway.
//! This crate contains all domain models organized by business entity.

pub mod audit;
pub mod federation;
pub mod models;
pub mod partners;
pub mod providers;
pub mod quotes;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use models::{HealthCheckResult, SecretString};

pub use partners::{
	default_retryable_signals, CallError, IntegrationError, IntegrationErrorKind, PartnerConfig,
	PartnerCredentials, PartnerMode, PartnerRetrySettings, RetryPolicy, RetrySignal, Retryable,
	TransportCode,
};

pub use audit::{AuditRecord, AuditSink, AuditSinkError, Auditor};

pub use quotes::{
	AggregationResult, Applicant, CarrierRating, FeatureValue, Gender, HealthClass,
	ProductFamily, ProductType, ProviderStatus, QuoteValidationError, UnifiedQuote,
	UnifiedQuoteRequest,
};

pub use providers::{QuoteContext, QuoteProvider, QuoteSimulator};

pub use federation::{
	FederationEnvironment, FederationProduct, ProfileFields, SignedAssertion,
	SsoAssertionRequest,
};
