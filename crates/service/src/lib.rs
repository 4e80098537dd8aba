//! Gateway Service
//!
//! Quote aggregation over partner providers and SAML assertion signing for
//! single sign-on handoff.

pub mod aggregator;
pub mod federation;

pub use aggregator::{
	apply_filters, average_premium, rank_quotes, AggregationError, QuoteAggregator,
};
pub use federation::{
	FederationConfig, FederationError, FederationSigner, FederationTarget, SigningConfig,
};
