//! Gateway Configuration
//!
//! Settings loading, secret resolution and startup logging for the agency
//! integration gateway.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	AggregationSettings, AuditSettings, AuditSinkKind, ConfigValidationError,
	FederationSettings, FederationTargetSettings, LogFormat, LoggingSettings, PartnerSettings,
	RetrySettings, Settings, SigningMaterial,
};
pub use startup_logger::{log_partner_summary, log_service_info, log_service_shutdown};
