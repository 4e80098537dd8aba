//! Shared domain models

pub mod health;
pub mod secret_string;

pub use health::HealthCheckResult;
pub use secret_string::SecretString;
