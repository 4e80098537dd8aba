//! Error types for quote requests

use thiserror::Error;

/// Validation errors for unified quote requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteValidationError {
	#[error("Missing required field: {field}")]
	MissingRequiredField { field: String },

	#[error("Invalid amount: {field} - {reason}")]
	InvalidAmount { field: String, reason: String },

	#[error("Invalid date of birth: {reason}")]
	InvalidDateOfBirth { reason: String },

	#[error("Invalid state code: {state}")]
	InvalidState { state: String },

	#[error("Invalid term: {term} years")]
	InvalidTerm { term: u32 },
}
