//! Retry policy shared by every partner gateway

use super::errors::{RetrySignal, TransportCode};
use std::collections::HashSet;
use std::time::Duration;

/// Bounded exponential backoff without jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	/// Total attempts including the first one; values below 1 are treated as 1
	pub max_attempts: u32,
	pub initial_delay: Duration,
	pub max_delay: Duration,
	pub backoff_multiplier: f64,
	pub retryable_signals: HashSet<RetrySignal>,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_delay: Duration::from_millis(1000),
			max_delay: Duration::from_millis(10_000),
			backoff_multiplier: 2.0,
			retryable_signals: default_retryable_signals(),
		}
	}
}

/// ETIMEDOUT, ECONNRESET, ECONNREFUSED, 429, 500, 502, 503 and 504
pub fn default_retryable_signals() -> HashSet<RetrySignal> {
	let mut signals: HashSet<RetrySignal> = [
		TransportCode::TimedOut,
		TransportCode::ConnectionReset,
		TransportCode::ConnectionRefused,
	]
	.into_iter()
	.map(RetrySignal::Transport)
	.collect();

	signals.extend([429, 500, 502, 503, 504].into_iter().map(RetrySignal::Status));
	signals
}

impl RetryPolicy {
	/// A policy that makes exactly one attempt
	pub fn single_attempt() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;
		self
	}

	pub fn with_delays(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
		self.initial_delay = initial_delay;
		self.max_delay = max_delay;
		self
	}

	pub fn with_multiplier(mut self, backoff_multiplier: f64) -> Self {
		self.backoff_multiplier = backoff_multiplier;
		self
	}

	/// Attempt ceiling, never below one
	pub fn attempts(&self) -> u32 {
		self.max_attempts.max(1)
	}

	pub fn is_retryable(&self, signal: Option<RetrySignal>) -> bool {
		signal.is_some_and(|s| self.retryable_signals.contains(&s))
	}

	/// Delay slept after failed attempt `attempt` (1-based)
	///
	/// `min(initial_delay * multiplier^(attempt-1), max_delay)`
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1) as i32;
		let scaled_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
		let max_ms = self.max_delay.as_millis() as f64;

		if !scaled_ms.is_finite() || scaled_ms >= max_ms {
			self.max_delay
		} else {
			Duration::from_millis(scaled_ms.max(0.0) as u64)
		}
	}

	/// Sum of every delay a permanently failing retryable call would sleep
	pub fn total_backoff(&self) -> Duration {
		(1..self.attempts()).map(|k| self.delay_for_attempt(k)).sum()
	}
}
