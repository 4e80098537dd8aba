//! Backoff executor
//!
//! Runs an async operation with bounded attempts and deterministic exponential
//! delay between them. Failures are classified through [`Retryable`].

use std::fmt::Display;
use std::future::Future;

use gateway_types::{RetryPolicy, Retryable};
use thiserror::Error;
use tracing::{debug, warn};

/// Why the executor stopped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError<E> {
	/// The failure was not retryable; it is returned untouched
	#[error("{0}")]
	Terminal(E),

	/// Every attempt failed with a retryable signal
	#[error("retries exhausted after {attempts} attempts: {last_error}")]
	Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
	/// The underlying failure, whichever way the loop ended
	pub fn last_error(&self) -> &E {
		match self {
			RetryError::Terminal(error) => error,
			RetryError::Exhausted { last_error, .. } => last_error,
		}
	}

	pub fn into_last_error(self) -> E {
		match self {
			RetryError::Terminal(error) => error,
			RetryError::Exhausted { last_error, .. } => last_error,
		}
	}

	pub fn is_exhausted(&self) -> bool {
		matches!(self, RetryError::Exhausted { .. })
	}
}

/// Outcome of [`run_with_retry`] plus the number of attempts made
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
	pub attempts: u32,
	pub result: Result<T, RetryError<E>>,
}

/// Run `operation` until it succeeds, fails terminally, or runs out of attempts
pub async fn run_with_retry<T, E, F, Fut>(
	policy: &RetryPolicy,
	operation: F,
) -> Result<T, RetryError<E>>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Retryable + Display,
{
	run_with_retry_counted(policy, operation).await.result
}

/// Same as [`run_with_retry`], also reporting how many attempts ran
pub async fn run_with_retry_counted<T, E, F, Fut>(
	policy: &RetryPolicy,
	mut operation: F,
) -> RetryOutcome<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Retryable + Display,
{
	let max_attempts = policy.attempts();
	let mut attempt = 1;

	loop {
		let error = match operation().await {
			Ok(value) => {
				if attempt > 1 {
					debug!(attempt, "operation succeeded after retry");
				}
				return RetryOutcome {
					attempts: attempt,
					result: Ok(value),
				};
			},
			Err(error) => error,
		};

		let signal = error.retry_signal();
		if !policy.is_retryable(signal) {
			debug!(attempt, error = %error, "non-retryable failure");
			return RetryOutcome {
				attempts: attempt,
				result: Err(RetryError::Terminal(error)),
			};
		}

		if attempt >= max_attempts {
			return RetryOutcome {
				attempts: attempt,
				result: Err(RetryError::Exhausted {
					attempts: attempt,
					last_error: error,
				}),
			};
		}

		let delay = policy.delay_for_attempt(attempt);
		let code = signal.map(|s| s.to_string()).unwrap_or_default();
		warn!(
			attempt,
			max_attempts,
			code = %code,
			delay_ms = delay.as_millis() as u64,
			"retryable failure, backing off"
		);

		tokio::time::sleep(delay).await;
		attempt += 1;
	}
}
