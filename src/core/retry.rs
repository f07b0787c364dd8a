//! Caller-side retry loop for transfers
//!
//! The orchestrator never retries and never waits. Callers that want a
//! transfer to eventually commit wrap it in [`transfer_with_retry`] (blocking
//! threads) or [`transfer_with_retry_async`] (tokio tasks), which repeat the
//! whole prepare/execute/commit sequence with a pluggable backoff. The
//! underlying [`retry`] / [`retry_async`] loops accept any fallible
//! operation, e.g. a bare `prepare`.
//!
//! Backoff reduces the probability of repeated contention; it does not
//! guarantee fairness.

use super::transfer::TransferOrchestrator;
use crate::types::{Account, BankingError, TransferRequest};
use std::time::{Duration, Instant};

/// Delay before the next attempt
pub trait BackoffPolicy: Send + Sync {
    /// Delay after the given failed attempt (1-based)
    fn next_delay(&self, attempt: u32) -> Duration;
}

/// `initial * factor^(attempt - 1)`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub factor: u32,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(10),
            factor: 2,
            max: Duration::from_secs(1),
        }
    }
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, factor: u32, max: Duration) -> Self {
        Self {
            initial,
            factor,
            max,
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Duration {
        let multiplier = self
            .factor
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial
            .checked_mul(multiplier)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Same delay after every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff(pub Duration);

impl BackoffPolicy for ConstantBackoff {
    fn next_delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Limits and retryable errors for the retry loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryConfig {
    /// Give up after this many attempts (`None`: unlimited)
    pub max_attempts: Option<u32>,

    /// Give up once the next sleep would end past this much elapsed time
    pub deadline: Option<Duration>,

    /// Also retry `InsufficientFunds`, waiting for incoming transfers to
    /// top the sender up
    pub retry_insufficient_funds: bool,
}

impl RetryConfig {
    /// Retry contention only, at most `max_attempts` times in total
    pub fn contention_only(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::default()
        }
    }

    /// Retry contention and insufficient funds with no limit
    pub fn until_committed() -> Self {
        Self {
            retry_insufficient_funds: true,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn is_retryable(&self, err: &BankingError) -> bool {
        err.is_contention()
            || (self.retry_insufficient_funds
                && matches!(err, BankingError::InsufficientFunds { .. }))
    }

    /// Delay before the next attempt, or `None` to give up
    fn next_step<P: BackoffPolicy + ?Sized>(
        &self,
        err: &BankingError,
        attempt: u32,
        elapsed: Duration,
        policy: &P,
    ) -> Option<Duration> {
        if !self.is_retryable(err) {
            return None;
        }

        if self.max_attempts.is_some_and(|max| attempt >= max) {
            tracing::warn!(attempt, error = %err, "retries exhausted");
            return None;
        }

        let delay = policy.next_delay(attempt);
        let past_deadline =
            |deadline: Duration| elapsed.checked_add(delay).map_or(true, |end| end > deadline);
        if self.deadline.is_some_and(past_deadline) {
            tracing::warn!(attempt, ?elapsed, error = %err, "retry deadline reached");
            return None;
        }

        Some(delay)
    }
}

/// Run `operation` until it succeeds, sleeping the current thread between attempts
///
/// # Errors
///
/// The first non-retryable error, or the last error once attempts or the
/// deadline run out.
pub fn retry<T, F, P>(policy: &P, config: &RetryConfig, mut operation: F) -> Result<T, BankingError>
where
    F: FnMut() -> Result<T, BankingError>,
    P: BackoffPolicy + ?Sized,
{
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match config.next_step(&err, attempt, started.elapsed(), policy) {
            Some(delay) => {
                tracing::trace!(attempt, ?delay, error = %err, "retrying");
                std::thread::sleep(delay);
            }
            None => return Err(err),
        }
    }
}

/// Async variant of [`retry`] that yields to the runtime between attempts
pub async fn retry_async<T, F, P>(
    policy: &P,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, BankingError>
where
    F: FnMut() -> Result<T, BankingError>,
    P: BackoffPolicy + ?Sized,
{
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match config.next_step(&err, attempt, started.elapsed(), policy) {
            Some(delay) => {
                tracing::trace!(attempt, ?delay, error = %err, "retrying");
                tokio::time::sleep(delay).await;
            }
            None => return Err(err),
        }
    }
}

/// Run full prepare/execute/commit transfers until one commits (blocking)
pub fn transfer_with_retry<P: BackoffPolicy + ?Sized>(
    orchestrator: &TransferOrchestrator,
    request: &TransferRequest,
    policy: &P,
    config: &RetryConfig,
) -> Result<Account, BankingError> {
    retry(policy, config, || orchestrator.transfer(request))
}

/// Run full prepare/execute/commit transfers until one commits (async)
pub async fn transfer_with_retry_async<P: BackoffPolicy + ?Sized>(
    orchestrator: &TransferOrchestrator,
    request: &TransferRequest,
    policy: &P,
    config: &RetryConfig,
) -> Result<Account, BankingError> {
    retry_async(policy, config, || orchestrator.transfer(request)).await
}
