//! Bounded exponential backoff around a backend probe.
//!
//! Ingestion from the transport into the analytical/time-series store is
//! asynchronous and may lag emission by a few seconds. The verifier retries
//! a disqualifying result (non-success status, transport error, or empty
//! frames) with exponentially growing delays, up to a fixed attempt bound.
//! Only exhaustion is fatal; every terminal outcome carries a diagnostic
//! naming the datasource and the last observation.

use crate::models::{DatasourceRef, QueryRequest, QueryResult};
use crate::verify::BackendProbe;
use std::time::Duration;

/// Retry bounds for one verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of probe calls before giving up.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Four attempts with a one-second base delay, the bound that balances
    /// test latency against ingestion-lag flakiness.
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given bounds.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the backoff delay after the zero-indexed `attempt`:
    /// `base_delay * 2^attempt`, saturating.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1_u32 << attempt.min(31))
    }
}

/// Per-call retry bookkeeping.
///
/// Lives only for the duration of one verification call and is discarded
/// after success or exhaustion. The attempt count never exceeds the
/// policy's maximum.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    attempt: u32,
    policy: RetryPolicy,
}

impl RetryState {
    /// Creates fresh state for one verification call.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { attempt: 0, policy }
    }

    /// Number of probe calls made so far, counting the one in flight.
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    /// Returns true if another attempt may follow the current one.
    #[must_use]
    pub fn has_attempts_remaining(&self) -> bool {
        self.attempt + 1 < self.policy.max_attempts
    }

    /// Returns the delay to wait before the next attempt.
    #[must_use]
    pub fn backoff_delay(&self) -> Duration {
        self.policy.delay_for_attempt(self.attempt)
    }

    /// Records that the current attempt has been spent.
    pub fn advance(&mut self) {
        self.attempt += 1;
    }
}

/// What the verifier saw on its most recent disqualifying attempt.
#[derive(Debug, Clone, Default)]
pub struct LastObservation {
    /// Status code of the first non-success sub-query, or any status if all
    /// succeeded.
    pub status: Option<i64>,

    /// Extracted value count of the last result, if a result was received.
    pub count: usize,

    /// Probe error message, if the attempt failed before a result arrived.
    pub error: Option<String>,
}

impl std::fmt::Display for LastObservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.error, self.status) {
            (Some(error), _) => write!(f, "error: {error}"),
            (None, Some(status)) => write!(f, "status={status}, count={}", self.count),
            (None, None) => write!(f, "no response observed"),
        }
    }
}

/// Terminal outcome of one verification call.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    /// A qualifying result arrived within the attempt bound.
    Succeeded {
        /// Name of the verified datasource.
        datasource: String,
        /// Number of probe calls made.
        attempts: u32,
        /// Extracted value count of the qualifying result.
        count: usize,
    },

    /// Every attempt disqualified; the bound is spent.
    Exhausted {
        /// Name of the datasource under verification.
        datasource: String,
        /// Number of probe calls made.
        attempts: u32,
        /// The last disqualifying observation, for diagnostics.
        last: LastObservation,
    },
}

impl VerifyOutcome {
    /// Returns true for [`VerifyOutcome::Succeeded`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl std::fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded {
                datasource,
                attempts,
                count,
            } => write!(
                f,
                "Datasource.name={datasource} returned {count} value column(s) on attempt {attempts}"
            ),
            Self::Exhausted {
                datasource,
                attempts,
                last,
            } => write!(
                f,
                "Datasource.name={datasource} still empty after {attempts} attempts; last observation: {last}"
            ),
        }
    }
}

/// Wraps a [`BackendProbe`] with the bounded backoff protocol.
///
/// State machine per call: Querying on entry; a qualifying result moves to
/// Succeeded; a disqualifying result with attempts remaining moves to
/// Waiting, then back to Querying once the backoff elapses; a disqualifying
/// result with no attempts remaining moves to Exhausted. Succeeded and
/// Exhausted are terminal.
#[derive(Debug)]
pub struct RetryingVerifier<P: BackendProbe> {
    probe: P,
    policy: RetryPolicy,
}

impl<P: BackendProbe> RetryingVerifier<P> {
    /// Creates a verifier over the given probe.
    #[must_use]
    pub fn new(probe: P, policy: RetryPolicy) -> Self {
        Self { probe, policy }
    }

    /// Verifies that `payload` eventually yields a successful, non-empty
    /// result from `datasource`.
    ///
    /// A result qualifies when every sub-query reports success and
    /// `extract_count` maps the result to a value greater than zero.
    /// Transport errors, non-success statuses, and empty results are all
    /// retryable within the bound; only exhaustion is fatal.
    pub async fn verify_non_empty<F>(
        &self,
        datasource: &DatasourceRef,
        payload: &QueryRequest,
        extract_count: F,
    ) -> VerifyOutcome
    where
        F: Fn(&QueryResult) -> usize + Send + Sync,
    {
        let mut state = RetryState::new(self.policy);

        loop {
            let last = match self.probe.query(datasource, payload).await {
                Ok(result) => {
                    let count = extract_count(&result);
                    if result.all_success() && count > 0 {
                        let outcome = VerifyOutcome::Succeeded {
                            datasource: datasource.name.clone(),
                            attempts: state.attempts_made(),
                            count,
                        };
                        tracing::info!(
                            datasource = %datasource.name,
                            attempts = state.attempts_made(),
                            count,
                            "Verification succeeded"
                        );
                        return outcome;
                    }
                    observe(&result, count)
                }
                Err(error) => LastObservation {
                    status: None,
                    count: 0,
                    error: Some(error.to_string()),
                },
            };

            if state.has_attempts_remaining() {
                let delay = state.backoff_delay();
                tracing::warn!(
                    datasource = %datasource.name,
                    attempt = state.attempts_made(),
                    delay_secs = delay.as_secs_f64(),
                    last = %last,
                    "Disqualifying result, backing off"
                );
                tokio::time::sleep(delay).await;
                state.advance();
            } else {
                let outcome = VerifyOutcome::Exhausted {
                    datasource: datasource.name.clone(),
                    attempts: state.attempts_made(),
                    last,
                };
                tracing::error!(
                    datasource = %datasource.name,
                    attempts = state.attempts_made(),
                    "Verification exhausted its attempt bound"
                );
                return outcome;
            }
        }
    }
}

fn observe(result: &QueryResult, count: usize) -> LastObservation {
    let status = result
        .results
        .values()
        .map(|r| r.status)
        .find(|status| *status != 200)
        .or_else(|| result.results.values().next().map(|r| r.status));

    LastObservation {
        status,
        count,
        error: None,
    }
}
