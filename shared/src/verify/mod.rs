//! The backend probe capability and the retrying verifier.
//!
//! A probe issues a single query against a resolved datasource and reports
//! the structured result; the retrying verifier wraps a probe with bounded
//! exponential backoff to tolerate the lag between signal emission and the
//! moment the backend has ingested enough to answer.

pub mod probe;
pub mod retry;

pub use probe::{BackendProbe, ProbeError};
pub use retry::{LastObservation, RetryPolicy, RetryState, RetryingVerifier, VerifyOutcome};
