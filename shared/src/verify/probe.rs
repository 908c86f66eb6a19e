//! The backend probe capability.
//!
//! A probe transmits one query payload to a named datasource and returns the
//! structured result. The payload is opaque to the probe. No retry logic
//! lives here; retries are the caller's responsibility.

use crate::models::{DatasourceRef, QueryRequest, QueryResult};
use async_trait::async_trait;
use thiserror::Error;

/// Errors a probe can report.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The dashboard API could not be reached.
    #[error("Failed to reach the dashboard API: {0}")]
    Connection(String),

    /// A datasource name could not be resolved.
    #[error("Datasource '{0}' not found")]
    NotFound(String),

    /// The dashboard API answered with something unparseable.
    #[error("Failed to decode dashboard response: {0}")]
    Decode(String),
}

/// Capability for issuing a single datasource query.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    /// Executes `payload` against the given datasource.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Connection`] on transport failure and
    /// [`ProbeError::NotFound`] if the datasource is unknown to the
    /// dashboard. Errors are reported to the caller, never swallowed.
    async fn query(
        &self,
        datasource: &DatasourceRef,
        payload: &QueryRequest,
    ) -> Result<QueryResult, ProbeError>;
}
