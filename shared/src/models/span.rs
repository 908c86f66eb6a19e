//! Span data model.
//!
//! Defines the `SpanRecord` structure handed to the telemetry sink. A span
//! record lives for exactly one emission cycle: it is opened at tick start,
//! closed at tick end, and owned by the cycle that created it until handoff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// Status code for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// No status was set on the span.
    #[default]
    Unset,
    /// The span completed without error.
    Ok,
    /// The span encountered an error.
    Error,
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Reference to a span's identity, used to correlate log records with the
/// span that was open when they were emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContextRef {
    /// Hex-encoded 128-bit trace ID.
    pub trace_id: String,
    /// Hex-encoded 64-bit span ID.
    pub span_id: String,
}

/// A span representing one timed unit of work.
///
/// # Example
///
/// ```
/// use shared::models::{SpanRecord, Tick};
///
/// let tick = Tick::now(0);
/// let span = SpanRecord::begin("hello-world-span", &tick)
///     .with_attribute("custom.attribute1", "value1")
///     .with_attribute("custom.attribute2", 1_234_567);
///
/// assert!(span.validate_record().is_ok());
/// assert_eq!(span.attributes.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SpanRecord {
    /// Hex-encoded trace ID this span belongs to.
    #[validate(length(min = 1, message = "Trace ID cannot be empty"))]
    pub trace_id: String,

    /// Hex-encoded identifier for this span.
    #[validate(length(min = 1, message = "Span ID cannot be empty"))]
    pub span_id: String,

    /// The name/operation of this span.
    #[validate(length(min = 1, message = "Span name cannot be empty"))]
    pub name: String,

    /// The status of the span.
    #[serde(default)]
    pub status: SpanStatus,

    /// Timestamp when the span started.
    pub start_time: DateTime<Utc>,

    /// Timestamp when the span ended.
    pub end_time: DateTime<Utc>,

    /// Scalar attributes attached to the span.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// Errors that can occur during span record validation.
#[derive(Debug, Error)]
pub enum SpanValidationError {
    /// The trace ID is empty.
    #[error("Trace ID cannot be empty")]
    EmptyTraceId,

    /// The span ID is empty.
    #[error("Span ID cannot be empty")]
    EmptySpanId,

    /// The span name is empty.
    #[error("Span name cannot be empty")]
    EmptyName,

    /// The end time is before the start time.
    #[error("End time cannot be before start time")]
    InvalidTimeRange,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl SpanRecord {
    /// Opens a span for the given tick.
    ///
    /// The trace and span IDs are derived from the tick's timestamp and
    /// sequence number, which makes them unique within a process lifetime.
    /// The end time is initialized to the start time; call [`finish`] to
    /// close the span.
    ///
    /// [`finish`]: SpanRecord::finish
    #[must_use]
    pub fn begin(name: impl Into<String>, tick: &crate::models::Tick) -> Self {
        // Cast keeps the low 64 bits, which carry all the entropy we need.
        #[allow(clippy::cast_sign_loss)]
        let nanos = tick.unix_nanos() as u64;
        Self {
            trace_id: format!("{nanos:016x}{:016x}", tick.seq + 1),
            span_id: format!("{:016x}", tick.seq + 1),
            name: name.into(),
            status: SpanStatus::default(),
            start_time: tick.timestamp,
            end_time: tick.timestamp,
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute to the span.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.attributes.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    /// Sets the span status.
    #[must_use]
    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    /// Closes the span at the given end time.
    #[must_use]
    pub fn finish(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time;
        self
    }

    /// Returns a reference to this span's identity for log correlation.
    #[must_use]
    pub fn context_ref(&self) -> SpanContextRef {
        SpanContextRef {
            trace_id: self.trace_id.clone(),
            span_id: self.span_id.clone(),
        }
    }

    /// Returns the duration of the span.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// Validates the span record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The trace ID is empty
    /// - The span ID is empty
    /// - The name is empty
    /// - The end time is before the start time
    pub fn validate_record(&self) -> Result<(), SpanValidationError> {
        if self.trace_id.is_empty() {
            return Err(SpanValidationError::EmptyTraceId);
        }
        if self.span_id.is_empty() {
            return Err(SpanValidationError::EmptySpanId);
        }
        if self.name.is_empty() {
            return Err(SpanValidationError::EmptyName);
        }
        if self.end_time < self.start_time {
            return Err(SpanValidationError::InvalidTimeRange);
        }
        self.validate()?;
        Ok(())
    }
}
