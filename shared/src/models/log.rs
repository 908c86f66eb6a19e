//! Log record data model.
//!
//! Defines the `LogRecord` structure handed to the telemetry sink. Records
//! are immutable once created; at most two are produced per emission cycle
//! (one inside the active span, one outside it).

use crate::models::SpanContextRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

/// A single log record emitted during an emission cycle.
///
/// # Example
///
/// ```
/// use shared::models::{LogRecord, Severity};
/// use chrono::Utc;
///
/// let record = LogRecord::new(Utc::now(), Severity::Info, "Started a new trace at 1700000000.");
///
/// assert_eq!(record.severity, Severity::Info);
/// assert!(record.span_context.is_none());
/// assert!(record.validate_record().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogRecord {
    /// Timestamp when the log event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the record.
    #[serde(default)]
    pub severity: Severity,

    /// The log message content.
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,

    /// Identity of the span that was open when this record was emitted,
    /// if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_context: Option<SpanContextRef>,
}

/// Errors that can occur during log record validation.
#[derive(Debug, Error)]
pub enum LogValidationError {
    /// The log message is empty.
    #[error("Log message cannot be empty")]
    EmptyMessage,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl LogRecord {
    /// Creates a new log record with no span correlation.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            severity,
            message: message.into(),
            span_context: None,
        }
    }

    /// Attributes this record to the span identified by `ctx`.
    #[must_use]
    pub fn with_span_context(mut self, ctx: SpanContextRef) -> Self {
        self.span_context = Some(ctx);
        self
    }

    /// Returns true if this record is correlated to a span.
    #[must_use]
    pub fn is_correlated(&self) -> bool {
        self.span_context.is_some()
    }

    /// Validates the log record.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is empty.
    pub fn validate_record(&self) -> Result<(), LogValidationError> {
        if self.message.is_empty() {
            return Err(LogValidationError::EmptyMessage);
        }
        self.validate()?;
        Ok(())
    }
}
