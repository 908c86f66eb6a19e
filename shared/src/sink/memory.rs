//! In-memory telemetry sink.
//!
//! Records every accepted signal so tests can assert on exactly what the
//! emitter produced. Suitable for unit tests and bounded scenario runs;
//! nothing is ever delivered anywhere.

use crate::models::{LogRecord, Severity, SpanRecord};
use crate::sink::TelemetrySink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Recording sink backed by in-memory vectors.
///
/// Cloning is cheap and every clone shares the same underlying storage, so
/// tests can keep a handle while the emitter owns another.
///
/// # Example
///
/// ```
/// use shared::models::{SpanRecord, Tick};
/// use shared::sink::{InMemorySink, TelemetrySink};
///
/// let sink = InMemorySink::new();
/// let tick = Tick::now(0);
/// sink.export_span(SpanRecord::begin("hello-world-span", &tick));
///
/// assert_eq!(sink.span_count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    inner: Arc<SinkState>,
}

#[derive(Debug, Default)]
struct SinkState {
    spans: RwLock<Vec<SpanRecord>>,
    logs: RwLock<Vec<LogRecord>>,
    counter_total: AtomicU64,
}

impl InMemorySink {
    /// Creates a new empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns copies of all recorded spans, in handoff order.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.inner
            .spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns copies of all recorded log records, in handoff order.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.inner
            .logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of recorded spans.
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.inner
            .spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the number of recorded log records.
    #[must_use]
    pub fn log_count(&self) -> usize {
        self.inner
            .logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the number of recorded log records with the given severity.
    #[must_use]
    pub fn log_count_with_severity(&self, severity: Severity) -> usize {
        self.inner
            .logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.severity == severity)
            .count()
    }

    /// Returns the current value of the counter instrument.
    #[must_use]
    pub fn counter_total(&self) -> u64 {
        self.inner.counter_total.load(Ordering::SeqCst)
    }

    /// Clears all recorded signals and resets the counter.
    pub fn clear(&self) {
        self.inner
            .spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner
            .logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.counter_total.store(0, Ordering::SeqCst);
    }
}

impl TelemetrySink for InMemorySink {
    fn export_span(&self, span: SpanRecord) {
        self.inner
            .spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }

    fn export_log(&self, record: LogRecord) {
        self.inner
            .logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn add_to_counter(&self, delta: u64) {
        self.inner.counter_total.fetch_add(delta, Ordering::SeqCst);
    }
}
