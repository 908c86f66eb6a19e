//! The telemetry sink capability.
//!
//! A sink accepts finished spans, log records, and counter increments from
//! the emitter. Handoff is non-blocking: every method returns as soon as the
//! record is accepted, and any buffering, batching, or delivery scheduling
//! happens behind the trait. Construction failures (bad endpoint, TLS
//! misconfiguration) must surface when the sink is built, not per event.

pub mod memory;

pub use memory::InMemorySink;

use crate::models::{LogRecord, SpanRecord};

/// Capability for exporting emitted signals.
///
/// Implementations guarantee that each accepted record is eventually
/// attempted for delivery, with no ordering guarantee across signal kinds
/// (spans, logs, and metrics travel on independent channels).
pub trait TelemetrySink: Send + Sync {
    /// Accepts a finished span for export.
    fn export_span(&self, span: SpanRecord);

    /// Accepts a log record for export.
    fn export_log(&self, record: LogRecord);

    /// Adds `delta` to the sink's monotonic counter instrument.
    fn add_to_counter(&self, delta: u64);
}
