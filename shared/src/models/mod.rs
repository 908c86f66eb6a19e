//! Data models for the Signalgen emitter and verification harness.
//!
//! This module contains the core data structures for emitted signals
//! (ticks, spans, log records) and for dashboard datasource queries.

pub mod log;
pub mod query;
pub mod span;
pub mod tick;

pub use log::{LogRecord, LogValidationError, Severity};
pub use query::{
    DataQuery, DatasourceRef, DatasourceSelector, Frame, FrameData, QueryRequest, QueryResult,
    SubQueryResult,
};
pub use span::{SpanContextRef, SpanRecord, SpanStatus, SpanValidationError};
pub use tick::Tick;
