//! Signalgen Shared Library
//!
//! This crate contains the core types and engines shared by the Signalgen
//! telemetry emitter and the backend verification harness.
//!
//! # Modules
//!
//! - [`models`] - Data models for ticks, spans, log records, and dashboard queries
//! - [`sink`] - The telemetry sink capability and an in-memory implementation
//! - [`emitter`] - The one-second signal clock and the per-tick emission engine
//! - [`verify`] - The backend probe capability and the retrying verifier
//!
//! # Example
//!
//! ```
//! use shared::emitter::TelemetryEmitter;
//! use shared::models::Tick;
//! use shared::sink::InMemorySink;
//!
//! let sink = InMemorySink::new();
//! let mut emitter = TelemetryEmitter::new(sink.clone());
//!
//! emitter.emit_cycle(&Tick::now(0));
//!
//! assert_eq!(sink.span_count(), 1);
//! assert_eq!(sink.log_count(), 2);
//! assert_eq!(sink.counter_total(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod emitter;
pub mod models;
pub mod sink;
pub mod verify;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
