//! The signal clock and the per-tick emission engine.
//!
//! [`SignalClock`] produces one [`Tick`](crate::models::Tick) per elapsed
//! second; [`TelemetryEmitter`] turns each tick into one span, two log
//! records, and one counter increment, handed to a
//! [`TelemetrySink`](crate::sink::TelemetrySink).

pub mod clock;
pub mod engine;

pub use clock::SignalClock;
pub use engine::{TelemetryEmitter, TickCounter};
