//! The per-tick emission engine.
//!
//! On each tick the emitter opens one span, writes one INFO log record
//! inside it and one DEBUG log record outside it, and adds 1 to the shared
//! counter. Side effects are observable only through the sink; export
//! failures are the sink's concern and are never caught, retried, or
//! suppressed here.

use crate::models::{LogRecord, Severity, SpanRecord, SpanStatus, Tick};
use crate::sink::TelemetrySink;
use chrono::Utc;

/// Name of the span opened on every tick.
pub const SPAN_NAME: &str = "hello-world-span";

/// Key of the fixed string attribute set on every span.
pub const ATTRIBUTE_ONE_KEY: &str = "custom.attribute1";

/// Value of the fixed string attribute.
pub const ATTRIBUTE_ONE_VALUE: &str = "value1";

/// Key of the fixed integer attribute set on every span.
pub const ATTRIBUTE_TWO_KEY: &str = "custom.attribute2";

/// Value of the fixed integer attribute.
pub const ATTRIBUTE_TWO_VALUE: i64 = 1_234_567;

/// Process-wide tick counter.
///
/// Monotonically non-decreasing, incremented by exactly 1 per tick by its
/// single writer (the emitter loop), never reset during the process
/// lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickCounter {
    value: u64,
}

impl TickCounter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds 1 and returns the new value.
    pub fn increment(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Turns ticks into signals.
///
/// # Example
///
/// ```
/// use shared::emitter::TelemetryEmitter;
/// use shared::models::Tick;
/// use shared::sink::InMemorySink;
///
/// let sink = InMemorySink::new();
/// let mut emitter = TelemetryEmitter::new(sink.clone());
///
/// for seq in 0..3 {
///     emitter.emit_cycle(&Tick::now(seq));
/// }
///
/// assert_eq!(sink.span_count(), 3);
/// assert_eq!(sink.log_count(), 6);
/// assert_eq!(emitter.counter().value(), 3);
/// ```
#[derive(Debug)]
pub struct TelemetryEmitter<S: TelemetrySink> {
    sink: S,
    counter: TickCounter,
}

impl<S: TelemetrySink> TelemetryEmitter<S> {
    /// Creates an emitter writing to the given sink.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            counter: TickCounter::new(),
        }
    }

    /// Returns the in-memory tick counter.
    #[must_use]
    pub fn counter(&self) -> TickCounter {
        self.counter
    }

    /// Runs one emission cycle for the given tick.
    ///
    /// Produces exactly one span, one correlated INFO record, one
    /// uncorrelated DEBUG record, and one counter increment.
    pub fn emit_cycle(&mut self, tick: &Tick) {
        let nanos = tick.unix_nanos();

        let span = SpanRecord::begin(SPAN_NAME, tick)
            .with_attribute(ATTRIBUTE_ONE_KEY, ATTRIBUTE_ONE_VALUE)
            .with_attribute(ATTRIBUTE_TWO_KEY, ATTRIBUTE_TWO_VALUE);

        let info = LogRecord::new(
            tick.timestamp,
            Severity::Info,
            format!("Started a new trace at {nanos}."),
        )
        .with_span_context(span.context_ref());
        self.sink.export_log(info);

        let span = span.with_status(SpanStatus::Ok).finish(Utc::now());
        self.sink.export_span(span);

        let debug = LogRecord::new(
            tick.timestamp,
            Severity::Debug,
            format!("Here's another message at {nanos}."),
        );
        self.sink.export_log(debug);

        let total = self.counter.increment();
        self.sink.add_to_counter(1);

        tracing::debug!(seq = tick.seq, counter = total, "Emission cycle complete");
    }

    /// Runs `cycles` emission cycles paced by the given clock.
    ///
    /// Used by tests and bounded scenario runs; production uses [`run`].
    ///
    /// [`run`]: TelemetryEmitter::run
    pub async fn run_for(&mut self, clock: &mut super::SignalClock, cycles: u64) {
        for _ in 0..cycles {
            let tick = clock.tick().await;
            self.emit_cycle(&tick);
        }
    }

    /// Runs emission cycles forever.
    ///
    /// This function never returns under normal operation; termination is
    /// external (process kill). The one-second wait inside the clock is the
    /// loop's only suspension point.
    pub async fn run(mut self, mut clock: super::SignalClock) {
        loop {
            let tick = clock.tick().await;
            self.emit_cycle(&tick);
        }
    }
}
