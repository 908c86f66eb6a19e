//! Signalgen Emitter
//!
//! This crate provides the long-running sample process that continuously
//! emits correlated traces, logs, and metrics over OTLP. Once per second it
//! opens a span, writes one INFO log record inside the span and one DEBUG
//! log record outside it, and increments a monotonic counter; the SDK's
//! batching processors and periodic metric reader handle delivery.
//!
//! # Example
//!
//! ```no_run
//! use emitter::run_emitter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_emitter().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod otlp;

pub use config::EmitterConfig;
pub use otlp::OtlpSink;

use anyhow::{Context, Result};
use shared::emitter::{SignalClock, TelemetryEmitter};

/// Runs the Signalgen emitter.
///
/// This function loads configuration from environment variables, builds the
/// OTLP export pipeline, and emits signals once per second until the
/// process receives a shutdown signal.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The OTLP export pipeline cannot be constructed
pub async fn run_emitter() -> Result<()> {
    let config = EmitterConfig::from_env()?;
    run_emitter_with_config(config).await
}

/// Runs the Signalgen emitter with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration
/// programmatically.
///
/// # Errors
///
/// Returns an error if the OTLP export pipeline cannot be constructed, or
/// if flushing the exporters on shutdown fails.
pub async fn run_emitter_with_config(config: EmitterConfig) -> Result<()> {
    tracing::info!(
        endpoint = %config.endpoint_url(),
        service_name = %config.service_name,
        "Signalgen emitter starting"
    );

    let sink = OtlpSink::new(&config).context("Failed to construct OTLP export pipeline")?;
    let shutdown_handle = sink.clone();

    let clock = SignalClock::per_second();
    let emitter = TelemetryEmitter::new(sink);

    tracing::info!("Emitting one span, two log records, and one counter increment per second");

    tokio::select! {
        () = emitter.run(clock) => {}
        () = shutdown_signal() => {
            tracing::info!("Flushing exporters before exit");
            shutdown_handle.shutdown()?;
        }
    }

    tracing::info!("Emitter shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
