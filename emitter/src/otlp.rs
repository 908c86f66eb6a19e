//! OTLP-backed telemetry sink.
//!
//! Wires the three export channels (spans, log records, metrics) to an OTLP
//! gRPC collector. Spans and log records go through batching processors;
//! metrics are read on a fixed period. All three channels share one resource
//! descriptor carrying the service identity.
//!
//! Construction failures (unreachable endpoint configuration, TLS
//! misconfiguration) surface from [`OtlpSink::new`]; individual export
//! failures afterwards are handled inside the SDK's processors and never
//! reach the emitter.

use crate::config::EmitterConfig;
use anyhow::{Context, Result};
use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, LoggerProvider as _};
use opentelemetry::metrics::{Counter, MeterProvider as _};
use opentelemetry::trace::{
    Span as _, SpanId, Status, TraceFlags, TraceId, Tracer as _, TracerProvider as _,
};
use opentelemetry::KeyValue;
use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use shared::models::{LogRecord, Severity, SpanRecord, SpanStatus};
use shared::sink::TelemetrySink;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Name of the counter instrument incremented once per tick.
pub const COUNTER_NAME: &str = "metric_counter";

/// Human-readable description of the counter instrument.
pub const COUNTER_DESCRIPTION: &str = "An example metric that increments every second";

/// Instrumentation scope version reported with the meter.
pub const SCOPE_VERSION: &str = "0.0.1";

/// Telemetry sink backed by OTLP gRPC exporters.
///
/// Cloning is cheap; every clone shares the same providers, so one handle
/// can drive the emitter while another is kept for shutdown.
#[derive(Debug, Clone)]
pub struct OtlpSink {
    inner: Arc<OtlpSinkInner>,
}

#[derive(Debug)]
struct OtlpSinkInner {
    tracer_provider: SdkTracerProvider,
    logger_provider: SdkLoggerProvider,
    meter_provider: SdkMeterProvider,
    tracer: SdkTracer,
    logger: SdkLogger,
    counter: Counter<u64>,
}

impl OtlpSink {
    /// Builds the full export pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three exporters fails to build, e.g.
    /// because the endpoint cannot be parsed or TLS is misconfigured.
    pub fn new(config: &EmitterConfig) -> Result<Self> {
        let endpoint = config.endpoint_url();
        let resource = build_resource(config);

        tracing::info!(
            endpoint = %endpoint,
            service_name = %config.service_name,
            "Building OTLP export pipeline"
        );

        let span_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .with_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build OTLP span exporter")?;
        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .with_resource(resource.clone())
            .build();

        let log_exporter = LogExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .with_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build OTLP log exporter")?;
        let logger_provider = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .with_resource(resource.clone())
            .build();

        let metric_exporter = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .with_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build OTLP metric exporter")?;
        let metric_reader = PeriodicReader::builder(metric_exporter)
            .with_interval(Duration::from_millis(config.metric_export_interval_ms))
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(metric_reader)
            .with_resource(resource)
            .build();

        let tracer = tracer_provider.tracer(config.service_name.clone());
        let logger = logger_provider.logger(config.service_name.clone());
        let counter = meter_provider
            .meter_with_scope(
                opentelemetry::InstrumentationScope::builder(config.service_name.clone())
                    .with_version(SCOPE_VERSION)
                    .build(),
            )
            .u64_counter(COUNTER_NAME)
            .with_description(COUNTER_DESCRIPTION)
            .build();

        Ok(Self {
            inner: Arc::new(OtlpSinkInner {
                tracer_provider,
                logger_provider,
                meter_provider,
                tracer,
                logger,
                counter,
            }),
        })
    }

    /// Flushes and shuts down all three export channels.
    ///
    /// # Errors
    ///
    /// Returns the first shutdown error encountered; later channels are
    /// still shut down.
    pub fn shutdown(&self) -> Result<()> {
        let trace_result = self
            .inner
            .tracer_provider
            .shutdown()
            .context("Failed to shut down tracer provider");
        let log_result = self
            .inner
            .logger_provider
            .shutdown()
            .context("Failed to shut down logger provider");
        let metric_result = self
            .inner
            .meter_provider
            .shutdown()
            .context("Failed to shut down meter provider");

        trace_result?;
        log_result?;
        metric_result?;
        Ok(())
    }
}

impl TelemetrySink for OtlpSink {
    fn export_span(&self, span: SpanRecord) {
        let trace_id = TraceId::from_hex(&span.trace_id).unwrap_or(TraceId::INVALID);
        let span_id = SpanId::from_hex(&span.span_id).unwrap_or(SpanId::INVALID);
        let attributes: Vec<KeyValue> = span
            .attributes
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), attribute_value(value)))
            .collect();

        let mut otel_span = self
            .inner
            .tracer
            .span_builder(span.name.clone())
            .with_trace_id(trace_id)
            .with_span_id(span_id)
            .with_start_time(SystemTime::from(span.start_time))
            .with_attributes(attributes)
            .with_status(span_status(span.status))
            .start(&self.inner.tracer);
        otel_span.end_with_timestamp(SystemTime::from(span.end_time));
    }

    fn export_log(&self, record: LogRecord) {
        let mut log = self.inner.logger.create_log_record();
        log.set_timestamp(SystemTime::from(record.timestamp));
        log.set_observed_timestamp(SystemTime::now());
        log.set_severity_number(severity_number(record.severity));
        log.set_severity_text(severity_text(record.severity));
        log.set_body(AnyValue::from(record.message));

        if let Some(ctx) = record.span_context {
            if let (Ok(trace_id), Ok(span_id)) = (
                TraceId::from_hex(&ctx.trace_id),
                SpanId::from_hex(&ctx.span_id),
            ) {
                log.set_trace_context(trace_id, span_id, Some(TraceFlags::SAMPLED));
            }
        }

        self.inner.logger.emit(log);
    }

    fn add_to_counter(&self, delta: u64) {
        self.inner.counter.add(delta, &[]);
    }
}

fn build_resource(config: &EmitterConfig) -> Resource {
    let mut builder = Resource::builder().with_service_name(config.service_name.clone());
    for (key, value) in &config.resource_attributes {
        builder = builder.with_attribute(KeyValue::new(key.clone(), value.clone()));
    }
    builder.build()
}

fn span_status(status: SpanStatus) -> Status {
    match status {
        SpanStatus::Unset => Status::Unset,
        SpanStatus::Ok => Status::Ok,
        SpanStatus::Error => Status::error(""),
    }
}

fn severity_number(severity: Severity) -> opentelemetry::logs::Severity {
    match severity {
        Severity::Debug => opentelemetry::logs::Severity::Debug,
        Severity::Info => opentelemetry::logs::Severity::Info,
        Severity::Warn => opentelemetry::logs::Severity::Warn,
        Severity::Error => opentelemetry::logs::Severity::Error,
    }
}

fn severity_text(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => "DEBUG",
        Severity::Info => "INFO",
        Severity::Warn => "WARN",
        Severity::Error => "ERROR",
    }
}

fn attribute_value(value: &serde_json::Value) -> opentelemetry::Value {
    match value {
        serde_json::Value::Bool(flag) => (*flag).into(),
        serde_json::Value::Number(number) if number.is_i64() => {
            number.as_i64().unwrap_or_default().into()
        }
        serde_json::Value::Number(number) => number.as_f64().unwrap_or_default().into(),
        serde_json::Value::String(text) => text.clone().into(),
        other => other.to_string().into(),
    }
}
