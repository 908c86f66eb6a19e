//! Emitter configuration module.
//!
//! Handles loading configuration from environment variables with sensible
//! defaults matching the local development stack.

use anyhow::Result;

/// Emitter configuration.
///
/// Configuration values can be set via environment variables:
/// - `SIGNALGEN_OTLP_ENDPOINT`: OTLP collector address (default: "http://localhost:4317")
/// - `SIGNALGEN_OTLP_INSECURE`: use plaintext transport (default: true)
/// - `SIGNALGEN_SERVICE_NAME`: value of the `service.name` resource attribute (default: "hello-world")
/// - `SIGNALGEN_METRIC_EXPORT_INTERVAL_MS`: metric export period in milliseconds (default: 1000)
/// - `SIGNALGEN_RESOURCE_ATTRIBUTES`: extra resource attributes as "key=value,key=value" (default: empty)
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// OTLP collector address, either a full URL or a bare `host:port`.
    pub endpoint: String,
    /// Whether to use plaintext transport instead of TLS.
    pub insecure: bool,
    /// Value of the `service.name` resource attribute.
    pub service_name: String,
    /// Metric export period in milliseconds.
    pub metric_export_interval_ms: u64,
    /// Extra resource attributes shared by all three export channels.
    pub resource_attributes: Vec<(String, String)>,
}

impl EmitterConfig {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SIGNALGEN_METRIC_EXPORT_INTERVAL_MS` is set but
    /// cannot be parsed as an integer.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SIGNALGEN_OTLP_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4317".to_string());

        let insecure = std::env::var("SIGNALGEN_OTLP_INSECURE")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let service_name = std::env::var("SIGNALGEN_SERVICE_NAME")
            .unwrap_or_else(|_| "hello-world".to_string());

        let metric_export_interval_ms = std::env::var("SIGNALGEN_METRIC_EXPORT_INTERVAL_MS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()?
            .unwrap_or(1000);

        let resource_attributes = std::env::var("SIGNALGEN_RESOURCE_ATTRIBUTES")
            .map(|v| parse_attributes(&v))
            .unwrap_or_default();

        Ok(Self {
            endpoint,
            insecure,
            service_name,
            metric_export_interval_ms,
            resource_attributes,
        })
    }

    /// Returns the endpoint as a full URL, deriving the scheme from the
    /// transport-security flag when the configured value is a bare
    /// `host:port`.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.insecure {
            format!("http://{}", self.endpoint)
        } else {
            format!("https://{}", self.endpoint)
        }
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4317".to_string(),
            insecure: true,
            service_name: "hello-world".to_string(),
            metric_export_interval_ms: 1000,
            resource_attributes: Vec::new(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_attributes(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter_map(|pair| {
            let (key, val) = pair.split_once('=')?;
            let key = key.trim();
            let val = val.trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), val.to_string()))
            }
        })
        .collect()
}
