//! Grafana HTTP API client.
//!
//! Thin reqwest wrapper over the handful of dashboard endpoints the
//! verification harness needs: instance health, datasource inventory,
//! datasource resolution by name, per-datasource health inquiry, and query
//! execution. The client is the workspace's [`BackendProbe`]
//! implementation.

use crate::config::{Credentials, GrafanaConfig};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::models::{DatasourceRef, QueryRequest, QueryResult};
use shared::verify::{BackendProbe, ProbeError};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while talking to the Grafana API.
#[derive(Debug, Error)]
pub enum GrafanaClientError {
    /// The configured base URL could not be parsed.
    #[error("Invalid Grafana URL '{0}': {1}")]
    Url(String, #[source] url::ParseError),

    /// The configured credentials could not be encoded into a header.
    #[error("Invalid Grafana credentials: {0}")]
    Credentials(String),

    /// The HTTP client itself could not be constructed.
    #[error("Failed to construct HTTP client: {0}")]
    Construction(#[source] reqwest::Error),

    /// Grafana could not be reached.
    #[error("Failed to reach Grafana at {url}: {source}")]
    Connection {
        /// The URL that was being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A datasource name could not be resolved.
    #[error("Datasource '{0}' not found")]
    DatasourceNotFound(String),

    /// Grafana answered with a non-success status code.
    #[error("Grafana returned status {status} for {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that was being requested.
        url: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode Grafana response from {url}: {source}")]
    Decode {
        /// The URL that was being requested.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl From<GrafanaClientError> for ProbeError {
    fn from(error: GrafanaClientError) -> Self {
        match error {
            GrafanaClientError::DatasourceNotFound(name) => ProbeError::NotFound(name),
            GrafanaClientError::Decode { .. } => ProbeError::Decode(error.to_string()),
            other => ProbeError::Connection(other.to_string()),
        }
    }
}

/// Grafana instance health, as reported by `/api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    /// Database health indicator; "ok" when the instance is healthy.
    #[serde(default)]
    pub database: String,

    /// Grafana version string.
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthInfo {
    /// Returns true if the instance reports a healthy database.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.database == "ok"
    }
}

/// A datasource as listed by the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceInfo {
    /// Numeric identifier.
    #[serde(default)]
    pub id: i64,
    /// Unique identifier used in query payloads.
    pub uid: String,
    /// Human-readable name.
    pub name: String,
    /// Datasource plugin type.
    #[serde(rename = "type")]
    pub ds_type: String,
}

impl From<DatasourceInfo> for DatasourceRef {
    fn from(info: DatasourceInfo) -> Self {
        Self {
            name: info.name,
            uid: info.uid,
            ds_type: info.ds_type,
        }
    }
}

/// Result of a per-datasource health inquiry.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceHealth {
    /// Health status; "OK" when the datasource is working.
    #[serde(default)]
    pub status: String,

    /// Human-readable detail message.
    #[serde(default)]
    pub message: String,
}

impl DatasourceHealth {
    /// Returns true if the datasource reports itself as working.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Client for the Grafana HTTP API.
///
/// # Example
///
/// ```no_run
/// use verifier::client::GrafanaClient;
/// use verifier::config::GrafanaConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = GrafanaClient::new(&GrafanaConfig::from_env()?)?;
/// let health = client.health().await?;
/// assert!(health.is_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GrafanaClient {
    /// Creates a client from connection configuration.
    ///
    /// Credentials are baked into the client's default headers, so
    /// misconfiguration surfaces here rather than on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed, the credentials
    /// cannot be encoded, or the HTTP client cannot be constructed.
    pub fn new(config: &GrafanaConfig) -> Result<Self, GrafanaClientError> {
        let base_url = Url::parse(&config.url)
            .map_err(|source| GrafanaClientError::Url(config.url.clone(), source))?;

        let mut headers = HeaderMap::new();
        if let Some(value) = authorization_header(&config.credentials)? {
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(GrafanaClientError::Construction)?;

        Ok(Self { http, base_url })
    }

    /// Checks instance health via `/api/health`.
    ///
    /// # Errors
    ///
    /// Returns an error if Grafana is unreachable or answers with a
    /// non-success status.
    pub async fn health(&self) -> Result<HealthInfo, GrafanaClientError> {
        self.get_json("api/health").await
    }

    /// Lists all configured datasources.
    ///
    /// # Errors
    ///
    /// Returns an error if Grafana is unreachable or answers with a
    /// non-success status.
    pub async fn list_datasources(&self) -> Result<Vec<DatasourceInfo>, GrafanaClientError> {
        self.get_json("api/datasources").await
    }

    /// Resolves a datasource by its human-readable name.
    ///
    /// Resolution is idempotent: repeated lookups of the same name within a
    /// session yield the same identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`GrafanaClientError::DatasourceNotFound`] if no datasource
    /// carries the given name, and transport errors otherwise.
    pub async fn find_datasource(&self, name: &str) -> Result<DatasourceRef, GrafanaClientError> {
        let path = format!("api/datasources/name/{name}");
        match self.get_json::<DatasourceInfo>(&path).await {
            Ok(info) => Ok(info.into()),
            Err(GrafanaClientError::Status { status: 404, .. }) => {
                Err(GrafanaClientError::DatasourceNotFound(name.to_string()))
            }
            Err(other) => Err(other),
        }
    }

    /// Runs the health inquiry for a single datasource.
    ///
    /// # Errors
    ///
    /// Returns an error if Grafana is unreachable or answers with a
    /// non-success status.
    pub async fn datasource_health(
        &self,
        uid: &str,
    ) -> Result<DatasourceHealth, GrafanaClientError> {
        let path = format!("api/datasources/uid/{uid}/health");
        self.get_json(&path).await
    }

    /// Executes a query payload via `/api/ds/query`.
    ///
    /// The payload is passed through untouched; per-sub-query statuses are
    /// reported inside the returned [`QueryResult`], not as client errors.
    ///
    /// # Errors
    ///
    /// Returns an error if Grafana is unreachable or the response cannot be
    /// decoded.
    pub async fn query_datasource(
        &self,
        payload: &QueryRequest,
    ) -> Result<QueryResult, GrafanaClientError> {
        self.post_json("api/ds/query", payload).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GrafanaClientError> {
        let url = self.join(path)?;
        let response =
            self.http
                .get(url.clone())
                .send()
                .await
                .map_err(|source| GrafanaClientError::Connection {
                    url: url.to_string(),
                    source,
                })?;
        Self::decode(url, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GrafanaClientError> {
        let url = self.join(path)?;
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| GrafanaClientError::Connection {
                url: url.to_string(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        url: Url,
        response: reqwest::Response,
    ) -> Result<T, GrafanaClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GrafanaClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| GrafanaClientError::Decode {
                url: url.to_string(),
                source,
            })
    }

    fn join(&self, path: &str) -> Result<Url, GrafanaClientError> {
        self.base_url
            .join(path)
            .map_err(|source| GrafanaClientError::Url(self.base_url.to_string(), source))
    }
}

#[async_trait]
impl BackendProbe for GrafanaClient {
    async fn query(
        &self,
        datasource: &DatasourceRef,
        payload: &QueryRequest,
    ) -> Result<QueryResult, ProbeError> {
        tracing::debug!(datasource = %datasource.name, "Issuing datasource query");
        self.query_datasource(payload).await.map_err(ProbeError::from)
    }
}

fn authorization_header(
    credentials: &Credentials,
) -> Result<Option<HeaderValue>, GrafanaClientError> {
    let raw = match credentials {
        Credentials::Anonymous => return Ok(None),
        Credentials::Token(token) => format!("Bearer {token}"),
        Credentials::Basic { username, password } => {
            let encoded = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{password}"));
            format!("Basic {encoded}")
        }
    };

    let mut value = HeaderValue::from_str(&raw)
        .map_err(|error| GrafanaClientError::Credentials(error.to_string()))?;
    value.set_sensitive(true);
    Ok(Some(value))
}
