//! The named verification check suite.
//!
//! Each check mirrors one of the stack's integration scenarios: dashboard
//! health, datasource inventory health, per-backend connectivity, and
//! signal presence for logs, traces, and metrics. Checks are selectable by
//! name from the CLI; `prometheus-metrics` is the one check that tolerates
//! ingestion lag through the retrying verifier, since scrape-based
//! ingestion trails emission by several seconds.

use crate::client::GrafanaClient;
use crate::queries;
use anyhow::{ensure, Context, Result};
use shared::verify::{RetryPolicy, RetryingVerifier};

/// A named verification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Dashboard reachability and database health.
    GrafanaHealth,
    /// Health of every configured datasource.
    GrafanaDatasources,
    /// ClickHouse reachability via the dashboard.
    ClickhouseConnection,
    /// Presence of emitted log records in ClickHouse.
    ClickhouseLogs,
    /// Presence of emitted trace spans in ClickHouse.
    ClickhouseTraces,
    /// Presence of the emitted counter in ClickHouse.
    ClickhouseMetrics,
    /// Prometheus reachability via the dashboard.
    PrometheusConnection,
    /// Presence of the emitted counter in Prometheus, with retry.
    PrometheusMetrics,
}

impl Check {
    /// Every check, in execution order.
    pub const ALL: [Check; 8] = [
        Check::GrafanaHealth,
        Check::GrafanaDatasources,
        Check::ClickhouseConnection,
        Check::ClickhouseLogs,
        Check::ClickhouseTraces,
        Check::ClickhouseMetrics,
        Check::PrometheusConnection,
        Check::PrometheusMetrics,
    ];

    /// Returns the check's CLI name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Check::GrafanaHealth => "grafana-health",
            Check::GrafanaDatasources => "grafana-datasources",
            Check::ClickhouseConnection => "clickhouse-connection",
            Check::ClickhouseLogs => "clickhouse-logs",
            Check::ClickhouseTraces => "clickhouse-traces",
            Check::ClickhouseMetrics => "clickhouse-metrics",
            Check::PrometheusConnection => "prometheus-connection",
            Check::PrometheusMetrics => "prometheus-metrics",
        }
    }

    /// Resolves a CLI name back to its check.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|check| check.name() == name)
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of running a selection of checks.
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Checks that passed.
    pub passed: Vec<Check>,
    /// Checks that failed, with their failure messages.
    pub failed: Vec<(Check, String)>,
}

impl CheckSummary {
    /// Returns true if no check failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs verification checks against one dashboard instance.
pub struct CheckRunner {
    client: GrafanaClient,
    policy: RetryPolicy,
}

impl CheckRunner {
    /// Creates a runner over the given client and retry policy.
    #[must_use]
    pub fn new(client: GrafanaClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Runs a single check.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first failed expectation, naming the
    /// datasource and the observed status/count.
    pub async fn run(&self, check: Check) -> Result<()> {
        match check {
            Check::GrafanaHealth => self.grafana_health().await,
            Check::GrafanaDatasources => self.grafana_datasources().await,
            Check::ClickhouseConnection => {
                self.datasource_connection(queries::CLICKHOUSE_DATASOURCE_NAME)
                    .await
            }
            Check::ClickhouseLogs => self.clickhouse_signal(check).await,
            Check::ClickhouseTraces => self.clickhouse_signal(check).await,
            Check::ClickhouseMetrics => self.clickhouse_signal(check).await,
            Check::PrometheusConnection => {
                self.datasource_connection(queries::PROMETHEUS_DATASOURCE_NAME)
                    .await
            }
            Check::PrometheusMetrics => self.prometheus_metrics().await,
        }
    }

    /// Runs every check in `checks`, collecting pass/fail results.
    pub async fn run_many(&self, checks: &[Check]) -> CheckSummary {
        let mut summary = CheckSummary::default();

        for &check in checks {
            match self.run(check).await {
                Ok(()) => {
                    tracing::info!(check = %check, "Check passed");
                    summary.passed.push(check);
                }
                Err(error) => {
                    tracing::error!(check = %check, error = %error, "Check failed");
                    summary.failed.push((check, format!("{error:#}")));
                }
            }
        }

        summary
    }

    async fn grafana_health(&self) -> Result<()> {
        let health = self
            .client
            .health()
            .await
            .context("Failed to connect to Grafana")?;
        ensure!(
            health.is_ok(),
            "Expected health database status to be 'ok', got '{}'",
            health.database
        );
        Ok(())
    }

    async fn grafana_datasources(&self) -> Result<()> {
        let datasources = self
            .client
            .list_datasources()
            .await
            .context("Failed to list datasources")?;

        for datasource in datasources {
            let health = self
                .client
                .datasource_health(&datasource.uid)
                .await
                .with_context(|| {
                    format!(
                        "Failed health inquiry for Datasource.name={}",
                        datasource.name
                    )
                })?;
            ensure!(
                health.is_ok(),
                "Expected Datasource.name={} to be healthy, got status '{}': {}",
                datasource.name,
                health.status,
                health.message
            );
        }
        Ok(())
    }

    async fn datasource_connection(&self, name: &str) -> Result<()> {
        let datasource = self
            .client
            .find_datasource(name)
            .await
            .with_context(|| format!("Failed to fetch datasource '{name}'"))?;

        let health = self
            .client
            .datasource_health(&datasource.uid)
            .await
            .with_context(|| format!("Failed health inquiry for Datasource.name={name}"))?;
        ensure!(
            health.is_ok(),
            "Expected Datasource.name={name} to be healthy, got status '{}': {}",
            health.status,
            health.message
        );
        Ok(())
    }

    async fn clickhouse_signal(&self, check: Check) -> Result<()> {
        let datasource = self
            .client
            .find_datasource(queries::CLICKHOUSE_DATASOURCE_NAME)
            .await
            .context("Failed to fetch ClickHouse datasource")?;

        let (payload, signal) = match check {
            Check::ClickhouseLogs => (queries::clickhouse_logs_query(&datasource), "log"),
            Check::ClickhouseTraces => (queries::clickhouse_traces_query(&datasource), "trace"),
            Check::ClickhouseMetrics => (queries::clickhouse_metrics_query(&datasource), "metric"),
            other => anyhow::bail!("'{other}' is not a ClickHouse signal check"),
        };

        let result = self
            .client
            .query_datasource(&payload)
            .await
            .with_context(|| {
                format!(
                    "Failed to query Datasource.name={}",
                    queries::CLICKHOUSE_DATASOURCE_NAME
                )
            })?;

        let status = result.status(queries::CLICKHOUSE_REF_ID);
        ensure!(
            status == Some(200),
            "Failed to query Datasource.name={}, got status={status:?}",
            queries::CLICKHOUSE_DATASOURCE_NAME
        );

        let count = result.value_count(queries::CLICKHOUSE_REF_ID);
        ensure!(
            count > 0,
            "Failed to fetch OTel {signal} entries in Datasource.name={}: query matched nothing",
            queries::CLICKHOUSE_DATASOURCE_NAME
        );
        Ok(())
    }

    async fn prometheus_metrics(&self) -> Result<()> {
        let datasource = self
            .client
            .find_datasource(queries::PROMETHEUS_DATASOURCE_NAME)
            .await
            .context("Failed to fetch Prometheus datasource")?;

        let payload = queries::prometheus_counter_query(&datasource);
        let verifier = RetryingVerifier::new(self.client.clone(), self.policy);
        let outcome = verifier
            .verify_non_empty(&datasource, &payload, |result| {
                result.value_count(queries::PROMETHEUS_REF_ID)
            })
            .await;

        ensure!(outcome.is_success(), "{outcome}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_names_round_trip() {
        for check in Check::ALL {
            assert_eq!(Check::from_name(check.name()), Some(check));
        }
    }

    #[test]
    fn test_check_from_unknown_name() {
        assert_eq!(Check::from_name("nonexistent-check"), None);
    }

    #[test]
    fn test_check_display_matches_name() {
        assert_eq!(Check::PrometheusMetrics.to_string(), "prometheus-metrics");
        assert_eq!(Check::ClickhouseLogs.to_string(), "clickhouse-logs");
    }

    #[test]
    fn test_summary_all_passed() {
        let mut summary = CheckSummary::default();
        assert!(summary.all_passed());

        summary.passed.push(Check::GrafanaHealth);
        assert!(summary.all_passed());

        summary
            .failed
            .push((Check::ClickhouseLogs, "empty".to_string()));
        assert!(!summary.all_passed());
    }
}
