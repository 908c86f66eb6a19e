//! Integration tests for the Signalgen verifier.
//!
//! These tests run the Grafana client and the check suite against an
//! in-process mock of the dashboard API, covering datasource resolution,
//! query execution, and the retry protocol end to end.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use verifier::{Credentials, GrafanaClient, GrafanaConfig};

/// In-process stand-in for the Grafana HTTP API.
#[derive(Clone, Default)]
struct MockGrafana {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    datasources: Vec<Value>,
    query_responses: Mutex<Vec<Value>>,
    query_calls: AtomicUsize,
    required_token: Option<String>,
}

impl MockGrafana {
    fn new() -> Self {
        Self::default()
    }

    fn with_datasource(mut self, name: &str, uid: &str, ds_type: &str) -> Self {
        let state = Arc::get_mut(&mut self.inner).unwrap();
        state.datasources.push(json!({
            "id": state.datasources.len() + 1,
            "uid": uid,
            "name": name,
            "type": ds_type,
        }));
        self
    }

    /// Queues query responses, served in order; the last one repeats.
    fn with_query_responses(mut self, responses: Vec<Value>) -> Self {
        let state = Arc::get_mut(&mut self.inner).unwrap();
        state.query_responses = Mutex::new(responses);
        self
    }

    fn with_required_token(mut self, token: &str) -> Self {
        let state = Arc::get_mut(&mut self.inner).unwrap();
        state.required_token = Some(token.to_string());
        self
    }

    fn query_calls(&self) -> usize {
        self.inner.query_calls.load(Ordering::SeqCst)
    }

    async fn serve(&self) -> SocketAddr {
        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/datasources", get(list_datasources))
            .route("/api/datasources/name/{name}", get(find_datasource))
            .route("/api/datasources/uid/{uid}/health", get(datasource_health))
            .route("/api/ds/query", post(ds_query))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

async fn health(
    State(mock): State<MockGrafana>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if let Some(token) = &mock.inner.required_token {
        let expected = format!("Bearer {token}");
        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some(expected.as_str());
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
        }
    }
    (
        StatusCode::OK,
        Json(json!({"database": "ok", "version": "11.0.0"})),
    )
}

async fn list_datasources(State(mock): State<MockGrafana>) -> Json<Value> {
    Json(Value::Array(mock.inner.datasources.clone()))
}

async fn find_datasource(
    State(mock): State<MockGrafana>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    let found = mock
        .inner
        .datasources
        .iter()
        .find(|ds| ds["name"] == json!(name));

    match found {
        Some(ds) => (StatusCode::OK, Json(ds.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Data source not found"})),
        ),
    }
}

async fn datasource_health(
    State(_mock): State<MockGrafana>,
    Path(_uid): Path<String>,
) -> Json<Value> {
    Json(json!({"status": "OK", "message": "Data source is working"}))
}

async fn ds_query(State(mock): State<MockGrafana>, _body: Json<Value>) -> Json<Value> {
    mock.inner.query_calls.fetch_add(1, Ordering::SeqCst);

    let mut responses = mock.inner.query_responses.lock().unwrap();
    let response = if responses.len() > 1 {
        responses.remove(0)
    } else if let Some(last) = responses.first() {
        last.clone()
    } else {
        empty_result("A")
    };
    Json(response)
}

fn empty_result(ref_id: &str) -> Value {
    json!({"results": {ref_id: {"status": 200, "frames": [{"data": {"values": []}}]}}})
}

fn data_result(ref_id: &str) -> Value {
    json!({
        "results": {
            ref_id: {
                "status": 200,
                "frames": [
                    {"data": {"values": [[1_700_000_000, 1_700_000_001], [1.0, 2.0]]}}
                ]
            }
        }
    })
}

fn client_for(addr: SocketAddr) -> GrafanaClient {
    let config = GrafanaConfig {
        url: format!("http://{addr}"),
        credentials: Credentials::Anonymous,
    };
    GrafanaClient::new(&config).unwrap()
}

// ============================================================================
// CLIENT TESTS
// ============================================================================

mod client {
    use super::*;
    use verifier::GrafanaClientError;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let mock = MockGrafana::new();
        let addr = mock.serve().await;
        let client = client_for(addr);

        let health = client.health().await.unwrap();

        assert!(health.is_ok());
        assert_eq!(health.version.as_deref(), Some("11.0.0"));
    }

    #[tokio::test]
    async fn test_find_datasource_resolves_by_name() {
        let mock = MockGrafana::new().with_datasource(
            "ClickHouse",
            "PDEE91DDB90597936",
            "grafana-clickhouse-datasource",
        );
        let addr = mock.serve().await;
        let client = client_for(addr);

        let ds = client.find_datasource("ClickHouse").await.unwrap();

        assert_eq!(ds.name, "ClickHouse");
        assert_eq!(ds.uid, "PDEE91DDB90597936");
        assert_eq!(ds.ds_type, "grafana-clickhouse-datasource");
    }

    #[tokio::test]
    async fn test_find_datasource_is_idempotent() {
        let mock = MockGrafana::new().with_datasource(
            "ClickHouse",
            "PDEE91DDB90597936",
            "grafana-clickhouse-datasource",
        );
        let addr = mock.serve().await;
        let client = client_for(addr);

        let first = client.find_datasource("ClickHouse").await.unwrap();
        let second = client.find_datasource("ClickHouse").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_find_datasource_unknown_name_is_not_found() {
        let mock = MockGrafana::new();
        let addr = mock.serve().await;
        let client = client_for(addr);

        let result = client.find_datasource("Nonexistent").await;

        assert!(matches!(
            result,
            Err(GrafanaClientError::DatasourceNotFound(name)) if name == "Nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_dashboard_is_connection_error() {
        // Nothing listens on this port
        let config = GrafanaConfig {
            url: "http://127.0.0.1:1".to_string(),
            credentials: Credentials::Anonymous,
        };
        let client = GrafanaClient::new(&config).unwrap();

        let result = client.health().await;

        assert!(matches!(
            result,
            Err(GrafanaClientError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_datasource_parses_frames() {
        let mock = MockGrafana::new().with_query_responses(vec![data_result("A")]);
        let addr = mock.serve().await;
        let client = client_for(addr);

        let result = client
            .query_datasource(&shared::models::QueryRequest::default())
            .await
            .unwrap();

        assert_eq!(result.status("A"), Some(200));
        assert_eq!(result.value_count("A"), 2);
        assert!(result.all_success());
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let mock = MockGrafana::new().with_required_token("glsa_secret");
        let addr = mock.serve().await;

        let config = GrafanaConfig {
            url: format!("http://{addr}"),
            credentials: Credentials::Token("glsa_secret".to_string()),
        };
        let authorized = GrafanaClient::new(&config).unwrap();
        assert!(authorized.health().await.unwrap().is_ok());

        let anonymous = client_for(addr);
        let result = anonymous.health().await;
        assert!(matches!(
            result,
            Err(GrafanaClientError::Status { status: 401, .. })
        ));
    }
}

// ============================================================================
// CHECK SUITE TESTS
// ============================================================================

mod checks {
    use super::*;
    use shared::verify::RetryPolicy;
    use std::time::Duration;
    use verifier::{Check, CheckRunner};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(4, Duration::from_millis(10))
    }

    fn runner_for(addr: SocketAddr) -> CheckRunner {
        CheckRunner::new(client_for(addr), fast_policy())
    }

    fn full_mock() -> MockGrafana {
        MockGrafana::new()
            .with_datasource(
                "ClickHouse",
                "ch-uid",
                "grafana-clickhouse-datasource",
            )
            .with_datasource("Prometheus", "prom-uid", "prometheus")
    }

    #[tokio::test]
    async fn test_grafana_health_check_passes() {
        let addr = full_mock().serve().await;

        let result = runner_for(addr).run(Check::GrafanaHealth).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_grafana_datasources_check_passes() {
        let addr = full_mock().serve().await;

        let result = runner_for(addr).run(Check::GrafanaDatasources).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_clickhouse_logs_check_passes_on_data() {
        let mock = full_mock().with_query_responses(vec![data_result("A")]);
        let addr = mock.serve().await;

        let result = runner_for(addr).run(Check::ClickhouseLogs).await;

        assert!(result.is_ok());
        assert_eq!(mock.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_clickhouse_logs_check_fails_on_empty_result() {
        let mock = full_mock().with_query_responses(vec![empty_result("A")]);
        let addr = mock.serve().await;

        let result = runner_for(addr).run(Check::ClickhouseLogs).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("ClickHouse"));
        // The ClickHouse signal checks are single-shot
        assert_eq!(mock.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_datasource_short_circuits_without_querying() {
        let mock = MockGrafana::new();
        let addr = mock.serve().await;

        let result = runner_for(addr).run(Check::ClickhouseLogs).await;

        assert!(result.is_err());
        assert_eq!(mock.query_calls(), 0);
    }

    #[tokio::test]
    async fn test_prometheus_metrics_check_retries_until_data_arrives() {
        let mock = full_mock().with_query_responses(vec![
            empty_result("test"),
            empty_result("test"),
            data_result("test"),
        ]);
        let addr = mock.serve().await;

        let result = runner_for(addr).run(Check::PrometheusMetrics).await;

        assert!(result.is_ok());
        assert_eq!(mock.query_calls(), 3);
    }

    #[tokio::test]
    async fn test_prometheus_metrics_check_exhausts_on_persistent_emptiness() {
        let mock = full_mock().with_query_responses(vec![empty_result("test")]);
        let addr = mock.serve().await;

        let result = runner_for(addr).run(Check::PrometheusMetrics).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Prometheus"));
        assert!(message.contains("4 attempts"));
        assert_eq!(mock.query_calls(), 4);
    }

    #[tokio::test]
    async fn test_run_many_collects_passes_and_failures() {
        let mock = full_mock().with_query_responses(vec![empty_result("A")]);
        let addr = mock.serve().await;

        let summary = runner_for(addr)
            .run_many(&[Check::GrafanaHealth, Check::ClickhouseLogs])
            .await;

        assert_eq!(summary.passed, vec![Check::GrafanaHealth]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, Check::ClickhouseLogs);
        assert!(!summary.all_passed());
    }
}
