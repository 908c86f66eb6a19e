//! Query payload builders.
//!
//! One builder per verification target, producing the `/api/ds/query`
//! payload for that backend. The ClickHouse builders issue raw SQL against
//! the OTel tables; the Prometheus builder issues a range expression over
//! the exported counter. Time windows are kept narrow so a freshly started
//! stack only has to ingest a few seconds of data to satisfy them.

use shared::models::{DataQuery, DatasourceRef, DatasourceSelector, QueryRequest};

/// Name of the ClickHouse datasource configured in the dashboard.
pub const CLICKHOUSE_DATASOURCE_NAME: &str = "ClickHouse";

/// Name of the Prometheus datasource configured in the dashboard.
pub const PROMETHEUS_DATASOURCE_NAME: &str = "Prometheus";

/// Sub-query identifier used by the ClickHouse builders.
pub const CLICKHOUSE_REF_ID: &str = "A";

/// Sub-query identifier used by the Prometheus builder.
pub const PROMETHEUS_REF_ID: &str = "test";

/// Prometheus series name of the exported tick counter.
///
/// The collector appends the `_total` suffix when translating a monotonic
/// OTLP sum into a Prometheus counter.
pub const PROMETHEUS_COUNTER_SERIES: &str = "metric_counter_total";

const TIME_WINDOW_FROM: &str = "now-1h";
const TIME_WINDOW_TO: &str = "now";

/// Builds the log-presence query: recent OTel log rows whose body matches
/// the emitter's INFO message.
#[must_use]
pub fn clickhouse_logs_query(ds: &DatasourceRef) -> QueryRequest {
    let raw_sql = "SELECT Timestamp as \"timestamp\", Body as \"body\" \
                   FROM \"otel\".\"otel_logs\" \
                   WHERE ( timestamp >= $__fromTime ) AND ( body LIKE '%Started a new trace%' ) \
                   ORDER BY timestamp DESC LIMIT 10";

    QueryRequest::single(
        DataQuery {
            ref_id: CLICKHOUSE_REF_ID.to_string(),
            datasource: Some(DatasourceSelector::from(ds)),
            editor_type: Some("sql".to_string()),
            raw_sql: Some(raw_sql.to_string()),
            ..DataQuery::default()
        },
        TIME_WINDOW_FROM,
        TIME_WINDOW_TO,
    )
}

/// Builds the trace-presence query: recent root spans with non-zero
/// duration from the emitter's service.
#[must_use]
pub fn clickhouse_traces_query(ds: &DatasourceRef) -> QueryRequest {
    let raw_sql = "SELECT \"TraceId\" as traceID \
                   FROM \"otel\".\"otel_traces\" \
                   WHERE ( Timestamp >= $__fromTime ) AND ( ParentSpanId = '' ) \
                   AND ( Duration > 0 ) AND ( ServiceName LIKE '%hello-world%' ) \
                   ORDER BY Timestamp DESC LIMIT 10";

    QueryRequest::single(
        DataQuery {
            ref_id: CLICKHOUSE_REF_ID.to_string(),
            datasource: Some(DatasourceSelector::from(ds)),
            editor_type: Some("builder".to_string()),
            raw_sql: Some(raw_sql.to_string()),
            format: Some(serde_json::json!(1)),
            query_type: Some("traces".to_string()),
            ..DataQuery::default()
        },
        TIME_WINDOW_FROM,
        TIME_WINDOW_TO,
    )
}

/// Builds the metric-presence query: recent samples of the exported tick
/// counter.
#[must_use]
pub fn clickhouse_metrics_query(ds: &DatasourceRef) -> QueryRequest {
    let raw_sql = "SELECT TimeUnix as \"time\", Value \
                   FROM \"otel\".\"otel_metrics_sum\" \
                   WHERE ( time >= $__fromTime ) AND ( MetricName = 'metric_counter' ) \
                   ORDER BY time ASC LIMIT 10";

    QueryRequest::single(
        DataQuery {
            ref_id: CLICKHOUSE_REF_ID.to_string(),
            datasource: Some(DatasourceSelector::from(ds)),
            editor_type: Some("builder".to_string()),
            raw_sql: Some(raw_sql.to_string()),
            format: Some(serde_json::json!(1)),
            query_type: Some("timeseries".to_string()),
            ..DataQuery::default()
        },
        TIME_WINDOW_FROM,
        TIME_WINDOW_TO,
    )
}

/// Builds the Prometheus counter query.
#[must_use]
pub fn prometheus_counter_query(ds: &DatasourceRef) -> QueryRequest {
    QueryRequest::single(
        DataQuery {
            ref_id: PROMETHEUS_REF_ID.to_string(),
            datasource: Some(DatasourceSelector::from(ds)),
            expr: Some(PROMETHEUS_COUNTER_SERIES.to_string()),
            range: Some(true),
            format: Some(serde_json::json!("time_series")),
            ..DataQuery::default()
        },
        TIME_WINDOW_FROM,
        TIME_WINDOW_TO,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clickhouse_ref() -> DatasourceRef {
        DatasourceRef {
            name: CLICKHOUSE_DATASOURCE_NAME.to_string(),
            uid: "ch-uid".to_string(),
            ds_type: "grafana-clickhouse-datasource".to_string(),
        }
    }

    fn prometheus_ref() -> DatasourceRef {
        DatasourceRef {
            name: PROMETHEUS_DATASOURCE_NAME.to_string(),
            uid: "prom-uid".to_string(),
            ds_type: "prometheus".to_string(),
        }
    }

    #[test]
    fn test_clickhouse_logs_query_shape() {
        let request = clickhouse_logs_query(&clickhouse_ref());

        assert_eq!(request.queries.len(), 1);
        let query = &request.queries[0];
        assert_eq!(query.ref_id, CLICKHOUSE_REF_ID);
        assert_eq!(query.editor_type.as_deref(), Some("sql"));

        let sql = query.raw_sql.as_deref().unwrap();
        assert!(sql.contains("otel_logs"));
        assert!(sql.contains("Started a new trace"));
        assert!(sql.contains("$__fromTime"));
    }

    #[test]
    fn test_clickhouse_traces_query_targets_root_spans() {
        let request = clickhouse_traces_query(&clickhouse_ref());
        let query = &request.queries[0];

        assert_eq!(query.query_type.as_deref(), Some("traces"));
        let sql = query.raw_sql.as_deref().unwrap();
        assert!(sql.contains("otel_traces"));
        assert!(sql.contains("ParentSpanId = ''"));
        assert!(sql.contains("Duration > 0"));
        assert!(sql.contains("hello-world"));
    }

    #[test]
    fn test_clickhouse_metrics_query_filters_counter() {
        let request = clickhouse_metrics_query(&clickhouse_ref());
        let query = &request.queries[0];

        assert_eq!(query.query_type.as_deref(), Some("timeseries"));
        let sql = query.raw_sql.as_deref().unwrap();
        assert!(sql.contains("otel_metrics_sum"));
        assert!(sql.contains("metric_counter"));
    }

    #[test]
    fn test_prometheus_counter_query_shape() {
        let request = prometheus_counter_query(&prometheus_ref());
        let query = &request.queries[0];

        assert_eq!(query.ref_id, PROMETHEUS_REF_ID);
        assert_eq!(query.expr.as_deref(), Some(PROMETHEUS_COUNTER_SERIES));
        assert_eq!(query.range, Some(true));
        assert!(query.raw_sql.is_none());
    }

    #[test]
    fn test_queries_embed_resolved_uid() {
        let ds = clickhouse_ref();
        for request in [
            clickhouse_logs_query(&ds),
            clickhouse_traces_query(&ds),
            clickhouse_metrics_query(&ds),
        ] {
            let selector = request.queries[0].datasource.as_ref().unwrap();
            assert_eq!(selector.uid, "ch-uid");
            assert_eq!(selector.ds_type, "grafana-clickhouse-datasource");
        }
    }
}
