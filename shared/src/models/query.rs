//! Dashboard datasource query models.
//!
//! Wire shapes for the dashboard's `/api/ds/query` endpoint: the request
//! body (a list of per-datasource sub-queries) and the response (one result
//! per sub-query, each carrying a status code and column-oriented data
//! frames). The payload is opaque to the probe that transmits it; these
//! types only pin down the parts the verifier inspects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved datasource: human-readable name plus the identifiers the
/// dashboard assigned to it.
///
/// Resolved once per run by name lookup and read-only afterwards. Repeated
/// resolution of the same name yields the same identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    /// Human-readable datasource name (e.g. "ClickHouse").
    pub name: String,

    /// Unique identifier assigned by the dashboard.
    pub uid: String,

    /// Datasource plugin type (e.g. "grafana-clickhouse-datasource").
    #[serde(rename = "type")]
    pub ds_type: String,
}

/// The datasource selector embedded in each sub-query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceSelector {
    /// Datasource plugin type.
    #[serde(rename = "type")]
    pub ds_type: String,

    /// Unique identifier assigned by the dashboard.
    pub uid: String,
}

impl From<&DatasourceRef> for DatasourceSelector {
    fn from(ds: &DatasourceRef) -> Self {
        Self {
            ds_type: ds.ds_type.clone(),
            uid: ds.uid.clone(),
        }
    }
}

/// One sub-query within a query request.
///
/// Field presence depends on the datasource plugin: SQL-backed datasources
/// use `raw_sql`, time-series datasources use `expr`. Absent fields are
/// omitted from the serialized body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    /// Identifier echoed back in the response (conventionally "A").
    pub ref_id: String,

    /// The datasource this sub-query targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceSelector>,

    /// Query editor mode ("sql" or "builder").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_type: Option<String>,

    /// Raw SQL text for SQL-backed datasources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_sql: Option<String>,

    /// Query expression for time-series datasources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    /// Result format hint; numeric or textual depending on the plugin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,

    /// Plugin-specific query type (e.g. "traces", "timeseries").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,

    /// Whether to evaluate the expression over the full time range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<bool>,
}

/// A query request: one or more sub-queries plus an optional time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The sub-queries to execute.
    pub queries: Vec<DataQuery>,

    /// Start of the time window (epoch millis or relative like "now-1h").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// End of the time window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl QueryRequest {
    /// Creates a request holding a single sub-query over the given window.
    #[must_use]
    pub fn single(query: DataQuery, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            queries: vec![query],
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }
}

/// Column-oriented values of one data frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameData {
    /// One array per column; empty when the query matched nothing.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// One data frame in a sub-query result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    /// The frame's column-oriented value table.
    #[serde(default)]
    pub data: FrameData,
}

/// Result of a single sub-query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubQueryResult {
    /// HTTP-style status code for this sub-query.
    #[serde(default)]
    pub status: i64,

    /// Data frames returned on success.
    #[serde(default)]
    pub frames: Vec<Frame>,

    /// Error message, if the sub-query failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubQueryResult {
    /// Returns true if this sub-query reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Response of a query request, keyed by sub-query `refId`.
///
/// Produced fresh per query call and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Per-sub-query results.
    #[serde(default)]
    pub results: HashMap<String, SubQueryResult>,
}

impl QueryResult {
    /// Returns the result of the sub-query with the given `refId`.
    #[must_use]
    pub fn sub(&self, ref_id: &str) -> Option<&SubQueryResult> {
        self.results.get(ref_id)
    }

    /// Returns true if every sub-query reported success (and at least one
    /// sub-query is present).
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(SubQueryResult::is_success)
    }

    /// Returns the status of the sub-query with the given `refId`, if present.
    #[must_use]
    pub fn status(&self, ref_id: &str) -> Option<i64> {
        self.sub(ref_id).map(|r| r.status)
    }

    /// Returns the number of value columns in the first frame of the given
    /// sub-query, or 0 if the sub-query or frame is absent.
    #[must_use]
    pub fn value_count(&self, ref_id: &str) -> usize {
        self.sub(ref_id)
            .and_then(|r| r.frames.first())
            .map_or(0, |frame| frame.data.values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clickhouse_ref() -> DatasourceRef {
        DatasourceRef {
            name: "ClickHouse".to_string(),
            uid: "PDEE91DDB90597936".to_string(),
            ds_type: "grafana-clickhouse-datasource".to_string(),
        }
    }

    #[test]
    fn test_datasource_selector_from_ref() {
        let ds = clickhouse_ref();
        let selector = DatasourceSelector::from(&ds);

        assert_eq!(selector.uid, ds.uid);
        assert_eq!(selector.ds_type, ds.ds_type);
    }

    #[test]
    fn test_data_query_serialization_camel_case() {
        let ds = clickhouse_ref();
        let query = DataQuery {
            ref_id: "A".to_string(),
            datasource: Some(DatasourceSelector::from(&ds)),
            editor_type: Some("sql".to_string()),
            raw_sql: Some("SELECT 1".to_string()),
            format: Some(json!(1)),
            query_type: Some("traces".to_string()),
            ..DataQuery::default()
        };

        let json = serde_json::to_string(&query).unwrap();

        assert!(json.contains("\"refId\":\"A\""));
        assert!(json.contains("\"editorType\":\"sql\""));
        assert!(json.contains("\"rawSql\":\"SELECT 1\""));
        assert!(json.contains("\"queryType\":\"traces\""));
        assert!(json.contains("\"type\":\"grafana-clickhouse-datasource\""));
        // Unused plugin fields stay off the wire
        assert!(!json.contains("expr"));
        assert!(!json.contains("range"));
    }

    #[test]
    fn test_query_request_single() {
        let query = DataQuery {
            ref_id: "A".to_string(),
            ..DataQuery::default()
        };
        let request = QueryRequest::single(query, "now-1h", "now");

        assert_eq!(request.queries.len(), 1);
        assert_eq!(request.from.as_deref(), Some("now-1h"));
        assert_eq!(request.to.as_deref(), Some("now"));
    }

    #[test]
    fn test_query_result_deserialization() {
        let body = r#"{
            "results": {
                "A": {
                    "status": 200,
                    "frames": [
                        {"data": {"values": [[1700000000, 1700000001], ["body one", "body two"]]}}
                    ]
                }
            }
        }"#;

        let result: QueryResult = serde_json::from_str(body).unwrap();

        assert!(result.all_success());
        assert_eq!(result.status("A"), Some(200));
        assert_eq!(result.value_count("A"), 2);
    }

    #[test]
    fn test_query_result_empty_frames() {
        let body = r#"{"results": {"A": {"status": 200, "frames": [{"data": {"values": []}}]}}}"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();

        assert!(result.all_success());
        assert_eq!(result.value_count("A"), 0);
    }

    #[test]
    fn test_query_result_missing_ref_id() {
        let result = QueryResult::default();

        assert!(!result.all_success());
        assert_eq!(result.status("A"), None);
        assert_eq!(result.value_count("A"), 0);
    }

    #[test]
    fn test_query_result_failed_sub_query() {
        let body = r#"{
            "results": {
                "A": {"status": 500, "error": "table otel.otel_logs does not exist"}
            }
        }"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();

        assert!(!result.all_success());
        assert_eq!(result.status("A"), Some(500));
        assert_eq!(result.value_count("A"), 0);
        assert!(result.sub("A").unwrap().error.is_some());
    }
}
