//! Wire types for the Cube REST API.
//!
//! [`CubeResponse`] mirrors the backend's body shape for both `/meta` and
//! `/load`. Unknown fields are preserved through the flattened `extra` map so
//! upstream error bodies pass through to callers unmodified.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single result row keyed by column name.
pub type Row = Map<String, Value>;

/// Sentinel `error` value signalling that the backend is still computing the
/// query and the request should be retried.
pub const CONTINUE_WAIT: &str = "Continue wait";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Backend stack trace accompanying `error`, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// Fields this client does not model (e.g. `cubes` on `/meta`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CubeResponse {
    /// Builds the uniform failure shape used for every normalized error.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_continue_wait(&self) -> bool {
        self.error.as_deref() == Some(CONTINUE_WAIT)
    }
}

/// Per-query column metadata returned alongside `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub dimensions: HashMap<String, ColumnMeta>,
    #[serde(default)]
    pub measures: HashMap<String, ColumnMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Semantic type of the column; `"number"` drives numeric casting.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Cube query, serialized as the single JSON-encoded `query` parameter of
/// the `load` route. This is a serialization surface only; shape validation
/// is the embedding layer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_dimensions: Vec<TimeDimension>,

    /// Maximum number of rows to return.
    #[serde(default = "default_limit", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Number of rows to skip.
    #[serde(default = "default_offset", skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    /// Result ordering, sensitive to entry order; serialized as
    /// `[["column", "asc"], ...]` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<(String, OrderDirection)>,

    /// Return raw rows without grouping by dimensions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ungrouped: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            measures: Vec::new(),
            dimensions: Vec::new(),
            time_dimensions: Vec::new(),
            limit: default_limit(),
            offset: default_offset(),
            order: Vec::new(),
            ungrouped: false,
        }
    }
}

fn default_limit() -> Option<u64> {
    Some(500)
}

fn default_offset() -> Option<u64> {
    Some(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimension {
    pub dimension: String,
    pub granularity: Granularity,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Either a pair of ISO dates or a relative range like `"last 7 days"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    Absolute(Vec<String>),
    Relative(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_response_fields_round_trip() {
        let body = json!({
            "error": "Internal error",
            "stack": "at query.js:1",
            "requestId": "abc-123"
        });
        let response: CubeResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(response.error.as_deref(), Some("Internal error"));
        assert_eq!(response.extra["requestId"], json!("abc-123"));
        assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }

    #[test]
    fn continue_wait_sentinel_is_exact() {
        assert!(CubeResponse::from_error("Continue wait").is_continue_wait());
        assert!(!CubeResponse::from_error("continue wait").is_continue_wait());
        assert!(!CubeResponse::default().is_continue_wait());
    }

    #[test]
    fn query_serializes_camel_case_with_defaults() {
        let query = Query {
            measures: vec!["orders.revenue".into()],
            time_dimensions: vec![TimeDimension {
                dimension: "orders.created_at".into(),
                granularity: Granularity::Month,
                date_range: DateRange::Relative("last year".into()),
            }],
            order: vec![("orders.revenue".into(), OrderDirection::Desc)],
            ..Query::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "measures": ["orders.revenue"],
                "timeDimensions": [{
                    "dimension": "orders.created_at",
                    "granularity": "month",
                    "dateRange": "last year"
                }],
                "limit": 500,
                "offset": 0,
                "order": [["orders.revenue", "desc"]]
            })
        );
    }

    #[test]
    fn query_field_order_survives_a_value_round_trip() {
        // The query is passed through `serde_json::to_value` before being
        // encoded onto the query string; struct field order must survive
        // that round trip (preserve_order), so the wire text is stable.
        let query = Query {
            measures: vec!["orders.count".into()],
            ..Query::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"measures":["orders.count"],"limit":500,"offset":0}"#
        );
    }

    #[test]
    fn date_range_accepts_pair_and_relative() {
        let pair: DateRange =
            serde_json::from_value(json!(["2024-01-01", "2024-12-31"])).unwrap();
        assert_eq!(
            pair,
            DateRange::Absolute(vec!["2024-01-01".into(), "2024-12-31".into()])
        );
        let relative: DateRange = serde_json::from_value(json!("last 30 days")).unwrap();
        assert_eq!(relative, DateRange::Relative("last 30 days".into()));
    }
}
