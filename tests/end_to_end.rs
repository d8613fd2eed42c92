//! End-to-end flow through the public API: connect, describe, query, and
//! sanitize a real wire response.

use cube_client::{sanitize_response, CubeClient, CubeCredentials, Query};
use httpmock::prelude::*;
use serde_json::{json, Map};

fn credentials(endpoint: String) -> CubeCredentials {
    CubeCredentials {
        endpoint,
        api_secret: "header.payload.signature".to_string(),
        token_claims: Map::new(),
    }
}

#[test]
fn describe_then_query_with_numeric_casting() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/meta");
        then.status(200).json_body(json!({
            "cubes": [{"name": "orders", "title": "Orders"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/load")
            .header("authorization", "header.payload.signature");
        then.status(200).json_body(json!({
            "data": [
                {"orders.status": "shipped", "orders.revenue": "1200.0"},
                {"orders.status": "pending", "orders.revenue": "350.5"}
            ],
            "annotation": {
                "dimensions": {"orders.status": {"type": "string"}},
                "measures": {"orders.revenue": {"type": "number"}}
            }
        }));
    });

    let client = CubeClient::connect(credentials(server.base_url())).unwrap();

    let meta = client.describe();
    assert!(meta.error.is_none());
    assert_eq!(meta.extra["cubes"][0]["name"], json!("orders"));

    let query = Query {
        measures: vec!["orders.revenue".into()],
        dimensions: vec!["orders.status".into()],
        ..Query::default()
    };
    let response = client.query(&query, true).unwrap();
    let rows = response.data.as_ref().unwrap();
    assert_eq!(rows[0]["orders.revenue"], json!(1200));
    assert_eq!(rows[1]["orders.revenue"], json!(350.5));
    assert_eq!(rows[0]["orders.status"], json!("shipped"));

    // Diagnostics copy collapses the rows and leaves the response intact.
    let sanitized = sanitize_response(&response);
    assert_eq!(sanitized["data"], json!("[DATA REDACTED - 2 rows]"));
    assert_eq!(response.data.as_ref().unwrap().len(), 2);
}

#[test]
fn upstream_error_reaches_the_caller_as_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/meta");
        then.status(400).json_body(json!({
            "error": "Invalid configuration",
            "stack": "at server.js:10"
        }));
    });

    let client = CubeClient::connect(credentials(server.base_url())).unwrap();
    let meta = client.describe();
    assert_eq!(meta.error.as_deref(), Some("Invalid configuration"));
    assert_eq!(meta.stack.as_deref(), Some("at server.js:10"));
}
