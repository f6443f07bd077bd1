//! End-to-end tests of the public API: build a query, send it through a
//! custom transport, check what reached the wire.

use async_trait::async_trait;
use cubejs_client::client::{HttpRequest, HttpResponse, TransportErrorKind};
use cubejs_client::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Echoes the posted query back in the Cube.js response envelope
#[derive(Default)]
struct EchoTransport {
    sent: Mutex<Vec<HttpRequest>>,
}

#[async_trait]
impl Transport for EchoTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let query = request
            .body
            .as_ref()
            .and_then(|b| b.get("query"))
            .cloned()
            .unwrap_or(Value::Null);
        self.sent.lock().unwrap().push(request);

        let body = json!({
            "query": query,
            "data": [{"wshn2mul.state": "WA", "wshn2mul.count": "1024"}],
            "annotation": {
                "measures": {"wshn2mul.count": {"title": "Count", "shortTitle": "Count", "type": "number"}},
                "dimensions": {},
                "segments": {},
                "timeDimensions": {},
            },
        });
        Ok(HttpResponse::new(200, body.to_string()))
    }
}

/// Always fails below the HTTP layer
struct DownTransport {
    calls: Mutex<u32>,
}

#[async_trait]
impl Transport for DownTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.calls.lock().unwrap() += 1;
        Err(TransportError::new(TransportErrorKind::Connect, "dns error"))
    }
}

fn accidents_query() -> Query {
    let cube = Cube::new("wshn2mul");
    let state = cube.dimension("state");
    Query::builder([cube.measure("count")])
        .dimensions([state.clone(), cube.dimension("county")])
        .time_dimension(TimeDimension::new(
            cube.dimension("start_time"),
            DateRange::relative("last year"),
        ))
        .filter(FilterExpr::or([
            Filter::new(&state, FilterOperator::Equals, ["WA"]),
            Filter::new(&state, FilterOperator::Equals, ["OR"]),
        ])
        .unwrap())
        .order_by(cube.measure("count"), Order::Desc)
        .build()
}

#[tokio::test]
async fn load_sends_wire_query_and_returns_envelope() {
    let transport = Arc::new(EchoTransport::default());
    let config = ClientConfig {
        host: "http://cube.local:4000/".into(),
        secret: Some("integration-secret".into()),
        load_timeout: Duration::from_secs(10),
        ..ClientConfig::default()
    };
    let client = CubeClient::with_transport(config, transport.clone());

    let result = client.load(&accidents_query()).await.unwrap();

    let expected_query = json!({
        "measures": ["wshn2mul.count"],
        "timeDimensions": [{
            "dimension": "wshn2mul.start_time",
            "dateRange": "last year",
            "granularity": null,
        }],
        "limit": 10000,
        "offset": 0,
        "timezone": "UTC",
        "ungrouped": false,
        "dimensions": ["wshn2mul.state", "wshn2mul.county"],
        "filters": [{"or": [
            {"member": "wshn2mul.state", "operator": "equals", "values": ["WA"]},
            {"member": "wshn2mul.state", "operator": "equals", "values": ["OR"]},
        ]}],
        "order": [["wshn2mul.count", "desc"]],
    });
    assert_eq!(result.query, expected_query);
    assert_eq!(result.data[0]["wshn2mul.count"], "1024");
    assert_eq!(result.annotation["measures"]["wshn2mul.count"]["type"], "number");

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://cube.local:4000/cubejs-api/v1/load");
    assert_eq!(sent[0].timeout, Duration::from_secs(10));
    assert!(sent[0].header("Authorization").is_some());
}

#[tokio::test]
async fn validation_error_is_distinguishable() {
    let err: ClientError = DateRange::from_parts(None, None, None).unwrap_err().into();
    assert!(err.is_validation());
    assert!(!err.is_transport());
    assert!(!err.is_http());

    let err: ClientError = FilterExpr::and(Vec::<Filter>::new()).unwrap_err().into();
    assert!(err.is_validation());
}

#[tokio::test(start_paused = true)]
async fn unreachable_service_gives_up_after_retry_budget() {
    let transport = Arc::new(DownTransport {
        calls: Mutex::new(0),
    });
    let config = ClientConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(100)),
        ..ClientConfig::default()
    };
    let client = CubeClient::with_transport(config, transport.clone());

    let err = client.load(&accidents_query()).await.unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(err, ClientError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(*transport.calls.lock().unwrap(), 3);
}

#[test]
fn query_serializes_through_serde() {
    let text = serde_json::to_string(&accidents_query()).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["measures"], json!(["wshn2mul.count"]));
    assert!(value.get("segments").is_none());
}
