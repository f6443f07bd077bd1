//! Cube.js REST API client
//!
//! Serializes queries, attaches the current bearer token and sends requests
//! through a [`Transport`], retrying network failures per [`RetryPolicy`].

use super::auth::{TokenManager, DEFAULT_TOKEN_TTL_SECS};
use super::error::{ClientError, ClientResult};
use super::retry::RetryPolicy;
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::query::Query;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Path of the load endpoint, relative to the API base
pub const LOAD_PATH: &str = "v1/load";

/// Configuration for the Cube.js client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service host (e.g., "http://localhost:4000")
    pub host: String,
    /// API base path (e.g., "/cubejs-api")
    pub base_path: String,
    /// Secret for signing tokens. `None` sends requests unauthenticated.
    pub secret: Option<String>,
    /// Per-attempt timeout for load requests
    pub load_timeout: Duration,
    /// Per-attempt timeout for other requests
    pub request_timeout: Duration,
    /// Lifetime of minted tokens
    pub token_ttl: chrono::Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:4000".to_string(),
            base_path: "/cubejs-api".to_string(),
            secret: None,
            load_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
            token_ttl: chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Response of the load endpoint. All fields are passed through untouched.
///
/// A body missing any of `query`, `data` or `annotation` (for example the
/// `{"error": "Continue wait"}` reply) fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    /// The query as understood by the service
    pub query: Value,
    /// Result rows
    pub data: Vec<Value>,
    /// Title, short title and type for every member in the result
    pub annotation: Value,
    /// Any other top-level keys (`lastRefreshTime`, `slowQuery`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Cube.js REST API client
pub struct CubeClient {
    config: ClientConfig,
    base_url: String,
    tokens: TokenManager,
    transport: Arc<dyn Transport>,
}

impl CubeClient {
    /// Create a client that talks HTTP through `reqwest`
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let tokens = TokenManager::new(config.secret.as_deref(), config.token_ttl);
        Self::with_parts(config, tokens, transport)
    }

    /// Create a client from preassembled parts
    pub fn with_parts(
        config: ClientConfig,
        tokens: TokenManager,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let host = config.host.trim_end_matches('/');
        let base_url = match config.base_path.trim_matches('/') {
            "" => format!("{}/", host),
            base_path => format!("{}/{}/", host, base_path),
        };

        Self {
            config,
            base_url,
            tokens,
            transport,
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL every path is resolved against, always ending in `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API base
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Current bearer token, or `None` when authentication is disabled
    pub fn token(&self) -> ClientResult<Option<String>> {
        self.tokens.current_token()
    }

    /// Get the data for a query.
    ///
    /// Each attempt is bounded by `load_timeout`; transport failures are
    /// retried.
    pub async fn load(&self, query: &Query) -> ClientResult<LoadResponse> {
        let body = json!({ "query": query.to_value() });
        let value = self
            .request(Method::POST, LOAD_PATH, Some(body), self.config.load_timeout)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make an API request and decode the JSON response
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> ClientResult<Value> {
        let url = self.endpoint(path);

        self.config
            .retry
            .run(|attempt| {
                let request = HttpRequest {
                    method: method.clone(),
                    url: url.clone(),
                    headers: Vec::new(),
                    body: body.clone(),
                    timeout,
                };
                self.send_once(attempt, request)
            })
            .await
    }

    async fn send_once(&self, attempt: u32, mut request: HttpRequest) -> ClientResult<Value> {
        if let Some(token) = self.tokens.current_token()? {
            request.headers.push(("Authorization".to_string(), token));
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt = attempt + 1,
            "Sending request"
        );

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::debug!(status = response.status, "Request rejected");
            return Err(ClientError::Http {
                status: response.status,
                body: response.body,
            });
        }

        Ok(serde_json::from_str(&response.body)?)
    }
}

impl std::fmt::Debug for CubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{HttpResponse, TransportError, TransportErrorKind};
    use crate::model::Cube;
    use crate::query::{DateRange, Filter, FilterOperator, Order, TimeDimension};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays canned outcomes and records what was sent
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<(Instant, HttpRequest)>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, r)| r.clone())
                .collect()
        }

        fn instants(&self) -> Vec<Instant> {
            self.requests.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push((Instant::now(), request));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new(TransportErrorKind::Connect, "refused")))
        }
    }

    fn ok_body() -> HttpResponse {
        HttpResponse::new(
            200,
            r#"{"query":{"measures":["orders.count"]},"data":[{"orders.count":"42"}],"annotation":{"measures":{}}}"#,
        )
    }

    fn sample_query() -> Query {
        let cube = Cube::new("orders");
        Query::builder([cube.measure("count")])
            .time_dimension(TimeDimension::new(
                cube.dimension("created_at"),
                DateRange::relative("last year"),
            ))
            .filter(Filter::new(cube.dimension("status"), FilterOperator::Equals, ["shipped"]))
            .order_by(cube.measure("count"), Order::Desc)
            .build()
    }

    #[test]
    fn test_default_base_url() {
        let client = CubeClient::new(ClientConfig::default());
        assert_eq!(client.base_url(), "http://localhost:4000/cubejs-api/");
        assert_eq!(
            client.endpoint(LOAD_PATH),
            "http://localhost:4000/cubejs-api/v1/load"
        );
        assert_eq!(
            client.endpoint("/v1/load"),
            "http://localhost:4000/cubejs-api/v1/load"
        );
    }

    #[test]
    fn test_base_url_normalises_slashes() {
        let config = ClientConfig {
            host: "https://analytics.example.com/".into(),
            base_path: "/cubejs-api/".into(),
            ..ClientConfig::default()
        };
        let client = CubeClient::new(config);
        assert_eq!(client.base_url(), "https://analytics.example.com/cubejs-api/");

        let config = ClientConfig {
            base_path: "/".into(),
            ..ClientConfig::default()
        };
        let client = CubeClient::new(config);
        assert_eq!(client.base_url(), "http://localhost:4000/");
    }

    #[tokio::test]
    async fn test_load_posts_query_envelope() {
        let transport = ScriptedTransport::new(vec![Ok(ok_body())]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let query = sample_query();
        let response = client.load(&query).await.unwrap();

        assert_eq!(response.data, vec![json!({"orders.count": "42"})]);
        assert_eq!(response.query, json!({"measures": ["orders.count"]}));
        assert_eq!(response.annotation, json!({"measures": {}}));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url, "http://localhost:4000/cubejs-api/v1/load");
        assert_eq!(sent.timeout, Duration::from_secs(30));
        assert_eq!(sent.body, Some(json!({ "query": query.to_value() })));
    }

    #[tokio::test]
    async fn test_no_auth_header_without_secret() {
        let transport = ScriptedTransport::new(vec![Ok(ok_body())]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        client.load(&sample_query()).await.unwrap();

        assert_eq!(client.token().unwrap(), None);
        assert!(transport.requests()[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_auth_header_with_secret() {
        let transport = ScriptedTransport::new(vec![Ok(ok_body()), Ok(ok_body())]);
        let config = ClientConfig {
            secret: Some("s3cret".into()),
            ..ClientConfig::default()
        };
        let client = CubeClient::with_transport(config, transport.clone());

        client.load(&sample_query()).await.unwrap();
        client.load(&sample_query()).await.unwrap();

        let token = client.token().unwrap().unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), Some(token.as_str()));
        assert_eq!(requests[1].header("Authorization"), Some(token.as_str()));
    }

    #[tokio::test]
    async fn test_http_error_surfaces_without_retry() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            400,
            r#"{"error":"Cube orders not found"}"#,
        ))]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let err = client.load(&sample_query()).await.unwrap_err();

        assert!(err.is_http());
        assert_eq!(err.status(), Some(400));
        assert_eq!(transport.requests().len(), 1);
        match err {
            ClientError::Http { body, .. } => assert!(body.contains("not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "<html>"))]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let err = client.load(&sample_query()).await.unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_exhaust_eight_attempts() {
        let transport = ScriptedTransport::new(Vec::new());
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let err = client.load(&sample_query()).await.unwrap_err();

        assert!(matches!(err, ClientError::RetriesExhausted { attempts: 8, .. }));
        assert!(err.is_transport());

        let instants = transport.instants();
        assert_eq!(instants.len(), 8);
        let gaps: Vec<Duration> = instants.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|g| g[0] <= g[1]), "gaps: {:?}", gaps);
        assert!(gaps[0] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::new(TransportErrorKind::Timeout, "timed out")),
            Ok(ok_body()),
        ]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let response = client.load(&sample_query()).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_request_get_without_body() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, r#"{"ok":true}"#))]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let value = client
            .request(Method::GET, "v1/readyz", None, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.url, "http://localhost:4000/cubejs-api/v1/readyz");
        assert!(sent.body.is_none());
        assert_eq!(sent.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_continue_wait_is_decode_error() {
        let transport =
            ScriptedTransport::new(vec![Ok(HttpResponse::new(200, r#"{"error":"Continue wait"}"#))]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport.clone());

        let err = client.load(&sample_query()).await.unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)), "got {:?}", err);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_load_keeps_extra_response_keys() {
        let body = json!({
            "query": {"measures": ["orders.count"]},
            "data": [],
            "annotation": {},
            "lastRefreshTime": "2024-01-01T00:00:00.000Z",
            "slowQuery": false,
        });
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, body.to_string()))]);
        let client = CubeClient::with_transport(ClientConfig::default(), transport);

        let response = client.load(&sample_query()).await.unwrap();

        assert_eq!(response.extra["lastRefreshTime"], "2024-01-01T00:00:00.000Z");
        assert_eq!(response.extra["slowQuery"], false);
        assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }
}
