//! Request Pipeline
//!
//! Authenticated HTTP access to the Cube.js REST API.
//!
//! ## Architecture
//!
//! - **CubeClient**: serializes queries and decodes responses
//! - **TokenManager**: mints and caches signed bearer tokens
//! - **RetryPolicy**: exponential backoff with jitter for network failures
//! - **Transport**: the HTTP seam (`reqwest` by default)
//!
//! ## Request Flow
//!
//! 1. `load` serializes the query into `{"query": ...}`
//! 2. Each attempt fetches the current token and sets `Authorization`
//! 3. The transport performs the exchange under the per-attempt timeout
//! 4. Network failures are retried; HTTP errors and bad JSON are not

mod auth;
mod cube_client;
mod error;
mod retry;
mod transport;

pub use auth::{
    Clock, SystemClock, TokenClaims, TokenManager, DEFAULT_TOKEN_TTL_SECS,
    MAX_TOKEN_TTL_SECS,
};
pub use cube_client::{ClientConfig, CubeClient, LoadResponse, LOAD_PATH};
pub use error::{ClientError, ClientResult};
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind,
};

pub use reqwest::Method;
