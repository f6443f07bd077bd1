//! # cubejs-client
//!
//! Typed query builder and authenticated HTTP client for the Cube.js REST API.
//!
//! ## Features
//!
//! - **Typed references**: measures, dimensions and segments scoped to a cube
//! - **Filter trees**: member filters combined with `and` / `or`
//! - **Wire-exact serialization**: optional keys are omitted, never emptied
//! - **Authentication**: HS256 tokens minted from the API secret and cached
//! - **Resilience**: network failures retried with exponential backoff
//!
//! ## Modules
//!
//! - [`model`]: cubes and field references
//! - [`query`]: query object model and serializer
//! - [`client`]: request pipeline, credentials and retries
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cubejs_client::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CubeClient::new(ClientConfig {
//!         secret: Some("my-api-secret".into()),
//!         ..ClientConfig::default()
//!     });
//!
//!     let cube = Cube::new("orders");
//!     let query = Query::builder([cube.measure("count")])
//!         .dimension(cube.dimension("status"))
//!         .time_dimension(
//!             TimeDimension::new(cube.dimension("created_at"), DateRange::relative("last year"))
//!                 .granularity(Granularity::Month),
//!         )
//!         .filter(Filter::new(cube.dimension("status"), FilterOperator::Equals, ["shipped"]))
//!         .order_by(cube.measure("count"), Order::Desc)
//!         .build();
//!
//!     let result = client.load(&query).await?;
//!     println!("Got {} rows", result.data.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod model;
pub mod query;

// Re-export top-level types for convenience
pub use model::{Cube, Dimension, Measure, Member, Segment};

pub use query::{
    DateRange, Filter, FilterExpr, FilterOperator, Granularity, Order, Query, QueryBuilder,
    QueryError, QueryResult, TimeDimension,
};

pub use client::{
    ClientConfig, ClientError, ClientResult, CubeClient, LoadResponse, RetryPolicy, TokenManager,
    Transport, TransportError,
};

pub use config::{Config, ConfigError, LoggingConfig};
