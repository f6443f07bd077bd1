//! Query Object Model
//!
//! Typed description of a Cube.js load query and its wire serializer:
//!
//! - **Enums**: operators, granularities, ordering directions
//! - **Filter**: date ranges, time dimensions and the boolean filter tree
//! - **Builder**: the `Query` aggregate and its builder
//!
//! # Example
//!
//! ```rust
//! use cubejs_client::model::Cube;
//! use cubejs_client::query::{DateRange, Filter, FilterOperator, Order, Query, TimeDimension};
//!
//! let cube = Cube::new("orders");
//! let query = Query::builder([cube.measure("count")])
//!     .dimension(cube.dimension("status"))
//!     .time_dimension(TimeDimension::new(
//!         cube.dimension("created_at"),
//!         DateRange::relative("last year"),
//!     ))
//!     .filter(Filter::new(cube.dimension("status"), FilterOperator::Equals, ["shipped"]))
//!     .order_by(cube.measure("count"), Order::Desc)
//!     .build();
//!
//! let body = query.to_value();
//! assert_eq!(body["measures"][0], "orders.count");
//! ```

mod builder;
mod enums;
mod error;
mod filter;

pub use builder::{Query, QueryBuilder, DEFAULT_LIMIT, DEFAULT_TIMEZONE};
pub use enums::{FilterOperator, Granularity, Order};
pub use error::{QueryError, QueryResult};
pub use filter::{DateRange, Filter, FilterExpr, TimeDimension};
