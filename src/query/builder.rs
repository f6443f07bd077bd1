//! Query aggregate and builder
//!
//! A [`Query`] is the request body of the `/v1/load` endpoint. Optional
//! collections are left out of the wire document entirely when empty: the
//! service treats a missing key and an empty array differently.

use super::enums::Order;
use super::filter::{FilterExpr, TimeDimension};
use crate::model::{Dimension, Measure, Member, Segment};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Default row limit applied by the service
pub const DEFAULT_LIMIT: u64 = 10_000;

/// Default timezone for date bucketing
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A query ready to be sent to the service
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub measures: Vec<Measure>,
    pub time_dimensions: Vec<TimeDimension>,
    pub dimensions: Vec<Dimension>,
    pub filters: Vec<FilterExpr>,
    pub segments: Vec<Segment>,
    pub limit: u64,
    pub offset: u64,
    pub order: Vec<(Member, Order)>,
    /// Timezone the data is reported in
    pub timezone: String,
    /// Skip GROUP BY on the service side
    pub ungrouped: bool,
}

impl Query {
    /// Start building a query selecting the given measures
    pub fn builder(measures: impl IntoIterator<Item = Measure>) -> QueryBuilder {
        QueryBuilder::new(measures)
    }

    /// Wire form.
    ///
    /// `measures`, `timeDimensions`, `limit`, `offset`, `timezone` and
    /// `ungrouped` are always present. `dimensions`, `filters`, `segments`
    /// and `order` are inserted only when non-empty.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "measures".into(),
            self.measures.iter().map(Measure::path).collect(),
        );
        map.insert(
            "timeDimensions".into(),
            self.time_dimensions
                .iter()
                .map(TimeDimension::to_value)
                .collect(),
        );
        map.insert("limit".into(), Value::from(self.limit));
        map.insert("offset".into(), Value::from(self.offset));
        map.insert("timezone".into(), Value::from(self.timezone.as_str()));
        map.insert("ungrouped".into(), Value::from(self.ungrouped));

        if !self.dimensions.is_empty() {
            map.insert(
                "dimensions".into(),
                self.dimensions.iter().map(Dimension::path).collect(),
            );
        }
        if !self.filters.is_empty() {
            map.insert(
                "filters".into(),
                self.filters.iter().map(FilterExpr::to_value).collect(),
            );
        }
        if !self.segments.is_empty() {
            map.insert(
                "segments".into(),
                self.segments.iter().map(Segment::path).collect(),
            );
        }
        if !self.order.is_empty() {
            map.insert(
                "order".into(),
                self.order
                    .iter()
                    .map(|(member, order)| {
                        Value::Array(vec![Value::from(member.path()), Value::from(order.as_str())])
                    })
                    .collect(),
            );
        }

        Value::Object(map)
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Builder for constructing queries programmatically
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Create a new builder with the given measures and default options
    pub fn new(measures: impl IntoIterator<Item = Measure>) -> Self {
        Self {
            query: Query {
                measures: measures.into_iter().collect(),
                time_dimensions: Vec::new(),
                dimensions: Vec::new(),
                filters: Vec::new(),
                segments: Vec::new(),
                limit: DEFAULT_LIMIT,
                offset: 0,
                order: Vec::new(),
                timezone: DEFAULT_TIMEZONE.to_string(),
                ungrouped: false,
            },
        }
    }

    /// Add a measure after the initial ones
    pub fn measure(mut self, measure: Measure) -> Self {
        self.query.measures.push(measure);
        self
    }

    /// Add a time dimension
    pub fn time_dimension(mut self, time_dimension: TimeDimension) -> Self {
        self.query.time_dimensions.push(time_dimension);
        self
    }

    /// Group by a dimension
    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.query.dimensions.push(dimension);
        self
    }

    /// Group by several dimensions, in order
    pub fn dimensions(mut self, dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        self.query.dimensions.extend(dimensions);
        self
    }

    /// Add a filter root (a single filter or a boolean tree)
    pub fn filter(mut self, filter: impl Into<FilterExpr>) -> Self {
        self.query.filters.push(filter.into());
        self
    }

    /// Restrict to a predefined segment
    pub fn segment(mut self, segment: Segment) -> Self {
        self.query.segments.push(segment);
        self
    }

    /// Sort by a member. Earlier calls take precedence.
    pub fn order_by(mut self, member: impl Into<Member>, order: Order) -> Self {
        self.query.order.push((member.into(), order));
        self
    }

    /// Set a limit on returned rows
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = limit;
        self
    }

    /// Skip rows for pagination
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = offset;
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.query.timezone = timezone.into();
        self
    }

    pub fn ungrouped(mut self, ungrouped: bool) -> Self {
        self.query.ungrouped = ungrouped;
        self
    }

    /// Build the query
    pub fn build(self) -> Query {
        self.query
    }
}
