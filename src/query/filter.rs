//! Filter Expression Tree
//!
//! Temporal filtering (`DateRange`, `TimeDimension`) and member predicates
//! (`Filter`) combined with boolean operators (`FilterExpr::And` / `Or`).
//!
//! # Wire format
//!
//! ```text
//! DateRange      "last year"  |  ["2024-01-01", "2024-01-31"]
//! TimeDimension  {"dimension", "dateRange", "granularity", "compareDateRange"?}
//! Filter         {"member", "operator", "values"}
//! And / Or       {"and": [...]}  |  {"or": [...]}
//! ```

use super::enums::{FilterOperator, Granularity};
use super::error::{QueryError, QueryResult};
use crate::model::{Dimension, Member};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// An absolute or relative date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    /// Inclusive range. Dates use `YYYY-MM-DD` or `YYYY-MM-DDTHH:mm:ss.SSS`.
    Absolute { start: String, end: String },
    /// Relative expression understood by the service, e.g. `"last year"`
    Relative(String),
}

impl DateRange {
    /// Absolute range between two dates
    pub fn absolute(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::Absolute {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Relative range such as `"this month"`
    pub fn relative(expr: impl Into<String>) -> Self {
        Self::Relative(expr.into())
    }

    /// Build a range from loosely specified parts.
    ///
    /// Exactly one of the absolute pair or the relative expression must be
    /// given. A half-specified absolute pair is rejected.
    pub fn from_parts(
        start: Option<String>,
        end: Option<String>,
        relative: Option<String>,
    ) -> QueryResult<Self> {
        match (start, end, relative) {
            (Some(start), Some(end), None) => Ok(Self::Absolute { start, end }),
            (None, None, Some(relative)) => Ok(Self::Relative(relative)),
            (None, None, None) => Err(QueryError::Validation(
                "Expected (start date, end date) or relative".into(),
            )),
            (Some(_), Some(_), Some(_)) => Err(QueryError::Validation(
                "Date range cannot be both absolute and relative".into(),
            )),
            _ => Err(QueryError::Validation(
                "Absolute date range requires both start and end date".into(),
            )),
        }
    }

    /// Wire form
    pub fn to_value(&self) -> Value {
        match self {
            Self::Absolute { start, end } => {
                Value::Array(vec![Value::from(start.as_str()), Value::from(end.as_str())])
            }
            Self::Relative(expr) => Value::from(expr.as_str()),
        }
    }
}

/// A time dimension paired with the range it is filtered to
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDimension {
    pub dimension: Dimension,
    pub date_range: DateRange,
    /// `None` serializes as `null` (no bucketing)
    pub granularity: Option<Granularity>,
    /// Ranges to compare a measure against, for period-over-period queries
    pub compare_date_range: Vec<DateRange>,
}

impl TimeDimension {
    pub fn new(dimension: Dimension, date_range: DateRange) -> Self {
        Self {
            dimension,
            date_range,
            granularity: None,
            compare_date_range: Vec::new(),
        }
    }

    /// Bucket results by the given unit
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Compare against previous periods
    pub fn compare_to(mut self, ranges: impl IntoIterator<Item = DateRange>) -> Self {
        self.compare_date_range.extend(ranges);
        self
    }

    /// Wire form
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("dimension".into(), Value::from(self.dimension.path()));
        map.insert("dateRange".into(), self.date_range.to_value());
        map.insert(
            "granularity".into(),
            self.granularity
                .map(|g| Value::from(g.as_str()))
                .unwrap_or(Value::Null),
        );
        if !self.compare_date_range.is_empty() {
            map.insert(
                "compareDateRange".into(),
                self.compare_date_range
                    .iter()
                    .map(DateRange::to_value)
                    .collect(),
            );
        }
        Value::Object(map)
    }
}

/// A predicate on a single member
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub member: Member,
    pub operator: FilterOperator,
    /// Already stringified, in caller order
    pub values: Vec<String>,
}

impl Filter {
    /// Create a filter. Values of any `ToString` type are converted to
    /// strings up front, so `[1, 2]` and `["1", "2"]` are equivalent.
    pub fn new<I>(member: impl Into<Member>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        Self {
            member: member.into(),
            operator,
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Member is not NULL
    pub fn set(member: impl Into<Member>) -> Self {
        Self::new(member, FilterOperator::IsSet, Vec::<String>::new())
    }

    /// Member is NULL
    pub fn not_set(member: impl Into<Member>) -> Self {
        Self::new(member, FilterOperator::NotSet, Vec::<String>::new())
    }

    /// Wire form
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("member".into(), Value::from(self.member.path()));
        map.insert("operator".into(), Value::from(self.operator.as_str()));
        map.insert(
            "values".into(),
            self.values.iter().map(|v| Value::from(v.as_str())).collect(),
        );
        Value::Object(map)
    }
}

/// Root or node of a filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Filter(Filter),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// All operands must hold. At least one operand is required.
    pub fn and<I>(operands: I) -> QueryResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<FilterExpr>,
    {
        Self::operands("and", operands).map(Self::And)
    }

    /// Any operand must hold. At least one operand is required.
    pub fn or<I>(operands: I) -> QueryResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<FilterExpr>,
    {
        Self::operands("or", operands).map(Self::Or)
    }

    fn operands<I>(key: &str, operands: I) -> QueryResult<Vec<FilterExpr>>
    where
        I: IntoIterator,
        I::Item: Into<FilterExpr>,
    {
        let operands: Vec<FilterExpr> = operands.into_iter().map(Into::into).collect();
        if operands.is_empty() {
            return Err(QueryError::Validation(format!(
                "'{}' needs at least one operand",
                key
            )));
        }
        Ok(operands)
    }

    /// Wire form, serialized depth-first
    pub fn to_value(&self) -> Value {
        match self {
            Self::Filter(filter) => filter.to_value(),
            Self::And(operands) => Self::envelope("and", operands),
            Self::Or(operands) => Self::envelope("or", operands),
        }
    }

    fn envelope(key: &str, operands: &[FilterExpr]) -> Value {
        let mut map = Map::new();
        map.insert(
            key.to_string(),
            operands.iter().map(FilterExpr::to_value).collect(),
        );
        Value::Object(map)
    }
}

impl From<Filter> for FilterExpr {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

macro_rules! serialize_via_value {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    self.to_value().serialize(serializer)
                }
            }
        )*
    };
}

serialize_via_value!(DateRange, TimeDimension, Filter, FilterExpr);
