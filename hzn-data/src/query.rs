//! GraphQL entity query builder.
//!
//! Renders the subset of The Graph query language the data modules
//! need: one entity collection with paging, ordering, a `where` filter
//! and a flat property selection.

use std::fmt::Write;

/// Maximum page size accepted by the hosted service.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Sort direction for an entity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

/// Resolution of the pre-aggregated time series entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSeries {
    FifteenMinutes,
    #[default]
    OneDay,
}

impl TimeSeries {
    /// Width of one period in seconds; aggregate ids count periods since epoch.
    pub fn period_secs(self) -> i64 {
        match self {
            TimeSeries::FifteenMinutes => 900,
            TimeSeries::OneDay => 86_400,
        }
    }
}

impl std::str::FromStr for TimeSeries {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15m" => Ok(TimeSeries::FifteenMinutes),
            "1d" => Ok(TimeSeries::OneDay),
            other => Err(format!("unknown time series '{}' (expected 1d or 15m)", other)),
        }
    }
}

impl std::fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeSeries::FifteenMinutes => "15m",
            TimeSeries::OneDay => "1d",
        })
    }
}

/// A value in a `where` filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rendered quoted, e.g. addresses and enum-like strings.
    Str(String),
    /// Rendered as a bare integer.
    Int(i64),
    /// Decimal BigInt literal, rendered unquoted.
    Big(String),
    Bool(bool),
}

impl Value {
    fn render(&self, out: &mut String) {
        match self {
            // JSON string escapes are valid GraphQL string escapes.
            Value::Str(s) => out.push_str(&serde_json::Value::from(s.as_str()).to_string()),
            Value::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Value::Big(s) => out.push_str(s),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Big(n.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A single-entity collection query.
///
/// # Example
///
/// ```rust
/// use hzn_data::query::EntityQuery;
///
/// let query = EntityQuery::new("issuers")
///     .order_by("id")
///     .properties(&["id"]);
///
/// assert_eq!(
///     query.render(100, 0),
///     "{ issuers(first: 100, skip: 0, orderBy: id, orderDirection: desc) { id } }"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    entity: String,
    order_by: Option<String>,
    order_direction: OrderDirection,
    filters: Vec<(String, Value)>,
    properties: Vec<String>,
}

impl EntityQuery {
    /// Start a query for an entity collection.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            order_by: None,
            order_direction: OrderDirection::Desc,
            filters: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn direction(mut self, direction: OrderDirection) -> Self {
        self.order_direction = direction;
        self
    }

    /// Add a filter. `None` values are skipped, which keeps option
    /// structs free of `if let` noise at the call sites.
    pub fn filter<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.filters.push((key.to_string(), value.into()));
        }
        self
    }

    pub fn properties(mut self, properties: &[&str]) -> Self {
        self.properties = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    /// The entity collection this query selects.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Render the query for one page.
    pub fn render(&self, first: u32, skip: u32) -> String {
        let mut out = String::with_capacity(128);
        let _ = write!(out, "{{ {}(first: {}, skip: {}", self.entity, first, skip);

        if let Some(order_by) = &self.order_by {
            let _ = write!(
                out,
                ", orderBy: {}, orderDirection: {}",
                order_by,
                self.order_direction.as_str()
            );
        }

        if !self.filters.is_empty() {
            out.push_str(", where: {");
            for (i, (key, value)) in self.filters.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                value.render(&mut out);
            }
            out.push('}');
        }

        out.push_str(") { ");
        out.push_str(&self.properties.join(" "));
        out.push_str(" } }");
        out
    }
}
