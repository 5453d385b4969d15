//! Declarative query builder.
//!
//! [`Query`] is an immutable builder: every method consumes the query and
//! returns an extended copy. [`Query::serialize`] renders it into the
//! `$`-prefixed operator mapping understood by Feathers services.
//!
//! ```rust,ignore
//! let query = Query::new().limit(5).gt("age", 18);
//! assert_eq!(Value::Object(query.serialize()), json!({ "$limit": 5, "age": { "$gt": 18 } }));
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sort direction for [`Query::sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Serialized as `1`.
    Ascending,
    /// Serialized as `-1`.
    Descending,
}

impl SortOrder {
    fn wire(self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// A single comparison against a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// `$gt`
    Gt(Value),
    /// `$gte`
    Gte(Value),
    /// `$lt`
    Lt(Value),
    /// `$lte`
    Lte(Value),
    /// `$in`
    In(Vec<Value>),
    /// `$nin`
    Nin(Vec<Value>),
    /// `$ne`
    Ne(Value),
    /// Direct equality, serialized as the bare value.
    Eq(Value),
}

impl Comparison {
    /// The wire operator, `None` for direct equality.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Comparison::Gt(_) => Some("$gt"),
            Comparison::Gte(_) => Some("$gte"),
            Comparison::Lt(_) => Some("$lt"),
            Comparison::Lte(_) => Some("$lte"),
            Comparison::In(_) => Some("$in"),
            Comparison::Nin(_) => Some("$nin"),
            Comparison::Ne(_) => Some("$ne"),
            Comparison::Eq(_) => None,
        }
    }

    fn value(&self) -> Value {
        match self {
            Comparison::Gt(v)
            | Comparison::Gte(v)
            | Comparison::Lt(v)
            | Comparison::Lte(v)
            | Comparison::Ne(v)
            | Comparison::Eq(v) => v.clone(),
            Comparison::In(values) | Comparison::Nin(values) => Value::Array(values.clone()),
        }
    }

    /// `{ property: value }` or `{ property: { $op: value } }`.
    fn to_clause(&self, property: &str) -> Value {
        let mut clause = Map::new();
        let value = match self.operator() {
            Some(op) => {
                let mut operators = Map::new();
                operators.insert(op.to_owned(), self.value());
                Value::Object(operators)
            }
            None => self.value(),
        };
        clause.insert(property.to_owned(), value);
        Value::Object(clause)
    }
}

/// A structured filter for service calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    limit: Option<u64>,
    skip: Option<u64>,
    sorts: Vec<(String, SortOrder)>,
    properties: BTreeMap<String, Vec<Comparison>>,
    selected: Vec<String>,
    or: Vec<(String, Comparison)>,
}

impl Query {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of returned entities (`$limit`).
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first entities (`$skip`).
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Append a sort key (`$sort`).
    pub fn sort(mut self, property: impl Into<String>, order: SortOrder) -> Self {
        self.sorts.push((property.into(), order));
        self
    }

    /// `property > value`
    pub fn gt(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Gt(value.into()))
    }

    /// `property >= value`
    pub fn gte(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Gte(value.into()))
    }

    /// `property < value`
    pub fn lt(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Lt(value.into()))
    }

    /// `property <= value`
    pub fn lte(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Lte(value.into()))
    }

    /// `property != value`
    pub fn ne(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Ne(value.into()))
    }

    /// `property == value`, serialized as a bare key.
    pub fn eq(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, Comparison::Eq(value.into()))
    }

    /// `property` is one of `values` (`$in`).
    pub fn in_<I, V>(self, property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(property, Comparison::In(values))
    }

    /// `property` is none of `values` (`$nin`).
    pub fn nin<I, V>(self, property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(property, Comparison::Nin(values))
    }

    /// Add a field to `$select`.
    pub fn select(mut self, property: impl Into<String>) -> Self {
        self.selected.push(property.into());
        self
    }

    /// Add several fields to `$select`.
    pub fn select_all<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(properties.into_iter().map(Into::into));
        self
    }

    /// Replace the `$or` clause with the given per-property subqueries.
    pub fn or<I, S>(mut self, subqueries: I) -> Self
    where
        I: IntoIterator<Item = (S, Comparison)>,
        S: Into<String>,
    {
        self.or = subqueries
            .into_iter()
            .map(|(property, comparison)| (property.into(), comparison))
            .collect();
        self
    }

    /// Whether no clause has been added.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn compare(mut self, property: impl Into<String>, comparison: Comparison) -> Self {
        self.properties
            .entry(property.into())
            .or_default()
            .push(comparison);
        self
    }

    /// Render the wire mapping.
    pub fn serialize(&self) -> Map<String, Value> {
        let mut wire = Map::new();

        if let Some(limit) = self.limit {
            wire.insert("$limit".into(), limit.into());
        }
        if let Some(skip) = self.skip {
            wire.insert("$skip".into(), skip.into());
        }
        if !self.sorts.is_empty() {
            let sorts: Map<String, Value> = self
                .sorts
                .iter()
                .map(|(property, order)| (property.clone(), order.wire().into()))
                .collect();
            wire.insert("$sort".into(), Value::Object(sorts));
        }

        for (property, comparisons) in &self.properties {
            let mut operators = Map::new();
            let mut direct = None;
            for comparison in comparisons {
                match comparison.operator() {
                    Some(op) => {
                        operators.insert(op.to_owned(), comparison.value());
                    }
                    None => direct = Some(comparison.value()),
                }
            }
            // Equality wins over operator maps on the same property.
            let value = direct.unwrap_or(Value::Object(operators));
            wire.insert(property.clone(), value);
        }

        if !self.selected.is_empty() {
            let selected = self.selected.iter().cloned().map(Value::String).collect();
            wire.insert("$select".into(), Value::Array(selected));
        }
        if !self.or.is_empty() {
            let clauses = self
                .or
                .iter()
                .map(|(property, comparison)| comparison.to_clause(property))
                .collect();
            wire.insert("$or".into(), Value::Array(clauses));
        }

        wire
    }
}
