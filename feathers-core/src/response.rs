//! Service responses.
//!
//! A [`Response`] carries the entity payload of a successful call and, for
//! paginated `find` results, the [`Pagination`] envelope the server wrapped
//! them in. [`Response::from_json`] classifies a raw JSON payload by shape:
//!
//! - an array is an unpaginated list;
//! - an object carrying all of `data`, `total`, `limit` and `skip` is unwrapped
//!   into a paginated list;
//! - any other object is a single entity;
//! - scalars and `null` cannot be classified and yield [`FeathersError::Unknown`].

use crate::error::FeathersError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination envelope of a paginated `find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of entities matching the query on the server.
    pub total: u64,
    /// Page size applied by the server.
    pub limit: u64,
    /// Number of entities skipped before this page.
    pub skip: u64,
}

/// Payload of a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// A list of entities.
    List(Vec<Value>),
    /// A single entity.
    Object(Value),
}

/// A successful service call.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Present when the server paginated the result.
    pub pagination: Option<Pagination>,
    /// The entities.
    pub data: ResponseData,
}

impl Response {
    /// A single-entity response.
    pub fn object(value: impl Into<Value>) -> Self {
        Self {
            pagination: None,
            data: ResponseData::Object(value.into()),
        }
    }

    /// An unpaginated list response.
    pub fn list(values: Vec<Value>) -> Self {
        Self {
            pagination: None,
            data: ResponseData::List(values),
        }
    }

    /// A paginated list response.
    pub fn paginated(values: Vec<Value>, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            data: ResponseData::List(values),
        }
    }

    /// Classify a raw success payload.
    pub fn from_json(value: Value) -> Result<Self, FeathersError> {
        match value {
            Value::Array(values) => Ok(Self::list(values)),
            Value::Object(map) => Ok(match split_page(map) {
                Ok((values, pagination)) => Self::paginated(values, pagination),
                Err(map) => Self::object(Value::Object(map)),
            }),
            _ => Err(FeathersError::Unknown),
        }
    }

    /// The single entity, if this is an object response.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match &self.data {
            ResponseData::Object(value) => value.as_object(),
            ResponseData::List(_) => None,
        }
    }

    /// The entities, if this is a list response.
    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.data {
            ResponseData::List(values) => Some(values),
            ResponseData::Object(_) => None,
        }
    }

    /// The payload as plain JSON, pagination dropped.
    pub fn into_value(self) -> Value {
        match self.data {
            ResponseData::List(values) => Value::Array(values),
            ResponseData::Object(value) => value,
        }
    }
}

/// Unwrap `{data, total, limit, skip}`, handing the map back untouched when it
/// is not a page.
fn split_page(mut map: Map<String, Value>) -> Result<(Vec<Value>, Pagination), Map<String, Value>> {
    let pagination = match (
        map.get("total").and_then(Value::as_u64),
        map.get("limit").and_then(Value::as_u64),
        map.get("skip").and_then(Value::as_u64),
        map.get("data").map(Value::is_array),
    ) {
        (Some(total), Some(limit), Some(skip), Some(true)) => Pagination { total, limit, skip },
        _ => return Err(map),
    };

    match map.remove("data") {
        Some(Value::Array(values)) => Ok((values, pagination)),
        _ => Err(map),
    }
}
