//! Service methods.
//!
//! A [`Method`] is one of the six canonical resource operations together with
//! its arguments. `update`, `patch` and `remove` take an optional id: without
//! one the call addresses every entity matched by the query.

use crate::query::Query;
use serde_json::{Map, Value};
use std::fmt;

/// Payload of `create`, `update` and `patch`.
pub type Data = Map<String, Value>;

/// One of the six service verbs, without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Retrieve a (possibly filtered) list of resources.
    Find,
    /// Retrieve a single resource by id.
    Get,
    /// Create a new resource.
    Create,
    /// Replace one resource, or every resource matched by the query.
    Update,
    /// Merge into one resource, or every resource matched by the query.
    Patch,
    /// Remove one resource, or every resource matched by the query.
    Remove,
}

impl Verb {
    /// All verbs in canonical order.
    pub const ALL: [Verb; 6] = [
        Verb::Find,
        Verb::Get,
        Verb::Create,
        Verb::Update,
        Verb::Patch,
        Verb::Remove,
    ];

    /// Wire name of the verb.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Verb::Find => "find",
            Verb::Get => "get",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Patch => "patch",
            Verb::Remove => "remove",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service method with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Retrieves a list of all resources from the service, can be filtered.
    Find {
        /// Optional filter.
        query: Option<Query>,
    },
    /// Retrieves a single resource with the given id.
    Get {
        /// Resource id.
        id: String,
        /// Optional filter.
        query: Option<Query>,
    },
    /// Creates a new resource with data.
    Create {
        /// Resource payload.
        data: Data,
        /// Optional filter.
        query: Option<Query>,
    },
    /// Replaces the resource identified by id with data.
    Update {
        /// Resource id; `None` updates every resource matched by `query`.
        id: Option<String>,
        /// Resource payload.
        data: Data,
        /// Optional filter.
        query: Option<Query>,
    },
    /// Merges data into the resource identified by id.
    Patch {
        /// Resource id; `None` patches every resource matched by `query`.
        id: Option<String>,
        /// Partial payload.
        data: Data,
        /// Optional filter.
        query: Option<Query>,
    },
    /// Removes the resource identified by id.
    Remove {
        /// Resource id; `None` removes every resource matched by `query`.
        id: Option<String>,
        /// Optional filter.
        query: Option<Query>,
    },
}

impl Method {
    /// The verb of this method.
    pub fn verb(&self) -> Verb {
        match self {
            Method::Find { .. } => Verb::Find,
            Method::Get { .. } => Verb::Get,
            Method::Create { .. } => Verb::Create,
            Method::Update { .. } => Verb::Update,
            Method::Patch { .. } => Verb::Patch,
            Method::Remove { .. } => Verb::Remove,
        }
    }

    /// The addressed resource id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Method::Get { id, .. } => Some(id.as_str()),
            Method::Update { id, .. } | Method::Patch { id, .. } | Method::Remove { id, .. } => {
                id.as_deref()
            }
            Method::Find { .. } | Method::Create { .. } => None,
        }
    }

    /// The payload for `create`, `update` and `patch`.
    pub fn data(&self) -> Option<&Data> {
        match self {
            Method::Create { data, .. } | Method::Update { data, .. } | Method::Patch { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }

    /// The filter attached to the call.
    pub fn query(&self) -> Option<&Query> {
        match self {
            Method::Find { query }
            | Method::Get { query, .. }
            | Method::Create { query, .. }
            | Method::Update { query, .. }
            | Method::Patch { query, .. }
            | Method::Remove { query, .. } => query.as_ref(),
        }
    }

    /// The serialized filter, or an empty mapping when there is none.
    pub fn parameters(&self) -> Map<String, Value> {
        self.query().map(Query::serialize).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Data {
        json!({ "name": "Bob" }).as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_accessors_follow_verb_shape() {
        let get = Method::Get {
            id: "1".into(),
            query: None,
        };
        assert_eq!(get.verb(), Verb::Get);
        assert_eq!(get.id(), Some("1"));
        assert!(get.data().is_none());

        let bulk_patch = Method::Patch {
            id: None,
            data: data(),
            query: Some(Query::new().eq("role", "admin")),
        };
        assert_eq!(bulk_patch.id(), None);
        assert_eq!(bulk_patch.data(), Some(&data()));
        assert_eq!(Value::Object(bulk_patch.parameters()), json!({ "role": "admin" }));
    }

    #[test]
    fn test_parameters_default_to_empty() {
        let find = Method::Find { query: None };
        assert!(find.parameters().is_empty());
    }

    #[test]
    fn test_verb_names() {
        let names: Vec<_> = Verb::ALL.iter().map(Verb::as_str).collect();
        assert_eq!(names, ["find", "get", "create", "update", "patch", "remove"]);
    }
}
