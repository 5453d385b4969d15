//! Transport-ready description of one call.
//!
//! An [`Endpoint`] is built fresh for every dispatch and never mutated. It
//! derives both request shapes a transport may need:
//!
//! - REST: [`Endpoint::url`], [`Endpoint::http_method`], [`Endpoint::body`]
//!   and [`Endpoint::authorization`].
//! - Duplex: [`Endpoint::event_name`] and [`Endpoint::event_arguments`].

use crate::config::AuthenticationConfiguration;
use crate::error::{EndpointError, FeathersError};
use crate::method::{Data, Method, Verb};
use serde_json::Value;
use std::fmt;
use url::Url;

/// HTTP verb a [`Method`] maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `find`, `get`
    Get,
    /// `create`
    Post,
    /// `update`
    Put,
    /// `patch`
    Patch,
    /// `remove`
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verb> for HttpMethod {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Find | Verb::Get => HttpMethod::Get,
            Verb::Create => HttpMethod::Post,
            Verb::Update => HttpMethod::Put,
            Verb::Patch => HttpMethod::Patch,
            Verb::Remove => HttpMethod::Delete,
        }
    }
}

/// A resolved call against one service path.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    base_url: Url,
    path: String,
    method: Method,
    access_token: Option<String>,
    authentication: AuthenticationConfiguration,
}

impl Endpoint {
    /// Create an endpoint. Leading and trailing `/` are stripped from `path`.
    pub fn new(
        base_url: Url,
        path: impl AsRef<str>,
        method: Method,
        access_token: Option<String>,
        authentication: AuthenticationConfiguration,
    ) -> Self {
        Self {
            base_url,
            path: path.as_ref().trim_matches('/').to_owned(),
            method,
            access_token,
            authentication,
        }
    }

    /// Server base address.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Service path, without surrounding slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The method being called.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Token read from storage when the endpoint was built.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Authentication configuration in effect for this call.
    pub fn authentication(&self) -> &AuthenticationConfiguration {
        &self.authentication
    }

    /// HTTP verb for REST transports.
    pub fn http_method(&self) -> HttpMethod {
        self.method.verb().into()
    }

    /// JSON body for `create`, `update` and `patch`.
    pub fn body(&self) -> Option<&Data> {
        self.method.data()
    }

    /// `(header, value)` carrying the token, if one is present.
    pub fn authorization(&self) -> Option<(&str, String)> {
        let token = self.access_token.as_deref()?;
        Some((
            self.authentication.header.as_str(),
            self.authentication.header_value(token),
        ))
    }

    /// Full request URL: base, path, optional id, then the flattened query.
    pub fn url(&self) -> Result<Url, FeathersError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| EndpointError::CannotBeABase(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(self.path.split('/').filter(|segment| !segment.is_empty()));
            if let Some(id) = self.method.id() {
                segments.push(id);
            }
        }

        let parameters = self.method.parameters();
        if !parameters.is_empty() {
            let mut pairs = Vec::new();
            for (key, value) in &parameters {
                flatten_query(key.clone(), value, &mut pairs);
            }
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Duplex event name, `"{path}::{verb}"`.
    pub fn event_name(&self) -> String {
        format!("{}::{}", self.path, self.method.verb())
    }

    /// Positional duplex arguments.
    ///
    /// | verb | arguments |
    /// |------|-----------|
    /// | `find` | `[query]` |
    /// | `get` | `[id, query]` |
    /// | `create` | `[data, query]` |
    /// | `update`, `patch` | `[id \| null, data, query]` |
    /// | `remove` | `[id \| null, query]` |
    pub fn event_arguments(&self) -> Vec<Value> {
        let query = Value::Object(self.method.parameters());
        let id = || {
            self.method
                .id()
                .map_or(Value::Null, |id| Value::String(id.to_owned()))
        };
        let data = || Value::Object(self.method.data().cloned().unwrap_or_default());

        match self.method.verb() {
            Verb::Find => vec![query],
            Verb::Get => vec![id(), query],
            Verb::Create => vec![data(), query],
            Verb::Update | Verb::Patch => vec![id(), data(), query],
            Verb::Remove => vec![id(), query],
        }
    }
}

/// Flatten nested query values into bracketed pairs: `age[$gt]=18`,
/// `age[$in][0]=5`.
fn flatten_query(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested, value) in map {
                flatten_query(format!("{key}[{nested}]"), value, pairs);
            }
        }
        Value::Array(values) => {
            for (index, value) in values.iter().enumerate() {
                flatten_query(format!("{key}[{index}]"), value, pairs);
            }
        }
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Null => pairs.push((key, String::new())),
        other => pairs.push((key, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Query, SortOrder};
    use serde_json::json;

    fn endpoint(method: Method, token: Option<&str>) -> Endpoint {
        Endpoint::new(
            Url::parse("https://api.example.com/v1/").unwrap(),
            "/users/",
            method,
            token.map(str::to_owned),
            AuthenticationConfiguration::default(),
        )
    }

    fn data() -> Data {
        json!({ "name": "Bob" }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_url_appends_id() {
        let endpoint = endpoint(
            Method::Get {
                id: "42".into(),
                query: None,
            },
            None,
        );
        assert_eq!(endpoint.url().unwrap().as_str(), "https://api.example.com/v1/users/42");
        assert_eq!(endpoint.http_method(), HttpMethod::Get);
        assert!(endpoint.body().is_none());
    }

    #[test]
    fn test_find_url_flattens_query() {
        let query = Query::new()
            .limit(5)
            .gt("age", 18)
            .sort("name", SortOrder::Ascending)
            .in_("role", ["admin", "owner"]);
        let endpoint = endpoint(Method::Find { query: Some(query) }, None);
        let url = endpoint.url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/v1/users");
        assert!(pairs.contains(&("$limit".into(), "5".into())));
        assert!(pairs.contains(&("age[$gt]".into(), "18".into())));
        assert!(pairs.contains(&("$sort[name]".into(), "1".into())));
        assert!(pairs.contains(&("role[$in][0]".into(), "admin".into())));
        assert!(pairs.contains(&("role[$in][1]".into(), "owner".into())));
    }

    #[test]
    fn test_empty_query_has_no_question_mark() {
        let endpoint = endpoint(Method::Find { query: None }, None);
        assert_eq!(endpoint.url().unwrap().query(), None);
    }

    #[test]
    fn test_bulk_remove_has_no_id_segment() {
        let endpoint = endpoint(
            Method::Remove {
                id: None,
                query: Some(Query::new().eq("done", true)),
            },
            None,
        );
        let url = endpoint.url().unwrap();
        assert_eq!(url.path(), "/v1/users");
        assert_eq!(url.query(), Some("done=true"));
        assert_eq!(endpoint.http_method(), HttpMethod::Delete);
    }

    #[test]
    fn test_cannot_be_a_base_is_underlying() {
        let endpoint = Endpoint::new(
            Url::parse("mailto:someone@example.com").unwrap(),
            "users",
            Method::Find { query: None },
            None,
            AuthenticationConfiguration::default(),
        );
        assert!(matches!(endpoint.url(), Err(FeathersError::Underlying(_))));
    }

    #[test]
    fn test_authorization_header() {
        let signed = endpoint(Method::Find { query: None }, Some("token"));
        assert_eq!(signed.authorization(), Some(("Authorization", "token".to_owned())));
        let anonymous = endpoint(Method::Find { query: None }, None);
        assert_eq!(anonymous.authorization(), None);
    }

    #[test]
    fn test_event_shapes() {
        let patch = endpoint(
            Method::Patch {
                id: None,
                data: data(),
                query: None,
            },
            None,
        );
        assert_eq!(patch.event_name(), "users::patch");
        assert_eq!(
            patch.event_arguments(),
            vec![Value::Null, json!({ "name": "Bob" }), json!({})]
        );

        let get = endpoint(
            Method::Get {
                id: "1".into(),
                query: Some(Query::new().limit(1)),
            },
            None,
        );
        assert_eq!(get.event_arguments(), vec![json!("1"), json!({ "$limit": 1 })]);

        let create = endpoint(
            Method::Create {
                data: data(),
                query: None,
            },
            None,
        );
        assert_eq!(create.event_name(), "users::create");
        assert_eq!(create.event_arguments(), vec![json!({ "name": "Bob" }), json!({})]);
    }
}
