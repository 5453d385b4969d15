//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// How the client authenticates against the server and attaches its token.
///
/// Every field has a default matching a stock Feathers server, so a partial
/// document deserializes cleanly:
///
/// ```rust,ignore
/// let config: AuthenticationConfiguration = serde_json::from_str(r#"{ "path": "/auth" }"#)?;
/// assert_eq!(config.header, "Authorization");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfiguration {
    /// Request header carrying the token.
    pub header: String,
    /// Optional prefix written before the token, e.g. `Bearer`.
    pub scheme: Option<String>,
    /// Path of the authentication service.
    pub path: String,
    /// Strategy used when re-authenticating with a stored token.
    pub jwt_strategy: String,
    /// Name of the authenticated entity in the auth response.
    pub entity: String,
    /// Service holding the authenticated entities.
    pub service: String,
    /// Key under which persistent storages keep the token.
    pub storage_key: String,
}

impl Default for AuthenticationConfiguration {
    fn default() -> Self {
        Self {
            header: "Authorization".into(),
            scheme: None,
            path: "/authentication".into(),
            jwt_strategy: "jwt".into(),
            entity: "user".into(),
            service: "users".into(),
            storage_key: "feathers-jwt".into(),
        }
    }
}

impl AuthenticationConfiguration {
    /// Set the token header.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Prefix the token with a scheme such as `Bearer`.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Set the authentication service path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the re-authentication strategy.
    pub fn with_jwt_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.jwt_strategy = strategy.into();
        self
    }

    /// Set the entity name.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }

    /// Set the entity service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// The header value for `token`, scheme-prefixed when configured.
    pub fn header_value(&self, token: &str) -> String {
        match &self.scheme {
            Some(scheme) => format!("{scheme} {token}"),
            None => token.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: AuthenticationConfiguration =
            serde_json::from_str(r#"{ "path": "/auth", "scheme": "Bearer" }"#).unwrap();
        assert_eq!(config.path, "/auth");
        assert_eq!(config.header, "Authorization");
        assert_eq!(config.storage_key, "feathers-jwt");
        assert_eq!(config.header_value("abc"), "Bearer abc");
    }

    #[test]
    fn test_raw_token_without_scheme() {
        let config = AuthenticationConfiguration::default().with_header("X-Token");
        assert_eq!(config.header, "X-Token");
        assert_eq!(config.header_value("abc"), "abc");
    }
}
