//! REST transport over `reqwest`.
//!
//! Each call becomes one HTTP request:
//!
//! | verb | request |
//! |------|---------|
//! | `find` | `GET /path?query` |
//! | `get` | `GET /path/id?query` |
//! | `create` | `POST /path?query` with JSON body |
//! | `update` | `PUT /path[/id]?query` with JSON body |
//! | `patch` | `PATCH /path[/id]?query` with JSON body |
//! | `remove` | `DELETE /path[/id]?query` |
//!
//! Classified HTTP statuses become the matching [`FeathersError`]; any other
//! non-success status is wrapped as [`UnexpectedStatus`].

use async_trait::async_trait;
use feathers_core::{
    Endpoint, FeathersError, HttpMethod, Provider, Response, UnexpectedStatus, Url,
};
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// A [`Provider`] speaking plain HTTP to a Feathers server.
#[derive(Debug, Clone)]
pub struct RestProvider {
    client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl RestProvider {
    /// Create a provider with a default `reqwest` client.
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout: None,
        }
    }

    /// Use a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Limit every request to `timeout`. Elapsed requests fail with
    /// [`FeathersError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn transport_error(err: reqwest::Error) -> FeathersError {
        if err.is_timeout() {
            FeathersError::Timeout
        } else {
            FeathersError::underlying(err)
        }
    }
}

fn http_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl RestProvider {
    /// Send the request for `endpoint` and reject non-success statuses.
    async fn send(&self, endpoint: &Endpoint) -> Result<reqwest::Response, FeathersError> {
        let url = endpoint.url()?;
        let method = endpoint.http_method();
        debug!(%method, %url, "sending request");

        let mut request = self
            .client
            .request(http_method(method), url)
            .header(ACCEPT, "application/json");
        if let Some((header, value)) = endpoint.authorization() {
            request = request.header(header, value);
        }
        if let Some(body) = endpoint.body() {
            request = request.json(body);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(Self::transport_error)?;
        let status = response.status();
        if let Some(error) = FeathersError::from_status(status.as_u16()) {
            debug!(status = status.as_u16(), "classified error status");
            return Err(error);
        }
        if !status.is_success() {
            return Err(FeathersError::underlying(UnexpectedStatus {
                status: status.as_u16(),
            }));
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for RestProvider {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn request(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        let response = self.send(endpoint).await?;
        let body = response.bytes().await.map_err(Self::transport_error)?;
        let value: Value = serde_json::from_slice(&body).map_err(|err| {
            warn!(error = %err, "response body is not JSON");
            FeathersError::Unknown
        })?;
        Response::from_json(value)
    }

    /// Any success status logs out; an empty or unclassifiable body becomes
    /// an empty object.
    async fn logout(&self, endpoint: &Endpoint) -> Result<Response, FeathersError> {
        let response = self.send(endpoint).await?;
        let body = response.bytes().await.unwrap_or_default();
        let parsed = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|value| Response::from_json(value).ok());
        Ok(parsed.unwrap_or_else(|| {
            debug!("logout reply has no payload");
            Response::object(Value::Object(Default::default()))
        }))
    }
}
