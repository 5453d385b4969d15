//! The application root.

use crate::service::{ProviderService, Service};
use crate::wrapper::{ServiceEntry, ServiceWrapper};
use feathers_core::{
    AuthenticationConfiguration, AuthenticationStorage, Data, Endpoint, FeathersError, Method,
    Provider, Response,
};
use feathers_std::storage::MemoryStorage;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A Feathers client application.
///
/// Owns the transport, the token storage, the authentication configuration
/// and the registry of services. Cloning is cheap and every clone shares the
/// same state.
///
/// # Example
///
/// ```rust,ignore
/// let provider = RestProvider::new(Url::parse("https://api.example.com")?);
/// let app = Feathers::new(Arc::new(provider));
///
/// app.authenticate(credentials).await?;
/// let messages = app.service("messages").find(None).await?;
/// ```
#[derive(Clone)]
pub struct Feathers {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn Provider>,
    storage: Arc<dyn AuthenticationStorage>,
    authentication: RwLock<AuthenticationConfiguration>,
    services: RwLock<HashMap<String, Arc<ServiceEntry>>>,
}

/// Builder for [`Feathers`].
pub struct FeathersBuilder {
    provider: Arc<dyn Provider>,
    storage: Option<Arc<dyn AuthenticationStorage>>,
    authentication: AuthenticationConfiguration,
}

impl FeathersBuilder {
    /// Keep the token in `storage` instead of process memory.
    pub fn storage(mut self, storage: Arc<dyn AuthenticationStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use `configuration` for authentication.
    pub fn authentication(mut self, configuration: AuthenticationConfiguration) -> Self {
        self.authentication = configuration;
        self
    }

    /// Build the application.
    pub fn build(self) -> Feathers {
        Feathers {
            inner: Arc::new(Inner {
                provider: self.provider,
                storage: self
                    .storage
                    .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
                authentication: RwLock::new(self.authentication),
                services: RwLock::new(HashMap::new()),
            }),
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_owned()
}

impl Feathers {
    /// An application over `provider` with in-memory token storage and the
    /// default authentication configuration.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::builder(provider).build()
    }

    /// Configure an application over `provider`.
    pub fn builder(provider: Arc<dyn Provider>) -> FeathersBuilder {
        FeathersBuilder {
            provider,
            storage: None,
            authentication: AuthenticationConfiguration::default(),
        }
    }

    /// The transport.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.inner.provider
    }

    /// The token storage.
    pub fn storage(&self) -> &Arc<dyn AuthenticationStorage> {
        &self.inner.storage
    }

    /// The stored access token.
    pub fn access_token(&self) -> Option<String> {
        self.inner.storage.access_token()
    }

    /// The authentication configuration in effect.
    pub fn authentication_configuration(&self) -> AuthenticationConfiguration {
        self.inner.authentication.read().clone()
    }

    /// Replace the authentication configuration.
    pub fn configure(&self, configuration: AuthenticationConfiguration) {
        *self.inner.authentication.write() = configuration;
    }

    /// The service at `path`, created on first use as a [`ProviderService`]
    /// bound to this application's transport.
    ///
    /// Leading and trailing `/` are ignored.
    pub fn service(&self, path: &str) -> ServiceWrapper {
        let path = normalize(path);
        let existing = self.inner.services.read().get(&path).cloned();
        let entry = match existing {
            Some(entry) => entry,
            None => {
                let mut services = self.inner.services.write();
                Arc::clone(services.entry(path.clone()).or_insert_with(|| {
                    debug!(%path, "registering provider service");
                    Arc::new(ServiceEntry::new(path.clone(), Arc::new(ProviderService)))
                }))
            }
        };
        ServiceWrapper::new(self.clone(), entry)
    }

    /// Serve `path` with `service`, replacing any previous registration and
    /// its hooks.
    pub fn use_service(&self, path: &str, service: impl Service) -> ServiceWrapper {
        let path = normalize(path);
        let entry = Arc::new(ServiceEntry::new(path.clone(), Arc::new(service)));
        debug!(%path, "registering custom service");
        self.inner
            .services
            .write()
            .insert(path, Arc::clone(&entry));
        ServiceWrapper::new(self.clone(), entry)
    }

    /// Build the endpoint for a call, reading the token now.
    pub fn endpoint(&self, path: &str, method: Method) -> Endpoint {
        Endpoint::new(
            self.inner.provider.base_url().clone(),
            path,
            method,
            self.access_token(),
            self.authentication_configuration(),
        )
    }

    /// Authenticate with `credentials` and store the returned token.
    ///
    /// The response must be an object with an `accessToken` string; it is
    /// returned whole. Any failure clears the stored token.
    pub async fn authenticate(&self, credentials: Data) -> Result<Data, FeathersError> {
        let configuration = self.authentication_configuration();
        let endpoint = Endpoint::new(
            self.inner.provider.base_url().clone(),
            &configuration.path,
            Method::Create {
                data: credentials,
                query: None,
            },
            None,
            configuration.clone(),
        );

        let outcome = async {
            let response = self.inner.provider.authenticate(&endpoint).await?;
            let object = response.as_object().cloned().ok_or(FeathersError::Unknown)?;
            let token = object
                .get("accessToken")
                .and_then(Value::as_str)
                .ok_or(FeathersError::Unknown)?
                .to_owned();
            Ok::<_, FeathersError>((object, token))
        }
        .await;

        match outcome {
            Ok((object, token)) => {
                self.inner.storage.set_access_token(Some(token));
                info!(path = %configuration.path, "authenticated");
                Ok(object)
            }
            Err(error) => {
                self.inner.storage.set_access_token(None);
                warn!(%error, "authentication failed");
                Err(error)
            }
        }
    }

    /// Log out and clear the stored token.
    pub async fn logout(&self) -> Result<Response, FeathersError> {
        let configuration = self.authentication_configuration();
        let endpoint = self.endpoint(&configuration.path, Method::Remove { id: None, query: None });
        let response = self.inner.provider.logout(&endpoint).await?;
        self.inner.storage.set_access_token(None);
        info!("logged out");
        Ok(response)
    }
}

impl fmt::Debug for Feathers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<String> = self.inner.services.read().keys().cloned().collect();
        f.debug_struct("Feathers")
            .field("base_url", &self.inner.provider.base_url().as_str())
            .field("services", &services)
            .finish_non_exhaustive()
    }
}
