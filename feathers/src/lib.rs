//! # feathers - Hook-Driven Feathers Client
//!
//! `feathers` talks to a Feathers server over REST or a duplex socket. Every
//! service call runs through a pipeline of user hooks:
//!
//! - **before** hooks may rewrite the call, answer it, or fail it
//! - **after** hooks see and may replace the result
//! - **error** hooks see any failure and decide which error is surfaced
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feathers::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = RestProvider::new(Url::parse("https://api.example.com")?);
//! let app = Feathers::new(Arc::new(provider));
//!
//! app.service("messages").before(
//!     Hooks::new().all(LoggingHook::new()),
//! );
//! app.service("messages").error(
//!     Hooks::new().all(ReauthenticationHook::new()),
//! );
//!
//! app.authenticate(credentials).await?;
//! let page = app
//!     .service("messages")
//!     .find(Some(Query::new().limit(10).sort("createdAt", SortOrder::Descending)))
//!     .await?;
//! ```
//!
//! ## Crates
//!
//! - `feathers-core`: data model and the transport contract
//! - `feathers-std`: transports, storage and test doubles
//! - `feathers`: application, services and the hook pipeline

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod application;
mod context;
mod hook;
mod pipeline;
mod registry;
mod service;
mod wrapper;

pub mod hooks;
pub mod testing;

pub use application::{Feathers, FeathersBuilder};
pub use context::{HookContext, HookKind};
pub use hook::{DynHook, Hook, HookFn, hook_fn};
pub use registry::{Hooks, SharedHook};
pub use service::{ProviderService, Service};
pub use wrapper::ServiceWrapper;

pub use feathers_core::{
    AuthenticationConfiguration, AuthenticationStorage, BoxError, Comparison, Data, Endpoint,
    EndpointError, EventStream, FeathersError, HttpMethod, Method, Pagination, Provider,
    Query, RealTimeEvent, Response, ResponseData, SortOrder, UnexpectedStatus, Url, Verb,
};

/// Transports.
pub mod providers {
    #[cfg(feature = "rest")]
    pub use feathers_std::providers::rest::RestProvider;
    pub use feathers_std::providers::socket::{
        ConnectionState, DEFAULT_TIMEOUT, EventHandler, NO_ACK, SocketClient, SocketError,
        SocketProvider, parse_ack,
    };
    #[cfg(feature = "ws")]
    pub use feathers_std::providers::socket::ws::WsSocketClient;
    #[cfg(feature = "tower")]
    pub use feathers_std::providers::tower::TowerProvider;
}

/// Token storages.
pub mod storage {
    pub use feathers_std::storage::MemoryStorage;
}

/// Prelude module - common imports for Feathers.
///
/// # Usage
///
/// ```rust,ignore
/// use feathers::prelude::*;
/// ```
pub mod prelude {
    pub use crate::hooks::{BranchHook, ConditionalHook, LoggingHook, ReauthenticationHook, TimeoutHook};
    #[cfg(feature = "rest")]
    pub use crate::providers::RestProvider;
    pub use crate::providers::SocketProvider;
    #[cfg(feature = "ws")]
    pub use crate::providers::WsSocketClient;
    pub use crate::{
        AuthenticationConfiguration, Data, Feathers, FeathersError, Hook, HookContext, HookKind,
        Hooks, Method, Query, RealTimeEvent, Response, ResponseData, Service, ServiceWrapper,
        SortOrder, Url, Verb, hook_fn,
    };
}
