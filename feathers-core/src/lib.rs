//! # feathers-core
//!
//! Data model and contracts for the Feathers client.
//!
//! This crate has minimal dependencies and is what transports and storages
//! implement against; the hook pipeline and application live in `feathers`.
//!
//! # Contents
//!
//! - [`Method`] / [`Verb`] - the six service methods and their arguments
//! - [`Query`] - declarative filter builder with wire serialization
//! - [`Response`] - payload classification and pagination
//! - [`Endpoint`] - per-call request description for REST and duplex transports
//! - [`Provider`] - the transport contract
//! - [`AuthenticationStorage`] - where the access token lives
//!
//! # Error Types
//!
//! - [`FeathersError`] - Error every call resolves to
//! - [`EndpointError`] - Request derivation errors
//! - [`UnexpectedStatus`] - Unclassified HTTP statuses

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod config;
mod endpoint;
mod error;
mod method;
mod provider;
mod query;
mod response;
mod storage;

// Re-exports
pub use config::AuthenticationConfiguration;
pub use endpoint::{Endpoint, HttpMethod};
pub use error::{BoxError, EndpointError, FeathersError, UnexpectedStatus};
pub use method::{Data, Method, Verb};
pub use provider::{EventStream, Provider, RealTimeEvent};
pub use query::{Comparison, Query, SortOrder};
pub use response::{Pagination, Response, ResponseData};
pub use storage::AuthenticationStorage;
pub use url::Url;
