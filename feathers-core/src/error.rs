//! Error types for the Feathers client.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`FeathersError`] - The error every service call resolves to
//! - [`EndpointError`] - Failures while deriving a request from an [`Endpoint`]
//! - [`UnexpectedStatus`] - HTTP statuses outside the classified set
//!
//! [`Endpoint`]: crate::Endpoint

use std::sync::Arc;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The closed error taxonomy surfaced by every service call.
///
/// Classified variants map one-to-one onto HTTP status codes (see
/// [`FeathersError::from_status`]). Transport failures that carry no such
/// status are wrapped in [`FeathersError::Underlying`], and [`FeathersError::Unknown`]
/// is the catch-all for a transport or hook chain that produced neither a
/// response nor a classifiable error.
///
/// # Equality
///
/// Two errors are equal when they are the same variant. The wrapped cause of
/// `Underlying` is never compared.
#[derive(Error, Debug, Clone)]
pub enum FeathersError {
    /// 400
    #[error("bad request")]
    BadRequest,
    /// 401
    #[error("not authenticated")]
    NotAuthenticated,
    /// 403
    #[error("forbidden")]
    Forbidden,
    /// 404
    #[error("not found")]
    NotFound,
    /// 405
    #[error("method not allowed")]
    MethodNotAllowed,
    /// 406
    #[error("not acceptable")]
    NotAcceptable,
    /// 408
    #[error("request timed out")]
    Timeout,
    /// 409
    #[error("conflict")]
    Conflict,
    /// 411
    #[error("length required")]
    LengthRequired,
    /// 422
    #[error("unprocessable entity")]
    Unprocessable,
    /// 429
    #[error("too many requests")]
    TooManyRequests,
    /// 500
    #[error("general server error")]
    General,
    /// 501
    #[error("not implemented")]
    NotImplemented,
    /// 502
    #[error("bad gateway")]
    BadGateway,
    /// 503
    #[error("service unavailable")]
    Unavailable,

    /// A transport-level failure without a classified status.
    #[error("transport error: {0}")]
    Underlying(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// Neither a response nor a classifiable error was produced.
    #[error("unknown error")]
    Unknown,
}

impl FeathersError {
    /// Classify an HTTP status code.
    ///
    /// Returns `None` for every status outside the fifteen classified codes;
    /// callers decide whether that becomes `Underlying` or `Unknown`.
    pub fn from_status(status: u16) -> Option<Self> {
        let error = match status {
            400 => Self::BadRequest,
            401 => Self::NotAuthenticated,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            406 => Self::NotAcceptable,
            408 => Self::Timeout,
            409 => Self::Conflict,
            411 => Self::LengthRequired,
            422 => Self::Unprocessable,
            429 => Self::TooManyRequests,
            500 => Self::General,
            501 => Self::NotImplemented,
            502 => Self::BadGateway,
            503 => Self::Unavailable,
            _ => return None,
        };
        Some(error)
    }

    /// The status code a classified error corresponds to.
    pub fn status_code(&self) -> Option<u16> {
        let status = match self {
            Self::BadRequest => 400,
            Self::NotAuthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::NotAcceptable => 406,
            Self::Timeout => 408,
            Self::Conflict => 409,
            Self::LengthRequired => 411,
            Self::Unprocessable => 422,
            Self::TooManyRequests => 429,
            Self::General => 500,
            Self::NotImplemented => 501,
            Self::BadGateway => 502,
            Self::Unavailable => 503,
            Self::Underlying(_) | Self::Unknown => return None,
        };
        Some(status)
    }

    /// Wrap a transport failure.
    pub fn underlying<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Underlying(Arc::new(error))
    }
}

impl PartialEq for FeathersError {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for FeathersError {}

impl From<BoxError> for FeathersError {
    fn from(err: BoxError) -> Self {
        FeathersError::Underlying(Arc::from(err))
    }
}

/// Errors raised while deriving a concrete request from an endpoint.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The base address cannot carry path segments (e.g. `mailto:`).
    #[error("base url cannot be a base: {0}")]
    CannotBeABase(String),
}

impl From<EndpointError> for FeathersError {
    fn from(err: EndpointError) -> Self {
        FeathersError::underlying(err)
    }
}

/// An HTTP status that is neither a success nor one of the classified codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unexpected http status {status}")]
pub struct UnexpectedStatus {
    /// The status returned by the server.
    pub status: u16,
}
