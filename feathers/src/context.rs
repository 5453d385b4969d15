//! The value threaded through the hook pipeline.

use crate::application::Feathers;
use crate::wrapper::ServiceWrapper;
use feathers_core::{FeathersError, Method, Response};
use std::fmt;

/// Pipeline phase a [`HookContext`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Before dispatch.
    Before,
    /// After a successful dispatch (or a result supplied by a before hook).
    After,
    /// Recovery after any failure.
    Error,
}

impl HookKind {
    /// Lower-case name of the phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            HookKind::Before => "before",
            HookKind::After => "after",
            HookKind::Error => "error",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook sees and hands on.
///
/// Hooks take the context by value and return the (possibly modified)
/// context. The phase and the owning service are fixed for the lifetime of
/// a phase; `method`, `result` and `error` are free to change.
///
/// # Short-circuits
///
/// - Setting `result` in the before phase skips the transport.
/// - Setting `error` outside the error phase skips the remaining hooks of
///   the phase and starts the error phase.
#[derive(Clone)]
pub struct HookContext {
    kind: HookKind,
    service: ServiceWrapper,
    /// The call being made. Before hooks may rewrite it.
    pub method: Method,
    /// Outcome of the call, if already known.
    pub result: Option<Response>,
    /// Failure of the call, if any.
    pub error: Option<FeathersError>,
}

impl HookContext {
    pub(crate) fn new(kind: HookKind, service: ServiceWrapper, method: Method) -> Self {
        Self {
            kind,
            service,
            method,
            result: None,
            error: None,
        }
    }

    /// Move into another phase, keeping method, result and error.
    pub(crate) fn into_phase(self, kind: HookKind) -> Self {
        Self { kind, ..self }
    }

    /// The phase this context runs in.
    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// The application owning the service.
    pub fn app(&self) -> &Feathers {
        self.service.app()
    }

    /// The service being called.
    pub fn service(&self) -> &ServiceWrapper {
        &self.service
    }

    /// Path of the service being called.
    pub fn path(&self) -> &str {
        self.service.path()
    }

    /// Set the result.
    pub fn with_result(mut self, result: Response) -> Self {
        self.result = Some(result);
        self
    }

    /// Set the error.
    pub fn with_error(mut self, error: FeathersError) -> Self {
        self.error = Some(error);
        self
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("kind", &self.kind)
            .field("path", &self.path())
            .field("method", &self.method)
            .field("result", &self.result)
            .field("error", &self.error)
            .finish()
    }
}
