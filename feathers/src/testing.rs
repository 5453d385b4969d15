//! Testing utilities for hooks and services.
//!
//! Re-exports the in-memory transports from `feathers-std` and adds hooks
//! with fixed behavior for exercising the pipeline.
//!
//! # Features
//!
//! - [`StubHook`]: Supplies a result
//! - [`ErrorHook`]: Fails the phase by returning `Err`
//! - [`ModifyErrorHook`]: Sets the context error
//! - [`PopulateResultHook`]: Replaces the result with an object
//! - [`RecordingHook`]: Records every run, optionally rewriting the context

use crate::context::{HookContext, HookKind};
use crate::hook::Hook;
use feathers_core::{Data, FeathersError, Response, ResponseData, Verb};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

pub use feathers_std::testing::{MockSocketClient, StubProvider};

// ============================================================================
// Fixed Hooks
// ============================================================================

/// Sets the result to `data`, without pagination.
///
/// In the before phase this skips the transport.
#[derive(Debug, Clone)]
pub struct StubHook {
    data: ResponseData,
}

impl StubHook {
    /// Create a hook supplying `data`.
    pub fn new(data: ResponseData) -> Self {
        Self { data }
    }

    /// Create a hook supplying a JSON object.
    pub fn object(value: Value) -> Self {
        Self::new(ResponseData::Object(value))
    }
}

impl Hook for StubHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        Ok(context.with_result(Response {
            pagination: None,
            data: self.data.clone(),
        }))
    }
}

/// Returns `Err` with its error.
#[derive(Debug, Clone)]
pub struct ErrorHook(pub FeathersError);

impl Hook for ErrorHook {
    async fn run(&self, _context: HookContext) -> Result<HookContext, FeathersError> {
        Err(self.0.clone())
    }
}

/// Sets the context error to its error.
#[derive(Debug, Clone)]
pub struct ModifyErrorHook(pub FeathersError);

impl Hook for ModifyErrorHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        Ok(context.with_error(self.0.clone()))
    }
}

/// Replaces the result with an object.
#[derive(Debug, Clone)]
pub struct PopulateResultHook(pub Data);

impl Hook for PopulateResultHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        Ok(context.with_result(Response::object(Value::Object(self.0.clone()))))
    }
}

// ============================================================================
// Recording Hook
// ============================================================================

/// One run seen by a [`RecordingHook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRun {
    /// Label the hook was created with.
    pub label: &'static str,
    /// Phase of the context.
    pub kind: HookKind,
    /// Verb of the call.
    pub verb: Verb,
    /// Service path.
    pub path: String,
}

type Mutation = Arc<dyn Fn(HookContext) -> HookContext + Send + Sync>;

/// Records every run into a log shared between clones.
///
/// Several recording hooks can share one log through
/// [`labelled`](Self::labelled) to assert on ordering across phases.
///
/// # Example
///
/// ```rust,ignore
/// let first = RecordingHook::new("first");
/// let second = first.labelled("second");
/// app.service("users").before(Hooks::new().all(first.clone()).find(second));
///
/// app.service("users").find(None).await?;
/// assert_eq!(first.labels(), ["first", "second"]);
/// ```
#[derive(Clone)]
pub struct RecordingHook {
    label: &'static str,
    runs: Arc<Mutex<Vec<HookRun>>>,
    mutation: Option<Mutation>,
}

impl RecordingHook {
    /// Create a hook with a fresh log.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            runs: Arc::new(Mutex::new(Vec::new())),
            mutation: None,
        }
    }

    /// Another hook writing into the same log.
    pub fn labelled(&self, label: &'static str) -> Self {
        Self {
            label,
            runs: Arc::clone(&self.runs),
            mutation: None,
        }
    }

    /// Apply `mutation` to the context after recording.
    pub fn with_mutation(
        mut self,
        mutation: impl Fn(HookContext) -> HookContext + Send + Sync + 'static,
    ) -> Self {
        self.mutation = Some(Arc::new(mutation));
        self
    }

    /// Every run recorded in the shared log, in order.
    pub fn runs(&self) -> Vec<HookRun> {
        self.runs.lock().clone()
    }

    /// Labels of every run in the shared log, in order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.runs.lock().iter().map(|run| run.label).collect()
    }

    /// Number of runs in the shared log.
    pub fn count(&self) -> usize {
        self.runs.lock().len()
    }
}

impl Hook for RecordingHook {
    async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
        self.runs.lock().push(HookRun {
            label: self.label,
            kind: context.kind(),
            verb: context.method.verb(),
            path: context.path().to_owned(),
        });
        Ok(match &self.mutation {
            Some(mutation) => mutation(context),
            None => context,
        })
    }
}
