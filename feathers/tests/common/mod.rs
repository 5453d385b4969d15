#![allow(dead_code)]

use feathers::testing::StubProvider;
use feathers::{Data, Feathers};
use serde_json::{Value, json};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

/// An application over a stub echoing `{"name": "Bob"}`.
pub fn app_with_stub() -> (Feathers, Arc<StubProvider>) {
    app_echoing(json!({ "name": "Bob" }))
}

/// An application over a stub echoing `data`.
pub fn app_echoing(data: Value) -> (Feathers, Arc<StubProvider>) {
    let provider = Arc::new(StubProvider::new(data));
    (Feathers::new(provider.clone()), provider)
}

/// A JSON object as request data.
pub fn data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Wait until the stub has seen `count` requests.
pub async fn requests_reach(provider: &StubProvider, count: usize) {
    while provider.request_count() < count {
        tokio::task::yield_now().await;
    }
}
