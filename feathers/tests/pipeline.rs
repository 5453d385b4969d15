mod common;

use common::{app_with_stub, data};
use feathers::testing::{ErrorHook, ModifyErrorHook, PopulateResultHook, RecordingHook, StubHook};
use feathers::{FeathersError, HookKind, Hooks, Method, Response, ResponseData, Verb};
use serde_json::json;

// ============================================================================
// Before Phase
// ============================================================================

#[tokio::test]
async fn test_before_result_skips_transport() {
    let (app, provider) = app_with_stub();
    let after = RecordingHook::new("after");
    app.service("users")
        .before(Hooks::new().all(StubHook::object(json!({ "name": "Alice" }))))
        .after(Hooks::new().all(after.clone()));

    let response = app.service("users").get("1", None).await.unwrap();

    assert_eq!(response, Response::object(json!({ "name": "Alice" })));
    assert_eq!(provider.request_count(), 0);
    assert_eq!(after.count(), 1);
}

#[tokio::test]
async fn test_before_error_skips_rest_of_phase_and_transport() {
    let (app, provider) = app_with_stub();
    let skipped = RecordingHook::new("skipped");
    let recovery = skipped.labelled("recovery");
    app.service("users").hooks(
        Some(
            Hooks::new()
                .find(ModifyErrorHook(FeathersError::NotAuthenticated))
                .find(skipped.clone()),
        ),
        None,
        Some(Hooks::new().all(recovery)),
    );

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::NotAuthenticated);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(skipped.labels(), ["recovery"]);
}

#[tokio::test]
async fn test_before_hook_rewrites_call() {
    let (app, provider) = app_with_stub();
    let rewrite = RecordingHook::new("rewrite").with_mutation(|mut context| {
        context.method = Method::Get {
            id: "2".into(),
            query: None,
        };
        context
    });
    app.service("users").before(Hooks::new().get(rewrite));

    app.service("users").get("1", None).await.unwrap();

    let endpoint = provider.last_endpoint().unwrap();
    assert_eq!(endpoint.method().id(), Some("2"));
}

// ============================================================================
// After Phase
// ============================================================================

#[tokio::test]
async fn test_after_hook_replaces_result() {
    let (app, _provider) = app_with_stub();
    app.service("users")
        .after(Hooks::new().all(PopulateResultHook(data(json!({ "name": "Carol" })))));

    let response = app.service("users").get("1", None).await.unwrap();

    assert_eq!(response.as_object().unwrap()["name"], "Carol");
}

#[tokio::test]
async fn test_after_hook_clearing_result_is_unknown() {
    let (app, _provider) = app_with_stub();
    let clear = RecordingHook::new("clear").with_mutation(|mut context| {
        context.result = None;
        context
    });
    let recovery = clear.labelled("recovery");
    app.service("users").hooks(None, Some(Hooks::new().all(clear.clone())), Some(Hooks::new().all(recovery)));

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::Unknown);
    assert_eq!(clear.labels(), ["clear", "recovery"]);
}

#[tokio::test]
async fn test_after_only_hook_registered_as_before_fails_the_call() {
    let (app, provider) = app_with_stub();
    // Expects a result that does not exist yet in the before phase.
    let after_only = feathers::hook_fn(|context: feathers::HookContext| async move {
        match &context.result {
            Some(_) => Ok(context),
            None => Err(FeathersError::General),
        }
    });
    app.service("users").before(Hooks::new().all(after_only));

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::General);
    assert_eq!(provider.request_count(), 0);
}

// ============================================================================
// Error Phase
// ============================================================================

#[tokio::test]
async fn test_transport_error_runs_error_hooks() {
    let (app, provider) = app_with_stub();
    provider.fail_with(FeathersError::NotFound);
    let recovery = RecordingHook::new("recovery");
    let after = recovery.labelled("after");
    app.service("users").hooks(None, Some(Hooks::new().all(after)), Some(Hooks::new().all(recovery.clone())));

    let error = app.service("users").get("9", None).await.unwrap_err();

    assert_eq!(error, FeathersError::NotFound);
    let runs = recovery.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].kind, HookKind::Error);
    assert_eq!(runs[0].verb, Verb::Get);
    assert_eq!(runs[0].path, "users");
}

#[tokio::test]
async fn test_last_error_set_wins() {
    let (app, provider) = app_with_stub();
    provider.fail_with(FeathersError::NotFound);
    app.service("users").error(
        Hooks::new()
            .all(ModifyErrorHook(FeathersError::BadRequest))
            .all(ModifyErrorHook(FeathersError::Forbidden)),
    );

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::Forbidden);
}

#[tokio::test]
async fn test_cleared_error_falls_back_to_originating() {
    let (app, provider) = app_with_stub();
    provider.fail_with(FeathersError::Timeout);
    let clear = RecordingHook::new("clear").with_mutation(|mut context| {
        context.error = None;
        context
    });
    app.service("users").error(Hooks::new().all(clear));

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::Timeout);
}

#[tokio::test]
async fn test_error_hook_returning_err_ends_chain() {
    let (app, provider) = app_with_stub();
    provider.fail_with(FeathersError::NotFound);
    let later = RecordingHook::new("later");
    app.service("users").error(
        Hooks::new()
            .all(ErrorHook(FeathersError::Conflict))
            .all(later.clone()),
    );

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::Conflict);
    assert_eq!(later.count(), 0);
}

#[tokio::test]
async fn test_error_hooks_cannot_turn_failure_into_success() {
    let (app, provider) = app_with_stub();
    provider.fail_with(FeathersError::Unavailable);
    app.service("users")
        .error(Hooks::new().all(StubHook::new(ResponseData::Object(json!({ "cached": true })))));

    let error = app.service("users").find(None).await.unwrap_err();

    assert_eq!(error, FeathersError::Unavailable);
}

// ============================================================================
// Scoping and Ordering
// ============================================================================

#[tokio::test]
async fn test_verb_hooks_only_run_for_their_verb() {
    let (app, _provider) = app_with_stub();
    let on_find = RecordingHook::new("find");
    app.service("users").before(Hooks::new().find(on_find.clone()));

    app.service("users").get("1", None).await.unwrap();
    app.service("users").create(data(json!({ "name": "Dan" })), None).await.unwrap();
    app.service("users").update(Some("1"), data(json!({ "name": "Dan" })), None).await.unwrap();
    app.service("users").patch(Some("1"), data(json!({ "name": "Dan" })), None).await.unwrap();
    app.service("users").remove(Some("1"), None).await.unwrap();
    assert_eq!(on_find.count(), 0);

    app.service("users").find(None).await.unwrap();
    assert_eq!(on_find.count(), 1);
}

#[tokio::test]
async fn test_all_hooks_run_before_verb_hooks_in_each_phase() {
    let (app, _provider) = app_with_stub();
    let log = RecordingHook::new("unused");
    app.service("users").hooks(
        Some(Hooks::new().patch(log.labelled("before patch")).all(log.labelled("before all"))),
        Some(Hooks::new().patch(log.labelled("after patch")).all(log.labelled("after all"))),
        None,
    );

    app.service("users")
        .patch(Some("1"), data(json!({ "name": "Eve" })), None)
        .await
        .unwrap();

    assert_eq!(
        log.labels(),
        ["before all", "before patch", "after all", "after patch"]
    );
}

#[tokio::test]
async fn test_hooks_are_per_service() {
    let (app, _provider) = app_with_stub();
    let users = RecordingHook::new("users");
    app.service("users").before(Hooks::new().all(users.clone()));

    app.service("messages").find(None).await.unwrap();

    assert_eq!(users.count(), 0);
}
