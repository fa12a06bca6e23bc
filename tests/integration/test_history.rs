//! History synchronization tests against a mock study service.
//!
//! Exercises the full-replacement refresh, clear-after-confirmation, and the
//! credential-expiry path of the background refresh.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use swot_client::{HttpAuthProvider, HttpStudyService};
use swot_core::{
    AuthGate, Config, ErrorKind, SessionStatus, StudyMode, StudySessionOrchestrator,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Mock server crashed");
    });
    format!("http://{addr}")
}

fn orchestrator_for(base_url: &str) -> StudySessionOrchestrator {
    let config = Config {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
    };
    let provider = Arc::new(HttpAuthProvider::new(&config).expect("Failed to build provider"));
    let gate = Arc::new(AuthGate::new(provider));
    let service = Arc::new(HttpStudyService::new(&config).expect("Failed to build service"));
    StudySessionOrchestrator::new(gate, service)
}

fn login_route() -> Router {
    Router::new().route(
        "/auth/login",
        post(|| async {
            Json(json!({
                "token": "test-token",
                "user": {"name": "Ada", "email": "ada@example.com"}
            }))
        }),
    )
}

fn two_entry_history() -> serde_json::Value {
    json!({
        "history": [
            {
                "_id": "h2",
                "topic": "Linear Algebra",
                "mode": "math",
                "createdAt": "2026-08-29T11:00:00Z"
            },
            {
                "_id": "h1",
                "topic": "Photosynthesis",
                "mode": "normal",
                "createdAt": "2026-08-28T09:30:00Z"
            }
        ]
    })
}

async fn login(orchestrator: &StudySessionOrchestrator) {
    let outcome = orchestrator.login("ada@example.com", "secret1").await;
    assert!(outcome.success, "Login failed: {:?}", outcome.error);
}

/// Tests that login syncs the history in server order, aliases and all.
#[tokio::test]
async fn test_login_syncs_history_in_server_order() {
    let router = login_route().route(
        "/study/history",
        get(|| async { Json(two_entry_history()) }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    login(&orchestrator).await;

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.history.len(), 2);
    assert_eq!(snapshot.history[0].id, "h2");
    assert_eq!(snapshot.history[0].mode, StudyMode::Math);
    assert_eq!(snapshot.history[1].topic, "Photosynthesis");
}

/// Tests that a refresh replaces the local list wholesale.
#[tokio::test]
async fn test_refresh_replaces_local_list() {
    let shrunk = Arc::new(AtomicBool::new(false));
    let history_flag = Arc::clone(&shrunk);

    // First call returns two entries; later calls return one. A merge would
    // keep both; a replacement shows exactly the latest payload.
    let router = login_route().route(
        "/study/history",
        get(move || {
            let shrunk = Arc::clone(&history_flag);
            async move {
                if shrunk.swap(true, Ordering::SeqCst) {
                    Json(json!({
                        "history": [{
                            "_id": "h2",
                            "topic": "Linear Algebra",
                            "mode": "math",
                            "createdAt": "2026-08-29T11:00:00Z"
                        }]
                    }))
                } else {
                    Json(two_entry_history())
                }
            }
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    login(&orchestrator).await;
    assert_eq!(orchestrator.snapshot().await.history.len(), 2);

    orchestrator.refresh_history().await.expect("Refresh failed");

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].id, "h2");
}

/// Tests that clearing empties the local list only after the remote delete.
#[tokio::test]
async fn test_clear_history_after_remote_confirmation() {
    let deletes = Arc::new(AtomicUsize::new(0));
    let delete_hits = Arc::clone(&deletes);

    let router = login_route().route(
        "/study/history",
        get(|| async { Json(two_entry_history()) }).delete(move || {
            let deletes = Arc::clone(&delete_hits);
            async move {
                deletes.fetch_add(1, Ordering::SeqCst);
                Json(json!({"message": "History cleared"}))
            }
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    login(&orchestrator).await;

    orchestrator.clear_history().await.expect("Clear failed");

    assert_eq!(deletes.load(Ordering::SeqCst), 1);
    assert!(orchestrator.snapshot().await.history.is_empty());
}

/// Tests that a failed remote delete leaves the local list untouched.
#[tokio::test]
async fn test_failed_clear_keeps_local_entries() {
    let router = login_route().route(
        "/study/history",
        get(|| async { Json(two_entry_history()) }).delete(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Delete rejected"})),
            )
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    login(&orchestrator).await;
    let before = orchestrator.snapshot().await.history;
    assert_eq!(before.len(), 2);

    let err = orchestrator
        .clear_history()
        .await
        .expect_err("Expected the delete to fail");

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.message(), "Delete rejected");
    assert_eq!(orchestrator.snapshot().await.history, before);
}

/// Tests that a failing background refresh never demotes a success.
#[tokio::test]
async fn test_background_refresh_failure_keeps_success() {
    let router = login_route()
        .route(
            "/study/history",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "History store down"})),
                )
            }),
        )
        .route(
            "/study",
            get(|| async {
                Json(json!({
                    "topic": "Photosynthesis",
                    "summary": ["Plants convert light into chemical energy."],
                    "quiz": [],
                    "studyTip": "Space your repetitions."
                }))
            }),
        );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    // The post-login sync fails; the session itself stays authenticated.
    login(&orchestrator).await;

    orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect("Submission failed");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Succeeded);
    assert!(snapshot.error.is_none());
}

/// Tests that a 401 on the background refresh ends the session: the
/// credential is discarded and the local history wiped, while the displayed
/// result stays succeeded.
#[tokio::test]
async fn test_expired_credential_during_refresh_ends_session() {
    let expired = Arc::new(AtomicBool::new(false));
    let history_flag = Arc::clone(&expired);

    let router = login_route()
        .route(
            "/study/history",
            get(move || {
                let expired = Arc::clone(&history_flag);
                async move {
                    if expired.load(Ordering::SeqCst) {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"message": "jwt expired"})),
                        )
                            .into_response()
                    } else {
                        Json(two_entry_history()).into_response()
                    }
                }
            }),
        )
        .route(
            "/study",
            get(|| async {
                Json(json!({
                    "topic": "Photosynthesis",
                    "summary": ["Plants convert light into chemical energy."],
                    "quiz": [],
                    "studyTip": "Space your repetitions."
                }))
            }),
        );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url);
    login(&orchestrator).await;
    assert_eq!(orchestrator.snapshot().await.history.len(), 2);

    // The credential expires between the submit and its refresh.
    expired.store(true, Ordering::SeqCst);
    orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect("Submission failed");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Succeeded);
    assert!(snapshot.history.is_empty());

    // Gated calls are now denied locally.
    let err = orchestrator
        .submit("Linear Algebra", StudyMode::Math)
        .await
        .expect_err("Expected a local denial");
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}
