//! End-to-end session tests against a mock study service.
//!
//! These tests stand up a real HTTP server per test and drive the
//! orchestrator through the full submit lifecycle, so classification is
//! exercised on actual wire responses rather than hand-built errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use swot_client::{HttpAuthProvider, HttpStudyService};
use swot_core::{
    AuthGate, Config, ErrorKind, SessionStatus, StudyMode, StudySessionOrchestrator, Submission,
};

/// Serves the router on an ephemeral port and returns its base URL.
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

/// Builds an orchestrator pointed at the mock server.
fn orchestrator_for(base_url: &str, timeout_secs: u64) -> StudySessionOrchestrator {
    let config = Config {
        api_base_url: base_url.to_string(),
        request_timeout_secs: timeout_secs,
    };
    let provider = Arc::new(HttpAuthProvider::new(&config).expect("Failed to build provider"));
    let gate = Arc::new(AuthGate::new(provider));
    let service = Arc::new(HttpStudyService::new(&config).expect("Failed to build service"));
    StudySessionOrchestrator::new(gate, service)
}

/// Standard auth route: issues a fixed token for any credentials.
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

/// Empty-history route so the post-login sync succeeds.
fn empty_history_route() -> Router {
    Router::new().route(
        "/study/history",
        get(|| async { Json(json!({"history": []})) }),
    )
}

async fn login(orchestrator: &StudySessionOrchestrator) {
    let outcome = orchestrator.login("ada@example.com", "secret1").await;
    assert!(outcome.success, "Login failed: {:?}", outcome.error);
}

/// Tests the happy path: auth, generate, and the post-success refresh.
#[tokio::test]
async fn test_study_request_round_trip() {
    let router = login_route()
        .route(
            "/study",
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    // The bearer credential and both query params must be on
                    // the wire.
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    assert_eq!(auth, "Bearer test-token");
                    assert_eq!(params.get("topic").map(String::as_str), Some("Photosynthesis"));
                    assert_eq!(params.get("mode").map(String::as_str), Some("normal"));

                    Json(json!({
                        "topic": "Photosynthesis",
                        "summary": ["Plants convert light into chemical energy."],
                        "quiz": [{
                            "question": "What pigment absorbs light?",
                            "options": ["Chlorophyll", "Keratin", "Melanin", "Hemoglobin"],
                            "correctAnswer": "A"
                        }],
                        "studyTip": "Draw the light and dark reactions side by side.",
                        "wikipediaUrl": "https://en.wikipedia.org/wiki/Photosynthesis"
                    }))
                },
            ),
        )
        .route(
            "/study/history",
            get(|| async {
                Json(json!({
                    "history": [{
                        "_id": "h1",
                        "topic": "Photosynthesis",
                        "mode": "normal",
                        "createdAt": "2026-08-29T10:00:00Z"
                    }]
                }))
            }),
        );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let submission = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect("Submission failed");

    let Submission::Completed(result) = submission else {
        panic!("Expected a completed submission");
    };
    assert_eq!(result.topic, "Photosynthesis");
    assert_eq!(result.quiz.len(), 1);
    assert_eq!(result.quiz[0].correct_answer, "A");
    assert_eq!(
        result.wikipedia_url.as_deref(),
        Some("https://en.wikipedia.org/wiki/Photosynthesis")
    );

    // The fire-and-forget refresh lands shortly after.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Succeeded);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].id, "h1");
}

/// Tests that a 5xx body message is surfaced on the classified error.
#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let router = login_route().merge(empty_history_route()).route(
        "/study",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "The model is overloaded"})),
            )
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a server error");

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.message(), "The model is overloaded");
    assert_eq!(
        orchestrator.snapshot().await.status,
        SessionStatus::Failed
    );
}

/// Tests that a 4xx message is shown verbatim.
#[tokio::test]
async fn test_client_error_message_is_verbatim() {
    let router = login_route().merge(empty_history_route()).route(
        "/study",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Topic is too long"})),
            )
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a client error");

    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_eq!(err.message(), "Topic is too long");
}

/// Tests that a 4xx without a readable message is malformed, not client.
#[tokio::test]
async fn test_unreadable_4xx_is_malformed() {
    let router = login_route().merge(empty_history_route()).route(
        "/study",
        get(|| async { (StatusCode::IM_A_TEAPOT, "<html>teapot</html>") }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a malformed-response error");
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

/// Tests that a 2xx with an unparseable body is malformed.
#[tokio::test]
async fn test_unparseable_success_body_is_malformed() {
    let router = login_route()
        .merge(empty_history_route())
        .route("/study", get(|| async { "definitely not json" }));

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a malformed-response error");
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

/// Tests that a 401 discards the credential: the next submit is denied
/// locally, without another request reaching the service.
#[tokio::test]
async fn test_401_forces_local_logout() {
    let hits = Arc::new(AtomicUsize::new(0));
    let study_hits = Arc::clone(&hits);

    let router = login_route().merge(empty_history_route()).route(
        "/study",
        get(move || {
            let hits = Arc::clone(&study_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"})))
            }
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected an unauthenticated error");
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let snapshot = orchestrator.snapshot().await;
    assert!(snapshot.needs_credentials);
    assert!(snapshot.history.is_empty());

    // Denied before the wire this time.
    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a local denial");
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Tests that a connection failure classifies as network-unreachable.
#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);

    let orchestrator = orchestrator_for(&format!("http://{addr}"), 5);

    // Login fails at the transport layer; no session is established.
    let outcome = orchestrator.login("ada@example.com", "secret1").await;
    assert!(!outcome.success);

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a denial");
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

/// Tests that a hung service resolves into the timeout kind.
#[tokio::test]
async fn test_hung_service_times_out() {
    let router = login_route().merge(empty_history_route()).route(
        "/study",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 1);
    login(&orchestrator).await;

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a timeout");
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

/// Tests that a rejected login leaves the session unauthenticated.
#[tokio::test]
async fn test_rejected_login_keeps_session_locked() {
    let router = Router::new()
        .route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Invalid credentials"})),
                )
            }),
        )
        .merge(empty_history_route());

    let base_url = serve(router).await;
    let orchestrator = orchestrator_for(&base_url, 5);

    let outcome = orchestrator.login("ada@example.com", "secret1").await;
    assert!(!outcome.success);
    assert!(outcome.error.is_some());

    let err = orchestrator
        .submit("Photosynthesis", StudyMode::Normal)
        .await
        .expect_err("Expected a local denial");
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}
