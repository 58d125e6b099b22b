// Integration tests for the HTTP API
//
// Requests go straight into the router with `tower::ServiceExt::oneshot`;
// the client side of speech recognition is played by posting events.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use interview_agent::config::SynthesizerKind;
use interview_agent::error::{FinalizeError, FollowupError};
use interview_agent::feedback::{FeedbackFinalizer, FinalizeRequest};
use interview_agent::followup::{FollowupRequest, FollowupRequester};
use interview_agent::speech::MANUAL_ENTRY_PROMPT;
use interview_agent::{create_router, AppState, Config};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct EchoFollowup;

#[async_trait::async_trait]
impl FollowupRequester for EchoFollowup {
    async fn request_followup(&self, request: &FollowupRequest) -> Result<String, FollowupError> {
        if request.answer == "fail" {
            return Err(FollowupError::Status {
                status: 502,
                message: "model unavailable".to_string(),
            });
        }
        Ok(format!("Thanks, {}.", request.user.name))
    }
}

struct FixedFinalizer {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl FeedbackFinalizer for FixedFinalizer {
    async fn finalize(&self, _request: &FinalizeRequest) -> Result<String, FinalizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("fb-1".to_string())
    }
}

fn test_config(connect_delay_ms: u64) -> Config {
    let mut config = Config::default();
    config.speech.synthesizer = SynthesizerKind::None;
    config.interview.connect_delay_ms = connect_delay_ms;
    config.interview.turn_pause_ms = 0;
    config.interview.capture_timeout_secs = 5;
    config.interview.manual_entry_timeout_secs = 5;
    config
}

fn test_state(config: Config, followup_service: bool) -> (AppState, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let followup: Arc<dyn FollowupRequester> = Arc::new(EchoFollowup);
    let state = AppState::new(
        config,
        Arc::clone(&followup),
        followup_service.then_some(followup),
        Arc::new(FixedFinalizer {
            calls: Arc::clone(&calls),
        }),
    );
    (state, calls)
}

fn test_app(connect_delay_ms: u64, followup_service: bool) -> (Router, Arc<AtomicUsize>) {
    let (state, calls) = test_state(test_config(connect_delay_ms), followup_service);
    (create_router(state), calls)
}

async fn session_count(state: &AppState) -> usize {
    state.sessions.read().await.len()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Poll the status endpoint until `condition` holds
async fn wait_for_status(
    app: &Router,
    session_id: &str,
    condition: impl Fn(&Value) -> bool,
) -> Value {
    let uri = format!("/interviews/{}/status", session_id);
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let (_, stats) = send(app, Method::GET, &uri, None).await;
            if condition(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("status condition not reached in time")
}

fn interview(session_id: &str, questions: &[&str]) -> Value {
    json!({
        "sessionId": session_id,
        "interviewId": "int-1",
        "questions": questions,
        "user": { "name": "Ada", "id": "user-1" }
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app(0, false);
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_start_returns_session_id() {
    let (app, _) = test_app(10_000, false);
    let (status, body) = send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-start", &["Q1"])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "s-start");
    assert_eq!(body["status"], "CONNECTING");

    send(&app, Method::POST, "/interviews/s-start/disconnect", None).await;
}

#[tokio::test]
async fn test_duplicate_session_conflicts() {
    let (app, _) = test_app(10_000, false);
    let body = interview("s-dup", &["Q1"]);

    let (first, _) = send(&app, Method::POST, "/interviews/start", Some(body.clone())).await;
    let (second, error) = send(&app, Method::POST, "/interviews/start", Some(body)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(error["error"].as_str().unwrap().contains("s-dup"));

    send(&app, Method::POST, "/interviews/s-dup/disconnect", None).await;
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (app, _) = test_app(0, false);

    for (method, uri) in [
        (Method::GET, "/interviews/missing/status"),
        (Method::GET, "/interviews/missing/transcript"),
        (Method::POST, "/interviews/missing/disconnect"),
    ] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/missing/speech",
        Some(json!({ "type": "end" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spoken_answer_completes_interview() -> Result<()> {
    let (app, finalized) = test_app(0, false);
    send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-spoken", &["Why Rust?"])),
    )
    .await;

    wait_for_status(&app, "s-spoken", |s| s["isListening"] == true).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/s-spoken/speech",
        Some(json!({ "type": "result", "transcript": "Memory safety" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let stats = wait_for_status(&app, "s-spoken", |s| !s["navigation"].is_null()).await;
    assert_eq!(stats["status"], "FINISHED");
    assert_eq!(stats["questionIndex"], 1);
    assert_eq!(
        stats["navigation"],
        json!({ "target": "feedback", "interviewId": "int-1", "feedbackId": "fb-1" })
    );

    let (_, transcript) = send(&app, Method::GET, "/interviews/s-spoken/transcript", None).await;
    assert_eq!(
        transcript,
        json!([
            { "role": "assistant", "content": "Why Rust?" },
            { "role": "user", "content": "Memory safety" },
            { "role": "assistant", "content": "Thanks, Ada." }
        ])
    );
    assert_eq!(finalized.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_recognition_error_accepts_typed_answer() -> Result<()> {
    let (app, _) = test_app(0, false);
    send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-typed", &["Q1"])),
    )
    .await;

    wait_for_status(&app, "s-typed", |s| s["isListening"] == true).await;
    send(
        &app,
        Method::POST,
        "/interviews/s-typed/speech",
        Some(json!({ "type": "error", "reason": "not-allowed" })),
    )
    .await;

    // The status shows the open prompt so the client knows what to ask for
    let stats = wait_for_status(&app, "s-typed", |s| s["pendingQuestion"] == "Q1").await;
    assert_eq!(stats["promptMessage"], MANUAL_ENTRY_PROMPT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/s-typed/answer",
        Some(json!({ "text": "Typed answer" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let stats = wait_for_status(&app, "s-typed", |s| s["pendingQuestion"].is_null()).await;
    assert!(stats["promptMessage"].is_null());

    wait_for_status(&app, "s-typed", |s| s["status"] == "FINISHED").await;
    let (_, transcript) = send(&app, Method::GET, "/interviews/s-typed/transcript", None).await;
    assert_eq!(transcript[1]["content"], "Typed answer");

    Ok(())
}

#[tokio::test]
async fn test_speech_without_capture_conflicts() {
    let (app, _) = test_app(10_000, false);
    send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-early", &["Q1"])),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/s-early/speech",
        Some(json!({ "type": "result", "transcript": "too early" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/s-early/answer",
        Some(json!({ "text": "too early" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, Method::POST, "/interviews/s-early/disconnect", None).await;
}

#[tokio::test]
async fn test_disconnect_finishes_session() {
    let (app, finalized) = test_app(0, false);
    send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-hangup", &["Q1", "Q2"])),
    )
    .await;
    wait_for_status(&app, "s-hangup", |s| s["isListening"] == true).await;

    let (status, stats) = send(&app, Method::POST, "/interviews/s-hangup/disconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["status"], "FINISHED");
    assert_eq!(stats["isListening"], false);
    assert_eq!(stats["turnCount"], 1);
    assert_eq!(stats["navigation"]["target"], "feedback");

    // The session is gone once disconnected
    let (status, _) = send(&app, Method::GET, "/interviews/s-hangup/status", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, "/interviews/s-hangup/disconnect", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disconnect_removes_sessions_from_map() {
    let (state, finalized) = test_state(test_config(10_000), false);
    let app = create_router(state.clone());

    for i in 0..20 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/interviews/start",
            Some(interview(&format!("s-bulk-{}", i), &["Q1"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(session_count(&state).await, 20);

    for i in 0..20 {
        let uri = format!("/interviews/s-bulk-{}/disconnect", i);
        let (status, _) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(session_count(&state).await, 0);
    assert_eq!(finalized.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_finished_session_expires_after_retention() -> Result<()> {
    let mut config = test_config(0);
    config.service.http.session_retention_secs = 0;
    let (state, finalized) = test_state(config, false);
    let app = create_router(state.clone());

    send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-expire", &["Q1"])),
    )
    .await;
    wait_for_status(&app, "s-expire", |s| s["isListening"] == true).await;
    send(
        &app,
        Method::POST,
        "/interviews/s-expire/speech",
        Some(json!({ "type": "result", "transcript": "A1" })),
    )
    .await;

    tokio::time::timeout(Duration::from_secs(3), async {
        while session_count(&state).await > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;

    let (status, _) = send(&app, Method::GET, "/interviews/s-expire/status", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);

    // The id can be reused once the old session is gone
    let (status, _) = send(
        &app,
        Method::POST,
        "/interviews/start",
        Some(interview("s-expire", &["Q1"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    send(&app, Method::POST, "/interviews/s-expire/disconnect", None).await;

    Ok(())
}

#[tokio::test]
async fn test_followup_endpoint_unavailable_without_model() {
    let (app, _) = test_app(0, false);
    let (status, body) = send(
        &app,
        Method::POST,
        "/followup",
        Some(json!({
            "question": "Q1",
            "answer": "A1",
            "history": [],
            "user": { "name": "Ada" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_followup_endpoint_returns_reply() {
    let (app, _) = test_app(0, true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/followup",
        Some(json!({
            "question": "Q1",
            "answer": "A1",
            "history": [],
            "user": { "name": "Ada" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "Thanks, Ada." }));
}

#[tokio::test]
async fn test_followup_endpoint_reports_failure() {
    let (app, _) = test_app(0, true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/followup",
        Some(json!({
            "question": "Q1",
            "answer": "fail",
            "history": [],
            "user": { "name": "Ada" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("model unavailable"));
    assert!(body.get("reply").is_none());
}
