// Integration tests for the follow-up clients
//
// Each test spins up a throwaway axum server on an ephemeral port that plays
// the follow-up service (or chat completions API).

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use interview_agent::error::FollowupError;
use interview_agent::followup::{
    ChatFollowupClient, FollowupRequest, FollowupRequester, HttpFollowupClient,
};
use interview_agent::session::{Turn, UserContext};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_request() -> FollowupRequest {
    FollowupRequest {
        question: "Why Rust?".to_string(),
        answer: "Memory safety without a GC".to_string(),
        history: vec![
            Turn::assistant("Why Rust?"),
            Turn::user("Memory safety without a GC"),
        ],
        user: UserContext::new("Ada"),
    }
}

#[tokio::test]
async fn test_http_client_returns_reply() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/followup",
            post(
                |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({ "reply": "  Great answer. Moving on.  " }))
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let base = spawn_server(app).await;

    let client =
        HttpFollowupClient::new(format!("{}/followup", base), Duration::from_secs(5)).unwrap();
    let reply = client.request_followup(&sample_request()).await.unwrap();

    assert_eq!(reply, "Great answer. Moving on.");

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(body["question"], "Why Rust?");
    assert_eq!(body["answer"], "Memory safety without a GC");
    assert_eq!(body["history"][0]["role"], "assistant");
    assert_eq!(body["history"][1]["role"], "user");
    assert_eq!(body["user"]["name"], "Ada");
}

#[tokio::test]
async fn test_http_client_surfaces_server_error() {
    let app = Router::new().route(
        "/followup",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate follow-up" })),
            )
        }),
    );
    let base = spawn_server(app).await;

    let client =
        HttpFollowupClient::new(format!("{}/followup", base), Duration::from_secs(5)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    match err {
        FollowupError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to generate follow-up");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_http_client_rejects_missing_reply() {
    let app = Router::new().route("/followup", post(|| async { Json(json!({})) }));
    let base = spawn_server(app).await;

    let client =
        HttpFollowupClient::new(format!("{}/followup", base), Duration::from_secs(5)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    assert!(matches!(err, FollowupError::EmptyReply));
}

#[tokio::test]
async fn test_http_client_rejects_non_json_body() {
    let app = Router::new().route("/followup", post(|| async { "not json" }));
    let base = spawn_server(app).await;

    let client =
        HttpFollowupClient::new(format!("{}/followup", base), Duration::from_secs(5)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    assert!(matches!(err, FollowupError::Malformed(_)));
}

#[tokio::test]
async fn test_http_client_times_out() {
    let app = Router::new().route(
        "/followup",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "reply": "late" }))
        }),
    );
    let base = spawn_server(app).await;

    let client =
        HttpFollowupClient::new(format!("{}/followup", base), Duration::from_millis(50)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    assert!(matches!(err, FollowupError::Transport(_)));
}

#[tokio::test]
async fn test_chat_client_sends_prompt_and_reads_first_choice() {
    let seen: Arc<Mutex<Option<(Option<String>, Value)>>> = Arc::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State(seen): State<Arc<Mutex<Option<(Option<String>, Value)>>>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().unwrap() = Some((auth, body));
                    Json(json!({
                        "choices": [
                            { "message": { "role": "assistant", "content": "Nice. Moving on." } }
                        ]
                    }))
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let base = spawn_server(app).await;

    let client = ChatFollowupClient::new(
        format!("{}/v1/", base),
        "sk-test",
        "gpt-4o-mini",
        Duration::from_secs(5),
    )
    .unwrap();
    let reply = client.request_followup(&sample_request()).await.unwrap();
    assert_eq!(reply, "Nice. Moving on.");

    let (auth, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4o-mini");
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("\"Why Rust?\""));
    assert!(prompt.contains("\"Memory safety without a GC\""));
}

#[tokio::test]
async fn test_chat_client_rejects_empty_choices() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    );
    let base = spawn_server(app).await;

    let client =
        ChatFollowupClient::new(base, "sk-test", "gpt-4o-mini", Duration::from_secs(5)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    assert!(matches!(err, FollowupError::EmptyReply));
}

#[tokio::test]
async fn test_chat_client_surfaces_api_error() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base = spawn_server(app).await;

    let client =
        ChatFollowupClient::new(base, "sk-bad", "gpt-4o-mini", Duration::from_secs(5)).unwrap();
    let err = client.request_followup(&sample_request()).await.unwrap_err();

    assert!(matches!(err, FollowupError::Status { status: 401, .. }));
}
