use super::state::{AppState, SessionEntry};
use crate::followup::{FollowupRequest, FollowupResponse};
use crate::session::{CallStatus, Collaborators, InterviewSession, SessionConfig};
use crate::speech::{RecognitionEvent, RemoteInput, SpeechFactory};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub status: CallStatus,
}

/// Outcome of a recognition attempt run by the client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpeechEventRequest {
    Result { transcript: String },
    Error { reason: String },
    End,
}

impl From<SpeechEventRequest> for RecognitionEvent {
    fn from(request: SpeechEventRequest) -> Self {
        match request {
            SpeechEventRequest::Result { transcript } => RecognitionEvent::Result(transcript),
            SpeechEventRequest::Error { reason } => RecognitionEvent::Error(reason),
            SpeechEventRequest::End => RecognitionEvent::End,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview session {} not found", session_id),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Start a new interview session
pub async fn start_interview(
    State(state): State<AppState>,
    Json(mut config): Json<SessionConfig>,
) -> impl IntoResponse {
    let session_id = config.session_id.clone();
    info!("Starting interview session: {}", session_id);

    if state.sessions.read().await.contains_key(&session_id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Interview session {} already exists", session_id),
        );
    }

    let synthesizer = match SpeechFactory::synthesizer(&state.config.speech) {
        Ok(synthesizer) => synthesizer,
        Err(e) => {
            error!("Failed to create speech synthesizer: {:#}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create speech synthesizer: {}", e),
            );
        }
    };

    config.timings = state.config.timings();
    let input = RemoteInput::new(state.config.manual_entry_timeout());
    let collaborators = Collaborators {
        synthesizer,
        recognizer: Some(Box::new(input.recognition_backend())),
        manual_entry: Arc::new(input.clone()),
        followup: Arc::clone(&state.followup),
        finalizer: Arc::clone(&state.finalizer),
    };
    let session = Arc::new(InterviewSession::new(config, collaborators));

    {
        let mut sessions = state.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Interview session {} already exists", session_id),
            );
        }
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                input,
            },
        );
    }

    if let Err(e) = session.start().await {
        error!("Failed to start interview session {}: {}", session_id, e);
        state.sessions.write().await.remove(&session_id);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to start interview: {}", e),
        );
    }

    spawn_reaper(state.clone(), Arc::clone(&session));

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            session_id,
            status: session.status(),
        }),
    )
        .into_response()
}

/// POST /interviews/:session_id/disconnect
/// End an interview session early
pub async fn disconnect_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(entry) = state.find(&session_id).await else {
        return not_found(&session_id);
    };

    let session = entry.session;
    session.disconnect().await;
    if let Err(e) = session.wait().await {
        warn!("Interview session {} ended abnormally: {}", session_id, e);
    }
    let stats = session.stats().await;

    state.evict(&session_id, &session).await;
    info!("Interview session {} disconnected", session_id);

    (StatusCode::OK, Json(stats)).into_response()
}

/// Drop a session from the registry once it has finished on its own and
/// its retention period has passed
fn spawn_reaper(state: AppState, session: Arc<InterviewSession>) {
    let retention = state.config.session_retention();
    tokio::spawn(async move {
        if let Err(e) = session.wait().await {
            warn!("Interview session {} ended abnormally: {}", session.id(), e);
        }
        tokio::time::sleep(retention).await;

        if state.evict(session.id(), &session).await {
            debug!("Interview session {} expired", session.id());
        }
    });
}

/// GET /interviews/:session_id/status
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.find(&session_id).await {
        Some(entry) => (StatusCode::OK, Json(entry.session.stats().await)).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /interviews/:session_id/transcript
pub async fn get_interview_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.find(&session_id).await {
        Some(entry) => (StatusCode::OK, Json(entry.session.transcript().await)).into_response(),
        None => not_found(&session_id),
    }
}

/// POST /interviews/:session_id/speech
/// Deliver the client's recognition outcome for the current question
pub async fn post_speech_event(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(event): Json<SpeechEventRequest>,
) -> impl IntoResponse {
    let Some(entry) = state.find(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.input.push_event(event.into()) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /interviews/:session_id/answer
/// Deliver a typed answer after speech capture failed
pub async fn post_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(answer): Json<AnswerRequest>,
) -> impl IntoResponse {
    let Some(entry) = state.find(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.input.submit_answer(answer.text) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /followup
/// Generate an interviewer follow-up for one answer
pub async fn followup(
    State(state): State<AppState>,
    Json(request): Json<FollowupRequest>,
) -> impl IntoResponse {
    let Some(service) = &state.followup_service else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "No follow-up model configured".to_string(),
        );
    };

    match service.request_followup(&request).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(FollowupResponse {
                reply: Some(reply),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Follow-up generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FollowupResponse {
                    reply: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
