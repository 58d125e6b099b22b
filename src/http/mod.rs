//! HTTP API for driving interview sessions from a remote client
//!
//! The client (typically a browser) plays the spoken lines, runs speech
//! recognition, and relays outcomes back:
//! - POST /interviews/start - Start a new interview session
//! - POST /interviews/:id/disconnect - End a session early
//! - GET /interviews/:id/status - Query session status
//! - GET /interviews/:id/transcript - Get the transcript so far
//! - POST /interviews/:id/speech - Deliver a recognition result/error/end
//! - POST /interviews/:id/answer - Deliver a typed answer
//! - POST /followup - Follow-up service contract
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{AnswerRequest, SpeechEventRequest, StartInterviewResponse};
pub use routes::create_router;
pub use state::{AppState, SessionEntry};
