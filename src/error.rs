use std::time::Duration;

use thiserror::Error;

use crate::session::CallStatus;

/// Why a single speech capture attempt produced no text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// No recognition capability was found for this session
    #[error("speech recognition is not supported")]
    Unsupported,

    /// Recognition ended without producing a result
    #[error("no speech detected")]
    NoSpeechDetected,

    /// The device or recognizer reported a fault
    #[error("speech capture failed: {0}")]
    Recognition(String),

    /// Nothing happened before the capture deadline
    #[error("listening timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a single follow-up request. Never retried.
#[derive(Debug, Error)]
pub enum FollowupError {
    #[error("follow-up service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("follow-up transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed follow-up response: {0}")]
    Malformed(String),

    #[error("follow-up reply was empty")]
    EmptyReply,

    #[error("follow-up request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("follow-up requests are disabled")]
    Disabled,
}

/// Failure handing the transcript to the feedback collaborator
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("missing required identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("feedback store rejected the transcript: {0}")]
    Rejected(String),

    #[error("feedback transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feedback store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize feedback: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by the interview session itself.
///
/// Capture, follow-up and finalize failures never reach the caller: they are
/// recovered inside the session and logged.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("cannot move session from {from} to {to}")]
    InvalidTransition { from: CallStatus, to: CallStatus },

    #[error("session has not been started")]
    NotStarted,

    #[error("session driver stopped unexpectedly: {0}")]
    Driver(String),
}
