use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{CallStatus, Navigation};

/// Point-in-time view of an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub session_id: String,

    pub status: CallStatus,

    /// When the start command was received
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since start, zero before start
    pub duration_secs: f64,

    /// Index of the question being asked (equals `question_count` when done)
    pub question_index: usize,

    pub question_count: usize,

    /// Number of transcript turns recorded so far
    pub turn_count: usize,

    /// Most recent transcript line
    pub last_message: Option<String>,

    pub is_speaking: bool,

    pub is_listening: bool,

    /// Question waiting on a typed answer
    pub pending_question: Option<String>,

    /// Message shown with the pending typed-answer prompt
    pub prompt_message: Option<String>,

    /// Set once the transcript has been finalized
    pub navigation: Option<Navigation>,
}
