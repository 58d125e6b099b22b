use serde::{Deserialize, Serialize};

use crate::session::{Turn, UserContext};

/// Body sent to the follow-up service after each answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowupRequest {
    pub question: String,
    /// The answer as recorded in the transcript. When nothing was captured
    /// this is the `[no answer]` sentinel rather than an empty string.
    pub answer: String,
    /// Every turn recorded so far, including this answer
    pub history: Vec<Turn>,
    pub user: UserContext,
}

/// Follow-up service response: `reply` on success, `error` otherwise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowupResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// OpenAI-compatible chat completion response (only the parts we read)
#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}
