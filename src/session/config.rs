use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the session does once the call is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Ask every question in order
    #[default]
    Interview,
    /// Acknowledge and hang up (questions are generated elsewhere)
    Generate,
}

/// Who is being interviewed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default = "default_profile_image")]
    pub profile_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn default_profile_image() -> String {
    "/user-avatar.png".to_string()
}

impl UserContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            profile_image: default_profile_image(),
            email: None,
            role: None,
        }
    }
}

/// Pacing and deadlines for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Simulated call setup before the session becomes active
    pub connect_delay: Duration,

    /// Upper bound for one speech capture attempt
    pub capture_timeout: Duration,

    /// Gap between one question's follow-up and the next question
    pub turn_pause: Duration,

    /// Upper bound for one follow-up request
    pub followup_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(500),
            capture_timeout: Duration::from_secs(20),
            turn_pause: Duration::from_millis(700),
            followup_timeout: Duration::from_secs(15),
        }
    }
}

/// Configuration for one interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Unique session identifier
    #[serde(default = "new_session_id")]
    pub session_id: String,

    #[serde(default)]
    pub mode: SessionMode,

    /// Questions asked in order; fixed for the session's lifetime
    #[serde(default)]
    pub questions: Vec<String>,

    pub user: UserContext,

    /// Interview record the feedback belongs to
    #[serde(default)]
    pub interview_id: Option<String>,

    /// Existing feedback record to overwrite, if any
    #[serde(default)]
    pub feedback_id: Option<String>,

    /// BCP 47 tag passed to speech output
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(skip)]
    pub timings: SessionTimings,
}

fn new_session_id() -> String {
    format!("interview-{}", uuid::Uuid::new_v4())
}

fn default_language() -> String {
    "en-US".to_string()
}

impl SessionConfig {
    pub fn new(user: UserContext, questions: Vec<String>) -> Self {
        Self {
            session_id: new_session_id(),
            mode: SessionMode::Interview,
            questions,
            user,
            interview_id: None,
            feedback_id: None,
            language: default_language(),
            timings: SessionTimings::default(),
        }
    }
}
