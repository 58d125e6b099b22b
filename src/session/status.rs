use serde::{Deserialize, Serialize};
use std::fmt;

/// Call lifecycle of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    #[default]
    Inactive,
    Connecting,
    Active,
    Finished,
}

impl CallStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Finished` is reachable from every state and absorbs itself; nothing
    /// else can be entered twice.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        matches!(
            (self, next),
            (CallStatus::Inactive, CallStatus::Connecting)
                | (CallStatus::Connecting, CallStatus::Active)
                | (_, CallStatus::Finished)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CallStatus::Finished
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallStatus::Inactive => "INACTIVE",
            CallStatus::Connecting => "CONNECTING",
            CallStatus::Active => "ACTIVE",
            CallStatus::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

/// Where the caller should go once the session is finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum Navigation {
    /// Feedback was saved
    #[serde(rename_all = "camelCase")]
    Feedback {
        interview_id: String,
        feedback_id: String,
    },
    /// Feedback could not be saved
    Home,
}

impl Navigation {
    pub fn path(&self) -> String {
        match self {
            Navigation::Feedback { interview_id, .. } => {
                format!("/interview/{}/feedback", interview_id)
            }
            Navigation::Home => "/".to_string(),
        }
    }
}
