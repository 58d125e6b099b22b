use serde::{Deserialize, Serialize};

use crate::error::FinalizeError;
use crate::session::Turn;

/// Transcript handoff sent once a session finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

impl FinalizeRequest {
    /// Fails when either required identifier is missing or blank
    pub fn new(
        interview_id: Option<&str>,
        user_id: Option<&str>,
        transcript: Vec<Turn>,
        feedback_id: Option<String>,
    ) -> Result<Self, FinalizeError> {
        let interview_id =
            present(interview_id).ok_or(FinalizeError::MissingIdentifier("interviewId"))?;
        let user_id = present(user_id).ok_or(FinalizeError::MissingIdentifier("userId"))?;

        Ok(Self {
            interview_id,
            user_id,
            transcript,
            feedback_id,
        })
    }
}

fn present(id: Option<&str>) -> Option<String> {
    id.map(str::trim).filter(|id| !id.is_empty()).map(str::to_string)
}

/// Feedback store response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
