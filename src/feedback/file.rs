use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::messages::FinalizeRequest;
use super::FeedbackFinalizer;
use crate::error::FinalizeError;
use crate::session::Turn;

/// Feedback record written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub feedback_id: String,
    pub interview_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<Turn>,
}

/// Stores transcripts as `{output_dir}/{interview_id}/feedback-{feedback_id}.json`
pub struct FileFeedbackStore {
    output_dir: PathBuf,
}

impl FileFeedbackStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn record_path(&self, interview_id: &str, feedback_id: &str) -> PathBuf {
        self.output_dir
            .join(sanitize(interview_id))
            .join(format!("feedback-{}.json", sanitize(feedback_id)))
    }

    /// Read back a stored record
    pub async fn load(
        &self,
        interview_id: &str,
        feedback_id: &str,
    ) -> Result<FeedbackRecord, FinalizeError> {
        let bytes = tokio::fs::read(self.record_path(interview_id, feedback_id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Keep identifiers from escaping the output directory
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait::async_trait]
impl FeedbackFinalizer for FileFeedbackStore {
    async fn finalize(&self, request: &FinalizeRequest) -> Result<String, FinalizeError> {
        let feedback_id = request
            .feedback_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let record = FeedbackRecord {
            feedback_id: feedback_id.clone(),
            interview_id: request.interview_id.clone(),
            user_id: request.user_id.clone(),
            created_at: Utc::now(),
            transcript: request.transcript.clone(),
        };

        let path = self.record_path(&request.interview_id, &feedback_id);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;

        info!(
            "Saved feedback {} ({} turns) to {}",
            feedback_id,
            record.transcript.len(),
            path.display()
        );

        Ok(feedback_id)
    }
}
