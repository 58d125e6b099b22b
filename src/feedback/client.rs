use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::messages::{FinalizeRequest, FinalizeResponse};
use super::FeedbackFinalizer;
use crate::error::FinalizeError;

/// Posts transcripts to a feedback service
pub struct HttpFeedbackClient {
    client: Client,
    url: String,
}

impl HttpFeedbackClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FinalizeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl FeedbackFinalizer for HttpFeedbackClient {
    async fn finalize(&self, request: &FinalizeRequest) -> Result<String, FinalizeError> {
        info!(
            "Submitting transcript for interview {} ({} turns) to {}",
            request.interview_id,
            request.transcript.len(),
            self.url
        );

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body: FinalizeResponse = response.json().await.unwrap_or_default();

        match (status.is_success(), body.success, body.feedback_id) {
            (true, true, Some(id)) if !id.is_empty() => Ok(id),
            _ => Err(FinalizeError::Rejected(
                body.error
                    .unwrap_or_else(|| format!("feedback service returned {}", status)),
            )),
        }
    }
}
