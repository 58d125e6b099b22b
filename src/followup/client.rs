use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::messages::{FollowupRequest, FollowupResponse};
use crate::error::FollowupError;

/// Produces a short interviewer reaction to one answer.
///
/// One attempt per answer; callers treat any error as "no follow-up".
#[async_trait::async_trait]
pub trait FollowupRequester: Send + Sync {
    async fn request_followup(&self, request: &FollowupRequest) -> Result<String, FollowupError>;
}

/// Returns the reply text if it has any content
pub(crate) fn non_empty(reply: Option<String>) -> Result<String, FollowupError> {
    match reply {
        Some(reply) if !reply.trim().is_empty() => Ok(reply.trim().to_string()),
        _ => Err(FollowupError::EmptyReply),
    }
}

/// Client for a follow-up service speaking the `{reply}` / `{error}` contract
pub struct HttpFollowupClient {
    client: Client,
    url: String,
}

impl HttpFollowupClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FollowupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl FollowupRequester for HttpFollowupClient {
    async fn request_followup(&self, request: &FollowupRequest) -> Result<String, FollowupError> {
        debug!("Requesting follow-up from {}", self.url);

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<FollowupResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or(body);
            return Err(FollowupError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FollowupResponse = serde_json::from_str(&body)
            .map_err(|e| FollowupError::Malformed(e.to_string()))?;
        non_empty(parsed.reply)
    }
}

/// Used when no follow-up provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFollowup;

#[async_trait::async_trait]
impl FollowupRequester for DisabledFollowup {
    async fn request_followup(&self, _request: &FollowupRequest) -> Result<String, FollowupError> {
        Err(FollowupError::Disabled)
    }
}
