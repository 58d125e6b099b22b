use reqwest::Client;
use std::time::Duration;

use super::client::{non_empty, FollowupRequester};
use super::messages::{ChatCompletion, FollowupRequest};
use crate::error::FollowupError;

/// Interviewer instructions for a single answer
pub fn followup_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are a professional job interviewer. The candidate was asked:\n\
         \"{question}\"\n\
         They answered:\n\
         \"{answer}\"\n\
         \n\
         Based on this answer, provide either:\n\
         - a short acknowledgement and a brief follow-up question if clarification is needed, OR\n\
         - a short positive acknowledgement and \"Moving on\" if the answer is sufficient.\n\
         \n\
         Keep the reply <= 30 words. Output only the reply text, no extra commentary."
    )
}

/// Asks an OpenAI-compatible chat completions API for the follow-up directly
pub struct ChatFollowupClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatFollowupClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FollowupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl FollowupRequester for ChatFollowupClient {
    async fn request_followup(&self, request: &FollowupRequest) -> Result<String, FollowupError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": followup_prompt(&request.question, &request.answer)
                }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FollowupError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| FollowupError::Malformed(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        non_empty(content)
    }
}
