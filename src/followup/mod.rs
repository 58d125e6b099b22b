//! Follow-up requests: a short interviewer reaction after each answer

pub mod chat;
pub mod client;
pub mod messages;

pub use chat::{followup_prompt, ChatFollowupClient};
pub use client::{DisabledFollowup, FollowupRequester, HttpFollowupClient};
pub use messages::{FollowupRequest, FollowupResponse};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{FollowupConfig, FollowupProvider};

/// Builds the configured follow-up requester
pub struct FollowupFactory;

impl FollowupFactory {
    pub fn create(
        config: &FollowupConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn FollowupRequester>> {
        match config.provider {
            FollowupProvider::None => Ok(Arc::new(DisabledFollowup)),
            FollowupProvider::Http => Ok(Arc::new(
                HttpFollowupClient::new(&config.url, timeout)
                    .context("Failed to build follow-up client")?,
            )),
            FollowupProvider::Chat => {
                let api_key = config
                    .api_key
                    .clone()
                    .context("followup.api_key must be set for the chat provider")?;
                Ok(Arc::new(
                    ChatFollowupClient::new(&config.url, api_key, &config.model, timeout)
                        .context("Failed to build chat follow-up client")?,
                ))
            }
        }
    }
}
