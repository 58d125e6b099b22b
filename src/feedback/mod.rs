//! Feedback finalization: the one-time transcript handoff after a session

pub mod client;
pub mod file;
pub mod messages;

pub use client::HttpFeedbackClient;
pub use file::{FeedbackRecord, FileFeedbackStore};
pub use messages::{FinalizeRequest, FinalizeResponse};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{FeedbackConfig, FeedbackStoreKind};
use crate::error::FinalizeError;

/// Persists a finished session's transcript
#[async_trait::async_trait]
pub trait FeedbackFinalizer: Send + Sync {
    /// Returns the identifier of the stored feedback
    async fn finalize(&self, request: &FinalizeRequest) -> Result<String, FinalizeError>;
}

/// Builds the configured feedback store
pub struct FeedbackFactory;

impl FeedbackFactory {
    pub fn create(config: &FeedbackConfig) -> Result<Arc<dyn FeedbackFinalizer>> {
        match config.store {
            FeedbackStoreKind::File => Ok(Arc::new(FileFeedbackStore::new(&config.output_dir))),
            FeedbackStoreKind::Http => Ok(Arc::new(
                HttpFeedbackClient::new(&config.url, Duration::from_secs(config.timeout_secs))
                    .context("Failed to build feedback client")?,
            )),
        }
    }
}
