use crate::config::{Config, FollowupProvider};
use crate::feedback::{FeedbackFactory, FeedbackFinalizer};
use crate::followup::{FollowupFactory, FollowupRequester};
use crate::session::InterviewSession;
use crate::speech::RemoteInput;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A running session plus the channel its client answers through
#[derive(Clone)]
pub struct SessionEntry {
    pub session: Arc<InterviewSession>,
    pub input: RemoteInput,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Interview sessions (session_id → entry)
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,

    pub config: Arc<Config>,

    /// Follow-up requester used by sessions
    pub followup: Arc<dyn FollowupRequester>,

    /// Backs `POST /followup`; only set when an LLM is configured
    pub followup_service: Option<Arc<dyn FollowupRequester>>,

    pub finalizer: Arc<dyn FeedbackFinalizer>,
}

impl AppState {
    pub fn new(
        config: Config,
        followup: Arc<dyn FollowupRequester>,
        followup_service: Option<Arc<dyn FollowupRequester>>,
        finalizer: Arc<dyn FeedbackFinalizer>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            followup,
            followup_service,
            finalizer,
        }
    }

    /// Build collaborators from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let timings = config.timings();
        let followup = FollowupFactory::create(&config.followup, timings.followup_timeout)?;
        let followup_service =
            (config.followup.provider == FollowupProvider::Chat).then(|| Arc::clone(&followup));
        let finalizer = FeedbackFactory::create(&config.feedback)?;

        Ok(Self::new(config, followup, followup_service, finalizer))
    }

    pub async fn find(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Remove `session_id` if it still refers to `session`.
    ///
    /// A newer session registered under the same id is left alone.
    pub async fn evict(&self, session_id: &str, session: &Arc<InterviewSession>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some(entry) if Arc::ptr_eq(&entry.session, session) => {
                sessions.remove(session_id);
                true
            }
            _ => false,
        }
    }
}
