use super::config::{SessionConfig, SessionMode};
use super::stats::SessionStats;
use super::status::{CallStatus, Navigation};
use super::transcript::{Transcript, Turn, NO_ANSWER};
use crate::error::{FinalizeError, FollowupError, InterviewError};
use crate::feedback::{FeedbackFinalizer, FinalizeRequest};
use crate::followup::{FollowupRequest, FollowupRequester};
use crate::speech::{
    ManualEntry, PromptSlot, RecognitionBackend, Speaker, SpeechRecognizer, SpeechSynthesizer,
    MANUAL_ENTRY_PROMPT,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{watch, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Spoken after the last question
pub const COMPLETION_MESSAGE: &str = "Thank you. The interview is complete. Ending now.";

/// Spoken instead of questions in generate mode
pub const GENERATE_MODE_MESSAGE: &str = "Interview generation mode active.";

pub fn greeting(name: &str) -> String {
    format!("Hello {}. Let's start the interview.", name)
}

/// External capabilities a session talks to.
///
/// A missing synthesizer or recognizer means the capability is unavailable:
/// speech becomes a silent no-op and every capture falls back to manual entry.
pub struct Collaborators {
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub recognizer: Option<Box<dyn RecognitionBackend>>,
    pub manual_entry: Arc<dyn ManualEntry>,
    pub followup: Arc<dyn FollowupRequester>,
    pub finalizer: Arc<dyn FeedbackFinalizer>,
}

/// Result of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub navigation: Navigation,
    pub transcript: Vec<Turn>,
}

/// A voice interview session.
///
/// `start` spawns a driver task that walks the call through
/// `Connecting → Active → Finished`, asking every question in turn.
/// `disconnect` can end it at any point; either way the transcript is
/// finalized exactly once.
pub struct InterviewSession {
    inner: Arc<SessionInner>,

    /// Handle for the driver task
    driver: Mutex<Option<JoinHandle<SessionOutcome>>>,
}

struct SessionInner {
    config: SessionConfig,
    speaker: Speaker,
    recognizer: SpeechRecognizer,
    manual_entry: Arc<dyn ManualEntry>,
    followup: Arc<dyn FollowupRequester>,
    finalizer: Arc<dyn FeedbackFinalizer>,

    /// Manual-entry prompt currently shown
    prompt: PromptSlot,

    status: watch::Sender<CallStatus>,
    question_index: AtomicUsize,
    transcript: Mutex<Transcript>,
    started_at: OnceLock<DateTime<Utc>>,

    /// Set by the single finalize run
    outcome: OnceCell<SessionOutcome>,

    /// Flips to true once `outcome` is set
    finalized: watch::Sender<bool>,

    /// Cancelled on disconnect
    cancel: CancellationToken,
}

impl InterviewSession {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        info!(
            "Creating interview session: {} ({} questions)",
            config.session_id,
            config.questions.len()
        );

        let (status, _) = watch::channel(CallStatus::Inactive);
        let (finalized, _) = watch::channel(false);
        let inner = SessionInner {
            speaker: Speaker::new(collaborators.synthesizer, config.language.clone()),
            recognizer: SpeechRecognizer::new(collaborators.recognizer),
            manual_entry: collaborators.manual_entry,
            followup: collaborators.followup,
            finalizer: collaborators.finalizer,
            prompt: PromptSlot::default(),
            status,
            question_index: AtomicUsize::new(0),
            transcript: Mutex::new(Transcript::new()),
            started_at: OnceLock::new(),
            outcome: OnceCell::new(),
            finalized,
            cancel: CancellationToken::new(),
            config,
        };

        Self {
            inner: Arc::new(inner),
            driver: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn status(&self) -> CallStatus {
        self.inner.status()
    }

    /// Watch status changes
    pub fn subscribe_status(&self) -> watch::Receiver<CallStatus> {
        self.inner.status.subscribe()
    }

    /// Start the call. Only valid once, from `Inactive`.
    pub async fn start(&self) -> Result<(), InterviewError> {
        self.inner.transition(CallStatus::Connecting)?;
        self.inner.started_at.set(Utc::now()).ok();

        info!("Starting interview session: {}", self.id());

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.drive().await });
        *self.driver.lock().await = Some(handle);

        Ok(())
    }

    /// End the call now: silence speech, abort capture, and finish.
    ///
    /// No-op once the session is finished.
    pub async fn disconnect(&self) {
        let previous = self.status();
        if previous.is_terminal() {
            debug!("Session {} already finished, ignoring disconnect", self.id());
            return;
        }

        info!("Disconnecting interview session: {}", self.id());

        self.inner.transition(CallStatus::Finished).ok();
        self.inner.cancel.cancel();
        self.inner.speaker.interrupt().await;
        self.inner.recognizer.interrupt().await;

        // Nothing is driving the session yet, so finalize here
        if previous == CallStatus::Inactive {
            self.inner.finalize_once().await;
        }
    }

    /// Wait for the session to finish and return its outcome.
    ///
    /// Any number of callers may wait at once; all see the same outcome.
    pub async fn wait(&self) -> Result<SessionOutcome, InterviewError> {
        if self.status() == CallStatus::Inactive {
            return Err(InterviewError::NotStarted);
        }

        // The first waiter reaps the driver so a crashed driver still finalizes
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Session {} driver failed: {}", self.id(), e);
                self.inner.transition(CallStatus::Finished).ok();
                self.inner.finalize_once().await;
                return Err(InterviewError::Driver(e.to_string()));
            }
        }

        let mut finalized = self.inner.finalized.subscribe();
        finalized
            .wait_for(|done| *done)
            .await
            .map_err(|e| InterviewError::Driver(e.to_string()))?;

        self.outcome().ok_or(InterviewError::NotStarted)
    }

    /// Outcome, once finalized
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.inner.outcome.get().cloned()
    }

    pub async fn transcript(&self) -> Vec<Turn> {
        self.inner.transcript.lock().await.to_vec()
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.speaker.is_speaking()
    }

    pub fn is_listening(&self) -> bool {
        self.inner.recognizer.is_listening()
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let (turn_count, last_message) = {
            let transcript = self.inner.transcript.lock().await;
            (
                transcript.len(),
                transcript.last().map(|turn| turn.content.clone()),
            )
        };

        let prompt = self.inner.prompt.current();
        let started_at = self.inner.started_at.get().copied();
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            session_id: self.id().to_string(),
            status: self.status(),
            started_at,
            duration_secs,
            question_index: self.inner.question_index.load(Ordering::SeqCst),
            question_count: self.inner.config.questions.len(),
            turn_count,
            last_message,
            is_speaking: self.is_speaking(),
            is_listening: self.is_listening(),
            pending_question: prompt.as_ref().map(|p| p.question.clone()),
            prompt_message: prompt.map(|p| p.message),
            navigation: self.outcome().map(|outcome| outcome.navigation),
        }
    }
}

impl SessionInner {
    fn id(&self) -> &str {
        &self.config.session_id
    }

    fn status(&self) -> CallStatus {
        *self.status.borrow()
    }

    fn transition(&self, next: CallStatus) -> Result<(), InterviewError> {
        let mut from = next;
        let mut allowed = false;
        self.status.send_if_modified(|status| {
            from = *status;
            allowed = status.can_transition_to(next);
            if allowed && *status != next {
                *status = next;
                true
            } else {
                false
            }
        });

        if !allowed {
            return Err(InterviewError::InvalidTransition { from, to: next });
        }
        if from != next {
            info!("Session {}: {} -> {}", self.id(), from, next);
        }
        Ok(())
    }

    async fn drive(self: Arc<Self>) -> SessionOutcome {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Session {} disconnected", self.id());
            }
            _ = self.conduct() => {
                debug!("Session {} ran to completion", self.id());
            }
        }

        // Any in-flight speech or capture was dropped with conduct()
        self.transition(CallStatus::Finished).ok();
        self.finalize_once().await
    }

    async fn conduct(&self) {
        tokio::time::sleep(self.config.timings.connect_delay).await;
        if let Err(e) = self.transition(CallStatus::Active) {
            warn!("Session {} could not become active: {}", self.id(), e);
            return;
        }

        self.speaker.speak(&greeting(&self.config.user.name)).await;

        match self.config.mode {
            SessionMode::Interview => self.ask_questions().await,
            SessionMode::Generate => self.speaker.speak(GENERATE_MODE_MESSAGE).await,
        }

        self.transition(CallStatus::Finished).ok();
    }

    async fn ask_questions(&self) {
        let questions = &self.config.questions;

        loop {
            let index = self.question_index.load(Ordering::SeqCst);
            let Some(question) = questions.get(index) else {
                info!("Session {}: all {} questions asked", self.id(), questions.len());
                self.speaker.speak(COMPLETION_MESSAGE).await;
                return;
            };

            info!(
                "Session {}: question {}/{}",
                self.id(),
                index + 1,
                questions.len()
            );
            self.ask(question).await;

            self.question_index.store(index + 1, Ordering::SeqCst);
            tokio::time::sleep(self.config.timings.turn_pause).await;
        }
    }

    async fn ask(&self, question: &str) {
        self.record(Turn::assistant(question)).await;
        self.speaker.speak(question).await;

        let answer = self.capture_answer(question).await;
        self.record(Turn::user(answer.clone())).await;

        self.follow_up(question, &answer).await;
    }

    /// Spoken answer, else typed answer, else the no-answer sentinel
    async fn capture_answer(&self, question: &str) -> String {
        match self
            .recognizer
            .listen(self.config.timings.capture_timeout)
            .await
        {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => {
                info!(
                    "Session {}: empty transcript, falling back to manual entry",
                    self.id()
                );
            }
            Err(e) => {
                info!(
                    "Session {}: {}, falling back to manual entry",
                    self.id(),
                    e
                );
            }
        }

        let _open = self.prompt.open(question, MANUAL_ENTRY_PROMPT);
        match self.manual_entry.prompt(question, MANUAL_ENTRY_PROMPT).await {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_ANSWER.to_string(),
        }
    }

    async fn follow_up(&self, question: &str, answer: &str) {
        let request = FollowupRequest {
            question: question.to_string(),
            answer: answer.to_string(),
            history: self.transcript.lock().await.to_vec(),
            user: self.config.user.clone(),
        };

        let timeout = self.config.timings.followup_timeout;
        let result = tokio::time::timeout(timeout, self.followup.request_followup(&request))
            .await
            .unwrap_or(Err(FollowupError::TimedOut(timeout)));

        match result {
            Ok(reply) if !reply.trim().is_empty() => {
                self.record(Turn::assistant(reply.clone())).await;
                self.speaker.speak(&reply).await;
            }
            Ok(_) => warn!("Session {}: {}", self.id(), FollowupError::EmptyReply),
            Err(FollowupError::Disabled) => {
                debug!("Session {}: follow-ups disabled", self.id());
            }
            Err(e) => warn!("Session {}: no follow-up: {}", self.id(), e),
        }
    }

    async fn record(&self, turn: Turn) {
        debug!("Session {} {:?}: {}", self.id(), turn.role, turn.content);
        self.transcript.lock().await.push(turn);
    }

    async fn finalize_once(&self) -> SessionOutcome {
        let outcome = self.outcome.get_or_init(|| self.finalize()).await.clone();
        self.finalized.send_replace(true);
        outcome
    }

    async fn finalize(&self) -> SessionOutcome {
        let transcript = self.transcript.lock().await.to_vec();

        let navigation = match self.submit_feedback(transcript.clone()).await {
            Ok(navigation) => navigation,
            Err(e) => {
                error!("Session {}: failed to save feedback: {}", self.id(), e);
                Navigation::Home
            }
        };

        info!(
            "Session {} finalized ({} turns), navigating to {}",
            self.id(),
            transcript.len(),
            navigation.path()
        );

        SessionOutcome {
            navigation,
            transcript,
        }
    }

    async fn submit_feedback(&self, transcript: Vec<Turn>) -> Result<Navigation, FinalizeError> {
        let request = FinalizeRequest::new(
            self.config.interview_id.as_deref(),
            self.config.user.id.as_deref(),
            transcript,
            self.config.feedback_id.clone(),
        )?;

        let feedback_id = self.finalizer.finalize(&request).await?;
        if feedback_id.is_empty() {
            return Err(FinalizeError::Rejected("no feedback id returned".to_string()));
        }

        Ok(Navigation::Feedback {
            interview_id: request.interview_id,
            feedback_id,
        })
    }
}
