use anyhow::{bail, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::input::{RecognitionBackend, RecognitionEvent};
use super::manual::ManualEntry;

#[derive(Default)]
struct Slots {
    /// Events for the capture attempt in flight
    capture: Option<mpsc::Sender<RecognitionEvent>>,
    /// Reply channel for the manual-entry prompt in flight
    answer: Option<oneshot::Sender<String>>,
    /// Question shown with the pending manual-entry prompt
    pending_question: Option<String>,
}

/// Speech input relayed from a remote client (e.g. a browser) over HTTP.
///
/// The client runs recognition itself and pushes the outcome; the session
/// sees it as an ordinary recognition backend and manual-entry prompt.
#[derive(Clone)]
pub struct RemoteInput {
    slots: Arc<Mutex<Slots>>,
    manual_timeout: Duration,
}

impl RemoteInput {
    pub fn new(manual_timeout: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            manual_timeout,
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // Slots hold no invariants a panic could break
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Backend to hand to the session's speech recognizer
    pub fn recognition_backend(&self) -> RemoteRecognition {
        RemoteRecognition {
            input: self.clone(),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.slots().capture.is_some()
    }

    /// Question awaiting a typed answer, if any
    pub fn pending_question(&self) -> Option<String> {
        self.slots().pending_question.clone()
    }

    /// Deliver a recognition event to the capture in flight
    pub fn push_event(&self, event: RecognitionEvent) -> Result<()> {
        let Some(capture) = self.slots().capture.take() else {
            bail!("No capture in progress");
        };
        if capture.try_send(event).is_err() {
            bail!("Capture already ended");
        }
        Ok(())
    }

    /// Deliver a typed answer to the pending prompt
    pub fn submit_answer(&self, text: String) -> Result<()> {
        let mut slots = self.slots();
        let Some(answer) = slots.answer.take() else {
            bail!("No answer requested");
        };
        slots.pending_question = None;
        if answer.send(text).is_err() {
            bail!("Answer prompt already closed");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ManualEntry for RemoteInput {
    async fn prompt(&self, question: &str, _message: &str) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slots = self.slots();
            slots.answer = Some(tx);
            slots.pending_question = Some(question.to_string());
        }
        let _open = OpenPrompt { input: self };

        let answer = tokio::time::timeout(self.manual_timeout, rx).await;

        match answer {
            Ok(Ok(text)) => Some(text),
            _ => {
                debug!("No typed answer received");
                None
            }
        }
    }
}

/// Clears the prompt slots however the prompt ends, including when the
/// prompting future is dropped mid-wait.
struct OpenPrompt<'a> {
    input: &'a RemoteInput,
}

impl Drop for OpenPrompt<'_> {
    fn drop(&mut self) {
        let mut slots = self.input.slots();
        slots.answer = None;
        slots.pending_question = None;
    }
}

/// Recognition backend fed by [`RemoteInput::push_event`]
pub struct RemoteRecognition {
    input: RemoteInput,
}

#[async_trait::async_trait]
impl RecognitionBackend for RemoteRecognition {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(1);
        self.input.slots().capture = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        self.input.slots().capture = None;
    }

    fn name(&self) -> &str {
        "remote"
    }
}
