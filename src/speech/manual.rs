use std::sync::{Mutex, MutexGuard};

/// Prompt shown when an answer could not be captured from speech
pub const MANUAL_ENTRY_PROMPT: &str = "Couldn't capture audio. Please type your answer:";

/// Typed-answer fallback used when speech capture fails
#[async_trait::async_trait]
pub trait ManualEntry: Send + Sync {
    /// Ask the candidate to type an answer. `None` means no answer was given.
    async fn prompt(&self, question: &str, message: &str) -> Option<String>;
}

/// Manual entry for sessions with nobody to type (always declines)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoManualEntry;

#[async_trait::async_trait]
impl ManualEntry for NoManualEntry {
    async fn prompt(&self, _question: &str, _message: &str) -> Option<String> {
        None
    }
}

/// A manual-entry prompt that is waiting for an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrompt {
    pub question: String,
    pub message: String,
}

/// Tracks the prompt a session is currently showing, if any
#[derive(Debug, Default)]
pub struct PromptSlot {
    current: Mutex<Option<PendingPrompt>>,
}

impl PromptSlot {
    fn lock(&self) -> MutexGuard<'_, Option<PendingPrompt>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark a prompt as open until the returned guard is dropped
    pub fn open(&self, question: &str, message: &str) -> OpenPrompt<'_> {
        *self.lock() = Some(PendingPrompt {
            question: question.to_string(),
            message: message.to_string(),
        });
        OpenPrompt { slot: self }
    }

    pub fn current(&self) -> Option<PendingPrompt> {
        self.lock().clone()
    }
}

/// Guard returned by [`PromptSlot::open`]
pub struct OpenPrompt<'a> {
    slot: &'a PromptSlot,
}

impl Drop for OpenPrompt<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}
