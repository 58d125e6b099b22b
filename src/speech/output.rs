use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::indicator::Indicator;

/// One piece of text to be spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// BCP 47 language tag (e.g. "en-US")
    pub language: String,
}

/// Text-to-speech backend trait
///
/// Implementations:
/// - Terminal: prints the line and waits roughly as long as it takes to say it
/// - Command: pipes the text to an external TTS program
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak one utterance and return once playback ends.
    ///
    /// Dropping the returned future must stop playback.
    async fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Session-scoped speech output.
///
/// Never fails: output errors and a missing synthesizer both resolve as a
/// completed utterance. At most one utterance plays at a time; starting a new
/// one interrupts the previous.
pub struct Speaker {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    language: String,
    speaking: Indicator,
    current: Mutex<CancellationToken>,
}

impl Speaker {
    pub fn new(
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            language: language.into(),
            speaking: Indicator::new(),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_active()
    }

    /// Speak `text` and wait until it finishes, fails, or is interrupted
    pub async fn speak(&self, text: &str) {
        let Some(synthesizer) = &self.synthesizer else {
            debug!("No speech synthesizer, skipping utterance: {}", text);
            return;
        };

        let token = self.preempt().await;
        let utterance = Utterance {
            text: text.to_string(),
            language: self.language.clone(),
        };

        let _speaking = self.speaking.raise();
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Utterance interrupted ({})", synthesizer.name());
            }
            result = synthesizer.speak(&utterance) => {
                if let Err(e) = result {
                    warn!("Speech output failed ({}): {:#}", synthesizer.name(), e);
                }
            }
        }
    }

    /// Silence whatever is currently being spoken
    pub async fn interrupt(&self) {
        self.current.lock().await.cancel();
    }

    async fn preempt(&self) -> CancellationToken {
        let mut current = self.current.lock().await;
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }
}
