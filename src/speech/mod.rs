//! Speech input and output for interview sessions
//!
//! - `output`: text-to-speech trait and the session's `Speaker`
//! - `input`: recognition backend trait and the session's `SpeechRecognizer`
//! - `manual`: typed-answer fallback
//! - `terminal`, `command`, `remote`: concrete adapters

pub mod command;
pub mod indicator;
pub mod input;
pub mod manual;
pub mod output;
pub mod remote;
pub mod terminal;

pub use command::{CommandRecognizer, CommandSynthesizer};
pub use indicator::Indicator;
pub use input::{RecognitionBackend, RecognitionEvent, SpeechRecognizer};
pub use manual::{
    ManualEntry, NoManualEntry, PendingPrompt, PromptSlot, MANUAL_ENTRY_PROMPT,
};
pub use output::{Speaker, SpeechSynthesizer, Utterance};
pub use remote::{RemoteInput, RemoteRecognition};
pub use terminal::{StdinEntry, TerminalSynthesizer};

use anyhow::Result;
use std::sync::Arc;

use crate::config::{SpeechConfig, SynthesizerKind};

/// Builds speech backends from configuration
pub struct SpeechFactory;

impl SpeechFactory {
    /// `None` means the session has no speech output capability
    pub fn synthesizer(config: &SpeechConfig) -> Result<Option<Arc<dyn SpeechSynthesizer>>> {
        match config.synthesizer {
            SynthesizerKind::None => Ok(None),
            SynthesizerKind::Terminal => Ok(Some(Arc::new(TerminalSynthesizer::new(
                config.words_per_minute,
            )))),
            SynthesizerKind::Command => Ok(Some(Arc::new(CommandSynthesizer::from_command_line(
                &config.synthesizer_command,
            )?))),
        }
    }

    /// `None` means the session has no speech recognition capability
    pub fn recognizer(config: &SpeechConfig) -> Result<Option<Box<dyn RecognitionBackend>>> {
        if config.recognizer_command.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(CommandRecognizer::from_command_line(
            &config.recognizer_command,
        )?)))
    }
}
