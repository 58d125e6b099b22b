use anyhow::{ensure, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionTimings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub interview: InterviewConfig,
    pub speech: SpeechConfig,
    pub followup: FollowupConfig,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "interview-agent".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// How long a finished session stays queryable before it is dropped
    pub session_retention_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            session_retention_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub language: String,
    pub connect_delay_ms: u64,
    pub capture_timeout_secs: u64,
    pub turn_pause_ms: u64,
    pub followup_timeout_secs: u64,
    /// How long a typed-answer prompt waits before giving up
    pub manual_entry_timeout_secs: u64,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            connect_delay_ms: 500,
            capture_timeout_secs: 20,
            turn_pause_ms: 700,
            followup_timeout_secs: 15,
            manual_entry_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    /// No speech output; utterances complete immediately
    None,
    /// Print lines to stdout
    #[default]
    Terminal,
    /// Run `synthesizer_command`
    Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub synthesizer: SynthesizerKind,
    /// e.g. ["espeak", "-v", "{lang}"]; the text is appended
    pub synthesizer_command: Vec<String>,
    /// Program printing one transcript line per run; empty disables recognition
    pub recognizer_command: Vec<String>,
    /// Pacing for the terminal synthesizer, 0 disables it
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synthesizer: SynthesizerKind::Terminal,
            synthesizer_command: Vec::new(),
            recognizer_command: Vec::new(),
            words_per_minute: 180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FollowupProvider {
    #[default]
    None,
    /// POST to a follow-up service (`url`)
    Http,
    /// Call an OpenAI-compatible chat completions API directly
    Chat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FollowupConfig {
    pub provider: FollowupProvider,
    /// Follow-up service URL (http) or API base URL (chat)
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for FollowupConfig {
    fn default() -> Self {
        Self {
            provider: FollowupProvider::None,
            url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStoreKind {
    /// Write transcripts under `output_dir`
    #[default]
    File,
    /// POST transcripts to `url`
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub store: FeedbackStoreKind,
    pub url: String,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            store: FeedbackStoreKind::File,
            url: "http://localhost:3000/api/feedback".to_string(),
            output_dir: PathBuf::from("feedback"),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load `path` (extension optional) layered with `INTERVIEW__SECTION__KEY`
    /// environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("INTERVIEW").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.interview.capture_timeout_secs > 0,
            "interview.capture_timeout_secs must be greater than zero"
        );
        ensure!(
            self.interview.followup_timeout_secs > 0,
            "interview.followup_timeout_secs must be greater than zero"
        );
        Ok(())
    }

    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.service.http.session_retention_secs)
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            connect_delay: Duration::from_millis(self.interview.connect_delay_ms),
            capture_timeout: Duration::from_secs(self.interview.capture_timeout_secs),
            turn_pause: Duration::from_millis(self.interview.turn_pause_ms),
            followup_timeout: Duration::from_secs(self.interview.followup_timeout_secs),
        }
    }

    pub fn manual_entry_timeout(&self) -> Duration {
        Duration::from_secs(self.interview.manual_entry_timeout_secs)
    }
}
