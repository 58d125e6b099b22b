// Terminal speech adapters for running an interview from a shell
//
// The synthesizer prints each line and holds for roughly the time it would
// take to say it, so pacing matches a spoken session.

use anyhow::Result;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

use super::manual::ManualEntry;
use super::output::{SpeechSynthesizer, Utterance};

/// Prints interviewer lines to stdout
pub struct TerminalSynthesizer {
    words_per_minute: u32,
}

impl TerminalSynthesizer {
    /// `words_per_minute` of 0 disables pacing
    pub fn new(words_per_minute: u32) -> Self {
        Self { words_per_minute }
    }

    fn speaking_time(&self, text: &str) -> Duration {
        if self.words_per_minute == 0 {
            return Duration::ZERO;
        }
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for TerminalSynthesizer {
    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        println!("Interviewer: {}", utterance.text);
        tokio::time::sleep(self.speaking_time(&utterance.text)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

/// Reads typed answers from stdin
pub struct StdinEntry {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    timeout: Duration,
}

impl StdinEntry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ManualEntry for StdinEntry {
    async fn prompt(&self, question: &str, message: &str) -> Option<String> {
        println!("{}", message);
        print!("[{}] > ", question);
        std::io::stdout().flush().ok();

        let mut lines = self.lines.lock().await;
        match tokio::time::timeout(self.timeout, lines.next_line()).await {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                warn!("Failed to read answer from stdin: {}", e);
                None
            }
            Err(_) => {
                println!();
                None
            }
        }
    }
}
