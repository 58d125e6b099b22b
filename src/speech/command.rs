// Speech adapters backed by external programs
//
// Synthesis: the text is appended as the final argument, "{lang}" in any
// argument is replaced with the language tag (e.g. `espeak -v {lang}`).
// Recognition: the program records one utterance and prints the transcript
// on stdout. Non-zero exit is a recognition error, silent exit means no speech.

use anyhow::{bail, Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::input::{RecognitionBackend, RecognitionEvent};
use super::output::{SpeechSynthesizer, Utterance};

/// Speaks through an external TTS command
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    /// Build from a command line such as `["espeak", "-v", "{lang}"]`
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("Synthesizer command is empty")?;

        info!("Command synthesizer initialized: {}", program);

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.replace("{lang}", &utterance.language));

        // kill_on_drop: an interrupted utterance kills the process
        let output = Command::new(&self.program)
            .args(args)
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Captures speech by running an external STT command per attempt
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    running: Option<CancellationToken>,
}

impl CommandRecognizer {
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("Recognizer command is empty")?;

        info!("Command recognizer initialized: {}", program);

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            running: None,
        })
    }

    async fn watch(
        child: &mut Child,
        stdout: ChildStdout,
        stderr: Option<ChildStderr>,
    ) -> RecognitionEvent {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return RecognitionEvent::Result(line.trim().to_string()),
                Ok(None) => break,
                Err(e) => return RecognitionEvent::Error(e.to_string()),
            }
        }

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return RecognitionEvent::Error(e.to_string()),
        };
        if status.success() {
            return RecognitionEvent::End;
        }

        let mut message = String::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_string(&mut message).await.ok();
        }
        let message = message.trim();
        if message.is_empty() {
            RecognitionEvent::Error(format!("recognizer exited with {}", status))
        } else {
            RecognitionEvent::Error(message.to_string())
        }
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for CommandRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        if self.running.is_some() {
            bail!("Already capturing");
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        let stdout = child.stdout.take().context("Recognizer stdout not captured")?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        self.running = Some(token.clone());

        tokio::spawn(async move {
            let event = tokio::select! {
                _ = token.cancelled() => None,
                event = Self::watch(&mut child, stdout, stderr) => Some(event),
            };

            if let Some(event) = event {
                tx.send(event).await.ok();
            }

            // Exited already, or stopped mid-capture
            child.kill().await.ok();
            debug!("Recognizer process released");
        });

        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(token) = self.running.take() {
            token.cancel();
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(CommandSynthesizer::from_command_line(&[]).is_err());
        assert!(CommandRecognizer::from_command_line(&[]).is_err());
    }

    #[tokio::test]
    async fn test_recognizer_reads_first_line() {
        let mut recognizer =
            CommandRecognizer::from_command_line(&command(&["sh", "-c", "echo; echo 'I am an engineer'"]))
                .unwrap();

        let mut events = recognizer.start().await.unwrap();
        let event = events.recv().await;
        recognizer.stop();

        assert_eq!(
            event,
            Some(RecognitionEvent::Result("I am an engineer".to_string()))
        );
    }

    #[tokio::test]
    async fn test_recognizer_silent_exit_is_end() {
        let mut recognizer =
            CommandRecognizer::from_command_line(&command(&["sh", "-c", "exit 0"])).unwrap();

        let mut events = recognizer.start().await.unwrap();
        assert_eq!(events.recv().await, Some(RecognitionEvent::End));
        recognizer.stop();
    }

    #[tokio::test]
    async fn test_recognizer_failure_reports_stderr() {
        let mut recognizer = CommandRecognizer::from_command_line(&command(&[
            "sh",
            "-c",
            "echo 'no microphone' >&2; exit 3",
        ]))
        .unwrap();

        let mut events = recognizer.start().await.unwrap();
        assert_eq!(
            events.recv().await,
            Some(RecognitionEvent::Error("no microphone".to_string()))
        );
        recognizer.stop();
    }

    #[tokio::test]
    async fn test_synthesizer_substitutes_language() {
        let synth =
            CommandSynthesizer::from_command_line(&command(&["sh", "-c", "test \"$0\" = en-US", "{lang}"]))
                .unwrap();

        let utterance = Utterance {
            text: "ignored".to_string(),
            language: "en-US".to_string(),
        };
        // sh -c script receives "{lang}" as $0 and the text as $1
        synth.speak(&utterance).await.unwrap();
    }

    #[tokio::test]
    async fn test_synthesizer_failure_is_error() {
        let synth = CommandSynthesizer::from_command_line(&command(&["sh", "-c", "exit 1"])).unwrap();
        let utterance = Utterance {
            text: "Hello".to_string(),
            language: "en-US".to_string(),
        };
        assert!(synth.speak(&utterance).await.is_err());
    }
}
