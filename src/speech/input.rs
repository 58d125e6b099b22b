use anyhow::Result;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::indicator::{Indicator, IndicatorGuard};
use crate::error::CaptureError;

/// Terminal event reported by a recognition backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Best transcript for the captured utterance
    Result(String),
    /// Device or recognizer fault, with the backend's reason
    Error(String),
    /// Capture ended on its own without a result
    End,
}

/// Speech-to-text capture backend trait
///
/// Implementations:
/// - Command: runs an external STT program for each capture
/// - Remote: receives events pushed over the HTTP API
#[async_trait::async_trait]
pub trait RecognitionBackend: Send {
    /// Start capturing one utterance
    ///
    /// Returns a channel receiver for the capture's events; only the first
    /// event is consumed.
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// Stop capturing and release the device. Must be safe to call when idle.
    fn stop(&mut self);

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Session-scoped speech input.
///
/// Each [`listen`](SpeechRecognizer::listen) call is one capture attempt with
/// exactly one outcome. The backend is held for the attempt and released on
/// every exit path, including when the caller drops the future.
pub struct SpeechRecognizer {
    backend: Option<Mutex<Box<dyn RecognitionBackend>>>,
    listening: Indicator,
    current: Mutex<CancellationToken>,
}

impl SpeechRecognizer {
    pub fn new(backend: Option<Box<dyn RecognitionBackend>>) -> Self {
        Self {
            backend: backend.map(Mutex::new),
            listening: Indicator::new(),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_active()
    }

    /// Capture one utterance, giving up after `timeout`.
    ///
    /// A newer call aborts an older one still in flight.
    pub async fn listen(&self, timeout: Duration) -> Result<String, CaptureError> {
        let Some(backend) = &self.backend else {
            return Err(CaptureError::Unsupported);
        };

        let token = self.preempt().await;
        let backend = tokio::select! {
            _ = token.cancelled() => return Err(aborted()),
            backend = backend.lock() => backend,
        };

        let mut capture = Capture::begin(backend, &self.listening).await?;
        debug!("Listening ({}) for up to {:?}", capture.backend.name(), timeout);

        tokio::select! {
            _ = token.cancelled() => Err(aborted()),
            outcome = tokio::time::timeout(timeout, capture.outcome()) => {
                outcome.unwrap_or(Err(CaptureError::Timeout(timeout)))
            }
        }
    }

    /// Abort the capture in flight, if any
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

fn aborted() -> CaptureError {
    CaptureError::Recognition("aborted".to_string())
}

/// Exclusive hold on the capture device for one attempt
struct Capture<'a> {
    backend: MutexGuard<'a, Box<dyn RecognitionBackend>>,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
    _listening: IndicatorGuard,
}

impl<'a> Capture<'a> {
    async fn begin(
        backend: MutexGuard<'a, Box<dyn RecognitionBackend>>,
        listening: &Indicator,
    ) -> Result<Capture<'a>, CaptureError> {
        let mut capture = Capture {
            backend,
            events: None,
            _listening: listening.raise(),
        };

        // On failure the partially started capture is dropped, which stops it
        let events = capture
            .backend
            .start()
            .await
            .map_err(|e| CaptureError::Recognition(format!("{:#}", e)))?;
        capture.events = Some(events);

        Ok(capture)
    }

    async fn outcome(&mut self) -> Result<String, CaptureError> {
        let Some(events) = self.events.as_mut() else {
            return Err(CaptureError::NoSpeechDetected);
        };

        match events.recv().await {
            Some(RecognitionEvent::Result(text)) => Ok(text),
            Some(RecognitionEvent::Error(reason)) => Err(CaptureError::Recognition(reason)),
            Some(RecognitionEvent::End) | None => Err(CaptureError::NoSpeechDetected),
        }
    }
}

impl Drop for Capture<'_> {
    fn drop(&mut self) {
        if let Some(mut events) = self.events.take() {
            events.close();
        }
        self.backend.stop();
    }
}
