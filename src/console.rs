//! Terminal-backed devices so the engine can run without a microphone or a
//! speech synthesizer.
//!
//! * [`ConsoleCapture`] turns each line typed on stdin into one complete
//!   device session: a final transcript segment followed by `SessionEnded`.
//!   An empty line is reported as `no-speech`.
//! * [`ConsoleSynthesis`] "speaks" for a time proportional to the text
//!   length.  The reply text itself is shown by whoever renders
//!   `ReplyReady` events.

use std::io::BufRead;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::device::{
    CaptureDevice, CaptureEvent, CaptureEventSender, CaptureStartError, SynthesisDevice,
    SynthesisError, TranscriptSegment, Utterance, VoiceSource,
};
use crate::voice::VoiceDescriptor;

// ---------------------------------------------------------------------------
// ConsoleCapture
// ---------------------------------------------------------------------------

/// Line-per-utterance capture device reading stdin on a background thread.
pub struct ConsoleCapture {
    language: String,
    session: Mutex<Option<CaptureEventSender>>,
}

impl ConsoleCapture {
    /// Start the stdin reader.  The returned receiver fires once stdin is
    /// closed.
    pub fn spawn(
        language: impl Into<String>,
    ) -> std::io::Result<(Arc<Self>, oneshot::Receiver<()>)> {
        let device = Arc::new(Self {
            language: language.into(),
            session: Mutex::new(None),
        });
        let (eof_tx, eof_rx) = oneshot::channel();

        let reader = Arc::clone(&device);
        std::thread::Builder::new()
            .name("console-capture".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => reader.deliver(line.trim()),
                        Err(e) => {
                            log::error!("console: failed to read stdin: {e}");
                            break;
                        }
                    }
                }
                log::debug!("console: stdin closed");
                let _ = eof_tx.send(());
            })?;

        Ok((device, eof_rx))
    }

    fn deliver(&self, line: &str) {
        let Some(tx) = self.take_session() else {
            println!("(not listening, input ignored)");
            return;
        };

        if line.is_empty() {
            let _ = tx.send(CaptureEvent::Error("no-speech".into()));
        } else {
            let _ = tx.send(CaptureEvent::Result(vec![TranscriptSegment::final_(line)]));
        }
        let _ = tx.send(CaptureEvent::SessionEnded);
    }

    fn take_session(&self) -> Option<CaptureEventSender> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl CaptureDevice for ConsoleCapture {
    fn start(&self, events: CaptureEventSender) -> Result<(), CaptureStartError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.is_some() {
            return Err(CaptureStartError::AlreadyStarted);
        }
        let _ = events.send(CaptureEvent::SessionStarted);
        *session = Some(events);
        println!("[{} mic] type your answer:", self.language);
        Ok(())
    }

    fn stop(&self) {
        if let Some(tx) = self.take_session() {
            let _ = tx.send(CaptureEvent::SessionEnded);
        }
    }

    fn abort(&self) {
        self.take_session();
    }
}

// ---------------------------------------------------------------------------
// ConsoleSynthesis
// ---------------------------------------------------------------------------

/// Silent synthesis stand-in with realistic timing.
pub struct ConsoleSynthesis {
    per_char: Duration,
    voices: Vec<VoiceDescriptor>,
}

impl ConsoleSynthesis {
    pub fn new(per_char: Duration) -> Arc<Self> {
        Arc::new(Self {
            per_char,
            voices: vec![
                VoiceDescriptor::new("Console English (United Kingdom)", "en-GB").local(),
                VoiceDescriptor::new("Console English (United States)", "en-US")
                    .local()
                    .platform_default(),
            ],
        })
    }

    fn speaking_time(&self, text: &str) -> Duration {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        self.per_char.saturating_mul(chars)
    }
}

impl VoiceSource for ConsoleSynthesis {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }
}

#[async_trait]
impl SynthesisDevice for ConsoleSynthesis {
    async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError> {
        log::debug!(
            "console: speaking {} chars (rate {:.2}, pitch {:.2})",
            utterance.text.chars().count(),
            utterance.rate,
            utterance.pitch
        );
        tokio::time::sleep(self.speaking_time(&utterance.text)).await;
        Ok(())
    }

    fn cancel_all(&self) {
        log::debug!("console: speech cancelled");
    }
}
