//! Pure per-session bookkeeping for endpoint detection.
//!
//! [`SessionState`] holds no timers; the session driver owns those and asks
//! this type what to do after each event.

use std::time::Duration;

use tokio::time::Instant;

use crate::device::TranscriptSegment;

/// Lifecycle of one capture session.
///
/// ```text
/// Idle ──start──▶ Listening ◀──────────────┐
///                    │ result (speech)      │ pause too early
///                    ▼                      │
///              EndpointPending ─────────────┘
///                    │ pause ≥ min speech / device end / stall
///                    ▼
///                  Ended
/// any ──error──▶ Errored ──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Listening,
    /// Speech seen and the pause timer is armed.
    EndpointPending,
    /// An utterance was emitted; waiting for the next `start`.
    Ended,
    /// Transient; always followed by `Idle` before the error is reported.
    Errored,
}

impl CaptureState {
    /// `true` while the microphone should be open.
    pub fn is_listening(&self) -> bool {
        matches!(self, CaptureState::Listening | CaptureState::EndpointPending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::Listening => "Listening",
            CaptureState::EndpointPending => "Listening (pause detected)",
            CaptureState::Ended => "Ended",
            CaptureState::Errored => "Error",
        }
    }
}

/// Transcript accumulated during the current device session.
#[derive(Debug, Default)]
pub struct SessionState {
    pub state: CaptureState,
    pub final_text: String,
    pub interim_text: String,
    pub speech_detected: bool,
    pub speech_started: Option<Instant>,
}

/// What the driver should do after a result event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEffect {
    /// (Re-)arm the pause timer.
    pub arm_pause: bool,
    /// This event carried the first speech of the session.
    pub first_speech: bool,
}

impl SessionState {
    /// Clear everything for a fresh device session.
    pub fn reset(&mut self, state: CaptureState) {
        *self = SessionState {
            state,
            ..SessionState::default()
        };
    }

    /// Fold one result event into the transcript.
    pub fn apply_result(&mut self, segments: &[TranscriptSegment], now: Instant) -> ResultEffect {
        let mut interim = String::new();
        for seg in segments {
            if seg.is_final {
                append(&mut self.final_text, &seg.text);
            } else {
                append(&mut interim, &seg.text);
            }
        }
        self.interim_text = interim;

        let mut first_speech = false;
        if !self.speech_detected && segments.iter().any(|s| !s.text.trim().is_empty()) {
            self.speech_detected = true;
            self.speech_started = Some(now);
            first_speech = true;
        }

        let arm_pause = self.speech_detected && !self.running_text().trim().is_empty();
        if arm_pause {
            self.state = CaptureState::EndpointPending;
        }

        ResultEffect {
            arm_pause,
            first_speech,
        }
    }

    /// Final text followed by the current interim text.
    pub fn running_text(&self) -> String {
        let mut text = self.final_text.clone();
        append(&mut text, &self.interim_text);
        text
    }

    /// Text to emit at the endpoint: the final text, or the interim text when
    /// nothing was ever marked final.
    pub fn utterance_text(&self) -> Option<String> {
        [&self.final_text, &self.interim_text]
            .into_iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .map(str::to_string)
    }

    pub fn speech_duration(&self, now: Instant) -> Duration {
        self.speech_started
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }
}

/// Append `piece`, inserting a space when neither side supplies one.
fn append(text: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    let needs_space = !text.is_empty()
        && !text.ends_with(char::is_whitespace)
        && !piece.starts_with(char::is_whitespace);
    if needs_space {
        text.push(' ');
    }
    text.push_str(piece);
}
