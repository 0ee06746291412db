//! Device seams: the capture (speech-to-text) and synthesis (text-to-speech)
//! drivers the engine talks to.
//!
//! Both devices are process-wide singletons on real platforms.  The engine
//! never reaches for ambient globals; it is handed `Arc<dyn …>` handles at
//! construction time, which also lets tests substitute doubles.
//!
//! ```text
//!   CaptureDevice ──CaptureEvent (mpsc)──▶ CaptureSession
//!   SynthesisDevice ◀──speak(Utterance).await── PlaybackScheduler
//!   VoiceSource ◀──voices()── VoiceCatalog
//! ```

pub mod profile;

#[cfg(test)]
pub mod mock;

pub use profile::{DeviceClass, DeviceProfile, Platform};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::voice::VoiceDescriptor;

// ---------------------------------------------------------------------------
// Capture device
// ---------------------------------------------------------------------------

/// One recognised piece of text inside a result event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    /// `true` once the recogniser will no longer revise this segment.
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Raw events delivered by a capture device, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The device has opened the microphone.
    SessionStarted,
    /// New or revised segments since the previous result event.
    Result(Vec<TranscriptSegment>),
    /// The device session is over (after `stop`, an error, or its own timeout).
    SessionEnded,
    /// A device-level error code such as `"no-speech"` or `"not-allowed"`.
    Error(String),
}

/// Sender half handed to [`CaptureDevice::start`].
pub type CaptureEventSender = mpsc::UnboundedSender<CaptureEvent>;

/// Why a capture device refused to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureStartError {
    /// A previous device session is still running.
    #[error("a capture session is already running")]
    AlreadyStarted,

    /// The platform has no recogniser.
    #[error("capture device is not supported")]
    Unsupported,

    #[error("failed to start capture: {0}")]
    Other(String),
}

/// A continuous speech-transcription device.
///
/// Each successful [`start`](Self::start) gets a fresh event sender; events of
/// an older session must never be delivered on a newer sender.
pub trait CaptureDevice: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// Open a session and deliver its events on `events`.
    fn start(&self, events: CaptureEventSender) -> Result<(), CaptureStartError>;

    /// Ask the device to finish; it is expected to emit `SessionEnded`.
    fn stop(&self);

    /// Tear the session down immediately; pending results are discarded.
    fn abort(&self);
}

// Compile-time assertion: the trait must stay object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CaptureDevice>) {}
};

// ---------------------------------------------------------------------------
// Synthesis device
// ---------------------------------------------------------------------------

/// Enumerates the synthetic voices the platform currently exposes.
///
/// The list may be empty right after start-up while the platform loads it.
pub trait VoiceSource: Send + Sync {
    fn voices(&self) -> Vec<VoiceDescriptor>;
}

/// Everything the synthesis device needs to speak one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<VoiceDescriptor>,
    /// BCP-47 language tag, e.g. `"en-US"`.
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Failure of a single utterance.  Never aborts the remaining chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("utterance interrupted")]
    Interrupted,

    #[error("synthesis failed: {0}")]
    Failed(String),
}

/// A text-to-speech device.
#[async_trait]
pub trait SynthesisDevice: VoiceSource {
    /// `false` when the platform has no synthesiser; playback is then skipped.
    fn is_available(&self) -> bool {
        true
    }

    /// Queue `utterance` and resolve when the device reports its end or error.
    async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError>;

    /// Drop everything the device has queued or is currently speaking.
    fn cancel_all(&self);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SynthesisDevice>) {}
};
