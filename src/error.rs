//! Engine-wide error taxonomy.
//!
//! Device-level failures are mapped into [`EngineError`] at the point where
//! they occur.  The orchestrator then decides, per variant, whether the error
//! is handled internally or surfaced to the UI:
//!
//! | Variant                   | Recoverable | Surfaced to the user |
//! |---------------------------|-------------|----------------------|
//! | `NoSpeechDetected`        | yes         | no (fallback turn)   |
//! | `Aborted`                 | yes         | no (auto-restart)    |
//! | `PermissionDenied`        | no          | yes                  |
//! | `AudioCaptureUnavailable` | no          | yes                  |
//! | `NetworkFailure`          | no          | yes                  |
//! | `DeviceUnsupported`       | no          | yes                  |
//! | `SynthesisUnavailable`    | yes         | no (text-only reply) |
//! | `InvalidInput`            | yes         | no (rejected)        |
//! | `Unknown`                 | no          | yes                  |

use thiserror::Error;

/// All errors the voice turn engine can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The platform has no capture (or synthesis) device at all.
    #[error("speech device is not supported on this platform")]
    DeviceUnsupported,

    /// The user or the OS refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The capture device heard nothing before its own timeout.
    #[error("no speech detected")]
    NoSpeechDetected,

    /// No microphone was found, or it is disabled.
    #[error("audio capture unavailable")]
    AudioCaptureUnavailable,

    /// The transcription service could not be reached.
    #[error("network failure during recognition")]
    NetworkFailure,

    /// The device session was aborted.
    #[error("recognition aborted")]
    Aborted,

    /// Speech output is unavailable; replies degrade to text only.
    #[error("speech synthesis unavailable")]
    SynthesisUnavailable,

    /// Rejected at the API boundary (e.g. speaking blank text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any device code that does not map onto the variants above.
    #[error("speech device error: {0}")]
    Unknown(String),
}

impl EngineError {
    /// Returns `true` for errors the engine recovers from on its own.
    ///
    /// ```
    /// use voice_turn_engine::EngineError;
    ///
    /// assert!(EngineError::NoSpeechDetected.is_recoverable());
    /// assert!(EngineError::Aborted.is_recoverable());
    /// assert!(!EngineError::PermissionDenied.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::NoSpeechDetected
                | EngineError::Aborted
                | EngineError::SynthesisUnavailable
                | EngineError::InvalidInput(_)
        )
    }

    /// Returns `true` when the UI should show [`user_message`](Self::user_message).
    pub fn is_user_visible(&self) -> bool {
        !self.is_recoverable()
    }

    /// A short message suitable for an error popup.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::DeviceUnsupported => {
                "Your device doesn't support speech features. Please try another browser or device."
                    .into()
            }
            EngineError::PermissionDenied => {
                "Microphone permission denied. Please allow microphone access to use this app."
                    .into()
            }
            EngineError::NoSpeechDetected => "No speech was detected.".into(),
            EngineError::AudioCaptureUnavailable => {
                "No microphone was found or microphone is disabled.".into()
            }
            EngineError::NetworkFailure => {
                "Network error occurred. Please check your internet connection.".into()
            }
            EngineError::Aborted => "Speech recognition was aborted.".into(),
            EngineError::SynthesisUnavailable => {
                "Speech output is unavailable; replies will be shown as text.".into()
            }
            EngineError::InvalidInput(what) => format!("Invalid input: {what}"),
            EngineError::Unknown(code) => format!("Speech recognition error: {code}"),
        }
    }
}
