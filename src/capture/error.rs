//! Device error codes and their mapping onto [`EngineError`].

use crate::error::EngineError;

/// Classified capture failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// The device is missing entirely.
    Unsupported,
    AudioUnavailable,
    PermissionDenied,
    NetworkFailure,
    Aborted,
    NoSpeech,
    Other(String),
}

impl CaptureErrorKind {
    /// Map a raw device error code.
    ///
    /// ```
    /// use voice_turn_engine::capture::CaptureErrorKind;
    ///
    /// assert_eq!(CaptureErrorKind::from_code("not-allowed"), CaptureErrorKind::PermissionDenied);
    /// assert_eq!(
    ///     CaptureErrorKind::from_code("bad-grammar"),
    ///     CaptureErrorKind::Other("bad-grammar".into())
    /// );
    /// ```
    pub fn from_code(code: &str) -> Self {
        match code {
            "audio-capture" => CaptureErrorKind::AudioUnavailable,
            "not-allowed" | "service-not-allowed" => CaptureErrorKind::PermissionDenied,
            "network" => CaptureErrorKind::NetworkFailure,
            "aborted" => CaptureErrorKind::Aborted,
            "no-speech" => CaptureErrorKind::NoSpeech,
            other => CaptureErrorKind::Other(other.to_string()),
        }
    }
}

impl From<CaptureErrorKind> for EngineError {
    fn from(kind: CaptureErrorKind) -> Self {
        match kind {
            CaptureErrorKind::Unsupported => EngineError::DeviceUnsupported,
            CaptureErrorKind::AudioUnavailable => EngineError::AudioCaptureUnavailable,
            CaptureErrorKind::PermissionDenied => EngineError::PermissionDenied,
            CaptureErrorKind::NetworkFailure => EngineError::NetworkFailure,
            CaptureErrorKind::Aborted => EngineError::Aborted,
            CaptureErrorKind::NoSpeech => EngineError::NoSpeechDetected,
            CaptureErrorKind::Other(code) => EngineError::Unknown(code),
        }
    }
}
