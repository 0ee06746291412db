//! Capture session: continuous transcription with endpoint detection.

pub mod error;
pub mod session;
pub mod state;

pub use error::CaptureErrorKind;
pub use session::{CaptureOutput, CaptureSession};
pub use state::CaptureState;
