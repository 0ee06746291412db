//! Voice turn engine: spoken, turn-based conversations with a scripted tutor.
//!
//! ```text
//!  CaptureDevice ─▶ capture::CaptureSession ─Utterance─▶ orchestrator::TurnOrchestrator
//!                                                         │        ▲
//!                                   dialogue::DialogueStepProvider  │ drained
//!                                                         ▼        │
//!  SynthesisDevice ◀── playback::PlaybackScheduler ◀── reply queue ─┘
//!        ▲
//!  voice::VoiceCatalog (selects the voice once at start-up)
//! ```

pub mod capture;
pub mod config;
pub mod console;
pub mod device;
pub mod dialogue;
pub mod error;
pub mod orchestrator;
pub mod playback;
pub mod voice;

pub use error::EngineError;
