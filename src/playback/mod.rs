//! Playback scheduler: chunked, sequential speech output.
//!
//! [`PlaybackScheduler`] owns the single active playback.  Reply text is split
//! by [`chunker`], each chunk is shaped by [`quirks`] and handed to the
//! synthesis device in order.

pub mod chunker;
pub mod quirks;
pub mod scheduler;

pub use chunker::{split_into_chunks, SpeechChunk};
pub use scheduler::{PlaybackHandle, PlaybackOutcome, PlaybackScheduler, SkipReason};
