//! Voice resource catalog: which synthetic voice speaks the replies.
//!
//! The platform voice list can arrive late, so [`VoiceCatalog::select_voice`]
//! polls it on a short retry schedule and ranks the first non-empty list with
//! [`rank_voices`].

pub mod catalog;

pub use catalog::{rank_voices, SelectionTier, VoiceCatalog, VoiceDescriptor};
