//! Dialogue step providers: the scripts that decide what the tutor says next.
//!
//! The engine never interprets what the learner said; it hands each utterance
//! to a [`DialogueStepProvider`] and speaks whatever comes back.

pub mod generic;
pub mod script;

pub use generic::GenericDialogue;
pub use script::{KeywordRule, ScriptError, ScriptStep, ScriptedDialogue, TopicScript};

/// A turn-by-turn conversation script.
///
/// Implementations keep their own step index; the orchestrator only reads it
/// to pick a fallback line.
pub trait DialogueStepProvider: Send {
    /// Opening line spoken when the conversation begins.
    fn initial_prompt(&self) -> String;

    /// Consume one learner utterance, advance the step and return the reply.
    fn process_utterance(&mut self, text: &str) -> String;

    /// Line to say when nothing was heard at `step`.  Does not advance.
    fn fallback(&self, step: usize) -> String;

    fn current_step(&self) -> usize;
}

// Compile-time assertion: the trait must stay object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn DialogueStepProvider>) {}
};

/// Case-insensitive substring match against any of `keywords`.
///
/// ```
/// use voice_turn_engine::dialogue::contains_keywords;
///
/// assert!(contains_keywords("I mostly READ novels", &["book", "read"]));
/// assert!(!contains_keywords("", &["read"]));
/// ```
pub fn contains_keywords<S: AsRef<str>>(input: &str, keywords: &[S]) -> bool {
    let input = input.to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_ref().to_lowercase())
        .any(|k| !k.is_empty() && input.contains(&k))
}
