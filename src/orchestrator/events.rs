//! Commands into the orchestrator and notifications out of it.

use crate::error::EngineError;

use super::state::TurnState;

/// Requests sent to a running [`TurnOrchestrator`](super::TurnOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnCommand {
    /// Speak the dialogue's opening line, then listen.
    Begin,
    /// Queue an arbitrary reply.
    EnqueueReply(String),
    /// Treat `text` as if the learner had said it.
    Utterance(String),
    /// Say the last reply again.
    Repeat,
    /// Open the microphone, e.g. after a surfaced error.
    StartListening,
    StopListening,
    ToggleMute,
    /// Tear everything down.  The orchestrator exits afterwards.
    End,
}

/// Notifications for whatever renders the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ListeningStarted,
    ListeningStopped,
    InterimTranscript { interim: String, final_text: String },
    /// The learner's completed turn.
    UserUtterance(String),
    /// A reply is about to be spoken (or shown, when speech is unavailable).
    ReplyReady(String),
    StateChanged(TurnState),
    Error { error: EngineError, message: String },
    Ended,
}

impl EngineEvent {
    pub fn error(error: EngineError) -> Self {
        let message = error.user_message();
        EngineEvent::Error { error, message }
    }
}
