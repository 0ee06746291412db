//! Turn state machine and the conversation snapshot shared with the UI.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// Whose turn it is.
///
/// ```text
/// WaitingForUser ──reply queued──▶ Replying ──queue drained──▶ WaitingForUser
/// any ──End──▶ Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Capture may be open; nothing is queued.
    #[default]
    WaitingForUser,
    /// Replies are being spoken; capture is closed.
    Replying,
    /// Torn down; terminal.
    Ended,
}

impl TurnState {
    /// A short human-readable label for a status line.
    ///
    /// ```
    /// use voice_turn_engine::orchestrator::TurnState;
    ///
    /// assert_eq!(TurnState::WaitingForUser.label(), "Your turn");
    /// assert_eq!(TurnState::Replying.label(), "Tutor speaking");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::WaitingForUser => "Your turn",
            TurnState::Replying => "Tutor speaking",
            TurnState::Ended => "Conversation ended",
        }
    }
}

// ---------------------------------------------------------------------------
// TurnContext
// ---------------------------------------------------------------------------

/// What opened a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnTrigger {
    Greeting,
    Utterance(String),
    /// Nothing was heard at this dialogue step.
    Fallback { step: usize },
    Repeat,
    External,
}

/// Correlates one trigger with the replies it produced, from the moment it
/// is handled until the outbound queue drains.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub id: u64,
    pub trigger: TurnTrigger,
    pub replies: usize,
    pub opened: Instant,
}

impl TurnContext {
    pub fn new(id: u64, trigger: TurnTrigger) -> Self {
        Self {
            id,
            trigger,
            replies: 0,
            opened: Instant::now(),
        }
    }
    /// One-line description for the log once the turn's replies drained.
    pub fn summary(&self) -> String {
        let cause = match &self.trigger {
            TurnTrigger::Greeting => "greeting".to_string(),
            TurnTrigger::Utterance(text) => format!("reply to {text:?}"),
            TurnTrigger::Fallback { step } => format!("fallback at step {step}"),
            TurnTrigger::Repeat => "repeat".to_string(),
            TurnTrigger::External => "external reply".to_string(),
        };
        format!("#{} {} done, {} repl(ies)", self.id, cause, self.replies)
    }
}

// ---------------------------------------------------------------------------
// ConversationState
// ---------------------------------------------------------------------------

/// Snapshot of the conversation for anything that renders it.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub turn: TurnState,
    /// Step index reported by the dialogue provider.
    pub step: usize,
    pub last_utterance: Option<String>,
    pub last_reply: Option<String>,
    pub listening: bool,
    pub muted: bool,
    /// Last error surfaced to the user; cleared on manual retry.
    pub error: Option<EngineError>,
    pub replies_spoken: usize,
}

/// Thread-safe handle to [`ConversationState`].
///
/// Lock for short critical sections only; never hold it across `.await`.
pub type SharedConversation = Arc<Mutex<ConversationState>>;

pub fn new_shared_conversation() -> SharedConversation {
    Arc::new(Mutex::new(ConversationState::default()))
}
