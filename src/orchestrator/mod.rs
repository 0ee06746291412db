//! Turn orchestrator: serializes replies and alternates capture and playback.

pub mod events;
pub mod queue;
pub mod runner;
pub mod state;

pub use events::{EngineEvent, TurnCommand};
pub use queue::OutboundQueue;
pub use runner::TurnOrchestrator;
pub use state::{
    new_shared_conversation, ConversationState, SharedConversation, TurnContext, TurnState,
    TurnTrigger,
};
