//! Conversation engine
//!
//! State model, orchestrator, and engine errors. The orchestrator is
//! the only writer of conversation state; everything else reads it.

mod error;
mod orchestrator;
mod state;

pub use error::EngineError;
pub use orchestrator::{DialogEngine, TurnInput, TurnOutcome};
pub use state::{ApprovalSummary, ConversationState, PendingApproval, ToolInvocation, TranscriptEntry};
