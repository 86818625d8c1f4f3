//! Concierge - Travel-support dialog orchestrator
//!
//! Concierge runs a multi-assistant support conversation for an airline:
//! a primary assistant answers flight and policy questions and quietly
//! delegates booking work to domain specialists (flights, hotels, car
//! rentals, excursions). A dialog stack tracks which assistant owns the
//! conversation, sensitive tool calls suspend at an approval gate, and
//! every thread checkpoints its full state after each step.
//!
//! # Core Concepts
//!
//! - **Stack-Routed Dialog**: The handler on top of the dialog stack owns
//!   the turn; delegation pushes, escalation pops, the primary is never popped
//! - **Approval Gate**: Sensitive (mutating) tool calls suspend the turn
//!   until the caller approves or denies them
//! - **Checkpoint Everything**: State is saved at every step boundary, so
//!   a restart resumes mid-turn without replaying work
//! - **Stateless Model Calls**: Every LLM call rebuilds context from the
//!   transcript; no state lives in the client
//!
//! # Modules
//!
//! - [`engine`] - Conversation state and the dialog orchestrator
//! - [`handlers`] - Primary handler and the four domain specialists
//! - [`tools`] - Tool trait, registry, and the builtin travel tools
//! - [`records`] - Travel record store (flights, hotels, cars, excursions)
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`prompts`] - Persona templates
//! - [`config`] - Configuration types and loading

pub mod cli;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod llm;
pub mod prompts;
pub mod records;
pub mod repl;
pub mod tools;

// Re-export commonly used types
pub use config::{Config, EngineConfig, LlmConfig, StorageConfig};
pub use engine::{
    ApprovalSummary, ConversationState, DialogEngine, EngineError, PendingApproval, ToolInvocation, TranscriptEntry,
    TurnInput, TurnOutcome,
};
pub use handlers::{HandlerId, HandlerOutcome};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use records::{Domain, Filter, MemoryRecordStore, Record, RecordError, RecordStore};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};
