//! Classified handler output

use crate::engine::ToolInvocation;
use crate::handlers::HandlerId;

/// What a handler decided to do with its turn
///
/// Delegation and escalation are control-flow decisions the orchestrator
/// acts on; `ToolCalls` stays within the active handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// A plain text reply; the turn is over
    Reply(String),

    /// Domain tool calls to dispatch, in emission order
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolInvocation>,
    },

    /// Hand the conversation to a specialist
    ///
    /// `calls` holds every delegate call from the batch so each one can
    /// be acknowledged in the transcript; only the first target takes
    /// control.
    Delegate {
        target: HandlerId,
        calls: Vec<ToolInvocation>,
    },

    /// A specialist returning control to the primary handler
    Escalate { call: ToolInvocation, reason: String },
}
