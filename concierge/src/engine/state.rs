//! Conversation state - the checkpoint payload
//!
//! One `ConversationState` per thread, owned by the orchestrator and
//! mutated only through its step loop. The transcript is append-only;
//! the dialog stack tracks which handler owns the conversation.

use serde::{Deserialize, Serialize};

use crate::handlers::HandlerId;
use crate::llm::{ContentBlock, Message};

/// A tool call as dispatched by the engine
///
/// The sensitivity flag is copied from the registry at dispatch time
/// and never re-derived, so an approval decision always refers to the
/// classification the user actually saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
    pub sensitive: bool,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TranscriptEntry {
    User {
        text: String,
    },
    Assistant {
        text: String,
    },
    ToolRequest {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolInvocation>,
    },
    ToolResult {
        call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A sensitive call suspended at the approval gate
///
/// `queued` holds the unexecuted remainder of the same batch, in the
/// order the handler emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub call: ToolInvocation,
    #[serde(default)]
    pub queued: Vec<ToolInvocation>,
}

/// Summary of a pending approval handed to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalSummary {
    pub call_id: String,
    pub tool: String,
    pub args: serde_json::Value,
}

impl From<&ToolInvocation> for ApprovalSummary {
    fn from(call: &ToolInvocation) -> Self {
        Self {
            call_id: call.id.clone(),
            tool: call.name.clone(),
            args: call.args.clone(),
        }
    }
}

/// Full per-thread conversation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Append-only transcript; never reordered or deleted
    pub messages: Vec<TranscriptEntry>,

    /// Passenger snapshot, set once by the account lookup step
    #[serde(default)]
    pub account_info: Option<serde_json::Value>,

    /// Handler ownership stack; bottom is always `Primary`
    pub dialog_stack: Vec<HandlerId>,

    /// At most one sensitive call awaiting a decision
    #[serde(default)]
    pub pending: Option<PendingApproval>,
}

impl ConversationState {
    /// Fresh state with the primary handler active
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            account_info: None,
            dialog_stack: vec![HandlerId::Primary],
            pending: None,
        }
    }

    /// The handler currently owning the conversation
    pub fn active_handler(&self) -> HandlerId {
        // The stack is never empty by construction; guard anyway so a
        // corrupted checkpoint degrades to the primary handler.
        self.dialog_stack.last().copied().unwrap_or(HandlerId::Primary)
    }

    /// Transfer control to a specialist
    pub fn push_handler(&mut self, id: HandlerId) {
        self.dialog_stack.push(id);
    }

    /// Return control to the handler beneath; the primary is never popped
    pub fn pop_handler(&mut self) -> Option<HandlerId> {
        if self.dialog_stack.len() > 1 {
            self.dialog_stack.pop()
        } else {
            None
        }
    }

    /// Current delegation depth (primary alone is depth 1)
    pub fn stack_depth(&self) -> usize {
        self.dialog_stack.len()
    }

    /// Passenger id pinned by the account lookup, if any
    pub fn passenger_id(&self) -> Option<&str> {
        self.account_info.as_ref()?.get("passenger_id")?.as_str()
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        self.messages.push(entry);
    }

    /// The last plain assistant reply, if the transcript ends with one
    pub fn last_reply(&self) -> Option<&str> {
        match self.messages.last() {
            Some(TranscriptEntry::Assistant { text }) => Some(text),
            _ => None,
        }
    }

    /// Render the transcript as LLM messages
    ///
    /// `tool-request` becomes an assistant message with tool_use blocks
    /// and `tool-result` a user message with a tool_result block, so the
    /// model sees a well-formed call/result pairing.
    pub fn to_llm_messages(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|entry| match entry {
                TranscriptEntry::User { text } => Message::user(text.clone()),
                TranscriptEntry::Assistant { text } => Message::assistant(text.clone()),
                TranscriptEntry::ToolRequest { text, calls } => {
                    let mut blocks = Vec::new();
                    if let Some(text) = text {
                        blocks.push(ContentBlock::text(text.clone()));
                    }
                    for call in calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.args.clone(),
                        });
                    }
                    Message::assistant_blocks(blocks)
                }
                TranscriptEntry::ToolResult {
                    call_id,
                    content,
                    is_error,
                } => Message::user_blocks(vec![ContentBlock::tool_result(call_id.clone(), content.clone(), *is_error)]),
            })
            .collect()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_at_primary() {
        let state = ConversationState::new();
        assert_eq!(state.dialog_stack, vec![HandlerId::Primary]);
        assert_eq!(state.active_handler(), HandlerId::Primary);
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_push_pop_is_strict_inverse() {
        let mut state = ConversationState::new();
        let before = state.dialog_stack.clone();

        state.push_handler(HandlerId::CarRental);
        assert_eq!(state.active_handler(), HandlerId::CarRental);

        state.pop_handler();
        assert_eq!(state.dialog_stack, before);
    }

    #[test]
    fn test_primary_is_never_popped() {
        let mut state = ConversationState::new();
        assert!(state.pop_handler().is_none());
        assert_eq!(state.dialog_stack, vec![HandlerId::Primary]);
    }

    #[test]
    fn test_bottom_of_stack_is_always_primary() {
        let mut state = ConversationState::new();
        state.push_handler(HandlerId::Flight);
        state.push_handler(HandlerId::Hotel);
        state.pop_handler();
        state.pop_handler();
        state.pop_handler();

        assert_eq!(state.dialog_stack.first(), Some(&HandlerId::Primary));
        assert!(!state.dialog_stack.is_empty());
    }

    #[test]
    fn test_to_llm_messages_pairs_calls_and_results() {
        let mut state = ConversationState::new();
        state.append(TranscriptEntry::User {
            text: "find me a hotel".to_string(),
        });
        state.append(TranscriptEntry::ToolRequest {
            text: None,
            calls: vec![ToolInvocation {
                id: "call_1".to_string(),
                name: "search_hotels".to_string(),
                args: serde_json::json!({"location": "Basel"}),
                sensitive: false,
            }],
        });
        state.append(TranscriptEntry::ToolResult {
            call_id: "call_1".to_string(),
            content: "[]".to_string(),
            is_error: false,
        });

        let messages = state.to_llm_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content.as_text(), Some("find me a hotel"));
        // tool request renders as assistant blocks, result as user blocks
        assert_eq!(messages[1].role, crate::llm::Role::Assistant);
        assert_eq!(messages[2].role, crate::llm::Role::User);
    }

    #[test]
    fn test_state_serde_round_trip() {
        let mut state = ConversationState::new();
        state.push_handler(HandlerId::Hotel);
        state.append(TranscriptEntry::User {
            text: "hi".to_string(),
        });
        state.pending = Some(PendingApproval {
            call: ToolInvocation {
                id: "call_9".to_string(),
                name: "book_hotel".to_string(),
                args: serde_json::json!({"hotel_id": "h-1"}),
                sensitive: true,
            },
            queued: vec![],
        });

        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dialog_stack, state.dialog_stack);
        assert_eq!(back.messages, state.messages);
        assert_eq!(back.pending, state.pending);
    }

    #[test]
    fn test_last_reply() {
        let mut state = ConversationState::new();
        assert!(state.last_reply().is_none());

        state.append(TranscriptEntry::Assistant {
            text: "done".to_string(),
        });
        assert_eq!(state.last_reply(), Some("done"));
    }
}
