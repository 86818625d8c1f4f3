//! Domain specialist handlers
//!
//! One handler per booking domain. A specialist only sees its own
//! registry tools plus `complete_or_escalate`, which returns control to
//! the primary handler.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::engine::{ConversationState, EngineError};
use crate::handlers::common::{complete_with_nudge, to_invocations};
use crate::handlers::{HandlerId, HandlerOutcome, ESCALATE_TOOL};
use crate::llm::{CompletionRequest, LlmClient, ToolDefinition};
use crate::prompts::Prompts;
use crate::tools::ToolRegistry;

/// Static description of one specialist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialistProfile {
    pub id: HandlerId,
}

impl SpecialistProfile {
    pub fn new(id: HandlerId) -> Self {
        debug_assert!(id.is_specialist());
        Self { id }
    }

    pub fn all() -> [SpecialistProfile; 4] {
        HandlerId::SPECIALISTS.map(SpecialistProfile::new)
    }
}

pub struct SpecialistHandler {
    profile: SpecialistProfile,
    client: Arc<dyn LlmClient>,
    prompts: Arc<Prompts>,
    max_tokens: u32,
}

impl SpecialistHandler {
    pub fn new(profile: SpecialistProfile, client: Arc<dyn LlmClient>, prompts: Arc<Prompts>, max_tokens: u32) -> Self {
        Self {
            profile,
            client,
            prompts,
            max_tokens,
        }
    }

    pub fn id(&self) -> HandlerId {
        self.profile.id
    }

    /// Run one model step for this specialist and classify the output
    pub async fn invoke(&self, state: &ConversationState, registry: &ToolRegistry) -> Result<HandlerOutcome, EngineError> {
        let user_info = state.account_info.clone().unwrap_or(serde_json::Value::Null);
        let time = chrono::Utc::now().to_rfc3339();
        let system_prompt = self.prompts.system_prompt(self.profile.id, &user_info, &time)?;

        let mut tools = registry.definitions_for(self.profile.id);
        tools.push(escalate_tool_definition());

        let request = CompletionRequest {
            system_prompt,
            messages: state.to_llm_messages(),
            tools,
            max_tokens: self.max_tokens,
        };
        let response = complete_with_nudge(&self.client, request).await?;
        debug!(
            handler = %self.profile.id,
            tool_calls = response.tool_calls.len(),
            "SpecialistHandler::invoke: model responded"
        );

        if response.tool_calls.is_empty() {
            return Ok(HandlerOutcome::Reply(response.content.unwrap_or_default()));
        }

        if response.tool_calls.iter().any(|c| HandlerId::from_delegate_tool(&c.name).is_some()) {
            return Err(EngineError::MalformedHandlerResponse(format!(
                "specialist {} attempted to delegate",
                self.profile.id
            )));
        }

        let calls = to_invocations(&response.tool_calls, registry);

        // An escalation supersedes anything else in the batch; only the
        // escalate call itself is recorded so call/result pairing holds.
        if let Some(call) = calls.iter().find(|c| c.name == ESCALATE_TOOL) {
            let reason = call
                .args
                .get("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("task complete")
                .to_string();
            let mut call = call.clone();
            call.sensitive = false;
            return Ok(HandlerOutcome::Escalate { call, reason });
        }

        Ok(HandlerOutcome::ToolCalls {
            content: response.content,
            calls,
        })
    }
}

/// Definition of the hand-back tool every specialist carries
pub fn escalate_tool_definition() -> ToolDefinition {
    ToolDefinition::new(
        ESCALATE_TOOL,
        "A tool to mark the current task as completed and/or to escalate control of the dialog to the main assistant, \
         who can re-route the dialog based on the user's needs.",
        json!({
            "type": "object",
            "properties": {
                "cancel": {
                    "type": "boolean",
                    "description": "True when the user changed their mind or the task could not be completed."
                },
                "reason": {
                    "type": "string",
                    "description": "Why control is being returned to the main assistant."
                }
            },
            "required": ["cancel", "reason"]
        }),
    )
}
