//! Shared handler plumbing

use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::{EngineError, ToolInvocation};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, ToolCall};
use crate::tools::ToolRegistry;

/// How many times to re-prompt an empty model output before giving up
pub(super) const MAX_NUDGES: usize = 2;

pub(super) const NUDGE: &str = "Respond with a real output.";

/// Run a completion, re-prompting when the model returns an empty turn
pub(super) async fn complete_with_nudge(
    client: &Arc<dyn LlmClient>,
    mut request: CompletionRequest,
) -> Result<CompletionResponse, EngineError> {
    for attempt in 0..=MAX_NUDGES {
        let response = client.complete(request.clone()).await?;
        if !response.is_empty() {
            return Ok(response);
        }
        warn!(attempt, "handler: empty model output, nudging");
        request.messages.push(Message::user(NUDGE));
    }
    Err(EngineError::MalformedHandlerResponse(
        "model produced no output after repeated nudges".to_string(),
    ))
}

/// Stamp each model tool call with its registry sensitivity
pub(super) fn to_invocations(calls: &[ToolCall], registry: &ToolRegistry) -> Vec<ToolInvocation> {
    calls
        .iter()
        .map(|call| {
            let sensitive = registry.is_sensitive(&call.name);
            debug!(tool = %call.name, sensitive, "handler: classified tool call");
            ToolInvocation {
                id: call.id.clone(),
                name: call.name.clone(),
                args: call.input.clone(),
                sensitive,
            }
        })
        .collect()
}
