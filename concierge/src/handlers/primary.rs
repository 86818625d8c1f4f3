//! Primary dialog handler
//!
//! Owns the conversation by default. Answers policy and flight-search
//! questions directly and routes everything else to a specialist via
//! the delegate tools.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::engine::{ConversationState, EngineError};
use crate::handlers::common::{complete_with_nudge, to_invocations};
use crate::handlers::{HandlerId, HandlerOutcome, ESCALATE_TOOL};
use crate::llm::{CompletionRequest, LlmClient, ToolDefinition};
use crate::prompts::Prompts;
use crate::tools::ToolRegistry;

pub struct PrimaryHandler {
    client: Arc<dyn LlmClient>,
    prompts: Arc<Prompts>,
    max_tokens: u32,
}

impl PrimaryHandler {
    pub fn new(client: Arc<dyn LlmClient>, prompts: Arc<Prompts>, max_tokens: u32) -> Self {
        Self {
            client,
            prompts,
            max_tokens,
        }
    }

    /// Run one model step for the primary handler and classify the output
    pub async fn invoke(&self, state: &ConversationState, registry: &ToolRegistry) -> Result<HandlerOutcome, EngineError> {
        let user_info = state.account_info.clone().unwrap_or(serde_json::Value::Null);
        let time = chrono::Utc::now().to_rfc3339();
        let system_prompt = self.prompts.system_prompt(HandlerId::Primary, &user_info, &time)?;

        let mut tools = registry.definitions_for(HandlerId::Primary);
        tools.extend(delegate_tool_definitions());

        let request = CompletionRequest {
            system_prompt,
            messages: state.to_llm_messages(),
            tools,
            max_tokens: self.max_tokens,
        };
        let response = complete_with_nudge(&self.client, request).await?;
        debug!(
            tool_calls = response.tool_calls.len(),
            "PrimaryHandler::invoke: model responded"
        );

        if response.tool_calls.is_empty() {
            let text = response.content.unwrap_or_default();
            return Ok(HandlerOutcome::Reply(text));
        }

        if response.tool_calls.iter().any(|c| c.name == ESCALATE_TOOL) {
            return Err(EngineError::EscalateFromPrimary);
        }

        let calls = to_invocations(&response.tool_calls, registry);
        let delegates: Vec<HandlerId> = calls
            .iter()
            .filter_map(|c| HandlerId::from_delegate_tool(&c.name))
            .collect();

        if delegates.is_empty() {
            return Ok(HandlerOutcome::ToolCalls {
                content: response.content,
                calls,
            });
        }

        // A delegate call hands off the whole batch; mixing domain tools
        // into the same batch leaves them with no executor.
        if delegates.len() != calls.len() {
            return Err(EngineError::MalformedHandlerResponse(
                "delegate calls cannot be mixed with domain tool calls".to_string(),
            ));
        }

        Ok(HandlerOutcome::Delegate {
            target: delegates[0],
            calls,
        })
    }
}

/// Tool definitions for handing work to the specialists
///
/// The structured fields carry the context a specialist needs before it
/// sees any tool results of its own.
pub fn delegate_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "to_flight_assistant",
            "Transfers work to a specialized assistant to handle flight updates and cancellations.",
            json!({
                "type": "object",
                "properties": {
                    "request": {
                        "type": "string",
                        "description": "Any necessary followup questions the flight assistant should clarify before proceeding."
                    }
                },
                "required": ["request"]
            }),
        ),
        ToolDefinition::new(
            "to_hotel_assistant",
            "Transfer work to a specialized assistant to handle hotel bookings.",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "The location where the user wants to book a hotel."},
                    "checkin_date": {"type": "string", "description": "The check-in date for the hotel."},
                    "checkout_date": {"type": "string", "description": "The check-out date for the hotel."},
                    "request": {"type": "string", "description": "Any additional information or requests from the user regarding the hotel booking."}
                },
                "required": ["location", "checkin_date", "checkout_date", "request"]
            }),
        ),
        ToolDefinition::new(
            "to_car_rental_assistant",
            "Transfers work to a specialized assistant to handle car rental bookings.",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "The location where the user wants to rent a car."},
                    "start_date": {"type": "string", "description": "The start date of the car rental."},
                    "end_date": {"type": "string", "description": "The end date of the car rental."},
                    "request": {"type": "string", "description": "Any additional information or requests from the user regarding the car rental."}
                },
                "required": ["location", "start_date", "end_date", "request"]
            }),
        ),
        ToolDefinition::new(
            "to_excursion_assistant",
            "Transfers work to a specialized assistant to handle trip recommendation and other excursion bookings.",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "The location where the user wants to book a recommended trip."},
                    "request": {"type": "string", "description": "Any additional information or requests from the user regarding the trip recommendation."}
                },
                "required": ["location", "request"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TranscriptEntry;
    use crate::llm::mock::{text_response, tool_response, MockLlmClient};
    use crate::llm::{CompletionResponse, StopReason, TokenUsage};

    fn handler(responses: Vec<CompletionResponse>) -> PrimaryHandler {
        PrimaryHandler::new(
            Arc::new(MockLlmClient::new(responses)),
            Arc::new(Prompts::new().unwrap()),
            1024,
        )
    }

    fn state_with_user(text: &str) -> ConversationState {
        let mut state = ConversationState::new();
        state.append(TranscriptEntry::User { text: text.to_string() });
        state
    }

    #[tokio::test]
    async fn test_plain_text_becomes_reply() {
        let handler = handler(vec![text_response("Your flight departs at 10:05.")]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("when does my flight leave?");

        let outcome = handler.invoke(&state, &registry).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::Reply("Your flight departs at 10:05.".to_string()));
    }

    #[tokio::test]
    async fn test_delegate_call_is_classified() {
        let handler = handler(vec![tool_response(vec![(
            "call_1",
            "to_hotel_assistant",
            json!({"location": "Basel", "checkin_date": "2024-05-01", "checkout_date": "2024-05-03", "request": "quiet room"}),
        )])]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("book me a hotel in Basel");

        let outcome = handler.invoke(&state, &registry).await.unwrap();
        match outcome {
            HandlerOutcome::Delegate { target, calls } => {
                assert_eq!(target, HandlerId::Hotel);
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "to_hotel_assistant");
            }
            other => panic!("expected Delegate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_domain_tool_calls_pass_through() {
        let handler = handler(vec![tool_response(vec![(
            "call_1",
            "search_flights",
            json!({"departure_airport": "ZRH"}),
        )])]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("flights from Zurich?");

        let outcome = handler.invoke(&state, &registry).await.unwrap();
        match outcome {
            HandlerOutcome::ToolCalls { calls, .. } => {
                assert_eq!(calls.len(), 1);
                assert!(!calls[0].sensitive);
            }
            other => panic!("expected ToolCalls, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mixed_delegate_and_domain_batch_is_rejected() {
        let handler = handler(vec![tool_response(vec![
            ("call_1", "to_flight_assistant", json!({"request": "rebook"})),
            ("call_2", "search_flights", json!({})),
        ])]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("rebook me");

        let err = handler.invoke(&state, &registry).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedHandlerResponse(_)));
    }

    #[tokio::test]
    async fn test_escalate_from_primary_is_rejected() {
        let handler = handler(vec![tool_response(vec![(
            "call_1",
            ESCALATE_TOOL,
            json!({"cancel": true, "reason": "done"}),
        )])]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("hello");

        let err = handler.invoke(&state, &registry).await.unwrap_err();
        assert!(matches!(err, EngineError::EscalateFromPrimary));
    }

    #[tokio::test]
    async fn test_empty_output_is_nudged_then_accepted() {
        let empty = CompletionResponse {
            content: Some("   ".to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        };
        let handler = handler(vec![empty, text_response("Here you go.")]);
        let registry = ToolRegistry::standard();
        let state = state_with_user("hello");

        let outcome = handler.invoke(&state, &registry).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::Reply("Here you go.".to_string()));
    }

    #[test]
    fn test_delegate_definitions_cover_all_specialists() {
        let defs = delegate_tool_definitions();
        for id in HandlerId::SPECIALISTS {
            assert!(defs.iter().any(|d| Some(d.name.as_str()) == id.delegate_tool()));
        }
    }
}
