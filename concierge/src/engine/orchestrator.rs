//! Dialog orchestrator
//!
//! Drives one conversation turn at a time: loads the thread checkpoint,
//! routes the transcript to the handler on top of the dialog stack,
//! dispatches tool batches through the approval gate, and saves the
//! checkpoint at every step boundary so a crash never loses more than
//! the step in flight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use threadstore::ThreadStore;

use crate::config::Config;
use crate::engine::{
    ApprovalSummary, ConversationState, EngineError, PendingApproval, ToolInvocation, TranscriptEntry,
};
use crate::handlers::{HandlerId, HandlerOutcome, PrimaryHandler, SpecialistHandler, SpecialistProfile};
use crate::llm::LlmClient;
use crate::prompts::{Prompts, RESUME_HOST};
use crate::records::{Domain, Filter, RecordStore};
use crate::tools::{ToolContext, ToolRegistry};

/// Caller input for one turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    /// A user message
    User(String),

    /// A decision on the thread's pending sensitive call
    Approval { approved: bool, reason: Option<String> },
}

/// What a turn produced
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A finished assistant reply
    Reply(String),

    /// The turn is suspended on a sensitive tool call
    PendingApproval(ApprovalSummary),
}

const DENIED_RESULT: &str = "Tool call denied by user. Reasoning: '{reason}'. Continue assisting, accounting for the user's input.";
const SKIPPED_RESULT: &str = "Tool call skipped: an earlier call in the same batch was denied by the user.";

pub struct DialogEngine {
    store: Arc<dyn ThreadStore<ConversationState>>,
    records: Arc<dyn RecordStore>,
    registry: ToolRegistry,
    primary: PrimaryHandler,
    specialists: HashMap<HandlerId, SpecialistHandler>,
    max_steps_per_turn: usize,
    max_dialog_depth: usize,
    auto_approve: bool,
    locks: ThreadLocks,
}

/// One mutex per thread id; turns on the same thread serialize
///
/// Entries no turn is holding are swept on every acquire, so the map
/// stays bounded by the number of concurrently active threads.
struct ThreadLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(thread_id.to_string()).or_default().clone()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl DialogEngine {
    pub fn new(
        client: Arc<dyn LlmClient>,
        records: Arc<dyn RecordStore>,
        store: Arc<dyn ThreadStore<ConversationState>>,
        config: &Config,
    ) -> Result<Self, EngineError> {
        let prompts = Arc::new(Prompts::new()?);
        let max_tokens = config.llm.max_tokens;

        let primary = PrimaryHandler::new(client.clone(), prompts.clone(), max_tokens);
        let specialists = SpecialistProfile::all()
            .into_iter()
            .map(|profile| {
                (
                    profile.id,
                    SpecialistHandler::new(profile, client.clone(), prompts.clone(), max_tokens),
                )
            })
            .collect();

        Ok(Self {
            store,
            records,
            registry: ToolRegistry::standard(),
            primary,
            specialists,
            max_steps_per_turn: config.engine.max_steps_per_turn,
            max_dialog_depth: config.engine.max_dialog_depth,
            auto_approve: config.engine.auto_approve(),
            locks: ThreadLocks::new(),
        })
    }

    /// Run one turn against a thread
    ///
    /// Turns on the same thread are serialized; different threads run
    /// concurrently.
    pub async fn submit_turn(
        &self,
        thread_id: &str,
        passenger_id: Option<&str>,
        input: TurnInput,
    ) -> Result<TurnOutcome, EngineError> {
        let lock = self.thread_lock(thread_id).await;
        let _guard = lock.lock().await;

        let mut state = self.store.load(thread_id).await?.unwrap_or_default();
        self.ensure_account_info(&mut state, passenger_id).await?;

        match input {
            TurnInput::User(text) => {
                if state.pending.is_some() {
                    // Don't lose the gate: the caller must resolve the
                    // pending call before the conversation moves on.
                    return Err(EngineError::ApprovalPending);
                }
                info!(thread_id, "submit_turn: user message");
                state.append(TranscriptEntry::User { text });
                self.store.save(thread_id, &state).await?;
                self.run_steps(thread_id, &mut state).await
            }
            TurnInput::Approval { approved, reason } => {
                let Some(pending) = state.pending.take() else {
                    // Redelivered decision with nothing pending is a no-op
                    debug!(thread_id, "submit_turn: approval with nothing pending");
                    let text = state
                        .last_reply()
                        .unwrap_or("There is nothing awaiting approval.")
                        .to_string();
                    return Ok(TurnOutcome::Reply(text));
                };
                info!(thread_id, approved, call = %pending.call.name, "submit_turn: approval decision");
                if approved {
                    self.execute_call(&mut state, &pending.call).await;
                    if let Some(outcome) = self.dispatch_batch(thread_id, &mut state, pending.queued).await? {
                        return Ok(outcome);
                    }
                } else {
                    let reason = reason.unwrap_or_else(|| "no reason given".to_string());
                    state.append(TranscriptEntry::ToolResult {
                        call_id: pending.call.id.clone(),
                        content: DENIED_RESULT.replace("{reason}", &reason),
                        is_error: true,
                    });
                    for call in pending.queued {
                        state.append(TranscriptEntry::ToolResult {
                            call_id: call.id,
                            content: SKIPPED_RESULT.to_string(),
                            is_error: true,
                        });
                    }
                }
                self.store.save(thread_id, &state).await?;
                self.run_steps(thread_id, &mut state).await
            }
        }
    }

    async fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.locks.acquire(thread_id).await
    }

    /// Pin the passenger snapshot on first contact
    ///
    /// Looked up once per thread; later turns reuse the pinned snapshot
    /// even if the caller passes a different passenger id.
    async fn ensure_account_info(
        &self,
        state: &mut ConversationState,
        passenger_id: Option<&str>,
    ) -> Result<(), EngineError> {
        if state.account_info.is_some() {
            return Ok(());
        }
        let Some(passenger_id) = passenger_id else {
            return Ok(());
        };

        let filter = Filter::new().eq("passenger_id", passenger_id);
        let tickets = self.records.find(Domain::Flight, &filter).await?;
        debug!(passenger_id, tickets = tickets.len(), "ensure_account_info: pinned");
        state.account_info = Some(serde_json::json!({
            "passenger_id": passenger_id,
            "tickets": tickets,
        }));
        Ok(())
    }

    /// The step loop: invoke the active handler until a reply or a gate
    async fn run_steps(&self, thread_id: &str, state: &mut ConversationState) -> Result<TurnOutcome, EngineError> {
        for step in 0..self.max_steps_per_turn {
            let active = state.active_handler();
            debug!(thread_id, step, handler = %active, "run_steps: invoking handler");

            let outcome = match active {
                HandlerId::Primary => self.primary.invoke(state, &self.registry).await?,
                specialist => {
                    // Every specialist id is constructed into the map
                    let handler = self
                        .specialists
                        .get(&specialist)
                        .ok_or_else(|| EngineError::MalformedHandlerResponse(format!("no handler for {specialist}")))?;
                    handler.invoke(state, &self.registry).await?
                }
            };

            match outcome {
                HandlerOutcome::Reply(text) => {
                    state.append(TranscriptEntry::Assistant { text: text.clone() });
                    self.store.save(thread_id, state).await?;
                    return Ok(TurnOutcome::Reply(text));
                }
                HandlerOutcome::ToolCalls { content, calls } => {
                    state.append(TranscriptEntry::ToolRequest {
                        text: content,
                        calls: calls.clone(),
                    });
                    if let Some(outcome) = self.dispatch_batch(thread_id, state, calls).await? {
                        return Ok(outcome);
                    }
                    self.store.save(thread_id, state).await?;
                }
                HandlerOutcome::Delegate { target, calls } => {
                    if state.stack_depth() + 1 > self.max_dialog_depth {
                        self.store.save(thread_id, state).await?;
                        return Err(EngineError::StackOverflow {
                            depth: self.max_dialog_depth,
                        });
                    }
                    state.append(TranscriptEntry::ToolRequest {
                        text: None,
                        calls: calls.clone(),
                    });
                    // Acknowledge every delegate call so pairing holds,
                    // but only the first target takes control.
                    for call in &calls {
                        let handler = HandlerId::from_delegate_tool(&call.name).unwrap_or(target);
                        state.append(TranscriptEntry::ToolResult {
                            call_id: call.id.clone(),
                            content: Prompts::entry_ack(handler),
                            is_error: false,
                        });
                    }
                    info!(thread_id, from = %active, to = %target, "run_steps: delegating");
                    state.push_handler(target);
                    self.store.save(thread_id, state).await?;
                }
                HandlerOutcome::Escalate { call, reason } => {
                    state.append(TranscriptEntry::ToolRequest {
                        text: None,
                        calls: vec![call.clone()],
                    });
                    state.append(TranscriptEntry::ToolResult {
                        call_id: call.id,
                        content: RESUME_HOST.to_string(),
                        is_error: false,
                    });
                    let popped = state.pop_handler();
                    info!(thread_id, ?popped, reason, "run_steps: escalating to host");
                    self.store.save(thread_id, state).await?;
                }
            }
        }

        warn!(thread_id, steps = self.max_steps_per_turn, "run_steps: step budget exhausted");
        self.store.save(thread_id, state).await?;
        Err(EngineError::RoutingLoop {
            steps: self.max_steps_per_turn,
        })
    }

    /// Execute a batch in order, suspending at the first ungated sensitive call
    ///
    /// Returns `Some(outcome)` when the turn ends here (gate hit), `None`
    /// when the whole batch executed and the step loop should continue.
    async fn dispatch_batch(
        &self,
        thread_id: &str,
        state: &mut ConversationState,
        calls: Vec<ToolInvocation>,
    ) -> Result<Option<TurnOutcome>, EngineError> {
        let mut queue = calls.into_iter();
        while let Some(call) = queue.next() {
            if call.sensitive && !self.auto_approve {
                let summary = ApprovalSummary::from(&call);
                info!(thread_id, tool = %call.name, "dispatch_batch: suspending on sensitive call");
                state.pending = Some(PendingApproval {
                    call,
                    queued: queue.collect(),
                });
                self.store.save(thread_id, state).await?;
                return Ok(Some(TurnOutcome::PendingApproval(summary)));
            }
            self.execute_call(state, &call).await;
        }
        Ok(None)
    }

    async fn execute_call(&self, state: &mut ConversationState, call: &ToolInvocation) {
        let ctx = ToolContext::new(
            self.records.clone(),
            state.passenger_id().map(|s| s.to_string()),
        );
        let result = self.registry.execute(&call.name, call.args.clone(), &ctx).await;
        debug!(tool = %call.name, is_error = result.is_error, "execute_call: finished");
        state.append(TranscriptEntry::ToolResult {
            call_id: call.id.clone(),
            content: result.content,
            is_error: result.is_error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_thread_locks_are_swept() {
        let locks = ThreadLocks::new();

        let held = locks.acquire("busy").await;
        let _guard = held.lock().await;

        // An idle entry: acquired once, no longer held by anyone
        drop(locks.acquire("idle").await);
        assert_eq!(locks.len().await, 2);

        // The next acquire sweeps "idle" but keeps the held lock
        let _other = locks.acquire("other").await;
        assert_eq!(locks.len().await, 2);

        let reacquired = locks.acquire("busy").await;
        assert!(Arc::ptr_eq(&held, &reacquired));
    }
}
