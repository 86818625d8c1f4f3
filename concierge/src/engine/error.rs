use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("checkpoint store error: {0}")]
    Store(#[from] threadstore::StoreError),

    #[error("record store error: {0}")]
    Record(#[from] crate::records::RecordError),

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("prompt render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("handler returned a malformed response: {0}")]
    MalformedHandlerResponse(String),

    #[error("turn exceeded {steps} steps without producing a reply")]
    RoutingLoop { steps: usize },

    #[error("dialog stack exceeded maximum depth {depth}")]
    StackOverflow { depth: usize },

    #[error("a sensitive tool call is awaiting approval; resolve it before sending new messages")]
    ApprovalPending,

    #[error("the primary handler cannot escalate")]
    EscalateFromPrimary,

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
