//! Interactive chat REPL
//!
//! Runs one conversation thread against the dialog engine, prompting
//! the user whenever a sensitive tool call hits the approval gate.

mod session;

pub use session::ChatSession;

use std::sync::Arc;

use eyre::Result;

use threadstore::{FileThreadStore, ThreadStore};

use crate::config::Config;
use crate::engine::{ConversationState, DialogEngine};
use crate::llm::create_client;
use crate::records::MemoryRecordStore;

/// Run the interactive chat
///
/// This is the main entry point for `concierge chat`.
pub async fn run_chat(config: &Config, passenger_id: Option<String>, thread: Option<String>) -> Result<()> {
    // Validate API key early
    if std::env::var(&config.llm.api_key_env).is_err() {
        return Err(eyre::eyre!(
            "LLM API key not found. Set the {} environment variable.",
            config.llm.api_key_env
        ));
    }

    let llm = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
    let records = Arc::new(MemoryRecordStore::seeded());
    let store: Arc<dyn ThreadStore<ConversationState>> =
        Arc::new(FileThreadStore::open(config.storage.resolve_threads_dir())?);

    let engine = DialogEngine::new(llm, records, store, config)?;
    let thread_id = thread.unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

    let mut session = ChatSession::new(engine, thread_id, passenger_id);
    session.run().await
}
