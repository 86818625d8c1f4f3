//! ThreadStore - generic per-thread checkpoint persistence
//!
//! A conversation thread's state is checkpointed after every completed
//! engine step. This crate owns only the persistence contract: load the
//! last checkpoint for a thread, or atomically overwrite it. Retention
//! and cleanup are the caller's concern.
//!
//! Two adapters ship here:
//!
//! - [`MemoryThreadStore`] - process-local, used in tests and demos
//! - [`FileThreadStore`] - one JSON file per thread with atomic
//!   tmp-file + rename writes and an advisory lock on the store root

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileThreadStore;
pub use memory::MemoryThreadStore;

/// Keyed checkpoint storage for conversation state
///
/// `save` overwrites the previous checkpoint for the thread; there is no
/// version history. `save` must be atomic with respect to a concurrent
/// `load` of the same thread id.
#[async_trait]
pub trait ThreadStore<S>: Send + Sync
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    /// Load the last checkpoint for a thread, if one exists
    async fn load(&self, thread_id: &str) -> Result<Option<S>, StoreError>;

    /// Overwrite the checkpoint for a thread
    async fn save(&self, thread_id: &str, state: &S) -> Result<(), StoreError>;
}
