//! In-memory checkpoint adapter

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use super::{StoreError, ThreadStore};

/// Process-local checkpoint store backed by a `HashMap`
///
/// Checkpoints are held as serialized JSON so the state type does not
/// need `Clone`, and so load/save round-trips behave the same as the
/// file-backed adapter.
pub struct MemoryThreadStore<S> {
    checkpoints: RwLock<HashMap<String, serde_json::Value>>,
    _marker: PhantomData<fn() -> S>,
}

impl<S> MemoryThreadStore<S> {
    pub fn new() -> Self {
        Self {
            checkpoints: RwLock::new(HashMap::new()),
            _marker: PhantomData,
        }
    }

    /// Number of threads with a checkpoint
    pub async fn len(&self) -> usize {
        self.checkpoints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checkpoints.read().await.is_empty()
    }
}

impl<S> Default for MemoryThreadStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> ThreadStore<S> for MemoryThreadStore<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self, thread_id: &str) -> Result<Option<S>, StoreError> {
        debug!(%thread_id, "MemoryThreadStore::load: called");
        let checkpoints = self.checkpoints.read().await;
        match checkpoints.get(thread_id) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn save(&self, thread_id: &str, state: &S) -> Result<(), StoreError> {
        debug!(%thread_id, "MemoryThreadStore::save: called");
        let value = serde_json::to_value(state)?;
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.insert(thread_id.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Demo {
        counter: u32,
        note: String,
    }

    #[tokio::test]
    async fn test_load_absent_returns_none() {
        let store: MemoryThreadStore<Demo> = MemoryThreadStore::new();
        let loaded = store.load("thread-1").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store: MemoryThreadStore<Demo> = MemoryThreadStore::new();
        let state = Demo {
            counter: 3,
            note: "hello".to_string(),
        };

        store.save("thread-1", &state).await.unwrap();
        let loaded = store.load("thread-1").await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_checkpoint() {
        let store: MemoryThreadStore<Demo> = MemoryThreadStore::new();

        store
            .save(
                "thread-1",
                &Demo {
                    counter: 1,
                    note: "first".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .save(
                "thread-1",
                &Demo {
                    counter: 2,
                    note: "second".to_string(),
                },
            )
            .await
            .unwrap();

        let loaded = store.load("thread-1").await.unwrap().unwrap();
        assert_eq!(loaded.counter, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_threads_are_independent() {
        let store: MemoryThreadStore<Demo> = MemoryThreadStore::new();
        store
            .save(
                "a",
                &Demo {
                    counter: 1,
                    note: "a".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(store.load("b").await.unwrap().is_none());
    }
}
