//! File-backed checkpoint adapter
//!
//! Layout: `<root>/<thread_id>.json`, plus a `.lock` file used for an
//! advisory lock around the read-modify-write of any single thread.
//! Writes go to a tmp file in the same directory and are renamed into
//! place, so a concurrent load sees either the old or the new
//! checkpoint, never a torn one.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{StoreError, ThreadStore};

/// Durable checkpoint store, one JSON file per thread
pub struct FileThreadStore<S> {
    root: PathBuf,
    _marker: std::marker::PhantomData<fn() -> S>,
}

impl<S> FileThreadStore<S> {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            _marker: std::marker::PhantomData,
        })
    }

    /// Reject thread ids that would escape the store directory
    fn validate_thread_id(thread_id: &str) -> Result<(), StoreError> {
        if thread_id.is_empty()
            || thread_id.contains(['/', '\\'])
            || thread_id == "."
            || thread_id == ".."
        {
            return Err(StoreError::InvalidThreadId(thread_id.to_string()));
        }
        Ok(())
    }

    fn checkpoint_path(&self, thread_id: &str) -> PathBuf {
        self.root.join(format!("{thread_id}.json"))
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Take the store-wide advisory lock for the duration of one op
    fn locked(&self) -> Result<fs::File, StoreError> {
        let lock_file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }
}

#[async_trait]
impl<S> ThreadStore<S> for FileThreadStore<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self, thread_id: &str) -> Result<Option<S>, StoreError> {
        debug!(%thread_id, "FileThreadStore::load: called");
        Self::validate_thread_id(thread_id)?;
        let path = self.checkpoint_path(thread_id);

        let _guard = self.locked()?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, thread_id: &str, state: &S) -> Result<(), StoreError> {
        debug!(%thread_id, "FileThreadStore::save: called");
        Self::validate_thread_id(thread_id)?;
        let path = self.checkpoint_path(thread_id);
        let tmp = self.root.join(format!(".{thread_id}.json.tmp"));

        let content = serde_json::to_string_pretty(state)?;

        let _guard = self.locked()?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
