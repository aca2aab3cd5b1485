//! Checkpoint store trait and an in-memory implementation.
//!
//! The engine only ever needs to load a thread's checkpoint and save a new
//! one. Saves are compare-and-swap on the checkpoint version, which
//! serializes concurrent writers on the same thread without a process-wide
//! lock.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use praxis_types::checkpoint::Checkpoint;
use praxis_types::error::RepositoryError;

/// Durable storage for per-thread checkpoints.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for `thread_id`, or `None` if the thread is unknown.
    fn load_checkpoint(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Checkpoint>, RepositoryError>> + Send;

    /// Persist `checkpoint`.
    ///
    /// With `expected_version = None` the thread must not exist yet. With
    /// `Some(v)` the stored checkpoint must still be at version `v`.
    /// Either mismatch fails with `RepositoryError::Conflict` and leaves the
    /// stored checkpoint untouched.
    fn save_checkpoint(
        &self,
        checkpoint: &Checkpoint,
        expected_version: Option<u64>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Process-local checkpoint store, keyed by thread id.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: DashMap<String, Checkpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    async fn load_checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>, RepositoryError> {
        Ok(self.checkpoints.get(thread_id).map(|cp| cp.value().clone()))
    }

    async fn save_checkpoint(
        &self,
        checkpoint: &Checkpoint,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        match (self.checkpoints.entry(checkpoint.thread_id.clone()), expected_version) {
            (Entry::Vacant(slot), None) => {
                slot.insert(checkpoint.clone());
                Ok(())
            }
            (Entry::Occupied(mut slot), Some(expected)) if slot.get().version == expected => {
                slot.insert(checkpoint.clone());
                Ok(())
            }
            (Entry::Occupied(slot), _) => Err(RepositoryError::Conflict(format!(
                "thread '{}' is at version {}",
                checkpoint.thread_id,
                slot.get().version
            ))),
            (Entry::Vacant(_), Some(_)) => Err(RepositoryError::Conflict(format!(
                "thread '{}' has no checkpoint",
                checkpoint.thread_id
            ))),
        }
    }
}
