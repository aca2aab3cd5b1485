//! SQLite checkpoint store.
//!
//! Implements `CheckpointStore` from `praxis-core`. State and position are
//! stored as JSON columns; the `version` column backs compare-and-swap
//! through the affected-row count of a guarded UPDATE.

use praxis_core::repository::checkpoint::CheckpointStore;
use praxis_types::checkpoint::{Checkpoint, Position};
use praxis_types::error::RepositoryError;
use praxis_types::run::RunState;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_err};

/// SQLite-backed implementation of `CheckpointStore`.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: DatabasePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_checkpoint(row: &sqlx::sqlite::SqliteRow) -> Result<Checkpoint, RepositoryError> {
    let thread_id: String = row.try_get("thread_id").map_err(query_err)?;
    let version: i64 = row.try_get("version").map_err(query_err)?;
    let position_json: String = row.try_get("position_json").map_err(query_err)?;
    let state_json: String = row.try_get("state_json").map_err(query_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(query_err)?;

    let position: Position = serde_json::from_str(&position_json)
        .map_err(|e| RepositoryError::Query(format!("invalid position for '{thread_id}': {e}")))?;
    let state: RunState = serde_json::from_str(&state_json)
        .map_err(|e| RepositoryError::Query(format!("invalid state for '{thread_id}': {e}")))?;

    Ok(Checkpoint {
        version: u64::try_from(version)
            .map_err(|_| RepositoryError::Query(format!("negative version {version}")))?,
        updated_at: parse_datetime(&updated_at)?,
        thread_id,
        state,
        position,
    })
}

impl CheckpointStore for SqliteCheckpointStore {
    async fn load_checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>, RepositoryError> {
        let row = sqlx::query(
            "SELECT thread_id, version, position_json, state_json, updated_at
             FROM checkpoints WHERE thread_id = ?",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        row.as_ref().map(row_to_checkpoint).transpose()
    }

    async fn save_checkpoint(
        &self,
        checkpoint: &Checkpoint,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        let position_json = serde_json::to_string(&checkpoint.position).map_err(query_err)?;
        let state_json = serde_json::to_string(&checkpoint.state).map_err(query_err)?;
        let version = i64::try_from(checkpoint.version).map_err(query_err)?;
        let updated_at = format_datetime(&checkpoint.updated_at);

        match expected_version {
            None => {
                sqlx::query(
                    "INSERT INTO checkpoints (thread_id, version, position_json, state_json, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&checkpoint.thread_id)
                .bind(version)
                .bind(&position_json)
                .bind(&state_json)
                .bind(&updated_at)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        return RepositoryError::Conflict(format!(
                            "thread '{}' already has a checkpoint",
                            checkpoint.thread_id
                        ));
                    }
                    query_err(e)
                })?;
            }
            Some(expected) => {
                let expected = i64::try_from(expected).map_err(query_err)?;
                let result = sqlx::query(
                    "UPDATE checkpoints
                     SET version = ?, position_json = ?, state_json = ?, updated_at = ?
                     WHERE thread_id = ? AND version = ?",
                )
                .bind(version)
                .bind(&position_json)
                .bind(&state_json)
                .bind(&updated_at)
                .bind(&checkpoint.thread_id)
                .bind(expected)
                .execute(&self.pool.writer)
                .await
                .map_err(query_err)?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::Conflict(format!(
                        "thread '{}' is not at version {expected}",
                        checkpoint.thread_id
                    )));
                }
            }
        }

        tracing::trace!(
            thread_id = %checkpoint.thread_id,
            version = checkpoint.version,
            position = %checkpoint.position.label(),
            "checkpoint saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use praxis_types::checkpoint::StepId;
    use uuid::Uuid;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn checkpoint(thread_id: &str, version: u64, position: Position) -> Checkpoint {
        Checkpoint {
            thread_id: thread_id.to_string(),
            state: RunState::new(Uuid::now_v7(), "notes".to_string(), None),
            position,
            version,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_unknown_thread() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        assert!(store.load_checkpoint("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_load() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let cp = checkpoint(
            "t-1",
            1,
            Position::Completed {
                step: StepId::Classify,
            },
        );
        store.save_checkpoint(&cp, None).await.unwrap();

        let loaded = store.load_checkpoint("t-1").await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.position, cp.position);
        assert_eq!(loaded.state, cp.state);
    }

    #[tokio::test]
    async fn test_insert_existing_thread_conflicts() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let cp = checkpoint("t-1", 1, Position::Done);
        store.save_checkpoint(&cp, None).await.unwrap();

        let err = store.save_checkpoint(&cp, None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_requires_expected_version() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let first = checkpoint(
            "t-1",
            1,
            Position::Completed {
                step: StepId::Classify,
            },
        );
        store.save_checkpoint(&first, None).await.unwrap();

        let second = checkpoint("t-1", 2, Position::Done);
        store.save_checkpoint(&second, Some(1)).await.unwrap();

        let stale = checkpoint("t-1", 2, Position::Done);
        let err = store.save_checkpoint(&stale, Some(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let loaded = store.load_checkpoint("t-1").await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.position, Position::Done);
    }

    #[tokio::test]
    async fn test_update_missing_thread_conflicts() {
        let store = SqliteCheckpointStore::new(test_pool().await);
        let cp = checkpoint("ghost", 2, Position::Done);
        let err = store.save_checkpoint(&cp, Some(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
