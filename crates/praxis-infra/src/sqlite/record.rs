//! SQLite record repository implementation.
//!
//! Implements `RecordRepository` from `praxis-core` using sqlx with split
//! read/write pools. Structured stage outputs are stored as JSON text; the
//! columns queries filter on (input type, insight type, intensity, status)
//! are kept as plain columns.

use chrono::Utc;
use praxis_core::repository::record::RecordRepository;
use praxis_types::error::RepositoryError;
use praxis_types::practice::{Classification, InputType, InsightCard, Scenario, Score};
use praxis_types::record::{
    InputRecord, InsightFilter, ResponseRecord, StoredInsight, StoredScenario, ThreadRecord,
    ThreadStatus,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid, query_err};

/// SQLite-backed implementation of `RecordRepository`.
#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: DatabasePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_json<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(json).map_err(|e| RepositoryError::Query(format!("invalid {what} json: {e}")))
}

fn parse_input_type(s: Option<String>) -> Result<Option<InputType>, RepositoryError> {
    s.map(|s| s.parse::<InputType>().map_err(RepositoryError::Query))
        .transpose()
}

fn row_to_input(row: &sqlx::sqlite::SqliteRow) -> Result<InputRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;

    Ok(InputRecord {
        id: parse_uuid(&id, "input")?,
        file_path: row.try_get("file_path").map_err(query_err)?,
        content_hash: row.try_get("content_hash").map_err(query_err)?,
        raw_text: row.try_get("raw_text").map_err(query_err)?,
        type_hint: parse_input_type(row.try_get("type_hint").map_err(query_err)?)?,
        input_type: parse_input_type(row.try_get("input_type").map_err(query_err)?)?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_response(row: &sqlx::sqlite::SqliteRow) -> Result<ResponseRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let scenario_id: String = row.try_get("scenario_id").map_err(query_err)?;
    let score_json: Option<String> = row.try_get("score_json").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;

    Ok(ResponseRecord {
        id: parse_uuid(&id, "response")?,
        scenario_id: parse_uuid(&scenario_id, "scenario")?,
        transcript: row.try_get("transcript").map_err(query_err)?,
        score: score_json
            .map(|json| parse_json::<Score>(&json, "score"))
            .transpose()?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_insight(row: &sqlx::sqlite::SqliteRow) -> Result<StoredInsight, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let input_id: String = row.try_get("input_id").map_err(query_err)?;
    let response_id: Option<String> = row.try_get("response_id").map_err(query_err)?;
    let card_json: String = row.try_get("card_json").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;

    Ok(StoredInsight {
        id: parse_uuid(&id, "insight")?,
        input_id: parse_uuid(&input_id, "input")?,
        response_id: response_id
            .map(|id| parse_uuid(&id, "response"))
            .transpose()?,
        card: parse_json::<InsightCard>(&card_json, "insight card")?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_thread(row: &sqlx::sqlite::SqliteRow) -> Result<ThreadRecord, RepositoryError> {
    let input_id: String = row.try_get("input_id").map_err(query_err)?;
    let scenario_id: Option<String> = row.try_get("scenario_id").map_err(query_err)?;
    let status: String = row.try_get("status").map_err(query_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(query_err)?;

    Ok(ThreadRecord {
        thread_id: row.try_get("thread_id").map_err(query_err)?,
        input_id: parse_uuid(&input_id, "input")?,
        scenario_id: scenario_id
            .map(|id| parse_uuid(&id, "scenario"))
            .transpose()?,
        status: status
            .parse::<ThreadStatus>()
            .map_err(RepositoryError::Query)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

const INPUT_COLUMNS: &str =
    "id, file_path, content_hash, raw_text, type_hint, input_type, created_at";

const THREAD_COLUMNS: &str = "thread_id, input_id, scenario_id, status, updated_at";

impl RecordRepository for SqliteRecordRepository {
    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    async fn create_input(&self, input: &InputRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO inputs (id, file_path, content_hash, raw_text, type_hint, input_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.id.to_string())
        .bind(&input.file_path)
        .bind(&input.content_hash)
        .bind(&input.raw_text)
        .bind(input.type_hint.map(|t| t.to_string()))
        .bind(input.input_type.map(|t| t.to_string()))
        .bind(format_datetime(&input.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return RepositoryError::Conflict(format!(
                    "input with hash {} already exists",
                    input.content_hash
                ));
            }
            query_err(e)
        })?;
        Ok(())
    }

    async fn get_input(&self, id: &Uuid) -> Result<Option<InputRecord>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {INPUT_COLUMNS} FROM inputs WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(row_to_input).transpose()
    }

    async fn find_input_by_hash(&self, content_hash: &str) -> Result<Option<InputRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {INPUT_COLUMNS} FROM inputs WHERE content_hash = ?"
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;
        row.as_ref().map(row_to_input).transpose()
    }

    async fn list_inputs(
        &self,
        input_type: Option<InputType>,
        limit: u32,
    ) -> Result<Vec<InputRecord>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {INPUT_COLUMNS} FROM inputs"));
        if let Some(input_type) = input_type {
            qb.push(" WHERE input_type = ").push_bind(input_type.to_string());
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(limit));

        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_input).collect()
    }

    // -----------------------------------------------------------------------
    // Stage outputs
    // -----------------------------------------------------------------------

    async fn save_classification(
        &self,
        input_id: &Uuid,
        classification: &Classification,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(classification).map_err(query_err)?;
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO classifications (input_id, json) VALUES (?, ?)
             ON CONFLICT(input_id) DO UPDATE SET json = excluded.json",
        )
        .bind(input_id.to_string())
        .bind(&json)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        sqlx::query("UPDATE inputs SET input_type = ? WHERE id = ?")
            .bind(classification.input_type.to_string())
            .bind(input_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn get_classification(&self, input_id: &Uuid) -> Result<Option<Classification>, RepositoryError> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT json FROM classifications WHERE input_id = ?")
                .bind(input_id.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_err)?;
        json.map(|json| parse_json(&json, "classification")).transpose()
    }

    async fn save_scenario(&self, input_id: &Uuid, scenario: &Scenario) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(scenario).map_err(query_err)?;
        sqlx::query(
            "INSERT INTO scenarios (id, input_id, json, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(scenario.id.to_string())
        .bind(input_id.to_string())
        .bind(&json)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn get_scenario(&self, scenario_id: &Uuid) -> Result<Option<StoredScenario>, RepositoryError> {
        let row = sqlx::query("SELECT input_id, json, created_at FROM scenarios WHERE id = ?")
            .bind(scenario_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let input_id: String = row.try_get("input_id").map_err(query_err)?;
        let json: String = row.try_get("json").map_err(query_err)?;
        let created_at: String = row.try_get("created_at").map_err(query_err)?;

        Ok(Some(StoredScenario {
            input_id: parse_uuid(&input_id, "input")?,
            scenario: parse_json(&json, "scenario")?,
            created_at: parse_datetime(&created_at)?,
        }))
    }

    async fn list_scenarios(&self, input_id: &Uuid) -> Result<Vec<Scenario>, RepositoryError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT json FROM scenarios WHERE input_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(input_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(|json| parse_json(json, "scenario")).collect()
    }

    async fn save_response(&self, response: &ResponseRecord) -> Result<(), RepositoryError> {
        let score_json = response
            .score
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(query_err)?;

        sqlx::query(
            "INSERT INTO responses (id, scenario_id, transcript, score_json, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(response.id.to_string())
        .bind(response.scenario_id.to_string())
        .bind(&response.transcript)
        .bind(score_json)
        .bind(format_datetime(&response.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn get_response_by_scenario(&self, scenario_id: &Uuid) -> Result<Option<ResponseRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, scenario_id, transcript, score_json, created_at
             FROM responses WHERE scenario_id = ?
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(scenario_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;
        row.as_ref().map(row_to_response).transpose()
    }

    async fn save_insights(
        &self,
        input_id: &Uuid,
        response_id: Option<Uuid>,
        cards: &[InsightCard],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        let now = format_datetime(&Utc::now());

        for card in cards {
            let card_json = serde_json::to_string(card).map_err(query_err)?;
            sqlx::query(
                "INSERT INTO insights
                 (id, input_id, scenario_id, response_id, insight_type, intensity, card_json, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::now_v7().to_string())
            .bind(input_id.to_string())
            .bind(card.scenario_id.to_string())
            .bind(response_id.map(|id| id.to_string()))
            .bind(card.insight_type.to_string())
            .bind(i64::from(card.intensity))
            .bind(&card_json)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;
        tracing::debug!(input_id = %input_id, count = cards.len(), "insights saved");
        Ok(())
    }

    async fn list_insights(&self, filter: &InsightFilter) -> Result<Vec<StoredInsight>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, input_id, response_id, card_json, created_at FROM insights WHERE 1 = 1",
        );
        if let Some(input_id) = filter.input_id {
            qb.push(" AND input_id = ").push_bind(input_id.to_string());
        }
        if let Some(insight_type) = filter.insight_type {
            qb.push(" AND insight_type = ").push_bind(insight_type.to_string());
        }
        if let Some(min) = filter.min_intensity {
            qb.push(" AND intensity >= ").push_bind(i64::from(min));
        }
        qb.push(" ORDER BY intensity DESC, created_at DESC, id ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_insight).collect()
    }

    // -----------------------------------------------------------------------
    // Threads
    // -----------------------------------------------------------------------

    async fn upsert_thread(&self, thread: &ThreadRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO threads (thread_id, input_id, scenario_id, status, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(thread_id) DO UPDATE SET
                 scenario_id = excluded.scenario_id,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(&thread.thread_id)
        .bind(thread.input_id.to_string())
        .bind(thread.scenario_id.map(|id| id.to_string()))
        .bind(thread.status.to_string())
        .bind(format_datetime(&thread.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = ?"
        ))
        .bind(thread_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;
        row.as_ref().map(row_to_thread).transpose()
    }

    async fn find_thread_by_scenario(&self, scenario_id: &Uuid) -> Result<Option<ThreadRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE scenario_id = ?
             ORDER BY updated_at DESC LIMIT 1"
        ))
        .bind(scenario_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;
        row.as_ref().map(row_to_thread).transpose()
    }
}
