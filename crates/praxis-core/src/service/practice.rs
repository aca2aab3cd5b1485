//! Practice service.
//!
//! Sits between the CLI and the engine: stores submitted inputs, starts and
//! resumes threads, and copies each stage's output from the run state into
//! the record store so it can be queried without loading checkpoints.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use praxis_types::error::RepositoryError;
use praxis_types::practice::{Classification, InputType, Scenario};
use praxis_types::record::{
    InputRecord, InsightFilter, ResponseRecord, StoredInsight, ThreadRecord, ThreadStatus,
};
use praxis_types::run::RunState;

use crate::pipeline::{Engine, EngineError, Outcome, PracticeSteps, RunOutcome};
use crate::repository::checkpoint::CheckpointStore;
use crate::repository::record::RecordRepository;
use crate::service::export::{self, ExportFormat};
use crate::service::hash::ContentHasher;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("same content already exists as input {existing_id}; use --force to reprocess")]
    Duplicate { existing_id: Uuid },

    #[error("input {0} not found")]
    InputNotFound(Uuid),

    #[error("no input or scenario with id {0}")]
    NotFound(Uuid),

    #[error("no thread found for scenario {0}")]
    ScenarioNotFound(Uuid),

    #[error("thread '{0}' not found")]
    ThreadNotFound(String),

    #[error("input {0} has no classification yet; add it first")]
    MissingClassification(Uuid),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("export failed: {0}")]
    Export(String),
}

/// A new input to run through the pipeline.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub file_path: Option<String>,
    pub raw_text: String,
    pub type_hint: Option<InputType>,
    /// Reprocess content whose hash is already stored.
    pub force: bool,
}

/// Result of any operation that drives the engine.
#[derive(Debug, Clone)]
pub struct PracticeReport {
    pub input_id: Uuid,
    pub run: RunOutcome,
}

/// Everything stored about one input.
#[derive(Debug, Clone, Serialize)]
pub struct InputOverview {
    pub input: InputRecord,
    pub classification: Option<Classification>,
    pub scenarios: Vec<ScenarioOverview>,
    pub insights: Vec<StoredInsight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOverview {
    pub scenario: Scenario,
    pub response: Option<ResponseRecord>,
}

/// Service orchestrating practice runs.
///
/// Generic over storage and hashing traits to maintain clean architecture --
/// praxis-core never depends on praxis-infra.
pub struct PracticeService<C: CheckpointStore, R: RecordRepository, H: ContentHasher> {
    engine: Engine<PracticeSteps, C>,
    records: R,
    hasher: H,
}

impl<C: CheckpointStore, R: RecordRepository, H: ContentHasher> PracticeService<C, R, H> {
    pub fn new(engine: Engine<PracticeSteps, C>, records: R, hasher: H) -> Self {
        Self {
            engine,
            records,
            hasher,
        }
    }

    pub fn engine(&self) -> &Engine<PracticeSteps, C> {
        &self.engine
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Store an input and run it through the pipeline on a fresh thread.
    ///
    /// Content is deduplicated by hash. With `force`, an existing input with
    /// the same content is reprocessed on a new thread instead of rejected.
    pub async fn submit(&self, request: SubmitRequest) -> Result<PracticeReport, ServiceError> {
        if request.raw_text.trim().is_empty() {
            return Err(ServiceError::Empty("input text"));
        }

        let content_hash = self.hasher.compute_hash(&request.raw_text);
        let existing = self.records.find_input_by_hash(&content_hash).await?;

        let input = match existing {
            Some(existing) if !request.force => {
                return Err(ServiceError::Duplicate {
                    existing_id: existing.id,
                });
            }
            Some(existing) => {
                tracing::info!(input_id = %existing.id, "reprocessing duplicate input");
                existing
            }
            None => {
                let input = InputRecord {
                    id: Uuid::now_v7(),
                    file_path: request.file_path,
                    content_hash,
                    raw_text: request.raw_text,
                    type_hint: request.type_hint,
                    input_type: None,
                    created_at: Utc::now(),
                };
                self.records.create_input(&input).await?;
                tracing::info!(input_id = %input.id, "input stored");
                input
            }
        };

        let hint = request.type_hint.or(input.type_hint);
        let state = RunState::new(input.id, input.raw_text.clone(), hint);
        self.start(input.id, state).await
    }

    /// Start a forced practice run for an already classified input.
    pub async fn practice(&self, input_id: Uuid) -> Result<PracticeReport, ServiceError> {
        let input = self
            .records
            .get_input(&input_id)
            .await?
            .ok_or(ServiceError::InputNotFound(input_id))?;
        let classification = self
            .records
            .get_classification(&input_id)
            .await?
            .ok_or(ServiceError::MissingClassification(input_id))?;

        let state = RunState::forced(input.id, input.raw_text, input.type_hint, classification);
        self.start(input_id, state).await
    }

    /// Reply to the scenario's suspended thread.
    pub async fn answer(&self, scenario_id: Uuid, reply: &str) -> Result<PracticeReport, ServiceError> {
        if reply.trim().is_empty() {
            return Err(ServiceError::Empty("answer"));
        }

        let thread = self
            .records
            .find_thread_by_scenario(&scenario_id)
            .await?
            .ok_or(ServiceError::ScenarioNotFound(scenario_id))?;

        let result = self.engine.resume(&thread.thread_id, reply).await;
        self.finish(thread.input_id, &thread.thread_id, result).await
    }

    /// Re-run a thread whose last invocation failed mid-graph.
    ///
    /// A thread that failed before its first checkpoint (classify never
    /// completed) is started again from the stored input on the same id.
    /// Forced threads always checkpoint classify, since it reuses the stored
    /// classification, so the restart is an unforced run.
    pub async fn retry(&self, thread_id: &str) -> Result<PracticeReport, ServiceError> {
        let thread = self
            .records
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| ServiceError::ThreadNotFound(thread_id.to_string()))?;

        let result = match self.engine.checkpoint(thread_id).await? {
            Some(_) => self.engine.retry(thread_id).await,
            None => {
                let input = self
                    .records
                    .get_input(&thread.input_id)
                    .await?
                    .ok_or(ServiceError::InputNotFound(thread.input_id))?;
                tracing::info!(thread_id, input_id = %input.id, "no checkpoint, restarting thread");
                let state = RunState::new(input.id, input.raw_text, input.type_hint);
                self.engine.run(state, thread_id).await
            }
        };
        self.finish(thread.input_id, thread_id, result).await
    }

    async fn start(&self, input_id: Uuid, state: RunState) -> Result<PracticeReport, ServiceError> {
        let thread_id = Uuid::now_v7().to_string();
        self.records
            .upsert_thread(&ThreadRecord {
                thread_id: thread_id.clone(),
                input_id,
                scenario_id: None,
                status: ThreadStatus::Running,
                updated_at: Utc::now(),
            })
            .await?;

        let result = self.engine.run(state, &thread_id).await;
        self.finish(input_id, &thread_id, result).await
    }

    /// Record the outcome of an engine call: stage outputs plus thread status.
    async fn finish(
        &self,
        input_id: Uuid,
        thread_id: &str,
        result: Result<RunOutcome, EngineError>,
    ) -> Result<PracticeReport, ServiceError> {
        let run = match result {
            Ok(run) => run,
            Err(err @ EngineError::Step { .. }) | Err(err @ EngineError::InvalidSuspend { .. }) => {
                self.mark_failed(input_id, thread_id).await?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let state = &run.state;
        self.store_stage_outputs(input_id, state).await?;

        let status = match &run.outcome {
            Outcome::Suspended(_) => ThreadStatus::Suspended,
            Outcome::Done => {
                self.store_results(input_id, state).await?;
                ThreadStatus::Completed
            }
        };

        self.records
            .upsert_thread(&ThreadRecord {
                thread_id: thread_id.to_string(),
                input_id,
                scenario_id: state.scenario.as_ref().map(|s| s.id),
                status,
                updated_at: Utc::now(),
            })
            .await?;

        tracing::debug!(thread_id, %status, "thread recorded");
        Ok(PracticeReport { input_id, run })
    }

    async fn store_stage_outputs(&self, input_id: Uuid, state: &RunState) -> Result<(), ServiceError> {
        if let Some(classification) = &state.classification {
            self.records.save_classification(&input_id, classification).await?;
        }
        if let Some(scenario) = &state.scenario {
            self.records.save_scenario(&input_id, scenario).await?;
        }
        Ok(())
    }

    async fn store_results(&self, input_id: Uuid, state: &RunState) -> Result<(), ServiceError> {
        let (Some(scenario), Some(score)) = (&state.scenario, &state.score) else {
            return Ok(());
        };

        let response = ResponseRecord {
            id: Uuid::now_v7(),
            scenario_id: scenario.id,
            transcript: state.transcript.clone().unwrap_or_default(),
            score: Some(score.clone()),
            created_at: Utc::now(),
        };
        self.records.save_response(&response).await?;
        self.records
            .save_insights(&input_id, Some(response.id), &state.insights)
            .await?;
        Ok(())
    }

    /// Flag the thread as failed, keeping whatever the last checkpoint holds.
    async fn mark_failed(&self, input_id: Uuid, thread_id: &str) -> Result<(), ServiceError> {
        let checkpoint = self.engine.checkpoint(thread_id).await?;
        let scenario_id = match &checkpoint {
            Some(cp) => {
                self.store_stage_outputs(input_id, &cp.state).await?;
                cp.state.scenario.as_ref().map(|s| s.id)
            }
            None => None,
        };
        self.records
            .upsert_thread(&ThreadRecord {
                thread_id: thread_id.to_string(),
                input_id,
                scenario_id,
                status: ThreadStatus::Failed,
                updated_at: Utc::now(),
            })
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn list_inputs(
        &self,
        input_type: Option<InputType>,
        limit: u32,
    ) -> Result<Vec<InputRecord>, ServiceError> {
        Ok(self.records.list_inputs(input_type, limit).await?)
    }

    /// Everything stored for an input. `id` may be an input id or a scenario id.
    pub async fn show(&self, id: Uuid) -> Result<InputOverview, ServiceError> {
        let input = match self.records.get_input(&id).await? {
            Some(input) => input,
            None => {
                let stored = self
                    .records
                    .get_scenario(&id)
                    .await?
                    .ok_or(ServiceError::NotFound(id))?;
                self.records
                    .get_input(&stored.input_id)
                    .await?
                    .ok_or(ServiceError::InputNotFound(stored.input_id))?
            }
        };

        let classification = self.records.get_classification(&input.id).await?;
        let mut scenarios = Vec::new();
        for scenario in self.records.list_scenarios(&input.id).await? {
            let response = self.records.get_response_by_scenario(&scenario.id).await?;
            scenarios.push(ScenarioOverview { scenario, response });
        }
        let insights = self
            .records
            .list_insights(&InsightFilter {
                input_id: Some(input.id),
                ..Default::default()
            })
            .await?;

        Ok(InputOverview {
            input,
            classification,
            scenarios,
            insights,
        })
    }

    pub async fn insights(&self, filter: &InsightFilter) -> Result<Vec<StoredInsight>, ServiceError> {
        Ok(self.records.list_insights(filter).await?)
    }

    pub async fn export(&self, format: ExportFormat) -> Result<(usize, String), ServiceError> {
        let insights = self.records.list_insights(&InsightFilter::default()).await?;
        let text = export::render(&insights, format).map_err(|e| ServiceError::Export(e.to_string()))?;
        Ok((insights.len(), text))
    }
}
