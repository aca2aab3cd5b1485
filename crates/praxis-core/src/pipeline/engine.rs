//! Resumable step engine with per-step checkpointing.
//!
//! The engine drives the fixed practice graph over a [`RunState`]. Every
//! executed step goes through the same loop:
//!
//! 1. Execute the step against the current state.
//! 2. Merge its update into the state.
//! 3. Persist a checkpoint (`Completed { step }`) with a version CAS.
//! 4. Route to the next step from the merged state.
//!
//! A failing step commits nothing: the checkpoint keeps the position of the
//! last successful step and the error is returned to the caller. Only
//! `human_turn` may suspend; the engine persists `Suspended { payload }` and
//! returns. A later [`Engine::resume`] (usually in a new process) loads the
//! checkpoint, feeds the reply to the suspended step and continues.

use chrono::Utc;
use thiserror::Error;

use praxis_types::checkpoint::{Checkpoint, Position, StepId, SuspendPayload};
use praxis_types::config::EngineConfig;
use praxis_types::error::RepositoryError;
use praxis_types::generation::GenerationError;
use praxis_types::run::RunState;

use crate::repository::checkpoint::CheckpointStore;

use super::routing;
use super::steps::{PipelineSteps, StepError, StepOutcome};

/// The only step allowed to suspend.
pub const SUSPENSION_POINT: StepId = StepId::HumanTurn;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How an engine invocation returned control.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Waiting for a human reply; resume with the same thread id.
    Suspended(SuspendPayload),
    Done,
}

/// State snapshot plus outcome of `run`, `resume` or `retry`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub thread_id: String,
    pub state: RunState,
    pub outcome: Outcome,
}

impl RunOutcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self.outcome, Outcome::Suspended(_))
    }
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EngineError {
    /// A step failed. Nothing was committed for it.
    #[error("step '{step}' failed on thread '{thread_id}': {source}")]
    Step {
        thread_id: String,
        step: StepId,
        #[source]
        source: StepError,
    },

    /// A step other than the suspension point asked to suspend.
    #[error("step '{step}' attempted to suspend on thread '{thread_id}'")]
    InvalidSuspend { thread_id: String, step: StepId },

    #[error("no checkpoint for thread '{0}'")]
    NoSuchThread(String),

    #[error("thread '{thread_id}' is not suspended ({position})")]
    NotSuspended { thread_id: String, position: String },

    #[error("thread '{0}' already has a checkpoint; start a new run with a fresh thread id")]
    ThreadExists(String),

    #[error("thread '{thread_id}' has nothing to retry ({position})")]
    NotRetryable { thread_id: String, position: String },

    #[error("concurrent update on thread '{0}'")]
    Conflict(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

impl EngineError {
    /// The generation failure behind a step error, if any.
    pub fn generation(&self) -> Option<&GenerationError> {
        match self {
            EngineError::Step {
                source: StepError::Generation(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    fn from_store(thread_id: &str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => EngineError::Conflict(thread_id.to_string()),
            other => EngineError::Checkpoint(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Generic over the step table and the checkpoint store so tests can swap
/// either for in-memory fakes.
pub struct Engine<S: PipelineSteps, C: CheckpointStore> {
    steps: S,
    store: C,
    config: EngineConfig,
}

impl<S: PipelineSteps, C: CheckpointStore> Engine<S, C> {
    pub fn new(steps: S, store: C, config: EngineConfig) -> Self {
        Self {
            steps,
            store,
            config,
        }
    }

    /// Access the underlying checkpoint store.
    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a thread's checkpoint without changing it.
    pub async fn checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>, EngineError> {
        self.store
            .load_checkpoint(thread_id)
            .await
            .map_err(|e| EngineError::from_store(thread_id, e))
    }

    /// Start a fresh run on an unused thread id.
    pub async fn run(&self, mut initial: RunState, thread_id: &str) -> Result<RunOutcome, EngineError> {
        if self.checkpoint(thread_id).await?.is_some() {
            return Err(EngineError::ThreadExists(thread_id.to_string()));
        }

        if initial.max_rounds.is_none() {
            initial.max_rounds = Some(self.config.round_cap(initial.force_practice));
        }

        tracing::info!(
            thread_id,
            input_id = %initial.input_id,
            forced = initial.force_practice,
            max_rounds = initial.max_rounds,
            "starting run"
        );

        self.drive(thread_id, initial, Some(routing::ENTRY), None).await
    }

    /// Deliver `reply` to a suspended thread and continue.
    pub async fn resume(&self, thread_id: &str, reply: &str) -> Result<RunOutcome, EngineError> {
        let checkpoint = self
            .checkpoint(thread_id)
            .await?
            .ok_or_else(|| EngineError::NoSuchThread(thread_id.to_string()))?;

        let Position::Suspended { step, .. } = &checkpoint.position else {
            return Err(EngineError::NotSuspended {
                thread_id: thread_id.to_string(),
                position: checkpoint.position.label(),
            });
        };
        let step = *step;

        tracing::info!(thread_id, %step, round = checkpoint.state.round_count + 1, "resuming thread");

        let mut state = checkpoint.state;
        let update = self
            .steps
            .resume(step, &state, reply)
            .map_err(|source| self.step_failed(thread_id, step, source))?;
        state.apply(update);

        let version = self
            .persist(thread_id, &state, Position::Completed { step }, Some(checkpoint.version))
            .await?;
        let next = routing::next_step(step, &state, self.round_cap(&state));

        self.drive(thread_id, state, next, Some(version)).await
    }

    /// Re-run the step after the last committed one, for a thread whose
    /// previous invocation failed mid-graph.
    pub async fn retry(&self, thread_id: &str) -> Result<RunOutcome, EngineError> {
        let checkpoint = self
            .checkpoint(thread_id)
            .await?
            .ok_or_else(|| EngineError::NoSuchThread(thread_id.to_string()))?;

        let Position::Completed { step } = checkpoint.position else {
            return Err(EngineError::NotRetryable {
                thread_id: thread_id.to_string(),
                position: checkpoint.position.label(),
            });
        };

        tracing::info!(thread_id, after = %step, "retrying thread");

        let next = routing::next_step(step, &checkpoint.state, self.round_cap(&checkpoint.state));
        self.drive(thread_id, checkpoint.state, next, Some(checkpoint.version))
            .await
    }

    fn round_cap(&self, state: &RunState) -> u32 {
        state
            .max_rounds
            .unwrap_or_else(|| self.config.round_cap(state.force_practice))
    }

    fn step_failed(&self, thread_id: &str, step: StepId, source: StepError) -> EngineError {
        tracing::warn!(thread_id, %step, error = %source, "step failed; checkpoint left unchanged");
        EngineError::Step {
            thread_id: thread_id.to_string(),
            step,
            source,
        }
    }

    /// Step-then-persist-then-route loop shared by `run`, `resume` and `retry`.
    async fn drive(
        &self,
        thread_id: &str,
        mut state: RunState,
        mut next: Option<StepId>,
        mut version: Option<u64>,
    ) -> Result<RunOutcome, EngineError> {
        while let Some(step) = next {
            tracing::debug!(thread_id, %step, "executing step");

            let outcome = self
                .steps
                .execute(step, &state)
                .await
                .map_err(|source| self.step_failed(thread_id, step, source))?;

            match outcome {
                StepOutcome::Update(update) => {
                    state.apply(update);
                    version = Some(
                        self.persist(thread_id, &state, Position::Completed { step }, version)
                            .await?,
                    );
                    next = routing::next_step(step, &state, self.round_cap(&state));
                }
                StepOutcome::Suspend(payload) => {
                    if step != SUSPENSION_POINT {
                        tracing::error!(thread_id, %step, "step attempted to suspend");
                        return Err(EngineError::InvalidSuspend {
                            thread_id: thread_id.to_string(),
                            step,
                        });
                    }

                    let position = Position::Suspended {
                        step,
                        payload: payload.clone(),
                    };
                    self.persist(thread_id, &state, position, version).await?;

                    tracing::info!(
                        thread_id,
                        scenario_id = %payload.scenario_id,
                        round = payload.round,
                        "thread suspended awaiting reply"
                    );

                    return Ok(RunOutcome {
                        thread_id: thread_id.to_string(),
                        state,
                        outcome: Outcome::Suspended(payload),
                    });
                }
            }
        }

        self.persist(thread_id, &state, Position::Done, version).await?;
        tracing::info!(
            thread_id,
            rounds = state.round_count,
            insights = state.insights.len(),
            "run complete"
        );

        Ok(RunOutcome {
            thread_id: thread_id.to_string(),
            state,
            outcome: Outcome::Done,
        })
    }

    /// Write a checkpoint and return its new version. `expected` is the
    /// version this invocation last saw (`None` for a brand-new thread).
    async fn persist(
        &self,
        thread_id: &str,
        state: &RunState,
        position: Position,
        expected: Option<u64>,
    ) -> Result<u64, EngineError> {
        let version = expected.map_or(1, |v| v + 1);
        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            state: state.clone(),
            position,
            version,
            updated_at: Utc::now(),
        };

        self.store
            .save_checkpoint(&checkpoint, expected)
            .await
            .map_err(|e| EngineError::from_store(thread_id, e))?;

        tracing::debug!(thread_id, version, position = %checkpoint.position.label(), "checkpoint saved");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::PracticeSteps;
    use crate::repository::checkpoint::InMemoryCheckpointStore;
    use crate::test_support::{
        ScriptedBackend, classification_json, coach_json, insights_json, score_json,
        scenario_json,
    };
    use praxis_types::practice::{
        Classification, CoachReply, InsightDrafts, RoutingPolicy, ScenarioDraft, Score, Speaker,
    };
    use praxis_types::generation::RawGeneration;
    use praxis_types::run::StateUpdate;
    use uuid::Uuid;

    type TestEngine = Engine<PracticeSteps, InMemoryCheckpointStore>;

    fn engine(backend: &ScriptedBackend) -> TestEngine {
        engine_with(backend, EngineConfig::default())
    }

    fn engine_with(backend: &ScriptedBackend, config: EngineConfig) -> TestEngine {
        Engine::new(
            PracticeSteps::new(backend.adapter()),
            InMemoryCheckpointStore::new(),
            config,
        )
    }

    fn initial() -> RunState {
        RunState::new(Uuid::now_v7(), "Interview notes on caching.", None)
    }

    /// Classification routed to practice plus a scenario and a first coach turn.
    fn script_until_first_suspend(backend: &ScriptedBackend, first_coach_ready: bool) {
        backend.push_json::<Classification>(classification_json(RoutingPolicy::Required));
        backend.push_json::<ScenarioDraft>(scenario_json());
        backend.push_json::<CoachReply>(coach_json("How would you invalidate?", first_coach_ready));
    }

    fn script_scoring(backend: &ScriptedBackend) {
        backend.push_json::<Score>(score_json());
        backend.push_json::<InsightDrafts>(insights_json());
    }

    async fn checkpoint_bytes(engine: &TestEngine, thread_id: &str) -> Vec<u8> {
        let cp = engine.checkpoint(thread_id).await.unwrap().unwrap();
        serde_json::to_vec(&cp).unwrap()
    }

    fn assert_dialogue_invariants(state: &RunState) {
        for (i, turn) in state.dialogue_turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Speaker::Coach } else { Speaker::Human };
            assert_eq!(turn.speaker, expected, "turn {i} out of order");
        }
        assert_eq!(state.round_count, state.human_turn_count());
    }

    // -----------------------------------------------------------------------
    // End-to-end flows
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_routing_none_finishes_after_classify() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::None));
        let engine = engine(&backend);

        let result = engine.run(initial(), "t-none").await.unwrap();

        assert_eq!(result.outcome, Outcome::Done);
        assert!(result.state.classification.is_some());
        assert!(result.state.scenario.is_none());
        assert!(result.state.dialogue_turns.is_empty());
        assert_eq!(backend.requests().len(), 1);

        let cp = engine.checkpoint("t-none").await.unwrap().unwrap();
        assert_eq!(cp.position, Position::Done);
    }

    #[tokio::test]
    async fn test_required_routing_suspends_then_resumes() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, false);
        let engine = engine(&backend);

        let first = engine.run(initial(), "t-req").await.unwrap();
        let Outcome::Suspended(payload) = &first.outcome else {
            panic!("expected suspension, got {:?}", first.outcome);
        };
        assert_eq!(payload.role, "Senior interviewer");
        assert!(payload.task.contains("read-through cache"));
        assert_eq!(payload.coach_message.as_deref(), Some("How would you invalidate?"));
        assert_eq!(payload.round, 1);

        // Second coach turn not ready: the thread suspends again.
        backend.push_json::<CoachReply>(coach_json("What about stampedes?", false));
        let second = engine.resume("t-req", "X").await.unwrap();

        let turns = &second.state.dialogue_turns;
        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns.iter().map(|t| t.speaker).collect::<Vec<_>>(),
            vec![Speaker::Coach, Speaker::Human, Speaker::Coach]
        );
        assert_eq!(turns[1].text, "X");
        assert!(second.is_suspended());
        assert!(second.state.score.is_none());
    }

    #[tokio::test]
    async fn test_resume_with_ready_coach_reaches_scoring() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, false);
        let engine = engine(&backend);
        engine.run(initial(), "t-ready").await.unwrap();

        backend.push_json::<CoachReply>(coach_json("Thanks, that covers it.", true));
        script_scoring(&backend);
        let done = engine.resume("t-ready", "X").await.unwrap();

        assert_eq!(done.outcome, Outcome::Done);
        assert_eq!(done.state.dialogue_turns.len(), 3);
        assert!(done.state.coach_ready);
        assert!(done.state.score.is_some());
        assert!(done.state.transcript.as_deref().is_some_and(|t| t.contains("human: X")));

        let scenario_id = done.state.scenario.as_ref().unwrap().id;
        assert!(!done.state.insights.is_empty());
        assert!(done.state.insights.iter().all(|c| c.scenario_id == scenario_id));
        assert_dialogue_invariants(&done.state);
    }

    #[tokio::test]
    async fn test_coach_ready_on_first_turn_skips_human_turn() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, true);
        script_scoring(&backend);
        let engine = engine(&backend);

        let done = engine.run(initial(), "t-eager").await.unwrap();
        assert_eq!(done.outcome, Outcome::Done);
        assert_eq!(done.state.round_count, 0);
        assert_eq!(done.state.dialogue_turns.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Round cap
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_round_cap_reaches_scoring_after_exactly_max_human_turns() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, false);
        for i in 0..5 {
            backend.push_json::<CoachReply>(coach_json(&format!("Follow-up {i}?"), false));
        }
        script_scoring(&backend);
        let engine = engine(&backend);

        let mut result = engine.run(initial(), "t-cap").await.unwrap();
        let mut replies = 0;
        while let Outcome::Suspended(payload) = &result.outcome {
            assert!(payload.round <= 3, "suspended for round {}", payload.round);
            replies += 1;
            result = engine.resume("t-cap", &format!("reply {replies}")).await.unwrap();
        }

        assert_eq!(replies, 3);
        assert_eq!(result.state.round_count, 3);
        assert_eq!(result.state.human_turn_count(), 3);
        assert!(!result.state.coach_ready);
        assert!(result.state.score.is_some());
        // Opening turn plus one coach turn per reply.
        assert_eq!(backend.calls_for("CoachReply"), 4);
        assert_dialogue_invariants(&result.state);
    }

    #[tokio::test]
    async fn test_forced_run_uses_forced_round_cap() {
        let backend = ScriptedBackend::new();
        backend.push_json::<ScenarioDraft>(scenario_json());
        for _ in 0..3 {
            backend.push_json::<CoachReply>(coach_json("Go on?", false));
        }
        script_scoring(&backend);
        let config = EngineConfig {
            max_rounds: 3,
            forced_max_rounds: Some(1),
        };
        let engine = engine_with(&backend, config);

        let seeded: Classification =
            serde_json::from_value(classification_json(RoutingPolicy::None)).unwrap();
        let state = RunState::forced(Uuid::now_v7(), "text", None, seeded);

        let first = engine.run(state, "t-forced").await.unwrap();
        let Outcome::Suspended(payload) = &first.outcome else {
            panic!("forced run must enter practice");
        };
        assert_eq!(payload.max_rounds, 1);
        assert_eq!(first.state.max_rounds, Some(1));
        assert_eq!(backend.calls_for("Classification"), 0);

        let done = engine.resume("t-forced", "only reply").await.unwrap();
        assert_eq!(done.outcome, Outcome::Done);
        assert_eq!(done.state.round_count, 1);
    }

    // -----------------------------------------------------------------------
    // Protocol violations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_second_run_on_same_thread_fails() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::None));
        let engine = engine(&backend);
        engine.run(initial(), "t-dup").await.unwrap();
        let before = checkpoint_bytes(&engine, "t-dup").await;

        let err = engine.run(initial(), "t-dup").await.unwrap_err();
        assert!(matches!(err, EngineError::ThreadExists(ref id) if id == "t-dup"));
        assert_eq!(backend.calls_for("Classification"), 1);
        assert_eq!(checkpoint_bytes(&engine, "t-dup").await, before);
    }

    #[tokio::test]
    async fn test_resume_unknown_thread() {
        let engine = engine(&ScriptedBackend::new());
        let err = engine.resume("ghost", "hello").await.unwrap_err();
        assert!(matches!(err, EngineError::NoSuchThread(_)));
    }

    #[tokio::test]
    async fn test_resume_not_suspended_leaves_checkpoint_unchanged() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::None));
        let engine = engine(&backend);
        engine.run(initial(), "t-done").await.unwrap();
        let before = checkpoint_bytes(&engine, "t-done").await;

        let err = engine.resume("t-done", "late reply").await.unwrap_err();
        assert!(matches!(err, EngineError::NotSuspended { .. }));
        assert_eq!(checkpoint_bytes(&engine, "t-done").await, before);
    }

    #[tokio::test]
    async fn test_resume_after_failed_step_is_not_suspended() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::Required));
        backend.push_error::<ScenarioDraft>(GenerationError::Transport("timeout".to_string()));
        let engine = engine(&backend);
        engine.run(initial(), "t-mid").await.unwrap_err();
        let before = checkpoint_bytes(&engine, "t-mid").await;

        let err = engine.resume("t-mid", "reply").await.unwrap_err();
        assert!(matches!(err, EngineError::NotSuspended { ref position, .. } if position == "after classify"));
        assert_eq!(checkpoint_bytes(&engine, "t-mid").await, before);
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_schema_mismatch_in_classify_writes_no_checkpoint() {
        let backend = ScriptedBackend::new();
        for _ in 0..2 {
            backend.push_json::<Classification>(serde_json::json!({ "summary": "missing fields" }));
        }
        let engine = engine(&backend);

        for _ in 0..2 {
            let err = engine.run(initial(), "t-bad").await.unwrap_err();
            assert!(matches!(
                err.generation(),
                Some(GenerationError::SchemaMismatch { raw_content, .. }) if raw_content.contains("missing fields")
            ));
            assert!(engine.checkpoint("t-bad").await.unwrap().is_none());
        }
        assert!(engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_schema_mismatch_mid_graph_keeps_previous_checkpoint() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::Required));
        backend.push_json::<ScenarioDraft>(serde_json::json!({ "role": 7 }));
        let engine = engine(&backend);

        let err = engine.run(initial(), "t-scn").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Step { step: StepId::GenerateScenario, .. }
        ));
        let after_failure = engine.checkpoint("t-scn").await.unwrap().unwrap();
        assert_eq!(after_failure.version, 1);
        assert_eq!(
            after_failure.position,
            Position::Completed {
                step: StepId::Classify
            }
        );
        assert!(after_failure.state.scenario.is_none());

        // Retry re-executes the failing step against the same stored state.
        backend.push_json::<ScenarioDraft>(serde_json::json!({ "role": 7 }));
        let again = engine.retry("t-scn").await.unwrap_err();
        assert!(matches!(again.generation(), Some(GenerationError::SchemaMismatch { .. })));
        assert_eq!(engine.checkpoint("t-scn").await.unwrap().unwrap(), after_failure);
    }

    #[tokio::test]
    async fn test_refusal_halts_run_and_keeps_checkpoint() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::Required));
        backend.push_raw::<ScenarioDraft>(RawGeneration::Refusal("policy".to_string()));
        let engine = engine(&backend);

        let err = engine.run(initial(), "t-refused").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Step { step: StepId::GenerateScenario, .. }
        ));
        assert!(matches!(
            err.generation(),
            Some(GenerationError::Refused { reason }) if reason == "policy"
        ));
        assert!(!err.generation().is_some_and(GenerationError::is_retryable));

        let cp = engine.checkpoint("t-refused").await.unwrap().unwrap();
        assert_eq!(cp.position.label(), "after classify");
        assert_eq!(cp.version, 1);
        assert!(cp.state.scenario.is_none());
        assert!(cp.state.dialogue_turns.is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_transport_error_continues_run() {
        let backend = ScriptedBackend::new();
        backend.push_json::<Classification>(classification_json(RoutingPolicy::Required));
        backend.push_error::<ScenarioDraft>(GenerationError::Transport("reset".to_string()));
        let engine = engine(&backend);
        let err = engine.run(initial(), "t-retry").await.unwrap_err();
        assert!(err.generation().is_some_and(GenerationError::is_retryable));

        backend.push_json::<ScenarioDraft>(scenario_json());
        backend.push_json::<CoachReply>(coach_json("Opening question?", false));
        let resumed = engine.retry("t-retry").await.unwrap();
        assert!(resumed.is_suspended());
        assert_eq!(backend.calls_for("Classification"), 1);
    }

    #[tokio::test]
    async fn test_retry_rejects_suspended_thread() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, false);
        let engine = engine(&backend);
        engine.run(initial(), "t-susp").await.unwrap();

        let err = engine.retry("t-susp").await.unwrap_err();
        assert!(matches!(err, EngineError::NotRetryable { .. }));
    }

    // -----------------------------------------------------------------------
    // Suspension discipline
    // -----------------------------------------------------------------------

    /// Step table whose scoring step illegally suspends.
    struct RogueSteps {
        inner: PracticeSteps,
    }

    impl PipelineSteps for RogueSteps {
        async fn execute(&self, step: StepId, state: &RunState) -> Result<StepOutcome, StepError> {
            if step == StepId::Score {
                return Ok(StepOutcome::Suspend(self.inner.begin_human_turn(state)?));
            }
            self.inner.execute(step, state).await
        }

        fn resume(&self, step: StepId, state: &RunState, reply: &str) -> Result<StateUpdate, StepError> {
            self.inner.resume(step, state, reply)
        }
    }

    #[tokio::test]
    async fn test_suspend_from_other_step_is_invalid() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, true);
        let engine = Engine::new(
            RogueSteps {
                inner: PracticeSteps::new(backend.adapter()),
            },
            InMemoryCheckpointStore::new(),
            EngineConfig::default(),
        );

        let err = engine.run(initial(), "t-rogue").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidSuspend { step: StepId::Score, .. }
        ));
        let cp = engine.checkpoint("t-rogue").await.unwrap().unwrap();
        assert_eq!(
            cp.position,
            Position::Completed {
                step: StepId::CoachTurn
            }
        );
    }

    // -----------------------------------------------------------------------
    // Checkpoint lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_checkpoint_versions_advance_per_step() {
        let backend = ScriptedBackend::new();
        script_until_first_suspend(&backend, false);
        let engine = engine(&backend);
        engine.run(initial(), "t-ver").await.unwrap();

        // classify, generate_scenario, coach_turn, then the suspension write.
        let cp = engine.checkpoint("t-ver").await.unwrap().unwrap();
        assert_eq!(cp.version, 4);
        assert!(cp.position.is_suspended());
        assert_eq!(cp.state.dialogue_turns.len(), 1);
    }
}
