//! Step functions: one per pipeline stage.
//!
//! Each step reads the fields it needs from the run state and returns a
//! partial [`StateUpdate`]. Only `human_turn` may ask the engine to suspend;
//! it is split into [`PracticeSteps::begin_human_turn`] (builds the payload
//! shown to the human) and [`PracticeSteps::complete_human_turn`] (folds the
//! reply back into the state on resume).

use praxis_types::checkpoint::{StepId, SuspendPayload};
use praxis_types::generation::{GenerationError, Message};
use praxis_types::practice::{
    Classification, CoachReply, DialogueTurn, InsightCard, InsightDrafts, Scenario,
    ScenarioDraft, Score, Speaker, flatten_transcript,
};
use praxis_types::run::{RunState, StateUpdate};
use thiserror::Error;
use uuid::Uuid;

use crate::generation::GenerationAdapter;
use crate::prompts;

/// Fallback round cap for states the engine has not stamped.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// What a step hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Update(StateUpdate),
    /// Halt the thread and show `payload` to the human.
    Suspend(SuspendPayload),
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("step requires `{0}` which has not been produced")]
    MissingState(&'static str),

    #[error("step '{0}' cannot receive a reply")]
    NotResumable(StepId),
}

/// The step table the engine drives.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait PipelineSteps: Send + Sync {
    /// Run `step` against the current state.
    fn execute(
        &self,
        step: StepId,
        state: &RunState,
    ) -> impl std::future::Future<Output = Result<StepOutcome, StepError>> + Send;

    /// Deliver `reply` to the suspended invocation of `step`.
    fn resume(&self, step: StepId, state: &RunState, reply: &str) -> Result<StateUpdate, StepError>;
}

// ---------------------------------------------------------------------------
// PracticeSteps
// ---------------------------------------------------------------------------

/// Steps of the practice pipeline, backed by a generation adapter.
#[derive(Clone)]
pub struct PracticeSteps {
    generation: GenerationAdapter,
}

impl PracticeSteps {
    pub fn new(generation: GenerationAdapter) -> Self {
        Self { generation }
    }

    /// Classify the input. A classification already present on the state
    /// (forced practice) is reused without a generation call.
    pub async fn classify(&self, state: &RunState) -> Result<StateUpdate, StepError> {
        if let Some(existing) = &state.classification {
            tracing::debug!(input_id = %state.input_id, "reusing seeded classification");
            return Ok(StateUpdate {
                classification: Some(existing.clone()),
                ..Default::default()
            });
        }

        let content = prompts::classify_input(&state.raw_text, state.type_hint);
        let classification: Classification = self
            .generation
            .generate(prompts::CLASSIFY_PROMPT, vec![Message::user(content)])
            .await?;

        tracing::debug!(
            input_id = %state.input_id,
            routing = %classification.routing_policy,
            "input classified"
        );

        Ok(StateUpdate {
            classification: Some(classification),
            ..Default::default()
        })
    }

    pub async fn generate_scenario(&self, state: &RunState) -> Result<StateUpdate, StepError> {
        let classification = state
            .classification
            .as_ref()
            .ok_or(StepError::MissingState("classification"))?;

        let content = prompts::scenario_input(classification, &state.raw_text);
        let draft: ScenarioDraft = self
            .generation
            .generate(prompts::SCENARIO_PROMPT, vec![Message::user(content)])
            .await?;

        let scenario = Scenario::from_draft(Uuid::now_v7(), draft);
        tracing::debug!(scenario_id = %scenario.id, scene_type = %scenario.scene_type, "scenario generated");

        Ok(StateUpdate {
            scenario: Some(scenario),
            ..Default::default()
        })
    }

    /// Ask for the next coach message given the full dialogue so far.
    pub async fn coach_turn(&self, state: &RunState) -> Result<StateUpdate, StepError> {
        let scenario = state
            .scenario
            .as_ref()
            .ok_or(StepError::MissingState("scenario"))?;

        let mut conversation = Vec::with_capacity(state.dialogue_turns.len() + 1);
        conversation.push(Message::user(prompts::COACH_KICKOFF));
        conversation.extend(state.dialogue_turns.iter().map(|turn| match turn.speaker {
            Speaker::Coach => Message::assistant(turn.text.clone()),
            Speaker::Human => Message::user(turn.text.clone()),
        }));

        let reply: CoachReply = self
            .generation
            .generate(&prompts::coach_system(scenario), conversation)
            .await?;

        Ok(StateUpdate {
            dialogue_turns: vec![DialogueTurn::coach(reply.message)],
            coach_ready: Some(reply.ready_for_evaluation),
            ..Default::default()
        })
    }

    /// Payload shown to the human while the thread waits for a reply.
    pub fn begin_human_turn(&self, state: &RunState) -> Result<SuspendPayload, StepError> {
        let scenario = state
            .scenario
            .as_ref()
            .ok_or(StepError::MissingState("scenario"))?;

        Ok(SuspendPayload {
            scenario_id: scenario.id,
            role: scenario.role.clone(),
            task: scenario.task.clone(),
            constraints: scenario.constraints.clone(),
            structure_hints: scenario.structure_hints.clone(),
            coach_message: state.latest_coach_message().map(str::to_string),
            round: state.round_count + 1,
            max_rounds: state.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
        })
    }

    /// Append the human's reply and count the round.
    pub fn complete_human_turn(&self, state: &RunState, reply: &str) -> StateUpdate {
        StateUpdate {
            dialogue_turns: vec![DialogueTurn::human(reply.trim_end())],
            round_count: Some(state.round_count + 1),
            ..Default::default()
        }
    }

    /// Flatten the dialogue into a transcript and score it.
    pub async fn score(&self, state: &RunState) -> Result<StateUpdate, StepError> {
        let scenario = state
            .scenario
            .as_ref()
            .ok_or(StepError::MissingState("scenario"))?;

        let transcript = flatten_transcript(&state.dialogue_turns);
        let content = prompts::score_input(scenario, &transcript, &state.raw_text);
        let score: Score = self
            .generation
            .generate(prompts::SCORE_PROMPT, vec![Message::user(content)])
            .await?;

        Ok(StateUpdate {
            transcript: Some(transcript),
            score: Some(score),
            ..Default::default()
        })
    }

    /// Turn the scored session into insight cards bound to the scenario.
    pub async fn extract_insights(&self, state: &RunState) -> Result<StateUpdate, StepError> {
        let scenario = state
            .scenario
            .as_ref()
            .ok_or(StepError::MissingState("scenario"))?;
        let score = state.score.as_ref().ok_or(StepError::MissingState("score"))?;
        let transcript = state
            .transcript
            .as_deref()
            .ok_or(StepError::MissingState("transcript"))?;

        let content =
            prompts::insight_input(state.classification.as_ref(), scenario, transcript, score);
        let drafts: InsightDrafts = self
            .generation
            .generate(prompts::INSIGHT_PROMPT, vec![Message::user(content)])
            .await?;

        let cards = drafts
            .cards
            .into_iter()
            .map(|draft| InsightCard::from_draft(scenario.id, draft))
            .collect::<Vec<_>>();

        Ok(StateUpdate {
            insights: Some(cards),
            ..Default::default()
        })
    }
}

impl PipelineSteps for PracticeSteps {
    async fn execute(&self, step: StepId, state: &RunState) -> Result<StepOutcome, StepError> {
        let update = match step {
            StepId::Classify => self.classify(state).await?,
            StepId::GenerateScenario => self.generate_scenario(state).await?,
            StepId::CoachTurn => self.coach_turn(state).await?,
            StepId::HumanTurn => return Ok(StepOutcome::Suspend(self.begin_human_turn(state)?)),
            StepId::Score => self.score(state).await?,
            StepId::ExtractInsights => self.extract_insights(state).await?,
        };
        Ok(StepOutcome::Update(update))
    }

    fn resume(&self, step: StepId, state: &RunState, reply: &str) -> Result<StateUpdate, StepError> {
        match step {
            StepId::HumanTurn => Ok(self.complete_human_turn(state, reply)),
            other => Err(StepError::NotResumable(other)),
        }
    }
}
