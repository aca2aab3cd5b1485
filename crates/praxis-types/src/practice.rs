//! Typed payloads produced by the pipeline steps.
//!
//! Every type the generation service produces derives `JsonSchema` so the
//! adapter can describe the target shape to the backend, and implements
//! [`Validate`] for the numeric ranges a JSON Schema alone does not enforce.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post-parse range check for generated values.
///
/// A violation is reported as a human-readable reason; the generation
/// adapter turns it into a schema mismatch.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn check_range(field: &str, value: u8, min: u8, max: u8) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{field} must be in {min}..={max}, got {value}"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Kind of learning input submitted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Report,
    Interview,
    Reflection,
    Idea,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Report => write!(f, "report"),
            InputType::Interview => write!(f, "interview"),
            InputType::Reflection => write!(f, "reflection"),
            InputType::Idea => write!(f, "idea"),
        }
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(InputType::Report),
            "interview" => Ok(InputType::Interview),
            "reflection" => Ok(InputType::Reflection),
            "idea" => Ok(InputType::Idea),
            other => Err(format!("invalid input type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Normal,
    Private,
}

/// Whether the classified input should enter the practice phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    None,
    Recommend,
    Required,
}

impl RoutingPolicy {
    pub fn needs_practice(&self) -> bool {
        !matches!(self, RoutingPolicy::None)
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingPolicy::None => write!(f, "none"),
            RoutingPolicy::Recommend => write!(f, "recommend"),
            RoutingPolicy::Required => write!(f, "required"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    Explain,
    Critique,
    Design,
    Decision,
    InterviewFollowup,
    Postmortem,
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SceneType::Explain => "explain",
            SceneType::Critique => "critique",
            SceneType::Design => "design",
            SceneType::Decision => "decision",
            SceneType::InterviewFollowup => "interview_followup",
            SceneType::Postmortem => "postmortem",
        };
        f.write_str(s)
    }
}

/// Category of cognitive gap an insight card targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    StructuringGap,
    FailureModeGap,
    TradeoffGap,
    MetricGap,
    ExampleGap,
    AssumptionGap,
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InsightType::StructuringGap => "structuring_gap",
            InsightType::FailureModeGap => "failure_mode_gap",
            InsightType::TradeoffGap => "tradeoff_gap",
            InsightType::MetricGap => "metric_gap",
            InsightType::ExampleGap => "example_gap",
            InsightType::AssumptionGap => "assumption_gap",
        };
        f.write_str(s)
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structuring_gap" => Ok(InsightType::StructuringGap),
            "failure_mode_gap" => Ok(InsightType::FailureModeGap),
            "tradeoff_gap" => Ok(InsightType::TradeoffGap),
            "metric_gap" => Ok(InsightType::MetricGap),
            "example_gap" => Ok(InsightType::ExampleGap),
            "assumption_gap" => Ok(InsightType::AssumptionGap),
            other => Err(format!("invalid insight type: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Tags {
    pub topics: Vec<String>,
    pub domains: Vec<String>,
    /// Conceptual complexity, 1..=5.
    pub difficulty: u8,
    pub sensitivity: Sensitivity,
}

/// How strongly the input exercises each capability, 0..=10 per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CapabilityMap {
    pub concept_understanding: u8,
    pub structuring: u8,
    pub tradeoff_thinking: u8,
    pub system_thinking: u8,
    pub communication: u8,
}

impl CapabilityMap {
    pub fn dimensions(&self) -> [(&'static str, u8); 5] {
        [
            ("concept_understanding", self.concept_understanding),
            ("structuring", self.structuring),
            ("tradeoff_thinking", self.tradeoff_thinking),
            ("system_thinking", self.system_thinking),
            ("communication", self.communication),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PracticeSeed {
    pub preferred_scene: SceneType,
    pub skills: Vec<String>,
    pub concepts: Vec<String>,
    pub constraints: Vec<String>,
}

/// Output of the classify step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub input_type: InputType,
    pub summary: String,
    pub tags: Tags,
    pub capability_map: CapabilityMap,
    pub routing_policy: RoutingPolicy,
    pub practice_seed: PracticeSeed,
}

impl Validate for Classification {
    fn validate(&self) -> Result<(), String> {
        check_range("tags.difficulty", self.tags.difficulty, 1, 5)?;
        for (name, value) in self.capability_map.dimensions() {
            check_range(&format!("capability_map.{name}"), value, 0, 10)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// The four fixed scoring dimensions every scenario is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    Clarity,
    ReasoningDepth,
    DecisionQuality,
    Communication,
}

impl RubricDimension {
    pub const ALL: [RubricDimension; 4] = [
        RubricDimension::Clarity,
        RubricDimension::ReasoningDepth,
        RubricDimension::DecisionQuality,
        RubricDimension::Communication,
    ];
}

impl fmt::Display for RubricDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RubricDimension::Clarity => "clarity",
            RubricDimension::ReasoningDepth => "reasoning_depth",
            RubricDimension::DecisionQuality => "decision_quality",
            RubricDimension::Communication => "communication",
        };
        f.write_str(s)
    }
}

/// Scenario as produced by the generation service, before the scenario step
/// assigns an identifier and the fixed rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioDraft {
    pub scene_type: SceneType,
    pub role: String,
    pub task: String,
    pub constraints: Vec<String>,
    pub structure_hints: Vec<String>,
}

impl Validate for ScenarioDraft {
    fn validate(&self) -> Result<(), String> {
        if self.role.trim().is_empty() {
            return Err("role must not be empty".to_string());
        }
        if self.task.trim().is_empty() {
            return Err("task must not be empty".to_string());
        }
        Ok(())
    }
}

/// A practice scenario the user is coached through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub scene_type: SceneType,
    pub role: String,
    pub task: String,
    pub constraints: Vec<String>,
    pub rubric: Vec<RubricDimension>,
    pub structure_hints: Vec<String>,
}

impl Scenario {
    pub fn from_draft(id: Uuid, draft: ScenarioDraft) -> Self {
        Self {
            id,
            scene_type: draft.scene_type,
            role: draft.role,
            task: draft.task,
            constraints: draft.constraints,
            rubric: RubricDimension::ALL.to_vec(),
            structure_hints: draft.structure_hints,
        }
    }
}

// ---------------------------------------------------------------------------
// Dialogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Coach,
    Human,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Coach => write!(f, "coach"),
            Speaker::Human => write!(f, "human"),
        }
    }
}

/// One message in the coaching dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl DialogueTurn {
    pub fn coach(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Coach,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
        }
    }
}

/// Flatten dialogue turns into a single transcript, one `speaker: text`
/// block per turn.
pub fn flatten_transcript(turns: &[DialogueTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.speaker, t.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The coach's next message plus its readiness signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoachReply {
    pub message: String,
    pub ready_for_evaluation: bool,
}

impl Validate for CoachReply {
    fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Rubric result, 0..=10 per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceSignal {
    pub clarity: u8,
    pub reasoning_depth: u8,
    pub decision_quality: u8,
    pub communication: u8,
}

impl PerformanceSignal {
    pub fn dimensions(&self) -> [(RubricDimension, u8); 4] {
        [
            (RubricDimension::Clarity, self.clarity),
            (RubricDimension::ReasoningDepth, self.reasoning_depth),
            (RubricDimension::DecisionQuality, self.decision_quality),
            (RubricDimension::Communication, self.communication),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Score {
    pub signal: PerformanceSignal,
    pub improvement_vectors: Vec<String>,
}

impl Validate for Score {
    fn validate(&self) -> Result<(), String> {
        for (dim, value) in self.signal.dimensions() {
            check_range(&format!("signal.{dim}"), value, 0, 10)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

/// Insight card as produced by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightDraft {
    pub title: String,
    pub insight_type: InsightType,
    pub what_happened: String,
    pub why_it_matters: String,
    pub upgrade_pattern: String,
    pub micro_practice: String,
    pub concepts: Vec<String>,
    pub skills: Vec<String>,
    /// How fundamental the gap is, 1..=5.
    pub intensity: u8,
}

/// Wrapper so the generated top-level value is an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightDrafts {
    pub cards: Vec<InsightDraft>,
}

impl Validate for InsightDrafts {
    fn validate(&self) -> Result<(), String> {
        for (i, card) in self.cards.iter().enumerate() {
            check_range(&format!("cards[{i}].intensity"), card.intensity, 1, 5)?;
        }
        Ok(())
    }
}

/// A transferable insight, bound to the scenario that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCard {
    pub scenario_id: Uuid,
    pub title: String,
    pub insight_type: InsightType,
    pub what_happened: String,
    pub why_it_matters: String,
    pub upgrade_pattern: String,
    pub micro_practice: String,
    pub concepts: Vec<String>,
    pub skills: Vec<String>,
    pub intensity: u8,
}

impl InsightCard {
    pub fn from_draft(scenario_id: Uuid, draft: InsightDraft) -> Self {
        Self {
            scenario_id,
            title: draft.title,
            insight_type: draft.insight_type,
            what_happened: draft.what_happened,
            why_it_matters: draft.why_it_matters,
            upgrade_pattern: draft.upgrade_pattern,
            micro_practice: draft.micro_practice,
            concepts: draft.concepts,
            skills: draft.skills,
            intensity: draft.intensity,
        }
    }
}
