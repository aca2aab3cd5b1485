//! Checkpoint model: run state plus the engine's position in the step graph.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::run::RunState;

/// A node of the fixed practice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Classify,
    GenerateScenario,
    CoachTurn,
    HumanTurn,
    Score,
    ExtractInsights,
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepId::Classify => "classify",
            StepId::GenerateScenario => "generate_scenario",
            StepId::CoachTurn => "coach_turn",
            StepId::HumanTurn => "human_turn",
            StepId::Score => "score",
            StepId::ExtractInsights => "extract_insights",
        };
        f.write_str(s)
    }
}

/// What the human is shown while a thread waits at the suspension point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspendPayload {
    pub scenario_id: Uuid,
    pub role: String,
    pub task: String,
    pub constraints: Vec<String>,
    pub structure_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_message: Option<String>,
    /// 1-based number of the round the reply will complete.
    pub round: u32,
    pub max_rounds: u32,
}

/// Where a thread stands in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Position {
    /// `step` ran and its update is merged. The next step is derived by
    /// routing over the stored state. A thread stays here when the step
    /// after it failed.
    Completed { step: StepId },
    /// Waiting at `step` for an external reply.
    Suspended { step: StepId, payload: SuspendPayload },
    Done,
}

impl Position {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Position::Suspended { .. })
    }

    pub fn label(&self) -> String {
        match self {
            Position::Completed { step } => format!("after {step}"),
            Position::Suspended { step, .. } => format!("suspended at {step}"),
            Position::Done => "done".to_string(),
        }
    }
}

/// Durable snapshot of one thread.
///
/// `version` starts at 1 on the first save and increases by one on every
/// overwrite; stores use it for compare-and-swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub state: RunState,
    pub position: Position,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serializes_with_kind_tag() {
        let pos = Position::Completed {
            step: StepId::GenerateScenario,
        };
        let json = serde_json::to_value(&pos).unwrap();
        assert_eq!(json["kind"], "completed");
        assert_eq!(json["step"], "generate_scenario");
    }

    #[test]
    fn test_position_label() {
        assert_eq!(Position::Done.label(), "done");
        assert_eq!(
            Position::Completed {
                step: StepId::Score
            }
            .label(),
            "after score"
        );
    }

    #[test]
    fn test_suspended_position_roundtrip() {
        let pos = Position::Suspended {
            step: StepId::HumanTurn,
            payload: SuspendPayload {
                scenario_id: Uuid::now_v7(),
                role: "interviewer".to_string(),
                task: "explain caching".to_string(),
                constraints: vec!["one failure mode".to_string()],
                structure_hints: vec![],
                coach_message: Some("Walk me through it.".to_string()),
                round: 1,
                max_rounds: 3,
            },
        };
        let json = serde_json::to_string(&pos).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert!(back.is_suspended());
        assert_eq!(back, pos);
    }
}
