//! Run state threaded through the pipeline for one thread.
//!
//! `RunState` is a fixed record with one optional field per step output.
//! Steps never mutate it directly: they return a [`StateUpdate`] and the
//! engine merges it with [`RunState::apply`]. `dialogue_turns` is the only
//! field merged by appending; every other field is last-write-wins.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::practice::{
    Classification, DialogueTurn, InputType, InsightCard, Scenario, Score, Speaker,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub input_id: Uuid,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<InputType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(default)]
    pub dialogue_turns: Vec<DialogueTurn>,
    #[serde(default)]
    pub round_count: u32,
    #[serde(default)]
    pub coach_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default)]
    pub insights: Vec<InsightCard>,

    #[serde(default)]
    pub force_practice: bool,
    /// Round cap in effect for this thread. Stamped by the engine when the
    /// run starts so a resumed thread keeps the cap it started with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u32>,
}

impl RunState {
    pub fn new(input_id: Uuid, raw_text: impl Into<String>, type_hint: Option<InputType>) -> Self {
        Self {
            input_id,
            raw_text: raw_text.into(),
            type_hint,
            classification: None,
            scenario: None,
            dialogue_turns: Vec::new(),
            round_count: 0,
            coach_ready: false,
            transcript: None,
            score: None,
            insights: Vec::new(),
            force_practice: false,
            max_rounds: None,
        }
    }

    /// Start a forced practice run that reuses an existing classification.
    pub fn forced(
        input_id: Uuid,
        raw_text: impl Into<String>,
        type_hint: Option<InputType>,
        classification: Classification,
    ) -> Self {
        Self {
            classification: Some(classification),
            force_practice: true,
            ..Self::new(input_id, raw_text, type_hint)
        }
    }

    /// Merge a step's partial update into the state.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(classification) = update.classification {
            self.classification = Some(classification);
        }
        if let Some(scenario) = update.scenario {
            self.scenario = Some(scenario);
        }
        self.dialogue_turns.extend(update.dialogue_turns);
        if let Some(round_count) = update.round_count {
            self.round_count = round_count;
        }
        if let Some(coach_ready) = update.coach_ready {
            self.coach_ready = coach_ready;
        }
        if let Some(transcript) = update.transcript {
            self.transcript = Some(transcript);
        }
        if let Some(score) = update.score {
            self.score = Some(score);
        }
        if let Some(insights) = update.insights {
            self.insights = insights;
        }
    }

    pub fn human_turn_count(&self) -> u32 {
        self.dialogue_turns
            .iter()
            .filter(|t| t.speaker == Speaker::Human)
            .count() as u32
    }

    pub fn latest_coach_message(&self) -> Option<&str> {
        self.dialogue_turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Coach)
            .map(|t| t.text.as_str())
    }
}

/// Partial update returned by a step.
///
/// `None` leaves the field untouched; `dialogue_turns` is appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub classification: Option<Classification>,
    pub scenario: Option<Scenario>,
    pub dialogue_turns: Vec<DialogueTurn>,
    pub round_count: Option<u32>,
    pub coach_ready: Option<bool>,
    pub transcript: Option<String>,
    pub score: Option<Score>,
    pub insights: Option<Vec<InsightCard>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RunState {
        RunState::new(Uuid::now_v7(), "notes", None)
    }

    #[test]
    fn test_apply_appends_dialogue_turns() {
        let mut s = state();
        s.apply(StateUpdate {
            dialogue_turns: vec![DialogueTurn::coach("first question")],
            ..Default::default()
        });
        s.apply(StateUpdate {
            dialogue_turns: vec![DialogueTurn::human("answer")],
            round_count: Some(1),
            ..Default::default()
        });

        assert_eq!(s.dialogue_turns.len(), 2);
        assert_eq!(s.dialogue_turns[0].speaker, Speaker::Coach);
        assert_eq!(s.dialogue_turns[1].speaker, Speaker::Human);
        assert_eq!(s.round_count, s.human_turn_count());
    }

    #[test]
    fn test_apply_last_write_wins_for_scalars() {
        let mut s = state();
        s.apply(StateUpdate {
            coach_ready: Some(true),
            transcript: Some("a".to_string()),
            ..Default::default()
        });
        s.apply(StateUpdate {
            coach_ready: Some(false),
            ..Default::default()
        });

        assert!(!s.coach_ready);
        assert_eq!(s.transcript.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut s = state();
        let before = s.clone();
        s.apply(StateUpdate::default());
        assert_eq!(s, before);
    }

    #[test]
    fn test_latest_coach_message() {
        let mut s = state();
        assert!(s.latest_coach_message().is_none());
        s.apply(StateUpdate {
            dialogue_turns: vec![
                DialogueTurn::coach("one"),
                DialogueTurn::human("reply"),
                DialogueTurn::coach("two"),
            ],
            ..Default::default()
        });
        assert_eq!(s.latest_coach_message(), Some("two"));
    }

    #[test]
    fn test_state_serde_roundtrip_preserves_turns() {
        let mut s = state();
        s.force_practice = true;
        s.max_rounds = Some(2);
        s.apply(StateUpdate {
            dialogue_turns: vec![DialogueTurn::coach("q")],
            ..Default::default()
        });
        let json = serde_json::to_string(&s).unwrap();
        let back: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
