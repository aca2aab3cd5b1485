//! Pure routing over run state.
//!
//! Routes are never checkpointed: the engine re-derives them from the
//! persisted state, so every function here must depend on its arguments only.

use praxis_types::checkpoint::StepId;
use praxis_types::run::RunState;

/// First step of every fresh run.
pub const ENTRY: StepId = StepId::Classify;

/// Step to run after `completed`, or `None` when the run is finished.
pub fn next_step(completed: StepId, state: &RunState, max_rounds: u32) -> Option<StepId> {
    match completed {
        StepId::Classify => needs_practice(state).then_some(StepId::GenerateScenario),
        StepId::GenerateScenario => Some(StepId::CoachTurn),
        StepId::CoachTurn => {
            if state.coach_ready || state.round_count >= max_rounds {
                Some(StepId::Score)
            } else {
                Some(StepId::HumanTurn)
            }
        }
        StepId::HumanTurn => Some(StepId::CoachTurn),
        StepId::Score => Some(StepId::ExtractInsights),
        StepId::ExtractInsights => None,
    }
}

/// Forced runs enter practice regardless of the routing policy.
pub fn needs_practice(state: &RunState) -> bool {
    state.force_practice
        || state
            .classification
            .as_ref()
            .is_some_and(|c| c.routing_policy.needs_practice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::classification_json;
    use praxis_types::practice::{Classification, RoutingPolicy};
    use uuid::Uuid;

    fn classified(policy: RoutingPolicy) -> RunState {
        let mut state = RunState::new(Uuid::now_v7(), "text", None);
        let c: Classification = serde_json::from_value(classification_json(policy)).unwrap();
        state.classification = Some(c);
        state
    }

    #[test]
    fn test_classify_routes_on_policy() {
        assert_eq!(next_step(StepId::Classify, &classified(RoutingPolicy::None), 3), None);
        assert_eq!(
            next_step(StepId::Classify, &classified(RoutingPolicy::Recommend), 3),
            Some(StepId::GenerateScenario)
        );
        assert_eq!(
            next_step(StepId::Classify, &classified(RoutingPolicy::Required), 3),
            Some(StepId::GenerateScenario)
        );
    }

    #[test]
    fn test_forced_practice_overrides_none_policy() {
        let mut state = classified(RoutingPolicy::None);
        state.force_practice = true;
        assert_eq!(next_step(StepId::Classify, &state, 3), Some(StepId::GenerateScenario));
    }

    #[test]
    fn test_missing_classification_ends_run() {
        let state = RunState::new(Uuid::now_v7(), "text", None);
        assert_eq!(next_step(StepId::Classify, &state, 3), None);
    }

    #[test]
    fn test_coach_turn_routes_on_readiness_and_cap() {
        let mut state = classified(RoutingPolicy::Required);
        assert_eq!(next_step(StepId::CoachTurn, &state, 3), Some(StepId::HumanTurn));

        state.round_count = 3;
        assert_eq!(next_step(StepId::CoachTurn, &state, 3), Some(StepId::Score));

        state.round_count = 1;
        state.coach_ready = true;
        assert_eq!(next_step(StepId::CoachTurn, &state, 3), Some(StepId::Score));
    }

    #[test]
    fn test_fixed_edges() {
        let state = classified(RoutingPolicy::Required);
        assert_eq!(next_step(StepId::GenerateScenario, &state, 3), Some(StepId::CoachTurn));
        assert_eq!(next_step(StepId::HumanTurn, &state, 3), Some(StepId::CoachTurn));
        assert_eq!(next_step(StepId::Score, &state, 3), Some(StepId::ExtractInsights));
        assert_eq!(next_step(StepId::ExtractInsights, &state, 3), None);
    }
}
