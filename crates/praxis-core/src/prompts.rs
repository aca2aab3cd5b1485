//! System prompts and user-content builders for the generating steps.

use praxis_types::practice::{Classification, InputType, PerformanceSignal, Scenario, Score};

pub const CLASSIFY_PROMPT: &str = "\
You analyse learning material and decide whether it deserves deliberate practice.

## Input type
Classify the input as one of: report, interview, reflection, idea. Respect the user's type hint when it is plausible.

## Summary
Summarise the core knowledge or experience in one to three sentences.

## Tags
List topics (e.g. \"RAG\", \"system design\") and domains (e.g. \"Backend\"). Rate difficulty from 1 to 5.
Mark sensitivity \"private\" when the text contains personal or confidential details, otherwise \"normal\".

## Capability map
Score each dimension from 0 (not engaged at all) to 10 (exercised in depth): concept_understanding,
structuring, tradeoff_thinking, system_thinking, communication. Do not inflate scores.

## Routing policy
- interview or reflection: \"required\"
- report with a framework, method or analysis: \"recommend\"; a purely informational summary: \"none\"
- idea with a testable hypothesis or design proposal: \"recommend\"; a loose brainstorm: \"none\"

## Practice seed
Pick the most valuable scene type (explain, critique, design, decision, interview_followup, postmortem),
one to three target skills, the key concepts, and practical constraints for the exercise.";

pub const SCENARIO_PROMPT: &str = "\
You design short practice scenarios that test whether someone can apply what they learned.

- Give the user a realistic role and situation (candidate, reviewer, PM, tech lead), not a quiz.
- State one task that can be answered well in two to five minutes and requires applying the material.
- Add two to four concrete constraints that push for depth (e.g. \"include at least one failure mode\").
- Offer three to five structure hints for a strong answer. They are suggestions, not requirements.
- scene_type must match the preferred scene from the practice seed.";

pub const COACH_PROMPT: &str = "\
You are a practice coach running a short multi-turn conversation in character.

- Play the role described by the scenario for the whole conversation.
- First turn (no user replies yet): set the scene in a sentence or two and ask one focused question. Do not paste the whole task.
- Later turns: read the latest reply. Push for depth when it is shallow, acknowledge briefly and probe a new angle when it is strong.
- Keep each message to one to three sentences plus one question.
- Set ready_for_evaluation to true once the user has had enough turns to show their understanding, has covered the key aspects, or further questions would add no signal.
- Never reveal scoring criteria, never give the answer, never grade the user.";

pub const SCORE_PROMPT: &str = "\
You are a senior evaluator scoring a practice conversation against a fixed rubric.

Score clarity, reasoning_depth, decision_quality and communication from 0 to 10, where 5 is adequate,
7 is good and 9 is excellent. Base every score on evidence from the user's replies.
Lower the relevant dimension when the user ignored a scenario constraint.

Give two to four improvement_vectors. Each must name a specific gap in the replies and why it matters.
Avoid generic advice such as \"be more detailed\".";

pub const INSIGHT_PROMPT: &str = "\
You extract transferable learning insights from a scored practice session.

- Produce one or two cards, each targeting a different gap.
- insight_type is one of: structuring_gap, failure_mode_gap, tradeoff_gap, metric_gap, example_gap, assumption_gap. Pick the root cause, not the symptom.
- what_happened cites concrete evidence from the user's replies.
- why_it_matters explains the real-world consequence of the gap.
- upgrade_pattern is a reusable template for future situations.
- micro_practice is an exercise that takes 30 to 90 seconds.
- intensity runs from 1 (minor polish) to 5 (core reasoning gap). Tag related concepts and skills.";

/// Kick-off message for the coach's first turn, before any human reply.
pub const COACH_KICKOFF: &str = "Start the practice session.";

pub fn classify_input(raw_text: &str, type_hint: Option<InputType>) -> String {
    match type_hint {
        Some(hint) => format!("[User type hint: {hint}]\n\n{raw_text}"),
        None => raw_text.to_string(),
    }
}

pub fn scenario_input(classification: &Classification, raw_text: &str) -> String {
    let seed = &classification.practice_seed;
    format!(
        "Summary: {}\n\nRaw content:\n{}\n\nPreferred scene type: {}\nSkills: {}\nConcepts: {}\nConstraints: {}",
        classification.summary,
        raw_text,
        seed.preferred_scene,
        seed.skills.join(", "),
        seed.concepts.join(", "),
        seed.constraints.join(", "),
    )
}

/// Coach system prompt with the scenario appended, so the role stays in view
/// across turns.
pub fn coach_system(scenario: &Scenario) -> String {
    format!(
        "{COACH_PROMPT}\n\n## Scenario\nRole: {}\nTask: {}\nConstraints:\n{}",
        scenario.role,
        scenario.task,
        bullet_list(&scenario.constraints),
    )
}

pub fn score_input(scenario: &Scenario, transcript: &str, raw_text: &str) -> String {
    let rubric = scenario
        .rubric
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Scenario task: {}\nConstraints:\n{}\nRubric: {}\n\nConversation:\n{}\n\nReference material:\n{}",
        scenario.task,
        bullet_list(&scenario.constraints),
        rubric,
        transcript,
        raw_text,
    )
}

pub fn insight_input(
    classification: Option<&Classification>,
    scenario: &Scenario,
    transcript: &str,
    score: &Score,
) -> String {
    let summary = classification.map(|c| c.summary.as_str()).unwrap_or("(none)");
    format!(
        "Input summary: {}\n\nScenario: {} - {}\nConversation:\n{}\n\nEvaluation: {}\nImprovement vectors:\n{}",
        summary,
        scenario.role,
        scenario.task,
        transcript,
        signal_line(&score.signal),
        bullet_list(&score.improvement_vectors),
    )
}

fn signal_line(signal: &PerformanceSignal) -> String {
    signal
        .dimensions()
        .iter()
        .map(|(dim, v)| format!("{dim}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
