//! The practice pipeline: step functions, routing and the resumable engine.
//!
//! ```text
//! classify -> [needs practice?] -> generate_scenario -> coach_turn
//! coach_turn -> [ready or round cap reached?] -> score : human_turn
//! human_turn -> coach_turn
//! score -> extract_insights -> end
//! ```

pub mod engine;
pub mod routing;
pub mod steps;

pub use engine::{Engine, EngineError, Outcome, RunOutcome};
pub use steps::{PipelineSteps, PracticeSteps, StepError, StepOutcome};
