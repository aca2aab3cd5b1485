//! Application services orchestrating the engine and the record store.

pub mod export;
pub mod hash;
pub mod practice;

pub use export::ExportFormat;
pub use practice::{
    InputOverview, PracticeReport, PracticeService, ScenarioOverview, ServiceError, SubmitRequest,
};
