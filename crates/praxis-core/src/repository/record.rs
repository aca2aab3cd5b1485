//! Record repository trait definition.
//!
//! Stores everything outside the engine's checkpoints: submitted inputs
//! (deduplicated by content hash), per-stage outputs keyed by input or
//! scenario id, and thread bookkeeping rows linking threads to scenarios.

use praxis_types::error::RepositoryError;
use praxis_types::practice::{Classification, InputType, InsightCard, Scenario};
use praxis_types::record::{
    InputRecord, InsightFilter, ResponseRecord, StoredInsight, StoredScenario, ThreadRecord,
};
use uuid::Uuid;

/// Repository trait for pipeline records.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RecordRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Insert a new input. A duplicate content hash fails with `Conflict`.
    fn create_input(
        &self,
        input: &InputRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_input(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<InputRecord>, RepositoryError>> + Send;

    fn find_input_by_hash(
        &self,
        content_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<InputRecord>, RepositoryError>> + Send;

    /// Most recent inputs first.
    fn list_inputs(
        &self,
        input_type: Option<InputType>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<InputRecord>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Stage outputs
    // -----------------------------------------------------------------------

    /// Upsert the classification of an input and record its input type.
    fn save_classification(
        &self,
        input_id: &Uuid,
        classification: &Classification,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_classification(
        &self,
        input_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Classification>, RepositoryError>> + Send;

    /// Insert a scenario. Saving the same scenario id again is a no-op.
    fn save_scenario(
        &self,
        input_id: &Uuid,
        scenario: &Scenario,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_scenario(
        &self,
        scenario_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<StoredScenario>, RepositoryError>> + Send;

    /// Scenarios generated for an input, oldest first.
    fn list_scenarios(
        &self,
        input_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Scenario>, RepositoryError>> + Send;

    fn save_response(
        &self,
        response: &ResponseRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_response_by_scenario(
        &self,
        scenario_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ResponseRecord>, RepositoryError>> + Send;

    fn save_insights(
        &self,
        input_id: &Uuid,
        response_id: Option<Uuid>,
        cards: &[InsightCard],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insights matching `filter`, most intense first.
    fn list_insights(
        &self,
        filter: &InsightFilter,
    ) -> impl std::future::Future<Output = Result<Vec<StoredInsight>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Threads
    // -----------------------------------------------------------------------

    /// Insert or replace the bookkeeping row for a thread.
    fn upsert_thread(
        &self,
        thread: &ThreadRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_thread(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ThreadRecord>, RepositoryError>> + Send;

    fn find_thread_by_scenario(
        &self,
        scenario_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ThreadRecord>, RepositoryError>> + Send;
}
