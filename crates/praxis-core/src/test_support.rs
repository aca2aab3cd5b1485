//! Scripted generation backend and fixtures shared by the crate's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use praxis_types::error::RepositoryError;
use praxis_types::generation::{GenerationError, RawGeneration};
use praxis_types::practice::{Classification, InputType, InsightCard, RoutingPolicy, Scenario};
use praxis_types::record::{
    InputRecord, InsightFilter, ResponseRecord, StoredInsight, StoredScenario, ThreadRecord,
};
use schemars::JsonSchema;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::generation::{BoxGenerationBackend, GenerationAdapter, GenerationBackend, GenerationRequest};
use crate::repository::record::RecordRepository;
use crate::service::hash::ContentHasher;

type Scripted = Result<RawGeneration, GenerationError>;

/// Backend that replays canned results, queued per target schema name.
///
/// An exhausted queue yields a transport error naming the schema.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    queues: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adapter(&self) -> GenerationAdapter {
        GenerationAdapter::new(BoxGenerationBackend::new(self.clone()))
    }

    fn push<T: JsonSchema>(&self, result: Scripted) {
        self.queues
            .lock()
            .unwrap()
            .entry(T::schema_name().into_owned())
            .or_default()
            .push_back(result);
    }

    pub fn push_json<T: JsonSchema>(&self, value: Value) {
        self.push::<T>(Ok(RawGeneration::Content(value.to_string())));
    }

    pub fn push_raw<T: JsonSchema>(&self, raw: RawGeneration) {
        self.push::<T>(Ok(raw));
    }

    pub fn push_error<T: JsonSchema>(&self, err: GenerationError) {
        self.push::<T>(Err(err));
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_for(&self, schema_name: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.schema.name == schema_name)
            .count()
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_raw(&self, request: &GenerationRequest) -> Scripted {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .queues
            .lock()
            .unwrap()
            .get_mut(&request.schema.name)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| {
            Err(GenerationError::Transport(format!(
                "no scripted response for {}",
                request.schema.name
            )))
        })
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Records {
    inputs: Vec<InputRecord>,
    classifications: HashMap<Uuid, Classification>,
    scenarios: Vec<StoredScenario>,
    responses: Vec<ResponseRecord>,
    insights: Vec<StoredInsight>,
    threads: HashMap<String, ThreadRecord>,
}

/// Vec-backed `RecordRepository` for service tests.
#[derive(Default)]
pub struct InMemoryRecordRepository {
    inner: Mutex<Records>,
}

impl InMemoryRecordRepository {
    /// Newest thread started for an input. Thread ids are v7 UUIDs, so they
    /// sort by creation time.
    pub fn latest_thread_for(&self, input_id: &Uuid) -> Option<ThreadRecord> {
        self.inner
            .lock()
            .unwrap()
            .threads
            .values()
            .filter(|t| t.input_id == *input_id)
            .max_by(|a, b| a.thread_id.cmp(&b.thread_id))
            .cloned()
    }
}

impl RecordRepository for InMemoryRecordRepository {
    async fn create_input(&self, input: &InputRecord) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.inputs.iter().any(|i| i.content_hash == input.content_hash) {
            return Err(RepositoryError::Conflict(input.content_hash.clone()));
        }
        inner.inputs.push(input.clone());
        Ok(())
    }

    async fn get_input(&self, id: &Uuid) -> Result<Option<InputRecord>, RepositoryError> {
        Ok(self.inner.lock().unwrap().inputs.iter().find(|i| i.id == *id).cloned())
    }

    async fn find_input_by_hash(&self, content_hash: &str) -> Result<Option<InputRecord>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .inputs
            .iter()
            .find(|i| i.content_hash == content_hash)
            .cloned())
    }

    async fn list_inputs(
        &self,
        input_type: Option<InputType>,
        limit: u32,
    ) -> Result<Vec<InputRecord>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .inputs
            .iter()
            .rev()
            .filter(|i| input_type.is_none() || i.input_type == input_type)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn save_classification(
        &self,
        input_id: &Uuid,
        classification: &Classification,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.classifications.insert(*input_id, classification.clone());
        if let Some(input) = inner.inputs.iter_mut().find(|i| i.id == *input_id) {
            input.input_type = Some(classification.input_type);
        }
        Ok(())
    }

    async fn get_classification(&self, input_id: &Uuid) -> Result<Option<Classification>, RepositoryError> {
        Ok(self.inner.lock().unwrap().classifications.get(input_id).cloned())
    }

    async fn save_scenario(&self, input_id: &Uuid, scenario: &Scenario) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.scenarios.iter().any(|s| s.scenario.id == scenario.id) {
            inner.scenarios.push(StoredScenario {
                input_id: *input_id,
                scenario: scenario.clone(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn get_scenario(&self, scenario_id: &Uuid) -> Result<Option<StoredScenario>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .scenarios
            .iter()
            .find(|s| s.scenario.id == *scenario_id)
            .cloned())
    }

    async fn list_scenarios(&self, input_id: &Uuid) -> Result<Vec<Scenario>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .scenarios
            .iter()
            .filter(|s| s.input_id == *input_id)
            .map(|s| s.scenario.clone())
            .collect())
    }

    async fn save_response(&self, response: &ResponseRecord) -> Result<(), RepositoryError> {
        self.inner.lock().unwrap().responses.push(response.clone());
        Ok(())
    }

    async fn get_response_by_scenario(&self, scenario_id: &Uuid) -> Result<Option<ResponseRecord>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .responses
            .iter()
            .rev()
            .find(|r| r.scenario_id == *scenario_id)
            .cloned())
    }

    async fn save_insights(
        &self,
        input_id: &Uuid,
        response_id: Option<Uuid>,
        cards: &[InsightCard],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        for card in cards {
            inner.insights.push(StoredInsight {
                id: Uuid::now_v7(),
                input_id: *input_id,
                response_id,
                card: card.clone(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn list_insights(&self, filter: &InsightFilter) -> Result<Vec<StoredInsight>, RepositoryError> {
        let mut matching: Vec<StoredInsight> = self
            .inner
            .lock()
            .unwrap()
            .insights
            .iter()
            .filter(|i| filter.input_id.is_none_or(|id| i.input_id == id))
            .filter(|i| filter.insight_type.is_none_or(|t| i.card.insight_type == t))
            .filter(|i| filter.min_intensity.is_none_or(|n| i.card.intensity >= n))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.card.intensity.cmp(&a.card.intensity));
        Ok(matching)
    }

    async fn upsert_thread(&self, thread: &ThreadRecord) -> Result<(), RepositoryError> {
        self.inner
            .lock()
            .unwrap()
            .threads
            .insert(thread.thread_id.clone(), thread.clone());
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>, RepositoryError> {
        Ok(self.inner.lock().unwrap().threads.get(thread_id).cloned())
    }

    async fn find_thread_by_scenario(&self, scenario_id: &Uuid) -> Result<Option<ThreadRecord>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .threads
            .values()
            .find(|t| t.scenario_id == Some(*scenario_id))
            .cloned())
    }
}

/// Hasher that returns its input, keeping duplicate detection readable in tests.
pub struct PlainHasher;

impl ContentHasher for PlainHasher {
    fn compute_hash(&self, content: &str) -> String {
        content.to_string()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn classification_json(policy: RoutingPolicy) -> Value {
    json!({
        "input_type": "interview",
        "summary": "Notes from a system design interview about caching.",
        "tags": {
            "topics": ["caching"],
            "domains": ["Backend"],
            "difficulty": 3,
            "sensitivity": "normal"
        },
        "capability_map": {
            "concept_understanding": 6,
            "structuring": 4,
            "tradeoff_thinking": 5,
            "system_thinking": 7,
            "communication": 5
        },
        "routing_policy": policy.to_string(),
        "practice_seed": {
            "preferred_scene": "interview_followup",
            "skills": ["failure-mode framing"],
            "concepts": ["cache invalidation"],
            "constraints": ["include 1 failure mode"]
        }
    })
}

pub fn scenario_json() -> Value {
    json!({
        "scene_type": "interview_followup",
        "role": "Senior interviewer",
        "task": "Explain how you would invalidate a read-through cache.",
        "constraints": ["include 1 failure mode", "3 minutes"],
        "structure_hints": ["context", "approach", "failure modes"]
    })
}

pub fn coach_json(message: &str, ready: bool) -> Value {
    json!({ "message": message, "ready_for_evaluation": ready })
}

pub fn score_json() -> Value {
    json!({
        "signal": {
            "clarity": 7,
            "reasoning_depth": 5,
            "decision_quality": 6,
            "communication": 7
        },
        "improvement_vectors": ["Discuss stampede protection when entries expire."]
    })
}

pub fn insights_json() -> Value {
    json!({
        "cards": [{
            "title": "Name the failure path",
            "insight_type": "failure_mode_gap",
            "what_happened": "The answer covered TTLs but not stampedes.",
            "why_it_matters": "Reviewers read missing failure modes as shallow analysis.",
            "upgrade_pattern": "normal path -> failure modes -> mitigation -> monitoring",
            "micro_practice": "List 3 failure modes of any API you used today in 60 seconds.",
            "concepts": ["cache stampede"],
            "skills": ["failure-mode framing"],
            "intensity": 4
        }]
    })
}
