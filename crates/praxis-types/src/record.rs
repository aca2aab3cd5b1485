//! Persisted record shapes for inputs, threads, responses and insights.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::practice::{InputType, InsightCard, InsightType, Scenario, Score};

/// A submitted learning input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    pub id: Uuid,
    pub file_path: Option<String>,
    /// Hex SHA-256 of the raw text, used for duplicate detection.
    pub content_hash: String,
    pub raw_text: String,
    pub type_hint: Option<InputType>,
    /// Type assigned by classification, once available.
    pub input_type: Option<InputType>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Running,
    Suspended,
    Completed,
    Failed,
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadStatus::Running => write!(f, "running"),
            ThreadStatus::Suspended => write!(f, "suspended"),
            ThreadStatus::Completed => write!(f, "completed"),
            ThreadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(ThreadStatus::Running),
            "suspended" => Ok(ThreadStatus::Suspended),
            "completed" => Ok(ThreadStatus::Completed),
            "failed" => Ok(ThreadStatus::Failed),
            other => Err(format!("invalid thread status: '{other}'")),
        }
    }
}

/// Bookkeeping row linking a thread to its input and scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: String,
    pub input_id: Uuid,
    pub scenario_id: Option<Uuid>,
    pub status: ThreadStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredScenario {
    pub input_id: Uuid,
    pub scenario: Scenario,
    pub created_at: DateTime<Utc>,
}

/// The scored dialogue for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub transcript: String,
    pub score: Option<Score>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInsight {
    pub id: Uuid,
    pub input_id: Uuid,
    pub response_id: Option<Uuid>,
    pub card: InsightCard,
    pub created_at: DateTime<Utc>,
}

/// Filter for insight queries. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct InsightFilter {
    pub input_id: Option<Uuid>,
    pub insight_type: Option<InsightType>,
    pub min_intensity: Option<u8>,
}
