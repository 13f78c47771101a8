use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn is_urgent(self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub telephone: String,
    pub emergency_contact: String,
    pub symptoms: String,
    pub severity: String,
    pub priority: Priority,
    /// Advisory text from the triage oracle (or its rule-based fallback);
    /// filled in after creation by the enrichment task.
    pub ai_suggestion: Option<String>,
    /// Never changes after admission; the tenant boundary hangs off it.
    pub hospital_id: Uuid,
    pub created_by: Option<Uuid>,
    pub admitted_at: DateTime<Utc>,
}
