use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::patient::Priority;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientInput {
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    pub priority: Option<Priority>,
}

fn default_severity() -> String {
    "Unknown".to_string()
}

/// Partial update. Which fields a caller may actually set depends on their
/// role; out-of-scope fields are rejected at validation time, never silently
/// dropped.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePatientInput {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub telephone: Option<String>,
    pub emergency_contact: Option<String>,
    pub symptoms: Option<String>,
    pub severity: Option<String>,
    pub priority: Option<Priority>,
    /// Assignment-derived field. Writable by super_admin only (emergency
    /// override, routed through the reassignment engine); everyone else gets
    /// an explicit 403.
    pub assigned_staff: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignInput {
    pub staff_id: Uuid,
}
