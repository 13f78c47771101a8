use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Binding of one patient to one staff member and one bed. At most one
/// active assignment exists per patient; changing it is release-then-create,
/// never an in-place update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub resource_id: Uuid,
    pub staff_id: Uuid,
    pub allocated_at: DateTime<Utc>,
    /// Admission-to-assignment duration in milliseconds, fixed at creation.
    pub assignment_time_ms: i64,
}

impl Assignment {
    pub fn new(patient_id: Uuid, resource_id: Uuid, staff_id: Uuid, admitted_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            resource_id,
            staff_id,
            allocated_at: now,
            assignment_time_ms: (now - admitted_at).num_milliseconds().max(0),
        }
    }
}
