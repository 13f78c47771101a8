//! Clinical sub-records hanging off a patient. All of them are append-only:
//! once written there is no update or delete path, so each row keeps its
//! author and timestamp for the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    General,
    Medical,
    Treatment,
    Lab,
    Discharge,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub author_id: Uuid,
    pub kind: NoteKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Vitals recorded by a nurse.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Observation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub nurse_id: Uuid,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub temperature: Option<f64>,
    pub pulse: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub notes: String,
    pub recorded_at: DateTime<Utc>,
}

/// Only doctors write diagnoses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Diagnosis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Ordered,
    Pending,
    Resulted,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub test_type: String,
    pub status: TestStatus,
    pub notes: String,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub prescribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabReport {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub findings: String,
    pub recorded_at: DateTime<Utc>,
}
