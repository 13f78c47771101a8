use serde::Deserialize;
use utoipa::ToSchema;

use super::clinical::{NoteKind, TestStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNoteInput {
    #[serde(default = "default_note_kind")]
    pub kind: NoteKind,
    pub text: String,
}

fn default_note_kind() -> NoteKind {
    NoteKind::General
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateObservationInput {
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub temperature: Option<f64>,
    pub pulse: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiagnosisInput {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTestOrderInput {
    pub test_type: String,
    pub status: Option<TestStatus>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePrescriptionInput {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLabReportInput {
    pub findings: String,
}
