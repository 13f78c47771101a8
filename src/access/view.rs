//! Field-level view selection. Independent of allow/deny: once a request is
//! allowed, the role decides which fields of the patient record are exposed.
//! Writes to out-of-scope fields are rejected in [`validate_patient_update`],
//! never silently dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Diagnosis, LabReport, Note, Observation, Patient, Prescription, Priority, Role, TestOrder,
    UpdatePatientInput, User,
};
use crate::store::Store;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignedStaff {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Intake view: demographics and triage only. No ai_suggestion, no clinical
/// nests, no administrative fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceptionistPatientView {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub telephone: String,
    pub emergency_contact: String,
    pub symptoms: String,
    pub severity: String,
    pub priority: Priority,
    pub admitted_at: DateTime<Utc>,
    pub assigned_staff: Option<AssignedStaff>,
}

/// Care-team view: vitals and care data; priority is visible but read-only
/// for nurses (enforced at update validation).
#[derive(Debug, Serialize, ToSchema)]
pub struct NursePatientView {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub symptoms: String,
    pub severity: String,
    pub priority: Priority,
    pub admitted_at: DateTime<Utc>,
    pub assigned_staff: Option<AssignedStaff>,
    pub observations: Vec<Observation>,
    pub prescriptions: Vec<Prescription>,
}

/// Full clinical record with every nested sub-record, but none of the
/// administrative fields (tenant id, creator).
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorPatientView {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub telephone: String,
    pub emergency_contact: String,
    pub symptoms: String,
    pub severity: String,
    pub priority: Priority,
    pub ai_suggestion: Option<String>,
    pub admitted_at: DateTime<Utc>,
    pub assigned_staff: Option<AssignedStaff>,
    pub notes: Vec<Note>,
    pub observations: Vec<Observation>,
    pub diagnoses: Vec<Diagnosis>,
    pub test_orders: Vec<TestOrder>,
    pub prescriptions: Vec<Prescription>,
    pub lab_reports: Vec<LabReport>,
}

/// Administrative view: the raw record plus assignment metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub assigned_staff: Option<AssignedStaff>,
    pub assignment_time_ms: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PatientView {
    Receptionist(ReceptionistPatientView),
    Nurse(Box<NursePatientView>),
    Doctor(Box<DoctorPatientView>),
    Admin(AdminPatientView),
}

/// Assembles the role-appropriate view of one (already authorized) patient.
pub async fn patient_view(store: &dyn Store, viewer: &User, patient: &Patient) -> PatientView {
    let assignment = store.active_assignment_for_patient(patient.id).await;
    let assigned_staff = match &assignment {
        Some(a) => store.user(a.staff_id).await.map(|staff| AssignedStaff {
            id: staff.id,
            name: staff.full_name(),
            role: staff.role,
        }),
        None => None,
    };

    match viewer.role {
        Role::Receptionist => PatientView::Receptionist(ReceptionistPatientView {
            id: patient.id,
            name: patient.name.clone(),
            age: patient.age,
            telephone: patient.telephone.clone(),
            emergency_contact: patient.emergency_contact.clone(),
            symptoms: patient.symptoms.clone(),
            severity: patient.severity.clone(),
            priority: patient.priority,
            admitted_at: patient.admitted_at,
            assigned_staff,
        }),
        Role::Nurse => PatientView::Nurse(Box::new(NursePatientView {
            id: patient.id,
            name: patient.name.clone(),
            age: patient.age,
            symptoms: patient.symptoms.clone(),
            severity: patient.severity.clone(),
            priority: patient.priority,
            admitted_at: patient.admitted_at,
            assigned_staff,
            observations: store.observations_for_patient(patient.id).await,
            prescriptions: store.prescriptions_for_patient(patient.id).await,
        })),
        Role::Doctor => PatientView::Doctor(Box::new(DoctorPatientView {
            id: patient.id,
            name: patient.name.clone(),
            age: patient.age,
            telephone: patient.telephone.clone(),
            emergency_contact: patient.emergency_contact.clone(),
            symptoms: patient.symptoms.clone(),
            severity: patient.severity.clone(),
            priority: patient.priority,
            ai_suggestion: patient.ai_suggestion.clone(),
            admitted_at: patient.admitted_at,
            assigned_staff,
            notes: store.notes_for_patient(patient.id).await,
            observations: store.observations_for_patient(patient.id).await,
            diagnoses: store.diagnoses_for_patient(patient.id).await,
            test_orders: store.test_orders_for_patient(patient.id).await,
            prescriptions: store.prescriptions_for_patient(patient.id).await,
            lab_reports: store.lab_reports_for_patient(patient.id).await,
        })),
        Role::SuperAdmin | Role::HospitalAdmin => PatientView::Admin(AdminPatientView {
            patient: patient.clone(),
            assignment_time_ms: assignment.as_ref().map(|a| a.assignment_time_ms),
            assigned_staff,
        }),
    }
}

/// Validation-time write scope per role. `assigned_staff` is handled by the
/// assignment-mutation guard in the handler before this runs.
pub fn validate_patient_update(role: Role, input: &UpdatePatientInput) -> AppResult<()> {
    let touches_demographics = input.name.is_some()
        || input.age.is_some()
        || input.telephone.is_some()
        || input.emergency_contact.is_some();

    match role {
        Role::SuperAdmin | Role::HospitalAdmin => Ok(()),
        Role::Doctor => {
            if touches_demographics {
                return Err(AppError::Validation(
                    "Doctors may update only symptoms, severity and priority".to_string(),
                ));
            }
            Ok(())
        }
        Role::Nurse => {
            if touches_demographics || input.priority.is_some() {
                return Err(AppError::Validation(
                    "Nurses may update only symptoms and severity".to_string(),
                ));
            }
            Ok(())
        }
        Role::Receptionist => Err(AppError::Forbidden(
            "Receptionists may not modify patient records".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdatePatientInput;

    #[test]
    fn nurse_priority_write_is_rejected() {
        let input = UpdatePatientInput {
            priority: Some(Priority::Critical),
            ..Default::default()
        };
        assert!(matches!(
            validate_patient_update(Role::Nurse, &input),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn nurse_vitals_scope_is_allowed() {
        let input = UpdatePatientInput {
            symptoms: Some("worsening cough".into()),
            severity: Some("Moderate".into()),
            ..Default::default()
        };
        assert!(validate_patient_update(Role::Nurse, &input).is_ok());
    }

    #[test]
    fn doctor_cannot_edit_demographics() {
        let input = UpdatePatientInput {
            telephone: Some("555-0100".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_patient_update(Role::Doctor, &input),
            Err(AppError::Validation(_))
        ));
        let clinical = UpdatePatientInput {
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert!(validate_patient_update(Role::Doctor, &clinical).is_ok());
    }

    #[tokio::test]
    async fn receptionist_view_excludes_ai_suggestion() {
        use crate::store::{MemoryStore, Store};

        let store = MemoryStore::new();
        let hospital_id = Uuid::new_v4();
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Pat".into(),
            age: 40,
            telephone: String::new(),
            emergency_contact: String::new(),
            symptoms: "fever".into(),
            severity: "Unknown".into(),
            priority: Priority::High,
            ai_suggestion: Some("internal advisory".into()),
            hospital_id,
            created_by: None,
            admitted_at: Utc::now(),
        };
        store.insert_patient(patient.clone()).await;

        let mut receptionist = User::register(
            "front@desk".into(),
            "Front".into(),
            "Desk".into(),
            Role::Receptionist,
            Some(hospital_id),
        );
        receptionist.approve();

        let view = patient_view(&store, &receptionist, &patient).await;
        let body = serde_json::to_value(&view).unwrap();
        assert!(body.get("ai_suggestion").is_none());
        assert_eq!(body["priority"], "High");
    }
}
