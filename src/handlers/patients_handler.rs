use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    access::{self, view::PatientView, Capability},
    assignment::{self, AssignOutcome, Deadline},
    extractors::AuthenticatedUser,
    models::{
        Assignment, CreateDiagnosisInput, CreateLabReportInput, CreateNoteInput,
        CreateObservationInput, CreatePatientInput, CreatePrescriptionInput, CreateTestOrderInput,
        Diagnosis, LabReport, Note, Observation, Patient, Prescription, Priority, ReassignInput,
        Role, TestOrder, TestStatus, UpdatePatientInput, User,
    },
    AppError, AppResult, AppState,
};

/// Fetches a patient and runs the full four-gate check against it. Unknown
/// ids and scope violations are indistinguishable on purpose.
async fn load_authorized_patient(
    state: &AppState,
    user: &crate::models::User,
    cap: Capability,
    id: Uuid,
) -> AppResult<Patient> {
    let patient = state
        .store
        .patient(id)
        .await
        .ok_or_else(|| AppError::hidden("Patient"))?;
    access::authorize_patient(state.store.as_ref(), user, cap, &patient).await?;
    Ok(patient)
}

/// GET /api/patients
///
/// Listing scope per role: super_admin everything, hospital_admin and
/// receptionist their hospital, doctors and nurses only patients an
/// assignment links them to.
#[utoipa::path(
    get,
    path = "/api/patients",
    responses(
        (status = 200, description = "Patients in the caller's scope", body = Vec<PatientView>)
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn get_patients(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<PatientView>>> {
    access::authorize(&auth.user, Capability::ListPatients)?;

    let patients = match (auth.user.role, auth.user.hospital_id) {
        (Role::SuperAdmin, _) => state.store.patients(None).await,
        (Role::HospitalAdmin | Role::Receptionist, Some(hospital_id)) => {
            state.store.patients(Some(hospital_id)).await
        }
        (Role::HospitalAdmin | Role::Receptionist, None) => Vec::new(),
        (Role::Doctor | Role::Nurse, _) => state.store.patients_assigned_to(auth.user.id).await,
    };

    let mut views = Vec::with_capacity(patients.len());
    for patient in &patients {
        views.push(access::view::patient_view(state.store.as_ref(), &auth.user, patient).await);
    }
    Ok(Json(views))
}

/// POST /api/patients - admit a patient
///
/// Persists the record, runs the assignment engine inside its deadline, then
/// spawns the best-effort triage enrichment. Capacity or timeout outcomes do
/// not fail the admission; the patient simply has no assignment yet.
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = CreatePatientInput,
    responses(
        (status = 200, description = "Patient admitted", body = PatientView),
        (status = 403, description = "Caller may not register patients"),
        (status = 422, description = "Invalid admission data")
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreatePatientInput>,
) -> AppResult<Json<PatientView>> {
    access::authorize(&auth.user, Capability::CreatePatient)?;

    let hospital_id = auth.user.hospital_id.ok_or_else(|| {
        AppError::Validation("User must belong to a hospital to admit patients".to_string())
    })?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Patient name is required".to_string()));
    }
    if input.age < 0 {
        return Err(AppError::Validation("Age cannot be negative".to_string()));
    }

    let patient = Patient {
        id: Uuid::new_v4(),
        name: input.name,
        age: input.age,
        telephone: input.telephone,
        emergency_contact: input.emergency_contact,
        symptoms: input.symptoms,
        severity: input.severity,
        priority: input.priority.unwrap_or(Priority::Low),
        ai_suggestion: None,
        hospital_id,
        created_by: Some(auth.user.id),
        admitted_at: Utc::now(),
    };
    state.store.insert_patient(patient.clone()).await;

    let outcome = assignment::assign(
        state.store.as_ref(),
        &patient,
        Deadline::new(state.config.assignment_deadline),
    )
    .await;
    if outcome.assignment().is_none() {
        tracing::warn!(patient_id = %patient.id, "patient admitted without an assignment");
    }

    // Priority enrichment is a follow-up write, never a precondition for the
    // assignment above.
    if !patient.symptoms.is_empty() {
        let store = state.store.clone();
        let oracle = state.oracle.clone();
        let status = state.oracle_status.clone();
        let patient_id = patient.id;
        let requested_by = auth.user.id;
        tokio::spawn(async move {
            crate::triage::enrich_patient(store, oracle, status, patient_id, requested_by).await;
        });
    }

    let view = access::view::patient_view(state.store.as_ref(), &auth.user, &patient).await;
    Ok(Json(view))
}

/// GET /api/patients/{id}
#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Role-scoped patient view", body = PatientView),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PatientView>> {
    let patient = load_authorized_patient(&state, &auth.user, Capability::ViewPatient, id).await?;
    let view = access::view::patient_view(state.store.as_ref(), &auth.user, &patient).await;
    Ok(Json(view))
}

/// PUT /api/patients/{id}
///
/// Role-scoped partial update. Assignment-derived fields are guarded: only
/// the super_admin emergency override may set `assigned_staff`, and it is
/// routed through the reassignment engine rather than written in place.
#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = UpdatePatientInput,
    responses(
        (status = 200, description = "Updated patient view", body = PatientView),
        (status = 403, description = "Manual assignment or out-of-role write"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePatientInput>,
) -> AppResult<Json<PatientView>> {
    let mut patient =
        load_authorized_patient(&state, &auth.user, Capability::UpdatePatient, id).await?;

    if let Some(staff_id) = input.assigned_staff {
        if auth.user.role != Role::SuperAdmin {
            return Err(AppError::Forbidden(
                "Manual patient assignment is not allowed; the system assigns automatically"
                    .to_string(),
            ));
        }
        let staff = validated_staff(&state, &patient, staff_id).await?;
        let outcome = assignment::reassign(state.store.as_ref(), &patient, &staff).await;
        if outcome.assignment().is_none() {
            tracing::warn!(patient_id = %patient.id, "override reassignment found no free bed");
        }
    }

    access::view::validate_patient_update(auth.user.role, &input)?;

    if let Some(name) = input.name {
        patient.name = name;
    }
    if let Some(age) = input.age {
        patient.age = age;
    }
    if let Some(telephone) = input.telephone {
        patient.telephone = telephone;
    }
    if let Some(emergency_contact) = input.emergency_contact {
        patient.emergency_contact = emergency_contact;
    }
    if let Some(symptoms) = input.symptoms {
        patient.symptoms = symptoms;
    }
    if let Some(severity) = input.severity {
        patient.severity = severity;
    }
    if let Some(priority) = input.priority {
        patient.priority = priority;
    }

    if !state.store.update_patient(patient.clone()).await {
        return Err(AppError::hidden("Patient"));
    }

    let view = access::view::patient_view(state.store.as_ref(), &auth.user, &patient).await;
    Ok(Json(view))
}

/// DELETE /api/patients/{id} - admin only; releases any held bed
#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted"),
        (status = 404, description = "Unknown or out-of-tenant patient")
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    load_authorized_patient(&state, &auth.user, Capability::DeletePatient, id).await?;

    if !state.store.delete_patient(id).await {
        return Err(AppError::hidden("Patient"));
    }
    Ok(Json(json!({ "success": true, "message": "Patient deleted" })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReassignResponse {
    pub success: bool,
    pub assignment: Option<Assignment>,
    pub message: String,
}

async fn validated_staff(state: &AppState, patient: &Patient, staff_id: Uuid) -> AppResult<User> {
    let staff = state
        .store
        .user(staff_id)
        .await
        .ok_or_else(|| AppError::Validation("Unknown staff member".to_string()))?;
    if !staff.role.is_clinical() {
        return Err(AppError::Validation(
            "Patients can only be assigned to doctors or nurses".to_string(),
        ));
    }
    if staff.hospital_id != Some(patient.hospital_id) {
        return Err(AppError::Validation(
            "Staff member belongs to a different hospital".to_string(),
        ));
    }
    if !staff.can_log_in() {
        return Err(AppError::Validation(
            "Staff member is not approved and active".to_string(),
        ));
    }
    Ok(staff)
}

/// POST /api/patients/{id}/reassign - admin-only release-then-create
#[utoipa::path(
    post,
    path = "/api/patients/{id}/reassign",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = ReassignInput,
    responses(
        (status = 200, description = "Reassignment outcome", body = ReassignResponse),
        (status = 403, description = "Caller may not reassign patients"),
        (status = 404, description = "Unknown or out-of-tenant patient")
    ),
    tag = "patients",
    security(("session" = []))
)]
pub async fn reassign_patient(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ReassignInput>,
) -> AppResult<Json<ReassignResponse>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ReassignPatient, id).await?;
    let staff = validated_staff(&state, &patient, input.staff_id).await?;

    let outcome = assignment::reassign(state.store.as_ref(), &patient, &staff).await;
    let response = match outcome {
        AssignOutcome::Assigned(assignment) => ReassignResponse {
            success: true,
            assignment: Some(assignment),
            message: format!("Patient reassigned to {}", staff.full_name()),
        },
        _ => ReassignResponse {
            success: false,
            assignment: None,
            message: "No bed available; patient is currently unassigned".to_string(),
        },
    };
    Ok(Json(response))
}

// -- nested clinical sub-records ---------------------------------------------
//
// All of these run the same four gates against the parent patient before
// touching the sub-record, so an unassigned clinician sees 404 here exactly
// as on the patient itself.

/// GET /api/patients/{id}/observations
#[utoipa::path(
    get,
    path = "/api/patients/{id}/observations",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Observations, newest first", body = Vec<Observation>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_observations(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Observation>>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ViewObservations, id).await?;
    Ok(Json(state.store.observations_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/observations - nurses only
#[utoipa::path(
    post,
    path = "/api/patients/{id}/observations",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreateObservationInput,
    responses(
        (status = 200, description = "Observation recorded", body = Observation),
        (status = 403, description = "Only nurses record observations"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_observation(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateObservationInput>,
) -> AppResult<Json<Observation>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::CreateObservation, id).await?;

    let observation = Observation {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        nurse_id: auth.user.id,
        blood_pressure_systolic: input.blood_pressure_systolic,
        blood_pressure_diastolic: input.blood_pressure_diastolic,
        temperature: input.temperature,
        pulse: input.pulse,
        respiratory_rate: input.respiratory_rate,
        oxygen_saturation: input.oxygen_saturation,
        notes: input.notes,
        recorded_at: Utc::now(),
    };
    state.store.insert_observation(observation.clone()).await;
    Ok(Json(observation))
}

/// GET /api/patients/{id}/diagnosis
#[utoipa::path(
    get,
    path = "/api/patients/{id}/diagnosis",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Diagnoses, newest first", body = Vec<Diagnosis>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_diagnoses(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Diagnosis>>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ViewDiagnoses, id).await?;
    Ok(Json(state.store.diagnoses_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/diagnosis - doctors only
#[utoipa::path(
    post,
    path = "/api/patients/{id}/diagnosis",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreateDiagnosisInput,
    responses(
        (status = 200, description = "Diagnosis recorded", body = Diagnosis),
        (status = 403, description = "Only doctors record diagnoses"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_diagnosis(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateDiagnosisInput>,
) -> AppResult<Json<Diagnosis>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::CreateDiagnosis, id).await?;
    if input.text.trim().is_empty() {
        return Err(AppError::Validation("Diagnosis text is required".to_string()));
    }

    let diagnosis = Diagnosis {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: auth.user.id,
        text: input.text,
        recorded_at: Utc::now(),
    };
    state.store.insert_diagnosis(diagnosis.clone()).await;
    Ok(Json(diagnosis))
}

/// GET /api/patients/{id}/tests
#[utoipa::path(
    get,
    path = "/api/patients/{id}/tests",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Test orders, newest first", body = Vec<TestOrder>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_test_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TestOrder>>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ViewTestOrders, id).await?;
    Ok(Json(state.store.test_orders_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/tests - doctors only
#[utoipa::path(
    post,
    path = "/api/patients/{id}/tests",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreateTestOrderInput,
    responses(
        (status = 200, description = "Test ordered", body = TestOrder),
        (status = 403, description = "Only doctors order tests"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_test_order(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateTestOrderInput>,
) -> AppResult<Json<TestOrder>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::CreateTestOrder, id).await?;
    if input.test_type.trim().is_empty() {
        return Err(AppError::Validation("Test type is required".to_string()));
    }

    let order = TestOrder {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: auth.user.id,
        test_type: input.test_type,
        status: input.status.unwrap_or(TestStatus::Ordered),
        notes: input.notes,
        ordered_at: Utc::now(),
    };
    state.store.insert_test_order(order.clone()).await;
    Ok(Json(order))
}

/// GET /api/patients/{id}/prescriptions
#[utoipa::path(
    get,
    path = "/api/patients/{id}/prescriptions",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Prescriptions, newest first", body = Vec<Prescription>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_prescriptions(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Prescription>>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ViewPrescriptions, id).await?;
    Ok(Json(state.store.prescriptions_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/prescriptions - doctors only
#[utoipa::path(
    post,
    path = "/api/patients/{id}/prescriptions",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreatePrescriptionInput,
    responses(
        (status = 200, description = "Prescription recorded", body = Prescription),
        (status = 403, description = "Only doctors prescribe"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_prescription(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreatePrescriptionInput>,
) -> AppResult<Json<Prescription>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::CreatePrescription, id).await?;
    if input.medication.trim().is_empty() {
        return Err(AppError::Validation("Medication is required".to_string()));
    }

    let prescription = Prescription {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: auth.user.id,
        medication: input.medication,
        dosage: input.dosage,
        frequency: input.frequency,
        duration: input.duration,
        instructions: input.instructions,
        prescribed_at: Utc::now(),
    };
    state.store.insert_prescription(prescription.clone()).await;
    Ok(Json(prescription))
}

/// GET /api/patients/{id}/notes
#[utoipa::path(
    get,
    path = "/api/patients/{id}/notes",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Notes, newest first", body = Vec<Note>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_notes(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Note>>> {
    let patient = load_authorized_patient(&state, &auth.user, Capability::ViewNotes, id).await?;
    Ok(Json(state.store.notes_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/notes
#[utoipa::path(
    post,
    path = "/api/patients/{id}/notes",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreateNoteInput,
    responses(
        (status = 200, description = "Note added", body = Note),
        (status = 403, description = "Receptionists may not write notes"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateNoteInput>,
) -> AppResult<Json<Note>> {
    let patient = load_authorized_patient(&state, &auth.user, Capability::CreateNote, id).await?;
    if input.text.trim().is_empty() {
        return Err(AppError::Validation("Note text is required".to_string()));
    }

    let note = Note {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        author_id: auth.user.id,
        kind: input.kind,
        text: input.text,
        created_at: Utc::now(),
    };
    state.store.insert_note(note.clone()).await;
    Ok(Json(note))
}

/// GET /api/patients/{id}/labs
#[utoipa::path(
    get,
    path = "/api/patients/{id}/labs",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Lab reports, newest first", body = Vec<LabReport>),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn get_lab_reports(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<LabReport>>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::ViewLabReports, id).await?;
    Ok(Json(state.store.lab_reports_for_patient(patient.id).await))
}

/// POST /api/patients/{id}/labs - doctors only
#[utoipa::path(
    post,
    path = "/api/patients/{id}/labs",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = CreateLabReportInput,
    responses(
        (status = 200, description = "Lab report filed", body = LabReport),
        (status = 403, description = "Only doctors file lab reports"),
        (status = 404, description = "Unknown, out-of-tenant or unassigned patient")
    ),
    tag = "clinical",
    security(("session" = []))
)]
pub async fn create_lab_report(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateLabReportInput>,
) -> AppResult<Json<LabReport>> {
    let patient =
        load_authorized_patient(&state, &auth.user, Capability::CreateLabReport, id).await?;
    if input.findings.trim().is_empty() {
        return Err(AppError::Validation("Findings are required".to_string()));
    }

    let report = LabReport {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: auth.user.id,
        findings: input.findings,
        recorded_at: Utc::now(),
    };
    state.store.insert_lab_report(report.clone()).await;
    Ok(Json(report))
}
