use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Assignment, Diagnosis, Hospital, LabReport, Note, Observation, Patient, Prescription,
    Resource, ResourceKind, Role, TestOrder, User,
};

use super::{AssignmentTx, Store};

#[derive(Default)]
struct Tables {
    hospitals: HashMap<Uuid, Hospital>,
    users: HashMap<Uuid, User>,
    patients: HashMap<Uuid, Patient>,
    resources: HashMap<Uuid, Resource>,
    assignments: HashMap<Uuid, Assignment>,
    notes: Vec<Note>,
    observations: Vec<Observation>,
    diagnoses: Vec<Diagnosis>,
    test_orders: Vec<TestOrder>,
    prescriptions: Vec<Prescription>,
    lab_reports: Vec<LabReport>,
}

impl Tables {
    fn workload(&self, staff_id: Uuid) -> usize {
        self.assignments
            .values()
            .filter(|a| a.staff_id == staff_id)
            .count()
    }

    fn release_patient(&mut self, patient_id: Uuid) -> usize {
        let released: Vec<Assignment> = self
            .assignments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        for assignment in &released {
            self.assignments.remove(&assignment.id);
            if let Some(resource) = self.resources.get_mut(&assignment.resource_id) {
                resource.available = true;
            }
        }
        released.len()
    }
}

/// In-memory store backed by a single `RwLock`. Ordinary operations take the
/// lock briefly (read-committed); the assignment transaction holds the write
/// half for its whole run, which is the engine's mutual-exclusion boundary.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTx<'a> {
    guard: RwLockWriteGuard<'a, Tables>,
}

impl AssignmentTx for MemoryTx<'_> {
    fn active_assignment_for(&self, patient_id: Uuid) -> Option<Assignment> {
        self.guard
            .assignments
            .values()
            .find(|a| a.patient_id == patient_id)
            .cloned()
    }

    fn workload(&self, staff_id: Uuid) -> usize {
        self.guard.workload(staff_id)
    }

    fn least_loaded_staff(&self, hospital_id: Uuid, role: Role) -> Option<User> {
        // min_by_key keeps the first minimum the iteration happens to visit;
        // the tie order between equally-loaded staff is unspecified.
        self.guard
            .users
            .values()
            .filter(|u| {
                u.hospital_id == Some(hospital_id)
                    && u.role == role
                    && u.is_approved
                    && u.is_active
            })
            .min_by_key(|u| self.guard.workload(u.id))
            .cloned()
    }

    fn first_available_bed(&self, hospital_id: Uuid) -> Option<Resource> {
        self.guard
            .resources
            .values()
            .find(|r| r.hospital_id == hospital_id && r.kind == ResourceKind::Bed && r.available)
            .cloned()
    }

    fn commit_assignment(&mut self, assignment: Assignment) {
        if let Some(resource) = self.guard.resources.get_mut(&assignment.resource_id) {
            resource.available = false;
        }
        self.guard.assignments.insert(assignment.id, assignment);
    }

    fn release_patient(&mut self, patient_id: Uuid) -> usize {
        self.guard.release_patient(patient_id)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_hospital(&self, hospital: Hospital) {
        self.tables.write().await.hospitals.insert(hospital.id, hospital);
    }

    async fn hospital(&self, id: Uuid) -> Option<Hospital> {
        self.tables.read().await.hospitals.get(&id).cloned()
    }

    async fn hospitals(&self) -> Vec<Hospital> {
        let mut all: Vec<Hospital> = self.tables.read().await.hospitals.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    async fn update_hospital(&self, hospital: Hospital) -> bool {
        let mut tables = self.tables.write().await;
        match tables.hospitals.get_mut(&hospital.id) {
            Some(slot) => {
                *slot = hospital;
                true
            }
            None => false,
        }
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    async fn user_by_email(&self, email: &str) -> Option<User> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    async fn users(&self, hospital_id: Option<Uuid>) -> Vec<User> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| hospital_id.is_none() || u.hospital_id == hospital_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
        users
    }

    async fn pending_users(&self, hospital_id: Option<Uuid>) -> Vec<User> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| !u.is_approved)
            .filter(|u| hospital_id.is_none() || u.hospital_id == hospital_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
        users
    }

    async fn update_user(&self, user: User) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                true
            }
            None => false,
        }
    }

    async fn insert_patient(&self, patient: Patient) {
        self.tables.write().await.patients.insert(patient.id, patient);
    }

    async fn patient(&self, id: Uuid) -> Option<Patient> {
        self.tables.read().await.patients.get(&id).cloned()
    }

    async fn patients(&self, hospital_id: Option<Uuid>) -> Vec<Patient> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| hospital_id.is_none() || Some(p.hospital_id) == hospital_id)
            .cloned()
            .collect();
        patients.sort_by(|a, b| b.admitted_at.cmp(&a.admitted_at));
        patients
    }

    async fn patients_assigned_to(&self, staff_id: Uuid) -> Vec<Patient> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .assignments
            .values()
            .filter(|a| a.staff_id == staff_id)
            .filter_map(|a| tables.patients.get(&a.patient_id))
            .cloned()
            .collect();
        patients.sort_by(|a, b| b.admitted_at.cmp(&a.admitted_at));
        patients
    }

    async fn update_patient(&self, patient: Patient) -> bool {
        let mut tables = self.tables.write().await;
        match tables.patients.get_mut(&patient.id) {
            Some(slot) => {
                *slot = patient;
                true
            }
            None => false,
        }
    }

    async fn delete_patient(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        if tables.patients.remove(&id).is_none() {
            return false;
        }
        tables.release_patient(id);
        tables.notes.retain(|n| n.patient_id != id);
        tables.observations.retain(|o| o.patient_id != id);
        tables.diagnoses.retain(|d| d.patient_id != id);
        tables.test_orders.retain(|t| t.patient_id != id);
        tables.prescriptions.retain(|p| p.patient_id != id);
        tables.lab_reports.retain(|r| r.patient_id != id);
        true
    }

    async fn insert_resource(&self, resource: Resource) {
        self.tables.write().await.resources.insert(resource.id, resource);
    }

    async fn resource(&self, id: Uuid) -> Option<Resource> {
        self.tables.read().await.resources.get(&id).cloned()
    }

    async fn resources(&self, hospital_id: Option<Uuid>) -> Vec<Resource> {
        let tables = self.tables.read().await;
        let mut resources: Vec<Resource> = tables
            .resources
            .values()
            .filter(|r| hospital_id.is_none() || Some(r.hospital_id) == hospital_id)
            .cloned()
            .collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        resources
    }

    async fn update_resource(&self, resource: Resource) -> bool {
        let mut tables = self.tables.write().await;
        match tables.resources.get_mut(&resource.id) {
            Some(slot) => {
                *slot = resource;
                true
            }
            None => false,
        }
    }

    async fn delete_resource(&self, id: Uuid) -> bool {
        self.tables.write().await.resources.remove(&id).is_some()
    }

    async fn assignments(&self, hospital_id: Option<Uuid>) -> Vec<Assignment> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| match hospital_id {
                None => true,
                Some(h) => tables
                    .patients
                    .get(&a.patient_id)
                    .map(|p| p.hospital_id == h)
                    .unwrap_or(false),
            })
            .cloned()
            .collect();
        assignments.sort_by(|a, b| b.allocated_at.cmp(&a.allocated_at));
        assignments
    }

    async fn active_assignment_for_patient(&self, patient_id: Uuid) -> Option<Assignment> {
        self.tables
            .read()
            .await
            .assignments
            .values()
            .find(|a| a.patient_id == patient_id)
            .cloned()
    }

    async fn is_assigned(&self, staff_id: Uuid, patient_id: Uuid) -> bool {
        self.tables
            .read()
            .await
            .assignments
            .values()
            .any(|a| a.staff_id == staff_id && a.patient_id == patient_id)
    }

    async fn mean_assignment_time_ms(&self) -> Option<f64> {
        let tables = self.tables.read().await;
        if tables.assignments.is_empty() {
            return None;
        }
        let total: i64 = tables.assignments.values().map(|a| a.assignment_time_ms).sum();
        Some(total as f64 / tables.assignments.len() as f64)
    }

    async fn begin_assignment(&self) -> Box<dyn AssignmentTx + Send + '_> {
        Box::new(MemoryTx {
            guard: self.tables.write().await,
        })
    }

    async fn insert_note(&self, note: Note) {
        self.tables.write().await.notes.push(note);
    }

    async fn notes_for_patient(&self, patient_id: Uuid) -> Vec<Note> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .iter()
            .filter(|n| n.patient_id == patient_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    async fn insert_observation(&self, observation: Observation) {
        self.tables.write().await.observations.push(observation);
    }

    async fn observations_for_patient(&self, patient_id: Uuid) -> Vec<Observation> {
        let tables = self.tables.read().await;
        let mut observations: Vec<Observation> = tables
            .observations
            .iter()
            .filter(|o| o.patient_id == patient_id)
            .cloned()
            .collect();
        observations.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        observations
    }

    async fn insert_diagnosis(&self, diagnosis: Diagnosis) {
        self.tables.write().await.diagnoses.push(diagnosis);
    }

    async fn diagnoses_for_patient(&self, patient_id: Uuid) -> Vec<Diagnosis> {
        let tables = self.tables.read().await;
        let mut diagnoses: Vec<Diagnosis> = tables
            .diagnoses
            .iter()
            .filter(|d| d.patient_id == patient_id)
            .cloned()
            .collect();
        diagnoses.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        diagnoses
    }

    async fn insert_test_order(&self, order: TestOrder) {
        self.tables.write().await.test_orders.push(order);
    }

    async fn test_orders_for_patient(&self, patient_id: Uuid) -> Vec<TestOrder> {
        let tables = self.tables.read().await;
        let mut orders: Vec<TestOrder> = tables
            .test_orders
            .iter()
            .filter(|t| t.patient_id == patient_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));
        orders
    }

    async fn insert_prescription(&self, prescription: Prescription) {
        self.tables.write().await.prescriptions.push(prescription);
    }

    async fn prescriptions_for_patient(&self, patient_id: Uuid) -> Vec<Prescription> {
        let tables = self.tables.read().await;
        let mut prescriptions: Vec<Prescription> = tables
            .prescriptions
            .iter()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect();
        prescriptions.sort_by(|a, b| b.prescribed_at.cmp(&a.prescribed_at));
        prescriptions
    }

    async fn insert_lab_report(&self, report: LabReport) {
        self.tables.write().await.lab_reports.push(report);
    }

    async fn lab_reports_for_patient(&self, patient_id: Uuid) -> Vec<LabReport> {
        let tables = self.tables.read().await;
        let mut reports: Vec<LabReport> = tables
            .lab_reports
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        reports
    }
}
