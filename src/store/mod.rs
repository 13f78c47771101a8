//! Persistence boundary. A durable engine lives behind this trait as an
//! external collaborator; the crate ships an in-memory implementation used
//! by the binary and the tests.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Assignment, Diagnosis, Hospital, LabReport, Note, Observation, Patient, Prescription,
    Resource, Role, TestOrder, User,
};

pub use memory::MemoryStore;

/// Exclusive multi-row transaction used by the assignment engine. Holding
/// the transaction is the only mutual-exclusion boundary in the system;
/// dropping it without committing any write is a clean abort.
pub trait AssignmentTx: Send {
    fn active_assignment_for(&self, patient_id: Uuid) -> Option<Assignment>;

    /// Number of currently-active assignments held by one staff member.
    fn workload(&self, staff_id: Uuid) -> usize;

    /// Approved, active staff member of the given role in the hospital with
    /// the fewest active assignments. Ties resolve in an unspecified order;
    /// the ranking itself is the only guarantee.
    fn least_loaded_staff(&self, hospital_id: Uuid, role: Role) -> Option<User>;

    fn first_available_bed(&self, hospital_id: Uuid) -> Option<Resource>;

    /// Inserts the assignment row and flips its bed to unavailable as one
    /// unit. A committed assignment with an available bed (or the reverse)
    /// can never be observed.
    fn commit_assignment(&mut self, assignment: Assignment);

    /// Deletes every assignment of the patient and flips the backing beds
    /// back to available. Returns how many were released.
    fn release_patient(&mut self, patient_id: Uuid) -> usize;
}

#[async_trait]
pub trait Store: Send + Sync {
    // -- hospitals ---------------------------------------------------------

    async fn insert_hospital(&self, hospital: Hospital);
    async fn hospital(&self, id: Uuid) -> Option<Hospital>;
    async fn hospitals(&self) -> Vec<Hospital>;
    async fn update_hospital(&self, hospital: Hospital) -> bool;

    // -- users -------------------------------------------------------------

    /// Fails with Conflict when the email is already registered.
    async fn insert_user(&self, user: User) -> AppResult<()>;
    async fn user(&self, id: Uuid) -> Option<User>;
    async fn user_by_email(&self, email: &str) -> Option<User>;
    /// `None` lists every user (super_admin scope).
    async fn users(&self, hospital_id: Option<Uuid>) -> Vec<User>;
    async fn pending_users(&self, hospital_id: Option<Uuid>) -> Vec<User>;
    async fn update_user(&self, user: User) -> bool;

    // -- patients ----------------------------------------------------------

    async fn insert_patient(&self, patient: Patient);
    async fn patient(&self, id: Uuid) -> Option<Patient>;
    async fn patients(&self, hospital_id: Option<Uuid>) -> Vec<Patient>;
    /// Patients linked to the staff member through an active assignment.
    async fn patients_assigned_to(&self, staff_id: Uuid) -> Vec<Patient>;
    async fn update_patient(&self, patient: Patient) -> bool;
    /// Removes the patient together with its assignments (beds released) and
    /// clinical records.
    async fn delete_patient(&self, id: Uuid) -> bool;

    // -- resources ---------------------------------------------------------

    async fn insert_resource(&self, resource: Resource);
    async fn resource(&self, id: Uuid) -> Option<Resource>;
    async fn resources(&self, hospital_id: Option<Uuid>) -> Vec<Resource>;
    async fn update_resource(&self, resource: Resource) -> bool;
    async fn delete_resource(&self, id: Uuid) -> bool;

    // -- assignments -------------------------------------------------------

    async fn assignments(&self, hospital_id: Option<Uuid>) -> Vec<Assignment>;
    async fn active_assignment_for_patient(&self, patient_id: Uuid) -> Option<Assignment>;
    async fn is_assigned(&self, staff_id: Uuid, patient_id: Uuid) -> bool;
    /// Mean admission-to-assignment time across active assignments, for the
    /// analytics endpoint.
    async fn mean_assignment_time_ms(&self) -> Option<f64>;

    /// Opens the exclusive transaction the engine runs steps 2-5 inside.
    async fn begin_assignment(&self) -> Box<dyn AssignmentTx + Send + '_>;

    // -- clinical sub-records (append-only) --------------------------------

    async fn insert_note(&self, note: Note);
    async fn notes_for_patient(&self, patient_id: Uuid) -> Vec<Note>;
    async fn insert_observation(&self, observation: Observation);
    async fn observations_for_patient(&self, patient_id: Uuid) -> Vec<Observation>;
    async fn insert_diagnosis(&self, diagnosis: Diagnosis);
    async fn diagnoses_for_patient(&self, patient_id: Uuid) -> Vec<Diagnosis>;
    async fn insert_test_order(&self, order: TestOrder);
    async fn test_orders_for_patient(&self, patient_id: Uuid) -> Vec<TestOrder>;
    async fn insert_prescription(&self, prescription: Prescription);
    async fn prescriptions_for_patient(&self, patient_id: Uuid) -> Vec<Prescription>;
    async fn insert_lab_report(&self, report: LabReport);
    async fn lab_reports_for_patient(&self, patient_id: Uuid) -> Vec<LabReport>;
}
