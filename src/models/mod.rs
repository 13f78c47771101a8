pub mod assignment;
pub mod clinical;
pub mod clinical_input;
pub mod hospital;
pub mod hospital_input;
pub mod patient;
pub mod patient_input;
pub mod resource;
pub mod resource_input;
pub mod user;
pub mod user_input;

pub use assignment::Assignment;
pub use clinical::{Diagnosis, LabReport, Note, NoteKind, Observation, Prescription, TestOrder, TestStatus};
pub use clinical_input::{
    CreateDiagnosisInput, CreateLabReportInput, CreateNoteInput, CreateObservationInput,
    CreatePrescriptionInput, CreateTestOrderInput,
};
pub use hospital::Hospital;
pub use hospital_input::{CreateHospitalInput, UpdateHospitalInput};
pub use patient::{Patient, Priority};
pub use patient_input::{CreatePatientInput, ReassignInput, UpdatePatientInput};
pub use resource::{Resource, ResourceKind};
pub use resource_input::{CreateResourceInput, UpdateResourceInput};
pub use user::{Role, User};
pub use user_input::{
    LoginInput, LoginResponse, RegisterInput, RegisterResponse, UserMutationResponse,
};
