//! Access-control layer. Every operation runs through [`evaluate`] (via one
//! of the `authorize_*` wrappers) before touching data: an ordered list of
//! predicates evaluated short-circuit, then a separate field-level view
//! selection in [`view`].

pub mod capability;
pub mod view;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Patient, User};
use crate::store::Store;

pub use capability::{role_allows, Capability};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Explicit, user-visible refusal (403 with a reason).
    Deny(String),
    /// Scope violation. Surfaced as not-found so existence is never
    /// disclosed across a tenant or assignment boundary.
    Hidden,
}

impl Decision {
    pub fn into_result(self, entity: &str) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason)),
            Decision::Hidden => Err(AppError::hidden(entity)),
        }
    }
}

/// Whether an assignment links the requester to the target patient. Only
/// meaningful for clinical roles; everyone else passes the gate untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientLink {
    NotApplicable,
    Linked,
    NotLinked,
}

#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub hospital_id: Option<Uuid>,
    pub patient_link: PatientLink,
}

impl Target {
    pub const NONE: Target = Target {
        hospital_id: None,
        patient_link: PatientLink::NotApplicable,
    };

    pub fn hospital(hospital_id: Uuid) -> Target {
        Target {
            hospital_id: Some(hospital_id),
            patient_link: PatientLink::NotApplicable,
        }
    }
}

struct CheckCtx<'a> {
    user: &'a User,
    cap: Capability,
    target: &'a Target,
}

type Check = fn(&CheckCtx) -> Option<Decision>;

/// Gate order is part of the contract: capability refusals are visible 403s
/// and must win over the scope gates, which hide instead of refusing.
const CHECKS: [Check; 4] = [approval_gate, capability_gate, tenant_gate, assignment_gate];

pub fn evaluate(user: &User, cap: Capability, target: &Target) -> Decision {
    let ctx = CheckCtx { user, cap, target };
    for check in CHECKS {
        // A check only speaks up to short-circuit with a refusal.
        if let Some(decision) = check(&ctx) {
            tracing::debug!(
                user_id = %user.id,
                role = %user.role,
                capability = ?cap,
                decision = ?decision,
                "access denied"
            );
            return decision;
        }
    }
    Decision::Allow
}

fn approval_gate(ctx: &CheckCtx) -> Option<Decision> {
    if !ctx.user.is_approved || !ctx.user.is_active {
        return Some(Decision::Deny(
            "Account is not approved or inactive".to_string(),
        ));
    }
    None
}

fn capability_gate(ctx: &CheckCtx) -> Option<Decision> {
    if !role_allows(ctx.user.role, ctx.cap) {
        return Some(Decision::Deny(format!(
            "Role {} may not {}",
            ctx.user.role,
            ctx.cap.describe()
        )));
    }
    None
}

fn tenant_gate(ctx: &CheckCtx) -> Option<Decision> {
    if ctx.user.role == crate::models::Role::SuperAdmin {
        return None;
    }
    if let Some(target_hospital) = ctx.target.hospital_id {
        if ctx.user.hospital_id != Some(target_hospital) {
            return Some(Decision::Hidden);
        }
    }
    None
}

fn assignment_gate(ctx: &CheckCtx) -> Option<Decision> {
    if ctx.user.role.is_clinical() && ctx.target.patient_link == PatientLink::NotLinked {
        return Some(Decision::Hidden);
    }
    None
}

/// Capability-only authorization for operations without a scoped target.
pub fn authorize(user: &User, cap: Capability) -> AppResult<()> {
    evaluate(user, cap, &Target::NONE).into_result("Resource")
}

pub fn authorize_in_hospital(user: &User, cap: Capability, hospital_id: Uuid) -> AppResult<()> {
    evaluate(user, cap, &Target::hospital(hospital_id)).into_result("Resource")
}

/// Full four-gate check against a patient, including the object-level
/// assignment relationship for clinical roles.
pub async fn authorize_patient(
    store: &dyn Store,
    user: &User,
    cap: Capability,
    patient: &Patient,
) -> AppResult<()> {
    let patient_link = if user.role.is_clinical() {
        if store.is_assigned(user.id, patient.id).await {
            PatientLink::Linked
        } else {
            PatientLink::NotLinked
        }
    } else {
        PatientLink::NotApplicable
    };
    let target = Target {
        hospital_id: Some(patient.hospital_id),
        patient_link,
    };
    evaluate(user, cap, &target).into_result("Patient")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use uuid::Uuid;

    fn staff(role: Role, hospital_id: Option<Uuid>) -> User {
        let mut user = User::register(
            format!("{}@test", role),
            "Test".into(),
            "Staff".into(),
            role,
            hospital_id,
        );
        user.approve();
        user
    }

    #[test]
    fn unapproved_user_is_denied_before_anything_else() {
        let hospital = Uuid::new_v4();
        let user = User::register(
            "new@test".into(),
            "New".into(),
            "User".into(),
            Role::Doctor,
            Some(hospital),
        );
        let decision = evaluate(&user, Capability::ViewPatient, &Target::hospital(hospital));
        assert!(matches!(decision, Decision::Deny(_)));
    }

    #[test]
    fn capability_refusal_is_visible_not_hidden() {
        let hospital = Uuid::new_v4();
        let nurse = staff(Role::Nurse, Some(hospital));
        // Even against a foreign hospital the missing capability wins, so
        // the caller sees an explicit 403 rather than a 404.
        let decision = evaluate(
            &nurse,
            Capability::ManageUsers,
            &Target::hospital(Uuid::new_v4()),
        );
        assert!(matches!(decision, Decision::Deny(_)));
    }

    #[test]
    fn cross_tenant_access_is_hidden() {
        let admin = staff(Role::HospitalAdmin, Some(Uuid::new_v4()));
        let decision = evaluate(
            &admin,
            Capability::ViewPatient,
            &Target::hospital(Uuid::new_v4()),
        );
        assert_eq!(decision, Decision::Hidden);
        assert!(matches!(
            decision.into_result("Patient"),
            Err(crate::error::AppError::NotFound(_))
        ));
    }

    #[test]
    fn unlinked_clinician_is_hidden() {
        let hospital = Uuid::new_v4();
        let doctor = staff(Role::Doctor, Some(hospital));
        let target = Target {
            hospital_id: Some(hospital),
            patient_link: PatientLink::NotLinked,
        };
        assert_eq!(evaluate(&doctor, Capability::ViewPatient, &target), Decision::Hidden);

        let linked = Target {
            hospital_id: Some(hospital),
            patient_link: PatientLink::Linked,
        };
        assert_eq!(evaluate(&doctor, Capability::ViewPatient, &linked), Decision::Allow);
    }

    #[tokio::test]
    async fn assignment_gate_consults_the_store() {
        use crate::models::{Assignment, Patient, Priority};
        use crate::store::{MemoryStore, Store};
        use chrono::Utc;

        let store = MemoryStore::new();
        let hospital = Uuid::new_v4();
        let doctor = staff(Role::Doctor, Some(hospital));
        store.insert_user(doctor.clone()).await.unwrap();

        let patient = Patient {
            id: Uuid::new_v4(),
            name: "P".into(),
            age: 30,
            telephone: String::new(),
            emergency_contact: String::new(),
            symptoms: String::new(),
            severity: "Unknown".into(),
            priority: Priority::Low,
            ai_suggestion: None,
            hospital_id: hospital,
            created_by: None,
            admitted_at: Utc::now(),
        };
        store.insert_patient(patient.clone()).await;

        // In-hospital but unlinked: hidden, same as a cross-tenant miss.
        let denied = authorize_patient(&store, &doctor, Capability::ViewPatient, &patient).await;
        assert!(matches!(denied, Err(crate::error::AppError::NotFound(_))));

        let mut tx = store.begin_assignment().await;
        tx.commit_assignment(Assignment::new(
            patient.id,
            Uuid::new_v4(),
            doctor.id,
            patient.admitted_at,
        ));
        drop(tx);

        let allowed = authorize_patient(&store, &doctor, Capability::ViewPatient, &patient).await;
        assert!(allowed.is_ok());

        // A hospital_admin from another tenant gets the same 404 whether or
        // not the patient exists.
        let foreign_admin = staff(Role::HospitalAdmin, Some(Uuid::new_v4()));
        let hidden =
            authorize_patient(&store, &foreign_admin, Capability::ViewPatient, &patient).await;
        assert!(matches!(hidden, Err(crate::error::AppError::NotFound(_))));
    }

    #[test]
    fn super_admin_crosses_tenants() {
        let root = staff(Role::SuperAdmin, None);
        let decision = evaluate(
            &root,
            Capability::ViewPatient,
            &Target::hospital(Uuid::new_v4()),
        );
        assert_eq!(decision, Decision::Allow);
    }
}
