//! Automatic patient-to-caregiver assignment engine. One call per admission,
//! executed inside a single exclusive store transaction, bounded by a
//! cooperative deadline token. Capacity exhaustion and deadline expiry are
//! ordinary outcomes, not errors; callers just see "no assignment".

use std::time::{Duration, Instant};

use metrics::{counter, histogram};

use crate::models::{Assignment, Patient, Priority, Role, User};
use crate::store::Store;

/// Portable cooperative deadline passed into the transaction. Checked
/// between steps; an expired token aborts with no partial writes.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Clone)]
pub enum AssignOutcome {
    Assigned(Assignment),
    /// No qualifying staff member or no free bed. Terminal and normal.
    CapacityUnavailable,
    /// Deadline exceeded. Reported separately from capacity exhaustion but
    /// treated identically by callers.
    Timeout,
}

impl AssignOutcome {
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            AssignOutcome::Assigned(a) => Some(a),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AssignOutcome::Assigned(_) => "assigned",
            AssignOutcome::CapacityUnavailable => "capacity_unavailable",
            AssignOutcome::Timeout => "timeout",
        }
    }
}

/// Urgent admissions go to a doctor first, routine ones to a nurse first;
/// the other class is the fallback.
pub fn staff_class_order(priority: Priority) -> [Role; 2] {
    if priority.is_urgent() {
        [Role::Doctor, Role::Nurse]
    } else {
        [Role::Nurse, Role::Doctor]
    }
}

/// Allocates one staff member and one bed for a freshly admitted patient.
///
/// Runs entirely inside the store's exclusive assignment transaction, so the
/// lowest-workload ranking, the bed pick and the final write cannot race a
/// concurrent admission. Dropping the transaction before the commit call is
/// the abort path for every early return.
pub async fn assign(store: &dyn Store, patient: &Patient, deadline: Deadline) -> AssignOutcome {
    let mut tx = store.begin_assignment().await;

    if deadline.expired() {
        return finish(patient, AssignOutcome::Timeout, deadline);
    }

    // A patient that already holds an assignment keeps it; this call must
    // never produce a second one.
    if let Some(existing) = tx.active_assignment_for(patient.id) {
        tracing::debug!(patient_id = %patient.id, assignment_id = %existing.id, "patient already assigned");
        return AssignOutcome::Assigned(existing);
    }

    let mut staff: Option<User> = None;
    for class in staff_class_order(patient.priority) {
        staff = tx.least_loaded_staff(patient.hospital_id, class);
        if staff.is_some() {
            break;
        }
    }

    let Some(staff) = staff else {
        tracing::warn!(
            patient_id = %patient.id,
            hospital_id = %patient.hospital_id,
            "no approved active staff available"
        );
        return finish(patient, AssignOutcome::CapacityUnavailable, deadline);
    };

    // No bed means no assignment at all; the staff pick is discarded with no
    // side effect.
    let Some(bed) = tx.first_available_bed(patient.hospital_id) else {
        tracing::warn!(
            patient_id = %patient.id,
            hospital_id = %patient.hospital_id,
            "no beds available"
        );
        return finish(patient, AssignOutcome::CapacityUnavailable, deadline);
    };

    if deadline.expired() {
        return finish(patient, AssignOutcome::Timeout, deadline);
    }

    let assignment = Assignment::new(patient.id, bed.id, staff.id, patient.admitted_at);
    tx.commit_assignment(assignment.clone());

    tracing::info!(
        patient_id = %patient.id,
        priority = %patient.priority,
        staff_id = %staff.id,
        staff_role = %staff.role,
        bed_id = %bed.id,
        assignment_time_ms = assignment.assignment_time_ms,
        "patient assigned"
    );

    finish(patient, AssignOutcome::Assigned(assignment), deadline)
}

/// Admin-only reassignment: release every current assignment (beds restored
/// first), then allocate a fresh bed for the new staff member.
///
/// Deliberately not two-phase: if no bed is free after the release, the
/// release still stands and the patient ends up unassigned.
pub async fn reassign(store: &dyn Store, patient: &Patient, new_staff: &User) -> AssignOutcome {
    let mut tx = store.begin_assignment().await;

    let released = tx.release_patient(patient.id);

    let Some(bed) = tx.first_available_bed(patient.hospital_id) else {
        tracing::warn!(
            patient_id = %patient.id,
            released,
            "no bed available after release; patient left unassigned"
        );
        counter!("reassignments_total", "outcome" => "capacity_unavailable").increment(1);
        return AssignOutcome::CapacityUnavailable;
    };

    let assignment = Assignment::new(patient.id, bed.id, new_staff.id, patient.admitted_at);
    tx.commit_assignment(assignment.clone());

    tracing::info!(
        patient_id = %patient.id,
        staff_id = %new_staff.id,
        staff_role = %new_staff.role,
        released,
        "patient reassigned"
    );
    counter!("reassignments_total", "outcome" => "assigned").increment(1);

    AssignOutcome::Assigned(assignment)
}

fn finish(patient: &Patient, outcome: AssignOutcome, deadline: Deadline) -> AssignOutcome {
    if matches!(outcome, AssignOutcome::Timeout) {
        tracing::error!(
            patient_id = %patient.id,
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "assignment aborted by deadline"
        );
    }
    counter!("assignments_total", "outcome" => outcome.label()).increment(1);
    histogram!("assignment_duration_seconds").record(deadline.elapsed().as_secs_f64());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hospital, Resource, ResourceKind};
    use crate::store::{MemoryStore, Store};
    use chrono::Utc;
    use uuid::Uuid;

    fn deadline() -> Deadline {
        Deadline::new(Duration::from_secs(10))
    }

    async fn hospital(store: &MemoryStore) -> Uuid {
        let hospital = Hospital {
            id: Uuid::new_v4(),
            name: "City General".into(),
            address: "1 Main St".into(),
            beds: 10,
            theaters: 2,
            specialties: vec!["general".into()],
        };
        let id = hospital.id;
        store.insert_hospital(hospital).await;
        id
    }

    async fn staff(store: &MemoryStore, hospital_id: Uuid, role: Role) -> User {
        let mut user = User::register(
            format!("{}-{}@test", role, Uuid::new_v4()),
            "Staff".into(),
            "Member".into(),
            role,
            Some(hospital_id),
        );
        user.approve();
        store.insert_user(user.clone()).await.unwrap();
        user
    }

    async fn bed(store: &MemoryStore, hospital_id: Uuid) -> Resource {
        let resource = Resource {
            id: Uuid::new_v4(),
            name: format!("Bed {}", Uuid::new_v4()),
            kind: ResourceKind::Bed,
            available: true,
            hospital_id,
        };
        store.insert_resource(resource.clone()).await;
        resource
    }

    async fn patient(store: &MemoryStore, hospital_id: Uuid, priority: Priority) -> Patient {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Patient".into(),
            age: 50,
            telephone: String::new(),
            emergency_contact: String::new(),
            symptoms: String::new(),
            severity: "Unknown".into(),
            priority,
            ai_suggestion: None,
            hospital_id,
            created_by: None,
            admitted_at: Utc::now(),
        };
        store.insert_patient(patient.clone()).await;
        patient
    }

    #[tokio::test]
    async fn critical_patient_goes_to_a_doctor() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let doctor = staff(&store, h, Role::Doctor).await;
        let _nurse = staff(&store, h, Role::Nurse).await;
        let bed = bed(&store, h).await;
        let p = patient(&store, h, Priority::Critical).await;

        let outcome = assign(&store, &p, deadline()).await;
        let assignment = outcome.assignment().expect("should assign");
        assert_eq!(assignment.staff_id, doctor.id);
        assert_eq!(assignment.resource_id, bed.id);
        assert!(!store.resource(bed.id).await.unwrap().available);
    }

    #[tokio::test]
    async fn routine_patient_prefers_a_nurse() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let _doctor = staff(&store, h, Role::Doctor).await;
        let nurse = staff(&store, h, Role::Nurse).await;
        bed(&store, h).await;
        let p = patient(&store, h, Priority::Low).await;

        let outcome = assign(&store, &p, deadline()).await;
        assert_eq!(outcome.assignment().unwrap().staff_id, nurse.id);
    }

    #[tokio::test]
    async fn critical_patient_falls_back_to_a_nurse() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let nurse = staff(&store, h, Role::Nurse).await;
        bed(&store, h).await;
        let p = patient(&store, h, Priority::Critical).await;

        let outcome = assign(&store, &p, deadline()).await;
        assert_eq!(outcome.assignment().unwrap().staff_id, nurse.id);
    }

    #[tokio::test]
    async fn workload_ranking_picks_the_idle_doctor() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let busy = staff(&store, h, Role::Doctor).await;
        let idle = staff(&store, h, Role::Doctor).await;

        for _ in 0..2 {
            bed(&store, h).await;
            let p = patient(&store, h, Priority::High).await;
            let mut tx = store.begin_assignment().await;
            let bed_id = tx.first_available_bed(h).unwrap().id;
            tx.commit_assignment(Assignment::new(p.id, bed_id, busy.id, p.admitted_at));
        }

        bed(&store, h).await;
        let p = patient(&store, h, Priority::High).await;
        let outcome = assign(&store, &p, deadline()).await;
        assert_eq!(outcome.assignment().unwrap().staff_id, idle.id);
    }

    #[tokio::test]
    async fn no_staff_means_capacity_unavailable_and_no_side_effects() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let bed = bed(&store, h).await;
        // Unapproved and inactive staff must not count as capacity.
        let mut ghost = User::register(
            "ghost@test".into(),
            "Not".into(),
            "Approved".into(),
            Role::Doctor,
            Some(h),
        );
        ghost.is_approved = false;
        store.insert_user(ghost).await.unwrap();

        let p = patient(&store, h, Priority::Critical).await;
        let outcome = assign(&store, &p, deadline()).await;
        assert!(matches!(outcome, AssignOutcome::CapacityUnavailable));
        assert!(store.assignments(None).await.is_empty());
        assert!(store.resource(bed.id).await.unwrap().available);
    }

    #[tokio::test]
    async fn staff_without_beds_means_capacity_unavailable() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        staff(&store, h, Role::Doctor).await;
        let p = patient(&store, h, Priority::Critical).await;

        let outcome = assign(&store, &p, deadline()).await;
        assert!(matches!(outcome, AssignOutcome::CapacityUnavailable));
        assert!(store.assignments(None).await.is_empty());
    }

    #[tokio::test]
    async fn assigning_twice_never_creates_a_second_assignment() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        staff(&store, h, Role::Doctor).await;
        bed(&store, h).await;
        bed(&store, h).await;
        let p = patient(&store, h, Priority::High).await;

        let first = assign(&store, &p, deadline()).await;
        let second = assign(&store, &p, deadline()).await;
        assert_eq!(
            first.assignment().unwrap().id,
            second.assignment().unwrap().id
        );
        assert_eq!(store.assignments(None).await.len(), 1);
    }

    #[tokio::test]
    async fn one_unavailable_bed_per_assignment() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        staff(&store, h, Role::Doctor).await;
        staff(&store, h, Role::Nurse).await;
        for _ in 0..3 {
            bed(&store, h).await;
        }

        for priority in [Priority::Critical, Priority::Low, Priority::Medium] {
            let p = patient(&store, h, priority).await;
            assert!(assign(&store, &p, deadline()).await.assignment().is_some());
        }

        let assignments = store.assignments(None).await;
        assert_eq!(assignments.len(), 3);

        // No bed backs two assignments, and the unavailable count matches.
        let mut bed_ids: Vec<Uuid> = assignments.iter().map(|a| a.resource_id).collect();
        bed_ids.sort();
        bed_ids.dedup();
        assert_eq!(bed_ids.len(), 3);

        let unavailable = store
            .resources(Some(h))
            .await
            .into_iter()
            .filter(|r| !r.available)
            .count();
        assert_eq!(unavailable, 3);
    }

    #[tokio::test]
    async fn expired_deadline_aborts_with_no_writes() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        staff(&store, h, Role::Doctor).await;
        let bed = bed(&store, h).await;
        let p = patient(&store, h, Priority::Critical).await;

        let outcome = assign(&store, &p, Deadline::new(Duration::ZERO)).await;
        assert!(matches!(outcome, AssignOutcome::Timeout));
        assert!(store.assignments(None).await.is_empty());
        assert!(store.resource(bed.id).await.unwrap().available);
    }

    #[tokio::test]
    async fn reassign_releases_the_old_bed_before_acquiring() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        let _doctor = staff(&store, h, Role::Doctor).await;
        let other = staff(&store, h, Role::Doctor).await;
        bed(&store, h).await;
        bed(&store, h).await;
        let p = patient(&store, h, Priority::High).await;

        let first = assign(&store, &p, deadline()).await;
        let first_id = first.assignment().unwrap().id;

        let outcome = reassign(&store, &p, &other).await;
        let replacement = outcome.assignment().unwrap();
        assert_ne!(replacement.id, first_id);
        assert_eq!(replacement.staff_id, other.id);

        // Release-then-create: exactly one assignment and one held bed.
        assert_eq!(store.assignments(None).await.len(), 1);
        let held = store
            .resources(Some(h))
            .await
            .into_iter()
            .filter(|r| !r.available)
            .count();
        assert_eq!(held, 1);
    }

    #[tokio::test]
    async fn reassign_with_no_bed_leaves_the_patient_unassigned() {
        let store = MemoryStore::new();
        let h = hospital(&store).await;
        staff(&store, h, Role::Doctor).await;
        let replacement = staff(&store, h, Role::Nurse).await;
        let bed = bed(&store, h).await;
        let p = patient(&store, h, Priority::High).await;

        assert!(assign(&store, &p, deadline()).await.assignment().is_some());

        // The held bed disappears, so after the release there is nothing to
        // acquire. The release still stands.
        store.delete_resource(bed.id).await;
        let outcome = reassign(&store, &p, &replacement).await;
        assert!(matches!(outcome, AssignOutcome::CapacityUnavailable));
        assert!(store.active_assignment_for_patient(p.id).await.is_none());
    }
}
