use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    HospitalAdmin,
    Doctor,
    Nurse,
    Receptionist,
}

impl Role {
    pub fn is_clinical(self) -> bool {
        matches!(self, Role::Doctor | Role::Nurse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::HospitalAdmin => "hospital_admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Nullable only for super_admin; every other role belongs to exactly
    /// one hospital.
    pub hospital_id: Option<Uuid>,
    pub is_approved: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Self-registered accounts start unapproved and inactive; an admin has
    /// to approve them before they can log in.
    pub fn register(
        email: String,
        first_name: String,
        last_name: String,
        role: Role,
        hospital_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            role,
            hospital_id,
            is_approved: false,
            is_active: false,
            date_joined: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Approve sets both flags together; a freshly approved account can log
    /// in immediately.
    pub fn approve(&mut self) {
        self.is_approved = true;
        self.is_active = true;
    }

    /// Reject clears both flags together.
    pub fn reject(&mut self) {
        self.is_approved = false;
        self.is_active = false;
    }

    /// Activate/deactivate toggle only the active flag; approval is a
    /// separate decision and survives deactivation.
    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn can_log_in(&self) -> bool {
        self.is_approved && self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> User {
        User::register(
            "nurse@city.test".into(),
            "Ada".into(),
            "Okafor".into(),
            Role::Nurse,
            Some(Uuid::new_v4()),
        )
    }

    #[test]
    fn registration_starts_unapproved_and_inactive() {
        let user = registered();
        assert!(!user.is_approved);
        assert!(!user.is_active);
        assert!(!user.can_log_in());
    }

    #[test]
    fn approve_sets_both_flags() {
        let mut user = registered();
        user.approve();
        assert!(user.is_approved);
        assert!(user.is_active);
        assert!(user.can_log_in());
    }

    #[test]
    fn reject_clears_both_flags() {
        let mut user = registered();
        user.approve();
        user.reject();
        assert!(!user.is_approved);
        assert!(!user.is_active);
    }

    #[test]
    fn deactivate_keeps_approval() {
        let mut user = registered();
        user.approve();
        user.deactivate();
        assert!(user.is_approved);
        assert!(!user.is_active);
        assert!(!user.can_log_in());

        // Reactivation does not require a second approval.
        user.activate();
        assert!(user.can_log_in());
    }
}
