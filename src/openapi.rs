use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wardflow API",
        version = "1.0.0",
        description = "Multi-hospital patient intake and care-team assignment backend"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Auth
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::logout,
        crate::handlers::auth_handler::get_me,

        // Users
        crate::handlers::users_handler::get_users,
        crate::handlers::users_handler::get_pending_users,
        crate::handlers::users_handler::get_user,
        crate::handlers::users_handler::approve_user,
        crate::handlers::users_handler::reject_user,
        crate::handlers::users_handler::activate_user,
        crate::handlers::users_handler::deactivate_user,

        // Hospitals
        crate::handlers::hospitals_handler::get_hospitals,
        crate::handlers::hospitals_handler::get_hospital,
        crate::handlers::hospitals_handler::create_hospital,
        crate::handlers::hospitals_handler::update_hospital,

        // Resources
        crate::handlers::resources_handler::get_resources,
        crate::handlers::resources_handler::get_available_resources,
        crate::handlers::resources_handler::get_resource,
        crate::handlers::resources_handler::create_resource,
        crate::handlers::resources_handler::update_resource,
        crate::handlers::resources_handler::delete_resource,

        // Patients
        crate::handlers::patients_handler::get_patients,
        crate::handlers::patients_handler::create_patient,
        crate::handlers::patients_handler::get_patient,
        crate::handlers::patients_handler::update_patient,
        crate::handlers::patients_handler::delete_patient,
        crate::handlers::patients_handler::reassign_patient,
        crate::handlers::patients_handler::get_observations,
        crate::handlers::patients_handler::create_observation,
        crate::handlers::patients_handler::get_diagnoses,
        crate::handlers::patients_handler::create_diagnosis,
        crate::handlers::patients_handler::get_test_orders,
        crate::handlers::patients_handler::create_test_order,
        crate::handlers::patients_handler::get_prescriptions,
        crate::handlers::patients_handler::create_prescription,
        crate::handlers::patients_handler::get_notes,
        crate::handlers::patients_handler::create_note,
        crate::handlers::patients_handler::get_lab_reports,
        crate::handlers::patients_handler::create_lab_report,

        // Assignments and analytics
        crate::handlers::assignments_handler::get_assignments,
        crate::handlers::assignments_handler::get_assignment_times,

        // Triage
        crate::handlers::triage_handler::suggest_triage,
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "users", description = "Account approval and management"),
        (name = "hospitals", description = "Tenant management"),
        (name = "resources", description = "Beds and equipment"),
        (name = "patients", description = "Patient intake and records"),
        (name = "clinical", description = "Append-only clinical sub-records"),
        (name = "assignments", description = "Automatic care-team assignments"),
        (name = "analytics", description = "Administrative metrics"),
        (name = "triage", description = "Priority suggestions"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}
