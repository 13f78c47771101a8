use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    access::{self, Capability},
    extractors::AuthenticatedUser,
    models::{Assignment, Role},
    AppResult, AppState,
};

/// GET /api/assignments - read-only; reassignment goes through the patient
/// endpoint and ordinary assignment only ever happens automatically.
#[utoipa::path(
    get,
    path = "/api/assignments",
    responses(
        (status = 200, description = "Assignments in the caller's scope", body = Vec<Assignment>),
        (status = 403, description = "Receptionists may not view assignments")
    ),
    tag = "assignments",
    security(("session" = []))
)]
pub async fn get_assignments(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<Assignment>>> {
    access::authorize(&auth.user, Capability::ViewAssignments)?;

    let assignments = match (auth.user.role, auth.user.hospital_id) {
        (Role::SuperAdmin, _) => state.store.assignments(None).await,
        (_, Some(hospital_id)) => state.store.assignments(Some(hospital_id)).await,
        (_, None) => Vec::new(),
    };
    Ok(Json(assignments))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentTimesResponse {
    /// Mean admission-to-assignment time in milliseconds, if any assignment
    /// has ever completed.
    pub average_assignment_time_ms: Option<f64>,
}

/// GET /api/analytics/assignment-times - administrative roles only
#[utoipa::path(
    get,
    path = "/api/analytics/assignment-times",
    responses(
        (status = 200, description = "Mean historical assignment time", body = AssignmentTimesResponse),
        (status = 403, description = "Restricted to administrators")
    ),
    tag = "analytics",
    security(("session" = []))
)]
pub async fn get_assignment_times(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<AssignmentTimesResponse>> {
    access::authorize(&auth.user, Capability::ViewAnalytics)?;

    Ok(Json(AssignmentTimesResponse {
        average_assignment_time_ms: state.store.mean_assignment_time_ms().await,
    }))
}
