use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    access::{self, Capability},
    extractors::AuthenticatedUser,
    models::Priority,
    triage,
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TriageRequest {
    pub symptoms: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TriageResponse {
    pub suggested_priority: Option<Priority>,
    pub explanation: String,
    /// False when the explanation came from the rule-based fallback.
    pub from_oracle: bool,
}

/// POST /api/triage - standalone suggestion endpoint
///
/// Oracle failures degrade to the keyword classifier; this endpoint never
/// errors because the oracle is down.
#[utoipa::path(
    post,
    path = "/api/triage",
    request_body = TriageRequest,
    responses(
        (status = 200, description = "Priority suggestion", body = TriageResponse),
        (status = 400, description = "Symptoms required")
    ),
    tag = "triage",
    security(("session" = []))
)]
pub async fn suggest_triage(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<TriageRequest>,
) -> AppResult<Json<TriageResponse>> {
    access::authorize(&auth.user, Capability::RequestTriage)?;

    if input.symptoms.trim().is_empty() {
        return Err(AppError::BadRequest("Symptoms required".to_string()));
    }

    let suggestion = triage::suggest_with_fallback(
        state.oracle.as_ref(),
        state.oracle_status.as_ref(),
        &input.symptoms,
    )
    .await;

    Ok(Json(TriageResponse {
        suggested_priority: suggestion.priority_hint,
        explanation: suggestion.text,
        from_oracle: suggestion.from_oracle,
    }))
}
