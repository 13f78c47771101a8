use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extractors::AuthenticatedUser,
    models::{LoginInput, LoginResponse, RegisterInput, RegisterResponse, Role, User},
    AppError, AppResult, AppState,
};

/// POST /api/auth/register - public self-registration
///
/// Accounts start unapproved and inactive; an administrator has to approve
/// them before login works.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterInput,
    responses(
        (status = 200, description = "Account created, pending approval", body = RegisterResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid registration data")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<RegisterResponse>> {
    if input.email.trim().is_empty() || !input.email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if input.role == Role::SuperAdmin {
        return Err(AppError::Validation(
            "Cannot self-register as super_admin".to_string(),
        ));
    }
    let hospital_id = input
        .hospital_id
        .ok_or_else(|| AppError::Validation("A hospital is required for this role".to_string()))?;
    if state.store.hospital(hospital_id).await.is_none() {
        return Err(AppError::Validation("Unknown hospital".to_string()));
    }

    let user = User::register(
        input.email.trim().to_lowercase(),
        input.first_name,
        input.last_name,
        input.role,
        Some(hospital_id),
    );
    state.store.insert_user(user.clone()).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "new registration pending approval");

    Ok(Json(RegisterResponse {
        message: "Registration successful. Your account is pending approval by an administrator."
            .to_string(),
        user,
    }))
}

/// POST /api/auth/login
///
/// Credential verification beyond the approval gate is handled by an
/// external identity collaborator; this issues an opaque session token for
/// an approved, active account.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Unknown account"),
        (status = 403, description = "Account not approved or inactive")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .store
        .user_by_email(input.email.trim())
        .await
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    // Approval gate: registration exists but the account is not usable yet
    // (or has been rejected/deactivated since).
    if !user.can_log_in() {
        return Err(AppError::Forbidden(
            "Account is not approved or inactive".to_string(),
        ));
    }

    let token = Uuid::new_v4().to_string();
    state.sessions.insert(token.clone(), user.id).await;

    tracing::debug!(user_id = %user.id, "session issued");

    Ok(Json(LoginResponse { token, user }))
}

/// POST /api/auth/logout - invalidates the presented session token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session invalidated")
    ),
    tag = "auth",
    security(("session" = []))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    if let Some(token) = crate::extractors::auth::token_from_headers(&headers) {
        state.sessions.invalidate(&token).await;
    }
    Ok(Json(json!({ "message": "Logged out" })))
}

/// GET /api/auth/me - the authenticated principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth",
    security(("session" = []))
)]
pub async fn get_me(auth: AuthenticatedUser) -> Json<User> {
    Json(auth.user)
}
