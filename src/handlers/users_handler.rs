use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    extractors::AuthenticatedUser,
    models::{Role, User, UserMutationResponse},
    AppError, AppResult, AppState,
};

/// Admin user listings are tenant-scoped: a hospital_admin only ever sees
/// their own hospital's accounts, super_admin sees everything. An admin
/// without a hospital has no tenant to list.
enum ListingScope {
    All,
    Hospital(Uuid),
    Nothing,
}

fn listing_scope(user: &User) -> ListingScope {
    match (user.role, user.hospital_id) {
        (Role::SuperAdmin, _) => ListingScope::All,
        (_, Some(hospital_id)) => ListingScope::Hospital(hospital_id),
        (_, None) => ListingScope::Nothing,
    }
}

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users visible to the caller", body = Vec<User>),
        (status = 403, description = "Caller may not view user accounts")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    access::authorize(&auth.user, Capability::ViewUsers)?;
    let users = match listing_scope(&auth.user) {
        ListingScope::All => state.store.users(None).await,
        ListingScope::Hospital(hospital_id) => state.store.users(Some(hospital_id)).await,
        ListingScope::Nothing => Vec::new(),
    };
    Ok(Json(users))
}

/// GET /api/users/pending - accounts awaiting approval
#[utoipa::path(
    get,
    path = "/api/users/pending",
    responses(
        (status = 200, description = "Unapproved accounts", body = Vec<User>),
        (status = 403, description = "Caller may not manage user accounts")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn get_pending_users(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    access::authorize(&auth.user, Capability::ManageUsers)?;
    let users = match listing_scope(&auth.user) {
        ListingScope::All => state.store.pending_users(None).await,
        ListingScope::Hospital(hospital_id) => state.store.pending_users(Some(hospital_id)).await,
        ListingScope::Nothing => Vec::new(),
    };
    Ok(Json(users))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Unknown or out-of-tenant user")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    access::authorize(&auth.user, Capability::ViewUsers)?;
    let target = fetch_scoped_user(&state, &auth.user, id).await?;
    Ok(Json(target))
}

async fn fetch_scoped_user(state: &AppState, caller: &User, id: Uuid) -> AppResult<User> {
    let target = state
        .store
        .user(id)
        .await
        .ok_or_else(|| AppError::hidden("User"))?;

    // Cross-tenant accounts (including hospital-less super admins) stay
    // hidden from hospital-scoped admins.
    if caller.role != Role::SuperAdmin
        && (caller.hospital_id.is_none() || target.hospital_id != caller.hospital_id)
    {
        return Err(AppError::hidden("User"));
    }
    Ok(target)
}

async fn apply_user_mutation(
    state: &AppState,
    caller: &User,
    id: Uuid,
    verb: &str,
    mutate: impl FnOnce(&mut User) -> AppResult<()>,
) -> AppResult<Json<UserMutationResponse>> {
    access::authorize(caller, Capability::ManageUsers)?;
    let mut target = fetch_scoped_user(state, caller, id).await?;

    mutate(&mut target)?;

    if !state.store.update_user(target.clone()).await {
        return Err(AppError::hidden("User"));
    }

    tracing::info!(user_id = %target.id, by = %caller.id, verb, "user account state changed");

    Ok(Json(UserMutationResponse {
        message: format!("User {} has been {}.", target.email, verb),
        user: target,
    }))
}

/// POST /api/users/{id}/approve - sets approved and active together
#[utoipa::path(
    post,
    path = "/api/users/{id}/approve",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User approved", body = UserMutationResponse),
        (status = 404, description = "Unknown or out-of-tenant user")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn approve_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserMutationResponse>> {
    apply_user_mutation(&state, &auth.user, id, "approved", |user| {
        user.approve();
        Ok(())
    })
    .await
}

/// POST /api/users/{id}/reject - clears approved and active together
#[utoipa::path(
    post,
    path = "/api/users/{id}/reject",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User rejected", body = UserMutationResponse),
        (status = 404, description = "Unknown or out-of-tenant user")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn reject_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserMutationResponse>> {
    apply_user_mutation(&state, &auth.user, id, "rejected", |user| {
        user.reject();
        Ok(())
    })
    .await
}

/// POST /api/users/{id}/activate - reactivation leaves approval untouched
#[utoipa::path(
    post,
    path = "/api/users/{id}/activate",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User activated", body = UserMutationResponse),
        (status = 404, description = "Unknown or out-of-tenant user")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserMutationResponse>> {
    apply_user_mutation(&state, &auth.user, id, "activated", |user| {
        user.activate();
        Ok(())
    })
    .await
}

/// POST /api/users/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = UserMutationResponse),
        (status = 403, description = "Super admin accounts cannot be deactivated"),
        (status = 404, description = "Unknown or out-of-tenant user")
    ),
    tag = "users",
    security(("session" = []))
)]
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserMutationResponse>> {
    apply_user_mutation(&state, &auth.user, id, "deactivated", |user| {
        if user.role == Role::SuperAdmin {
            return Err(AppError::Forbidden(
                "Cannot deactivate super admin accounts".to_string(),
            ));
        }
        user.deactivate();
        Ok(())
    })
    .await
}
