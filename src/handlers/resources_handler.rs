use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    extractors::AuthenticatedUser,
    models::{CreateResourceInput, Resource, Role, UpdateResourceInput},
    AppError, AppResult, AppState,
};

async fn scoped_resources(state: &AppState, user: &crate::models::User) -> Vec<Resource> {
    match (user.role, user.hospital_id) {
        (Role::SuperAdmin, _) => state.store.resources(None).await,
        (_, Some(hospital_id)) => state.store.resources(Some(hospital_id)).await,
        (_, None) => Vec::new(),
    }
}

/// GET /api/resources
#[utoipa::path(
    get,
    path = "/api/resources",
    responses(
        (status = 200, description = "Resources in the caller's scope", body = Vec<Resource>)
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn get_resources(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<Resource>>> {
    access::authorize(&auth.user, Capability::ViewResources)?;
    Ok(Json(scoped_resources(&state, &auth.user).await))
}

/// GET /api/resources/available
#[utoipa::path(
    get,
    path = "/api/resources/available",
    responses(
        (status = 200, description = "Currently free resources", body = Vec<Resource>)
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn get_available_resources(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<Resource>>> {
    access::authorize(&auth.user, Capability::ViewResources)?;
    let available = scoped_resources(&state, &auth.user)
        .await
        .into_iter()
        .filter(|r| r.available)
        .collect();
    Ok(Json(available))
}

/// GET /api/resources/{id}
#[utoipa::path(
    get,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource", body = Resource),
        (status = 404, description = "Unknown or out-of-tenant resource")
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Resource>> {
    let resource = state
        .store
        .resource(id)
        .await
        .ok_or_else(|| AppError::hidden("Resource"))?;
    access::authorize_in_hospital(&auth.user, Capability::ViewResources, resource.hospital_id)?;
    Ok(Json(resource))
}

/// POST /api/resources
#[utoipa::path(
    post,
    path = "/api/resources",
    request_body = CreateResourceInput,
    responses(
        (status = 200, description = "Resource created", body = Resource),
        (status = 403, description = "Caller may not manage resources")
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreateResourceInput>,
) -> AppResult<Json<Resource>> {
    access::authorize(&auth.user, Capability::ManageResources)?;

    // Non-super admins always create into their own hospital.
    let hospital_id = match auth.user.role {
        Role::SuperAdmin => input.hospital_id.ok_or_else(|| {
            AppError::Validation("hospital_id is required for super_admin".to_string())
        })?,
        _ => auth
            .user
            .hospital_id
            .ok_or_else(|| AppError::Validation("Caller has no hospital".to_string()))?,
    };
    if state.store.hospital(hospital_id).await.is_none() {
        return Err(AppError::Validation("Unknown hospital".to_string()));
    }

    let resource = Resource {
        id: Uuid::new_v4(),
        name: input.name,
        kind: input.kind,
        available: input.available,
        hospital_id,
    };
    state.store.insert_resource(resource.clone()).await;

    tracing::info!(resource_id = %resource.id, by = %auth.user.id, "resource created");

    Ok(Json(resource))
}

/// PUT /api/resources/{id}
#[utoipa::path(
    put,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    request_body = UpdateResourceInput,
    responses(
        (status = 200, description = "Resource updated", body = Resource),
        (status = 403, description = "Availability is assignment-derived state"),
        (status = 404, description = "Unknown or out-of-tenant resource")
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateResourceInput>,
) -> AppResult<Json<Resource>> {
    let mut resource = state
        .store
        .resource(id)
        .await
        .ok_or_else(|| AppError::hidden("Resource"))?;
    access::authorize_in_hospital(&auth.user, Capability::ManageResources, resource.hospital_id)?;

    // Bed availability is owned by the assignment engine; only the
    // super_admin emergency override may touch it directly.
    if input.available.is_some() && auth.user.role != Role::SuperAdmin {
        return Err(AppError::Forbidden(
            "Resource availability is managed by the assignment engine".to_string(),
        ));
    }

    if let Some(name) = input.name {
        resource.name = name;
    }
    if let Some(kind) = input.kind {
        resource.kind = kind;
    }
    if let Some(available) = input.available {
        resource.available = available;
    }

    if !state.store.update_resource(resource.clone()).await {
        return Err(AppError::hidden("Resource"));
    }
    Ok(Json(resource))
}

/// DELETE /api/resources/{id}
#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource deleted"),
        (status = 404, description = "Unknown or out-of-tenant resource")
    ),
    tag = "resources",
    security(("session" = []))
)]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let resource = state
        .store
        .resource(id)
        .await
        .ok_or_else(|| AppError::hidden("Resource"))?;
    access::authorize_in_hospital(&auth.user, Capability::ManageResources, resource.hospital_id)?;

    if !state.store.delete_resource(id).await {
        return Err(AppError::hidden("Resource"));
    }
    Ok(Json(json!({ "success": true, "message": "Resource deleted" })))
}
