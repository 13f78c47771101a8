use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    extractors::AuthenticatedUser,
    models::{CreateHospitalInput, Hospital, Role, UpdateHospitalInput},
    AppError, AppResult, AppState,
};

/// GET /api/hospitals
#[utoipa::path(
    get,
    path = "/api/hospitals",
    responses(
        (status = 200, description = "Hospitals visible to the caller", body = Vec<Hospital>)
    ),
    tag = "hospitals",
    security(("session" = []))
)]
pub async fn get_hospitals(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<Hospital>>> {
    access::authorize(&auth.user, Capability::ViewHospitals)?;

    // Hospital admins administer exactly one tenant; everyone else may see
    // the directory (staff register against it).
    let hospitals = match (auth.user.role, auth.user.hospital_id) {
        (Role::HospitalAdmin, Some(own)) => state.store.hospital(own).await.into_iter().collect(),
        _ => state.store.hospitals().await,
    };
    Ok(Json(hospitals))
}

/// GET /api/hospitals/{id}
#[utoipa::path(
    get,
    path = "/api/hospitals/{id}",
    params(("id" = Uuid, Path, description = "Hospital id")),
    responses(
        (status = 200, description = "Hospital", body = Hospital),
        (status = 404, description = "Unknown hospital")
    ),
    tag = "hospitals",
    security(("session" = []))
)]
pub async fn get_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Hospital>> {
    access::authorize(&auth.user, Capability::ViewHospitals)?;
    let hospital = state
        .store
        .hospital(id)
        .await
        .ok_or_else(|| AppError::hidden("Hospital"))?;
    Ok(Json(hospital))
}

/// POST /api/hospitals
#[utoipa::path(
    post,
    path = "/api/hospitals",
    request_body = CreateHospitalInput,
    responses(
        (status = 200, description = "Hospital created", body = Hospital),
        (status = 403, description = "Caller may not manage hospitals")
    ),
    tag = "hospitals",
    security(("session" = []))
)]
pub async fn create_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreateHospitalInput>,
) -> AppResult<Json<Hospital>> {
    access::authorize(&auth.user, Capability::ManageHospitals)?;

    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Hospital name is required".to_string()));
    }
    if input.beds < 0 || input.theaters < 0 {
        return Err(AppError::Validation(
            "Bed and theater counts cannot be negative".to_string(),
        ));
    }

    let hospital = Hospital {
        id: Uuid::new_v4(),
        name: input.name,
        address: input.address,
        beds: input.beds,
        theaters: input.theaters,
        specialties: input.specialties,
    };
    state.store.insert_hospital(hospital.clone()).await;

    tracing::info!(hospital_id = %hospital.id, by = %auth.user.id, "hospital created");

    Ok(Json(hospital))
}

/// PUT /api/hospitals/{id}
#[utoipa::path(
    put,
    path = "/api/hospitals/{id}",
    params(("id" = Uuid, Path, description = "Hospital id")),
    request_body = UpdateHospitalInput,
    responses(
        (status = 200, description = "Hospital updated", body = Hospital),
        (status = 404, description = "Unknown or out-of-tenant hospital")
    ),
    tag = "hospitals",
    security(("session" = []))
)]
pub async fn update_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateHospitalInput>,
) -> AppResult<Json<Hospital>> {
    let mut hospital = state
        .store
        .hospital(id)
        .await
        .ok_or_else(|| AppError::hidden("Hospital"))?;
    access::authorize_in_hospital(&auth.user, Capability::ManageHospitals, hospital.id)?;

    if let Some(name) = input.name {
        hospital.name = name;
    }
    if let Some(address) = input.address {
        hospital.address = address;
    }
    if let Some(beds) = input.beds {
        hospital.beds = beds;
    }
    if let Some(theaters) = input.theaters {
        hospital.theaters = theaters;
    }
    if let Some(specialties) = input.specialties {
        hospital.specialties = specialties;
    }

    if !state.store.update_hospital(hospital.clone()).await {
        return Err(AppError::hidden("Hospital"));
    }
    Ok(Json(hospital))
}
