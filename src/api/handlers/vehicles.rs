//! Vehicle handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::api::schemas::{ApiResponse, CreateVehicleRequest, UpdateVehicleRequest};
use crate::api::state::AppState;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::models::{NewVehicle, Vehicle, VehicleChanges, VehicleRepository, VehicleStatus};
use crate::utils::public_id::{generate_public_id, VEHICLE_PREFIX};
use crate::utils::validate_public_id;

/// Vehicle creation handler.
///
/// # Route
///
/// `POST /v1/vehicles`
pub async fn create_vehicle_handler(
    State(state): State<AppState>,
    Json(req_body): Json<CreateVehicleRequest>,
) -> AppResult<impl IntoResponse> {
    req_body.validate().map_err(|e| e.to_validation_error())?;

    let new_vehicle = NewVehicle {
        public_id: generate_public_id(VEHICLE_PREFIX),
        plate_number: req_body.plate_number,
        make: req_body.make.filter(|s| !s.is_empty()),
        model: req_body.model.filter(|s| !s.is_empty()),
        year: req_body.year,
    };
    let vehicle = VehicleRepository::create(&state.db, &new_vehicle).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::record(vehicle))))
}

/// Vehicle list handler with filters and pagination.
///
/// # Route
///
/// `GET /v1/vehicles`
pub async fn list_vehicles_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<Vehicle>>>> {
    let (vehicles, meta) = VehicleRepository::list(&state.db, &params).await?;
    Ok(Json(ApiResponse::list(vehicles, meta)))
}

/// Single vehicle read handler.
///
/// # Route
///
/// `GET /v1/vehicles/{public_id}`
pub async fn get_vehicle_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    validate_public_id(&public_id)?;

    let vehicle = VehicleRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(ApiResponse::record(vehicle)))
}

/// Vehicle update handler.
///
/// # Route
///
/// `PUT /v1/vehicles/{public_id}`
pub async fn update_vehicle_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    // Status strings are constrained to the vehicle status set
    if let Some(status) = &req_body.status {
        status.parse::<VehicleStatus>()?;
    }

    let changes = VehicleChanges {
        plate_number: req_body.plate_number,
        make: req_body.make,
        model: req_body.model,
        year: req_body.year,
        status: req_body.status,
    };
    let vehicle = VehicleRepository::update(&state.db, &public_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(ApiResponse::record(vehicle)))
}

/// Vehicle soft-delete handler.
///
/// # Route
///
/// `DELETE /v1/vehicles/{public_id}`
pub async fn delete_vehicle_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    validate_public_id(&public_id)?;

    if !VehicleRepository::soft_delete(&state.db, &public_id).await? {
        return Err(AppError::NotFound("Vehicle not found".to_string()));
    }

    Ok(Json(ApiResponse::record(
        json!({"id": public_id, "deleted": true}),
    )))
}
