//! Driver handlers.
//!
//! CRUD plus duty status and position updates. The latest position fix
//! is written through to Redis so the console's live map never has to
//! touch the database.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use deadpool_redis::redis::AsyncCommands;
use serde_json::json;
use validator::Validate;

use crate::api::schemas::{
    ApiResponse, CreateDriverRequest, DriverLocationRequest, DriverStatusRequest,
    UpdateDriverRequest,
};
use crate::api::state::AppState;
use crate::config::APP_CONFIG;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::events::{names, Event};
use crate::models::{
    Driver, DriverChanges, DriverLocation, DriverRepository, DriverStatus, NewDriver,
    VehicleRepository,
};
use crate::utils::public_id::{generate_public_id, DRIVER_PREFIX};
use crate::utils::validate_public_id;

fn location_cache_key(public_id: &str) -> String {
    format!("drivers:location:{public_id}")
}

/// Ensures a referenced vehicle exists before wiring it onto a driver.
async fn require_vehicle(state: &AppState, public_id: &str) -> AppResult<()> {
    if VehicleRepository::find_by_public_id(&state.db, public_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation {
            message: format!("vehicle: '{public_id}' does not exist"),
            details: Some(json!({"vehicle": [format!("'{public_id}' does not exist")]})),
        });
    }
    Ok(())
}

/// Moves a driver to a new duty status and announces the change.
///
/// A no-op when the driver is already in that status, so assignment and
/// release flows never emit spurious events.
pub(crate) async fn transition_driver_status(
    state: &AppState,
    public_id: &str,
    status: DriverStatus,
) -> AppResult<Option<Driver>> {
    let Some(driver) = DriverRepository::find_by_public_id(&state.db, public_id).await? else {
        return Ok(None);
    };

    if driver.status == status.as_str() {
        return Ok(Some(driver));
    }

    let previous = driver.status.clone();
    let updated = DriverRepository::set_status(&state.db, public_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    let mut data = serde_json::to_value(&updated)?;
    data["previous_status"] = json!(previous);
    state.events.publish(Event::for_driver(
        names::DRIVER_STATUS_CHANGED,
        &updated.public_id,
        data,
    ));

    Ok(Some(updated))
}

/// Driver creation handler.
///
/// # Route
///
/// `POST /v1/drivers`
pub async fn create_driver_handler(
    State(state): State<AppState>,
    Json(req_body): Json<CreateDriverRequest>,
) -> AppResult<impl IntoResponse> {
    // 1. Validation
    req_body.validate().map_err(|e| e.to_validation_error())?;
    if let Some(vehicle) = &req_body.vehicle {
        require_vehicle(&state, vehicle).await?;
    }

    // 2. Insert in `offline` status
    let new_driver = NewDriver {
        public_id: generate_public_id(DRIVER_PREFIX),
        name: req_body.name,
        phone: req_body.phone.filter(|s| !s.is_empty()),
        vehicle: req_body.vehicle,
    };
    let driver = DriverRepository::create(&state.db, &new_driver).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::record(driver))))
}

/// Driver list handler with filters and pagination.
///
/// # Route
///
/// `GET /v1/drivers`
pub async fn list_drivers_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<Driver>>>> {
    let (drivers, meta) = DriverRepository::list(&state.db, &params).await?;
    Ok(Json(ApiResponse::list(drivers, meta)))
}

/// Single driver read handler.
///
/// # Route
///
/// `GET /v1/drivers/{public_id}`
pub async fn get_driver_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    validate_public_id(&public_id)?;

    let driver = DriverRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    Ok(Json(ApiResponse::record(driver)))
}

/// Driver update handler.
///
/// # Route
///
/// `PUT /v1/drivers/{public_id}`
pub async fn update_driver_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<UpdateDriverRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    if let Some(vehicle) = &req_body.vehicle {
        require_vehicle(&state, vehicle).await?;
    }

    let changes = DriverChanges {
        name: req_body.name,
        phone: req_body.phone,
        vehicle: req_body.vehicle,
    };
    let driver = DriverRepository::update(&state.db, &public_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    Ok(Json(ApiResponse::record(driver)))
}

/// Driver soft-delete handler.
///
/// # Route
///
/// `DELETE /v1/drivers/{public_id}`
pub async fn delete_driver_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    validate_public_id(&public_id)?;

    if !DriverRepository::soft_delete(&state.db, &public_id).await? {
        return Err(AppError::NotFound("Driver not found".to_string()));
    }

    Ok(Json(ApiResponse::record(
        json!({"id": public_id, "deleted": true}),
    )))
}

/// Driver duty status handler.
///
/// # Route
///
/// `POST /v1/drivers/{public_id}/status`
pub async fn driver_status_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<DriverStatusRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;
    let status: DriverStatus = req_body.status.parse()?;

    let driver = transition_driver_status(&state, &public_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    Ok(Json(ApiResponse::record(driver)))
}

/// Driver position update handler.
///
/// Stores the fix, writes it through to the cache, and emits
/// `driver.location_updated`.
///
/// # Route
///
/// `POST /v1/drivers/{public_id}/location`
pub async fn update_driver_location_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<DriverLocationRequest>,
) -> AppResult<Json<ApiResponse<DriverLocation>>> {
    // 1. Validation
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    let latitude = req_body
        .latitude
        .ok_or_else(|| AppError::validation("Latitude is required"))?;
    let longitude = req_body
        .longitude
        .ok_or_else(|| AppError::validation("Longitude is required"))?;

    // 2. Store the fix
    let driver = DriverRepository::set_location(
        &state.db,
        &public_id,
        latitude,
        longitude,
        req_body.heading,
        req_body.speed,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    let location = DriverLocation::from_driver(&driver)
        .ok_or_else(|| AppError::Internal("location missing after update".to_string()))?;

    // 3. Write-through cache for the live map
    if let Ok(mut conn) = state.cache.get().await {
        match rmp_serde::to_vec(&location) {
            Ok(data) => {
                let cache_key = location_cache_key(&public_id);
                let cache_result: Result<(), deadpool_redis::redis::RedisError> = conn
                    .set_ex(&cache_key, data, APP_CONFIG.location_ttl_secs)
                    .await;

                if let Err(e) = cache_result {
                    tracing::error!(
                        cache_key = %cache_key,
                        error = %e,
                        "Failed to cache driver location"
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    driver = %public_id,
                    error = %e,
                    "Failed to serialize driver location for cache"
                );
            }
        }
    }

    // 4. Announce
    state.events.publish(Event::for_driver(
        names::DRIVER_LOCATION_UPDATED,
        &public_id,
        serde_json::to_value(&location)?,
    ));

    Ok(Json(ApiResponse::record(location)))
}

/// Latest driver position read handler.
///
/// Serves from the cache, falling back to the stored row.
///
/// # Route
///
/// `GET /v1/drivers/{public_id}/location`
pub async fn get_driver_location_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<DriverLocation>>> {
    validate_public_id(&public_id)?;

    // 1. Check cache
    if let Ok(mut conn) = state.cache.get().await {
        if let Ok(cached_val) = conn
            .get::<_, Vec<u8>>(location_cache_key(&public_id))
            .await
        {
            if let Ok(location) = rmp_serde::from_slice::<DriverLocation>(&cached_val) {
                return Ok(Json(ApiResponse::record(location)));
            }
        }
    }

    // 2. Fall back to the stored row
    let driver = DriverRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    let location = DriverLocation::from_driver(&driver)
        .ok_or_else(|| AppError::NotFound("No location fix recorded".to_string()))?;

    Ok(Json(ApiResponse::record(location)))
}
