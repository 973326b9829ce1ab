//! Place handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::api::schemas::{ApiResponse, CreatePlaceRequest, UpdatePlaceRequest};
use crate::api::state::AppState;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::models::{NewPlace, Place, PlaceChanges, PlaceRepository};
use crate::utils::public_id::{generate_public_id, PLACE_PREFIX};
use crate::utils::validate_public_id;

/// Place creation handler.
///
/// # Route
///
/// `POST /v1/places`
pub async fn create_place_handler(
    State(state): State<AppState>,
    Json(req_body): Json<CreatePlaceRequest>,
) -> AppResult<impl IntoResponse> {
    req_body.validate().map_err(|e| e.to_validation_error())?;

    let new_place = NewPlace {
        public_id: generate_public_id(PLACE_PREFIX),
        name: req_body.name,
        street1: req_body.street1.filter(|s| !s.is_empty()),
        city: req_body.city.filter(|s| !s.is_empty()),
        country: req_body.country.filter(|s| !s.is_empty()),
        postal_code: req_body.postal_code.filter(|s| !s.is_empty()),
        latitude: req_body.latitude,
        longitude: req_body.longitude,
    };
    let place = PlaceRepository::create(&state.db, &new_place).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::record(place))))
}

/// Place list handler with filters and pagination.
///
/// # Route
///
/// `GET /v1/places`
pub async fn list_places_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<Place>>>> {
    let (places, meta) = PlaceRepository::list(&state.db, &params).await?;
    Ok(Json(ApiResponse::list(places, meta)))
}

/// Single place read handler.
///
/// # Route
///
/// `GET /v1/places/{public_id}`
pub async fn get_place_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<Place>>> {
    validate_public_id(&public_id)?;

    let place = PlaceRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Place not found".to_string()))?;

    Ok(Json(ApiResponse::record(place)))
}

/// Place update handler.
///
/// # Route
///
/// `PUT /v1/places/{public_id}`
pub async fn update_place_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<UpdatePlaceRequest>,
) -> AppResult<Json<ApiResponse<Place>>> {
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    let changes = PlaceChanges {
        name: req_body.name,
        street1: req_body.street1,
        city: req_body.city,
        country: req_body.country,
        postal_code: req_body.postal_code,
        latitude: req_body.latitude,
        longitude: req_body.longitude,
    };
    let place = PlaceRepository::update(&state.db, &public_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Place not found".to_string()))?;

    Ok(Json(ApiResponse::record(place)))
}

/// Place soft-delete handler.
///
/// # Route
///
/// `DELETE /v1/places/{public_id}`
pub async fn delete_place_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    validate_public_id(&public_id)?;

    if !PlaceRepository::soft_delete(&state.db, &public_id).await? {
        return Err(AppError::NotFound("Place not found".to_string()));
    }

    Ok(Json(ApiResponse::record(
        json!({"id": public_id, "deleted": true}),
    )))
}
