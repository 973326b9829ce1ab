//! Order handlers.
//!
//! CRUD plus the two lifecycle operations: driver assignment and status
//! transitions. Single-record reads are served through the Redis cache;
//! every mutation invalidates the cached record and publishes the
//! matching event on the bus.

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

use crate::api::handlers::drivers::transition_driver_status;
use crate::api::schemas::{
    ApiResponse, AssignDriverRequest, CreateOrderRequest, OrderStatusRequest, UpdateOrderRequest,
};
use crate::api::state::AppState;
use crate::config::APP_CONFIG;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::events::{names, Event};
use crate::models::{
    DriverRepository, DriverStatus, NewOrder, Order, OrderChanges, OrderRepository, OrderStatus,
    PlaceRepository,
};
use crate::utils::public_id::{generate_public_id, ORDER_PREFIX};
use crate::utils::validate_public_id;

fn order_cache_key(public_id: &str) -> String {
    format!("orders:{public_id}")
}

/// Stores the record in the cache; failures only cost future cache hits.
async fn cache_order(state: &AppState, order: &Order) {
    let Ok(mut conn) = state.cache.get().await else {
        return;
    };

    match rmp_serde::to_vec(order) {
        Ok(data) => {
            let cache_key = order_cache_key(&order.public_id);
            let cache_result: Result<(), deadpool_redis::redis::RedisError> = conn
                .set_ex(&cache_key, data, APP_CONFIG.cache_ttl_secs)
                .await;

            if let Err(e) = cache_result {
                tracing::error!(
                    cache_key = %cache_key,
                    error = %e,
                    "Failed to cache order - DB load may increase"
                );
            }
        }
        Err(e) => {
            tracing::error!(
                order = %order.public_id,
                error = %e,
                "Failed to serialize order for cache"
            );
        }
    }
}

/// Drops the cached record after a mutation.
async fn invalidate_order_cache(state: &AppState, public_id: &str) {
    let Ok(mut conn) = state.cache.get().await else {
        return;
    };

    let cache_key = order_cache_key(public_id);
    if let Err(e) = conn.del::<_, i64>(&cache_key).await {
        tracing::error!(
            cache_key = %cache_key,
            error = %e,
            "Failed to invalidate order cache"
        );
    }
}

/// Ensures a referenced place exists before wiring it into an order.
async fn require_place(state: &AppState, public_id: &str, field: &str) -> AppResult<()> {
    if PlaceRepository::find_by_public_id(&state.db, public_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation {
            message: format!("{field}: place '{public_id}' does not exist"),
            details: Some(json!({field: [format!("place '{public_id}' does not exist")]})),
        });
    }
    Ok(())
}

/// Order creation handler.
///
/// # Route
///
/// `POST /v1/orders`
pub async fn create_order_handler(
    State(state): State<AppState>,
    Json(req_body): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    // 1. Validation
    req_body.validate().map_err(|e| e.to_validation_error())?;
    require_place(&state, &req_body.pickup_place, "pickup_place").await?;
    require_place(&state, &req_body.dropoff_place, "dropoff_place").await?;

    // 2. Insert in `created` status
    let new_order = NewOrder {
        public_id: generate_public_id(ORDER_PREFIX),
        pickup_place: req_body.pickup_place,
        dropoff_place: req_body.dropoff_place,
        customer_name: req_body.customer_name.filter(|s| !s.is_empty()),
        scheduled_at: req_body.scheduled_at,
        notes: req_body.notes.filter(|s| !s.is_empty()),
    };
    let order = OrderRepository::create(&state.db, &new_order).await?;

    // 3. Announce
    state.events.publish(Event::for_order(
        names::ORDER_CREATED,
        &order.public_id,
        serde_json::to_value(&order)?,
    ));

    Ok((StatusCode::CREATED, Json(ApiResponse::record(order))))
}

/// Order list handler with filters and pagination.
///
/// # Route
///
/// `GET /v1/orders`
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let (orders, meta) = OrderRepository::list(&state.db, &params).await?;
    Ok(Json(ApiResponse::list(orders, meta)))
}

/// Single order read handler, served through the cache.
///
/// # Route
///
/// `GET /v1/orders/{public_id}`
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    // 1. Validation
    validate_public_id(&public_id)?;

    // 2. Check cache (MessagePack format for speed)
    if let Ok(mut conn) = state.cache.get().await {
        if let Ok(cached_val) = conn.get::<_, Vec<u8>>(order_cache_key(&public_id)).await {
            if let Ok(order) = rmp_serde::from_slice::<Order>(&cached_val) {
                return Ok(Json(ApiResponse::record(order)));
            }
        }
    }

    // 3. If not in cache, query DB
    let order = OrderRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // 4. Save to cache
    cache_order(&state, &order).await;

    Ok(Json(ApiResponse::record(order)))
}

/// Order update handler.
///
/// # Route
///
/// `PUT /v1/orders/{public_id}`
pub async fn update_order_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    // 1. Validation
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    if let Some(pickup_place) = &req_body.pickup_place {
        require_place(&state, pickup_place, "pickup_place").await?;
    }
    if let Some(dropoff_place) = &req_body.dropoff_place {
        require_place(&state, dropoff_place, "dropoff_place").await?;
    }

    // 2. Apply the partial update
    let changes = OrderChanges {
        pickup_place: req_body.pickup_place,
        dropoff_place: req_body.dropoff_place,
        customer_name: req_body.customer_name,
        scheduled_at: req_body.scheduled_at,
        notes: req_body.notes,
    };
    let order = OrderRepository::update(&state.db, &public_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // 3. Invalidate and announce
    invalidate_order_cache(&state, &public_id).await;
    state.events.publish(Event::for_order(
        names::ORDER_UPDATED,
        &order.public_id,
        serde_json::to_value(&order)?,
    ));

    Ok(Json(ApiResponse::record(order)))
}

/// Order soft-delete handler.
///
/// # Route
///
/// `DELETE /v1/orders/{public_id}`
pub async fn delete_order_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    validate_public_id(&public_id)?;

    if !OrderRepository::soft_delete(&state.db, &public_id).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }

    invalidate_order_cache(&state, &public_id).await;

    Ok(Json(ApiResponse::record(
        json!({"id": public_id, "deleted": true}),
    )))
}

/// Driver assignment handler.
///
/// Records the driver on the order, emits `order.assigned`, and puts the
/// driver on duty.
///
/// # Route
///
/// `POST /v1/orders/{public_id}/assign`
pub async fn assign_driver_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<AssignDriverRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    // 1. Validation
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;

    let order = OrderRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let status = order.parsed_status()?;
    if status.is_terminal() {
        return Err(AppError::validation(format!(
            "cannot assign a driver to a {status} order"
        )));
    }

    if DriverRepository::find_by_public_id(&state.db, &req_body.driver)
        .await?
        .is_none()
    {
        return Err(AppError::Validation {
            message: format!("driver: '{}' does not exist", req_body.driver),
            details: Some(json!({"driver": [format!("'{}' does not exist", req_body.driver)]})),
        });
    }

    // 2. Record the assignment
    let order = OrderRepository::assign_driver(&state.db, &public_id, &req_body.driver)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // 3. Invalidate and announce
    invalidate_order_cache(&state, &public_id).await;
    state.events.publish(Event::for_order(
        names::ORDER_ASSIGNED,
        &order.public_id,
        serde_json::to_value(&order)?,
    ));

    // 4. The assigned driver goes on duty
    transition_driver_status(&state, &req_body.driver, DriverStatus::OnDuty).await?;

    Ok(Json(ApiResponse::record(order)))
}

/// Order status transition handler.
///
/// Validates the lifecycle, emits `order.status_changed` on every
/// transition plus the terminal `order.completed` / `order.cancelled`
/// events, and releases an assigned driver on terminal transitions.
///
/// # Route
///
/// `POST /v1/orders/{public_id}/status`
pub async fn order_status_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<OrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    // 1. Validation
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;
    let requested: OrderStatus = req_body.status.parse()?;

    let order = OrderRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let current = order.parsed_status()?;

    // 2. Lifecycle checks
    if !current.can_transition_to(requested) {
        return Err(AppError::validation(format!(
            "cannot transition order from {current} to {requested}"
        )));
    }
    if requested == OrderStatus::InProgress && order.driver.is_none() {
        return Err(AppError::validation(
            "order cannot start without an assigned driver",
        ));
    }

    // 3. Write the new status
    let updated = OrderRepository::set_status(&state.db, &public_id, requested)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // 4. Invalidate and announce
    invalidate_order_cache(&state, &public_id).await;

    let mut data = serde_json::to_value(&updated)?;
    data["previous_status"] = json!(current.as_str());
    state
        .events
        .publish(Event::for_order(names::ORDER_STATUS_CHANGED, &updated.public_id, data));

    match requested {
        OrderStatus::Completed => {
            state.events.publish(Event::for_order(
                names::ORDER_COMPLETED,
                &updated.public_id,
                serde_json::to_value(&updated)?,
            ));
        }
        OrderStatus::Canceled => {
            state.events.publish(Event::for_order(
                names::ORDER_CANCELLED,
                &updated.public_id,
                serde_json::to_value(&updated)?,
            ));
        }
        _ => {}
    }

    // 5. Terminal transitions release the driver
    if requested.is_terminal() {
        if let Some(driver) = &updated.driver {
            transition_driver_status(&state, driver, DriverStatus::Available).await?;
        }
    }

    Ok(Json(ApiResponse::record(updated)))
}
