//! Webhook endpoint handlers.
//!
//! Endpoint registration is plain CRUD; subscriptions are validated
//! against the known event set so a typo never silently subscribes to
//! nothing.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::api::schemas::{ApiResponse, CreateWebhookEndpointRequest, UpdateWebhookEndpointRequest};
use crate::api::state::AppState;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::events::names;
use crate::models::{
    NewWebhookEndpoint, WebhookEndpoint, WebhookEndpointChanges, WebhookEndpointRepository,
};
use crate::utils::public_id::{generate_public_id, WEBHOOK_PREFIX};
use crate::utils::validate_public_id;

/// Rejects subscriptions to event names the platform never emits.
fn validate_event_names(events: &[String]) -> AppResult<()> {
    for event in events {
        if !names::ALL.contains(&event.as_str()) {
            return Err(AppError::Validation {
                message: format!("events: '{event}' is not a known event"),
                details: Some(json!({"events": [format!("'{event}' is not a known event")]})),
            });
        }
    }
    Ok(())
}

/// Webhook endpoint registration handler.
///
/// # Route
///
/// `POST /v1/webhook-endpoints`
pub async fn create_webhook_endpoint_handler(
    State(state): State<AppState>,
    Json(req_body): Json<CreateWebhookEndpointRequest>,
) -> AppResult<impl IntoResponse> {
    req_body.validate().map_err(|e| e.to_validation_error())?;
    validate_event_names(&req_body.events)?;

    let new_endpoint = NewWebhookEndpoint {
        public_id: generate_public_id(WEBHOOK_PREFIX),
        url: req_body.url,
        events: req_body.events,
    };
    let endpoint = WebhookEndpointRepository::create(&state.db, &new_endpoint).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::record(endpoint))))
}

/// Webhook endpoint list handler.
///
/// # Route
///
/// `GET /v1/webhook-endpoints`
pub async fn list_webhook_endpoints_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<WebhookEndpoint>>>> {
    let (endpoints, meta) = WebhookEndpointRepository::list(&state.db, &params).await?;
    Ok(Json(ApiResponse::list(endpoints, meta)))
}

/// Single webhook endpoint read handler.
///
/// # Route
///
/// `GET /v1/webhook-endpoints/{public_id}`
pub async fn get_webhook_endpoint_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<WebhookEndpoint>>> {
    validate_public_id(&public_id)?;

    let endpoint = WebhookEndpointRepository::find_by_public_id(&state.db, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Webhook endpoint not found".to_string()))?;

    Ok(Json(ApiResponse::record(endpoint)))
}

/// Webhook endpoint update handler.
///
/// # Route
///
/// `PUT /v1/webhook-endpoints/{public_id}`
pub async fn update_webhook_endpoint_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req_body): Json<UpdateWebhookEndpointRequest>,
) -> AppResult<Json<ApiResponse<WebhookEndpoint>>> {
    validate_public_id(&public_id)?;
    req_body.validate().map_err(|e| e.to_validation_error())?;
    if let Some(events) = &req_body.events {
        validate_event_names(events)?;
    }

    let changes = WebhookEndpointChanges {
        url: req_body.url,
        events: req_body.events,
        is_active: req_body.is_active,
    };
    let endpoint = WebhookEndpointRepository::update(&state.db, &public_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Webhook endpoint not found".to_string()))?;

    Ok(Json(ApiResponse::record(endpoint)))
}

/// Webhook endpoint soft-delete handler.
///
/// # Route
///
/// `DELETE /v1/webhook-endpoints/{public_id}`
pub async fn delete_webhook_endpoint_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    validate_public_id(&public_id)?;

    if !WebhookEndpointRepository::soft_delete(&state.db, &public_id).await? {
        return Err(AppError::NotFound("Webhook endpoint not found".to_string()));
    }

    Ok(Json(ApiResponse::record(
        json!({"id": public_id, "deleted": true}),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_event_names_accepts_known() {
        let events = vec![
            "order.created".to_string(),
            "driver.location_updated".to_string(),
        ];
        assert!(validate_event_names(&events).is_ok());
    }

    #[test]
    fn test_validate_event_names_accepts_empty() {
        assert!(validate_event_names(&[]).is_ok());
    }

    #[test]
    fn test_validate_event_names_rejects_unknown() {
        let events = vec!["order.exploded".to_string()];
        let result = validate_event_names(&events);
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_validate_event_names_rejects_mixed() {
        let events = vec!["order.created".to_string(), "bogus".to_string()];
        assert!(validate_event_names(&events).is_err());
    }
}
