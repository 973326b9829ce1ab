//! Webhook endpoint model module.
//!
//! Registered endpoints receive event payloads by POST. An endpoint with
//! an empty event list subscribes to everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::AppResult;
use crate::query::{FieldKind, FilterField, Identifiable};

/// Columns selected for every webhook endpoint query.
pub const WEBHOOK_ENDPOINT_COLUMNS: &str =
    "id, public_id, url, events, is_active, created_at, updated_at, deleted_at";

/// Fields accepted as list filters on `/v1/webhook-endpoints`.
pub const WEBHOOK_ENDPOINT_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("url", FieldKind::Text),
    FilterField::new("is_active", FieldKind::Bool),
    FilterField::new("created_at", FieldKind::Timestamp),
];

/// Webhook endpoint model struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEndpoint {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub url: String,
    /// Subscribed event names; empty subscribes to all events.
    pub events: Json<Vec<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WebhookEndpoint {
    /// Whether this endpoint wants the named event.
    #[must_use]
    pub fn subscribes_to(&self, event_name: &str) -> bool {
        self.events.0.is_empty() || self.events.0.iter().any(|e| e == event_name)
    }
}

impl Identifiable for WebhookEndpoint {
    fn internal_id(&self) -> i64 {
        self.id
    }
}

/// Struct for creating a new webhook endpoint record.
#[derive(Debug, Clone)]
pub struct NewWebhookEndpoint {
    pub public_id: String,
    pub url: String,
    pub events: Vec<String>,
}

/// Partial update applied by `PUT /v1/webhook-endpoints/{id}`.
#[derive(Debug, Clone, Default)]
pub struct WebhookEndpointChanges {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Webhook endpoint repository for database operations.
pub struct WebhookEndpointRepository;

impl WebhookEndpointRepository {
    pub async fn create(
        pool: &sqlx::PgPool,
        new_endpoint: &NewWebhookEndpoint,
    ) -> AppResult<WebhookEndpoint> {
        let endpoint = sqlx::query_as::<_, WebhookEndpoint>(&format!(
            r"
            INSERT INTO webhook_endpoints (public_id, url, events, is_active,
                                           created_at, updated_at)
            VALUES ($1, $2, $3, true, NOW(), NOW())
            RETURNING {WEBHOOK_ENDPOINT_COLUMNS}
            "
        ))
        .bind(&new_endpoint.public_id)
        .bind(&new_endpoint.url)
        .bind(Json(&new_endpoint.events))
        .fetch_one(pool)
        .await?;

        Ok(endpoint)
    }

    pub async fn find_by_public_id(
        pool: &sqlx::PgPool,
        public_id: &str,
    ) -> AppResult<Option<WebhookEndpoint>> {
        let endpoint = sqlx::query_as::<_, WebhookEndpoint>(&format!(
            r"
            SELECT {WEBHOOK_ENDPOINT_COLUMNS}
            FROM webhook_endpoints
            WHERE public_id = $1 AND deleted_at IS NULL
            LIMIT 1
            "
        ))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

        Ok(endpoint)
    }

    pub async fn list(
        pool: &sqlx::PgPool,
        raw: &std::collections::HashMap<String, String>,
    ) -> AppResult<(Vec<WebhookEndpoint>, crate::query::PageMeta)> {
        crate::query::fetch_page(
            pool,
            "webhook_endpoints",
            WEBHOOK_ENDPOINT_COLUMNS,
            WEBHOOK_ENDPOINT_FILTER_FIELDS,
            raw,
        )
        .await
    }

    /// All live, active endpoints eligible for delivery.
    pub async fn find_active(pool: &sqlx::PgPool) -> AppResult<Vec<WebhookEndpoint>> {
        let endpoints = sqlx::query_as::<_, WebhookEndpoint>(&format!(
            r"
            SELECT {WEBHOOK_ENDPOINT_COLUMNS}
            FROM webhook_endpoints
            WHERE deleted_at IS NULL AND is_active = true
            "
        ))
        .fetch_all(pool)
        .await?;

        Ok(endpoints)
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        public_id: &str,
        changes: &WebhookEndpointChanges,
    ) -> AppResult<Option<WebhookEndpoint>> {
        let endpoint = sqlx::query_as::<_, WebhookEndpoint>(&format!(
            r"
            UPDATE webhook_endpoints
            SET url = COALESCE($2, url),
                events = COALESCE($3, events),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {WEBHOOK_ENDPOINT_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(&changes.url)
        .bind(changes.events.as_ref().map(Json))
        .bind(changes.is_active)
        .fetch_optional(pool)
        .await?;

        Ok(endpoint)
    }

    pub async fn soft_delete(pool: &sqlx::PgPool, public_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE webhook_endpoints
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(public_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_endpoint(events: Vec<&str>) -> WebhookEndpoint {
        WebhookEndpoint {
            id: 5,
            public_id: "WHK-eeee5555".to_string(),
            url: "https://hooks.example.com/fleet".to_string(),
            events: Json(events.into_iter().map(String::from).collect()),
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_empty_event_list_subscribes_to_all() {
        let endpoint = create_test_endpoint(vec![]);
        assert!(endpoint.subscribes_to("order.created"));
        assert!(endpoint.subscribes_to("driver.location_updated"));
    }

    #[test]
    fn test_explicit_event_list_filters() {
        let endpoint = create_test_endpoint(vec!["order.created", "order.completed"]);
        assert!(endpoint.subscribes_to("order.created"));
        assert!(endpoint.subscribes_to("order.completed"));
        assert!(!endpoint.subscribes_to("order.cancelled"));
        assert!(!endpoint.subscribes_to("driver.status_changed"));
    }

    #[test]
    fn test_endpoint_serializes_public_id_as_id() {
        let endpoint = create_test_endpoint(vec!["order.created"]);
        let json = serde_json::to_value(&endpoint).unwrap();

        assert_eq!(json["id"], "WHK-eeee5555");
        assert_eq!(json["url"], "https://hooks.example.com/fleet");
        assert_eq!(json["events"][0], "order.created");
        assert_eq!(json["is_active"], true);
    }

    #[test]
    fn test_endpoint_identifiable() {
        let endpoint = create_test_endpoint(vec![]);
        assert_eq!(endpoint.internal_id(), 5);
    }

    #[test]
    fn test_changes_default_is_empty() {
        let changes = WebhookEndpointChanges::default();
        assert!(changes.url.is_none());
        assert!(changes.events.is_none());
        assert!(changes.is_active.is_none());
    }
}
