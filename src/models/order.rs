//! Order model module.
//!
//! Contains the order entity, its status lifecycle, and the repository
//! for database operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};
use crate::query::{FieldKind, FilterField, Identifiable};

/// Columns selected for every order query.
pub const ORDER_COLUMNS: &str = "id, public_id, status, pickup_place, dropoff_place, driver, \
     customer_name, scheduled_at, notes, created_at, updated_at, deleted_at";

/// Fields accepted as list filters on `/v1/orders`.
pub const ORDER_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("status", FieldKind::Text),
    FilterField::new("driver", FieldKind::Text),
    FilterField::new("pickup_place", FieldKind::Text),
    FilterField::new("dropoff_place", FieldKind::Text),
    FilterField::new("customer_name", FieldKind::Text),
    FilterField::new("scheduled_at", FieldKind::Timestamp),
    FilterField::new("created_at", FieldKind::Timestamp),
    FilterField::new("updated_at", FieldKind::Timestamp),
];

/// Order lifecycle status.
///
/// The forward path is `created -> dispatched -> in_progress ->
/// completed`; `canceled` is reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Dispatched,
    InProgress,
    Completed,
    Canceled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Dispatched => "dispatched",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Terminal statuses admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// Whether the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Created => matches!(next, Self::Dispatched | Self::Canceled),
            Self::Dispatched => matches!(next, Self::InProgress | Self::Canceled),
            Self::InProgress => matches!(next, Self::Completed | Self::Canceled),
            Self::Completed | Self::Canceled => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "dispatched" => Ok(Self::Dispatched),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(AppError::validation(format!(
                "'{other}' is not a valid order status"
            ))),
        }
    }
}

/// Order model struct.
///
/// Places and drivers are referenced by their public IDs; the internal
/// row id never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub status: String,
    pub pickup_place: String,
    pub dropoff_place: String,
    pub driver: Option<String>,
    pub customer_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Parses the stored status string.
    pub fn parsed_status(&self) -> AppResult<OrderStatus> {
        self.status.parse()
    }
}

impl Identifiable for Order {
    fn internal_id(&self) -> i64 {
        self.id
    }
}

/// Struct for creating a new order record.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub public_id: String,
    pub pickup_place: String,
    pub dropoff_place: String,
    pub customer_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Partial update applied by `PUT /v1/orders/{id}`.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub pickup_place: Option<String>,
    pub dropoff_place: Option<String>,
    pub customer_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Order repository for database operations.
pub struct OrderRepository;

impl OrderRepository {
    /// Inserts a new order in `created` status.
    pub async fn create(pool: &sqlx::PgPool, new_order: &NewOrder) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (
                public_id, status, pickup_place, dropoff_place,
                customer_name, scheduled_at, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&new_order.public_id)
        .bind(OrderStatus::Created.as_str())
        .bind(&new_order.pickup_place)
        .bind(&new_order.dropoff_place)
        .bind(&new_order.customer_name)
        .bind(new_order.scheduled_at)
        .bind(&new_order.notes)
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    /// Finds a live order by its public ID.
    pub async fn find_by_public_id(
        pool: &sqlx::PgPool,
        public_id: &str,
    ) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE public_id = $1 AND deleted_at IS NULL
            LIMIT 1
            "
        ))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Lists orders with filters and pagination.
    pub async fn list(
        pool: &sqlx::PgPool,
        raw: &std::collections::HashMap<String, String>,
    ) -> AppResult<(Vec<Order>, crate::query::PageMeta)> {
        crate::query::fetch_page(pool, "orders", ORDER_COLUMNS, ORDER_FILTER_FIELDS, raw).await
    }

    /// Applies a partial update; absent fields keep their value.
    pub async fn update(
        pool: &sqlx::PgPool,
        public_id: &str,
        changes: &OrderChanges,
    ) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET pickup_place = COALESCE($2, pickup_place),
                dropoff_place = COALESCE($3, dropoff_place),
                customer_name = COALESCE($4, customer_name),
                scheduled_at = COALESCE($5, scheduled_at),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(&changes.pickup_place)
        .bind(&changes.dropoff_place)
        .bind(&changes.customer_name)
        .bind(changes.scheduled_at)
        .bind(&changes.notes)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Soft-deletes an order; returns false when it does not exist.
    pub async fn soft_delete(pool: &sqlx::PgPool, public_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(public_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records the assigned driver's public ID on the order.
    pub async fn assign_driver(
        pool: &sqlx::PgPool,
        public_id: &str,
        driver_public_id: &str,
    ) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET driver = $2, updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(driver_public_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Writes a new lifecycle status. Transition validity is checked by
    /// the handler before this is called.
    pub async fn set_status(
        pool: &sqlx::PgPool,
        public_id: &str,
        status: OrderStatus,
    ) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }
}
