//! Event type definitions.
//!
//! Every state change the platform announces is an [`Event`]: one JSON
//! payload delivered both to registered webhook endpoints and to
//! WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::utils::public_id::{generate_public_id, EVENT_PREFIX};

/// Names of every event the platform emits.
pub mod names {
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_UPDATED: &str = "order.updated";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    pub const ORDER_ASSIGNED: &str = "order.assigned";
    pub const ORDER_COMPLETED: &str = "order.completed";
    pub const ORDER_CANCELLED: &str = "order.cancelled";
    pub const DRIVER_LOCATION_UPDATED: &str = "driver.location_updated";
    pub const DRIVER_STATUS_CHANGED: &str = "driver.status_changed";

    /// The full event set, used to validate webhook endpoint subscriptions.
    pub const ALL: &[&str] = &[
        ORDER_CREATED,
        ORDER_UPDATED,
        ORDER_STATUS_CHANGED,
        ORDER_ASSIGNED,
        ORDER_COMPLETED,
        ORDER_CANCELLED,
        DRIVER_LOCATION_UPDATED,
        DRIVER_STATUS_CHANGED,
    ];
}

/// WebSocket feed carrying every order event.
pub const ORDERS_CHANNEL: &str = "orders";

/// WebSocket feed carrying every driver event.
pub const DRIVERS_CHANNEL: &str = "drivers";

/// A state-change notification.
///
/// Serializes to the webhook payload shape `{id, event, created_at,
/// data}`; the channel list drives WebSocket fan-out and is not part of
/// the payload.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: String,
    pub event: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub channels: Vec<String>,
    pub data: Value,
}

impl Event {
    /// Creates an event published on the orders feed and the order's own
    /// public id channel.
    #[must_use]
    pub fn for_order(name: &str, order_public_id: &str, data: Value) -> Self {
        Self::new(
            name,
            vec![ORDERS_CHANNEL.to_string(), order_public_id.to_string()],
            data,
        )
    }

    /// Creates an event published on the drivers feed and the driver's own
    /// public id channel.
    #[must_use]
    pub fn for_driver(name: &str, driver_public_id: &str, data: Value) -> Self {
        Self::new(
            name,
            vec![DRIVERS_CHANNEL.to_string(), driver_public_id.to_string()],
            data,
        )
    }

    #[must_use]
    pub fn new(name: &str, channels: Vec<String>, data: Value) -> Self {
        Self {
            id: generate_public_id(EVENT_PREFIX),
            event: name.to_string(),
            created_at: Utc::now(),
            channels,
            data,
        }
    }
}
