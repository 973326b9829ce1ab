//! Application state module.
//!
//! Contains shared state for database, cache, and the event bus.

use deadpool_redis::Pool as RedisPool;
use sqlx::PgPool;

use crate::events::EventBus;

/// Shared application state.
///
/// This struct holds references to shared resources like database and
/// cache connections plus the event bus that handlers publish to.
#[derive(Clone)]
pub struct AppState {
    /// `PostgreSQL` connection pool
    pub db: PgPool,
    /// Redis connection pool
    pub cache: RedisPool,
    /// In-process event bus
    pub events: EventBus,
}

impl AppState {
    /// Creates a new `AppState` instance.
    #[must_use]
    pub fn new(db: PgPool, cache: RedisPool) -> Self {
        let events = EventBus::new(db.clone());
        Self { db, cache, events }
    }
}
