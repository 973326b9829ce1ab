//! Driver model module.
//!
//! Contains the driver entity, its duty status, the latest-position
//! cache payload, and the repository for database operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};
use crate::query::{FieldKind, FilterField, Identifiable};

/// Columns selected for every driver query.
pub const DRIVER_COLUMNS: &str = "id, public_id, name, phone, status, vehicle, latitude, \
     longitude, heading, speed, located_at, created_at, updated_at, deleted_at";

/// Fields accepted as list filters on `/v1/drivers`.
pub const DRIVER_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("name", FieldKind::Text),
    FilterField::new("phone", FieldKind::Text),
    FilterField::new("status", FieldKind::Text),
    FilterField::new("vehicle", FieldKind::Text),
    FilterField::new("created_at", FieldKind::Timestamp),
    FilterField::new("updated_at", FieldKind::Timestamp),
];

/// Driver duty status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Available,
    OnDuty,
    Offline,
}

impl DriverStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OnDuty => "on_duty",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "on_duty" => Ok(Self::OnDuty),
            "offline" => Ok(Self::Offline),
            other => Err(AppError::validation(format!(
                "'{other}' is not a valid driver status"
            ))),
        }
    }
}

/// Driver model struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub status: String,
    /// Public ID of the assigned vehicle, if any.
    pub vehicle: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub located_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identifiable for Driver {
    fn internal_id(&self) -> i64 {
        self.id
    }
}

/// Latest position fix, as cached in Redis and served by
/// `GET /v1/drivers/{id}/location`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverLocation {
    pub driver: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub located_at: DateTime<Utc>,
}

impl DriverLocation {
    /// Builds the cache payload from a stored driver row, when it has a
    /// position at all.
    #[must_use]
    pub fn from_driver(driver: &Driver) -> Option<Self> {
        Some(Self {
            driver: driver.public_id.clone(),
            latitude: driver.latitude?,
            longitude: driver.longitude?,
            heading: driver.heading,
            speed: driver.speed,
            located_at: driver.located_at?,
        })
    }
}

/// Struct for creating a new driver record.
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub public_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
}

/// Partial update applied by `PUT /v1/drivers/{id}`.
#[derive(Debug, Clone, Default)]
pub struct DriverChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
}

/// Driver repository for database operations.
pub struct DriverRepository;

impl DriverRepository {
    /// Inserts a new driver in `offline` status.
    pub async fn create(pool: &sqlx::PgPool, new_driver: &NewDriver) -> AppResult<Driver> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r"
            INSERT INTO drivers (public_id, name, phone, status, vehicle, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(&new_driver.public_id)
        .bind(&new_driver.name)
        .bind(&new_driver.phone)
        .bind(DriverStatus::Offline.as_str())
        .bind(&new_driver.vehicle)
        .fetch_one(pool)
        .await?;

        Ok(driver)
    }

    /// Finds a live driver by its public ID.
    pub async fn find_by_public_id(
        pool: &sqlx::PgPool,
        public_id: &str,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r"
            SELECT {DRIVER_COLUMNS}
            FROM drivers
            WHERE public_id = $1 AND deleted_at IS NULL
            LIMIT 1
            "
        ))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

        Ok(driver)
    }

    /// Lists drivers with filters and pagination.
    pub async fn list(
        pool: &sqlx::PgPool,
        raw: &std::collections::HashMap<String, String>,
    ) -> AppResult<(Vec<Driver>, crate::query::PageMeta)> {
        crate::query::fetch_page(pool, "drivers", DRIVER_COLUMNS, DRIVER_FILTER_FIELDS, raw).await
    }

    /// Applies a partial update; absent fields keep their value.
    pub async fn update(
        pool: &sqlx::PgPool,
        public_id: &str,
        changes: &DriverChanges,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r"
            UPDATE drivers
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                vehicle = COALESCE($4, vehicle),
                updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(&changes.name)
        .bind(&changes.phone)
        .bind(&changes.vehicle)
        .fetch_optional(pool)
        .await?;

        Ok(driver)
    }

    /// Soft-deletes a driver; returns false when it does not exist.
    pub async fn soft_delete(pool: &sqlx::PgPool, public_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE drivers
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(public_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes a new duty status.
    pub async fn set_status(
        pool: &sqlx::PgPool,
        public_id: &str,
        status: DriverStatus,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r"
            UPDATE drivers
            SET status = $2, updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(driver)
    }

    /// Stores a position fix on the driver row.
    pub async fn set_location(
        pool: &sqlx::PgPool,
        public_id: &str,
        latitude: f64,
        longitude: f64,
        heading: Option<f64>,
        speed: Option<f64>,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r"
            UPDATE drivers
            SET latitude = $2, longitude = $3, heading = $4, speed = $5,
                located_at = NOW(), updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(latitude)
        .bind(longitude)
        .bind(heading)
        .bind(speed)
        .fetch_optional(pool)
        .await?;

        Ok(driver)
    }
}
