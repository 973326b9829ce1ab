//! Vehicle model module.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};
use crate::query::{FieldKind, FilterField, Identifiable};

/// Columns selected for every vehicle query.
pub const VEHICLE_COLUMNS: &str =
    "id, public_id, plate_number, make, model, year, status, created_at, updated_at, deleted_at";

/// Fields accepted as list filters on `/v1/vehicles`.
pub const VEHICLE_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("plate_number", FieldKind::Text),
    FilterField::new("make", FieldKind::Text),
    FilterField::new("model", FieldKind::Text),
    FilterField::new("year", FieldKind::Int),
    FilterField::new("status", FieldKind::Text),
    FilterField::new("created_at", FieldKind::Timestamp),
];

/// Vehicle operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Active,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "maintenance" => Ok(Self::Maintenance),
            "retired" => Ok(Self::Retired),
            other => Err(AppError::validation(format!(
                "'{other}' is not a valid vehicle status"
            ))),
        }
    }
}

/// Vehicle model struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub plate_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identifiable for Vehicle {
    fn internal_id(&self) -> i64 {
        self.id
    }
}

/// Struct for creating a new vehicle record.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub public_id: String,
    pub plate_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

/// Partial update applied by `PUT /v1/vehicles/{id}`.
#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub plate_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub status: Option<String>,
}

/// Vehicle repository for database operations.
pub struct VehicleRepository;

impl VehicleRepository {
    /// Inserts a new vehicle in `active` status.
    pub async fn create(pool: &sqlx::PgPool, new_vehicle: &NewVehicle) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r"
            INSERT INTO vehicles (public_id, plate_number, make, model, year, status,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {VEHICLE_COLUMNS}
            "
        ))
        .bind(&new_vehicle.public_id)
        .bind(&new_vehicle.plate_number)
        .bind(&new_vehicle.make)
        .bind(&new_vehicle.model)
        .bind(new_vehicle.year)
        .bind(VehicleStatus::Active.as_str())
        .fetch_one(pool)
        .await?;

        Ok(vehicle)
    }

    /// Finds a live vehicle by its public ID.
    pub async fn find_by_public_id(
        pool: &sqlx::PgPool,
        public_id: &str,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r"
            SELECT {VEHICLE_COLUMNS}
            FROM vehicles
            WHERE public_id = $1 AND deleted_at IS NULL
            LIMIT 1
            "
        ))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Lists vehicles with filters and pagination.
    pub async fn list(
        pool: &sqlx::PgPool,
        raw: &std::collections::HashMap<String, String>,
    ) -> AppResult<(Vec<Vehicle>, crate::query::PageMeta)> {
        crate::query::fetch_page(pool, "vehicles", VEHICLE_COLUMNS, VEHICLE_FILTER_FIELDS, raw)
            .await
    }

    /// Applies a partial update; absent fields keep their value.
    pub async fn update(
        pool: &sqlx::PgPool,
        public_id: &str,
        changes: &VehicleChanges,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r"
            UPDATE vehicles
            SET plate_number = COALESCE($2, plate_number),
                make = COALESCE($3, make),
                model = COALESCE($4, model),
                year = COALESCE($5, year),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {VEHICLE_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(&changes.plate_number)
        .bind(&changes.make)
        .bind(&changes.model)
        .bind(changes.year)
        .bind(&changes.status)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Soft-deletes a vehicle; returns false when it does not exist.
    pub async fn soft_delete(pool: &sqlx::PgPool, public_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE vehicles
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

    fn create_test_vehicle() -> Vehicle {
        Vehicle {
            id: 3,
            public_id: "VEH-dddd4444".to_string(),
            plate_number: "XYZ-123".to_string(),
            make: Some("Volvo".to_string()),
            model: Some("FH16".to_string()),
            year: Some(2022),
            status: "active".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            VehicleStatus::Active,
            VehicleStatus::Maintenance,
            VehicleStatus::Retired,
        ] {
            assert_eq!(status.as_str().parse::<VehicleStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!("parked".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn test_vehicle_serializes_public_id_as_id() {
        let vehicle = create_test_vehicle();
        let json = serde_json::to_value(&vehicle).unwrap();

        assert_eq!(json["id"], "VEH-dddd4444");
        assert_eq!(json["plate_number"], "XYZ-123");
        assert_eq!(json["year"], 2022);
    }

    #[test]
    fn test_vehicle_identifiable() {
        let vehicle = create_test_vehicle();
        assert_eq!(vehicle.internal_id(), 3);
    }

    #[test]
    fn test_vehicle_changes_default_is_empty() {
        let changes = VehicleChanges::default();
        assert!(changes.plate_number.is_none());
        assert!(changes.status.is_none());
    }

    #[test]
    fn test_filter_fields_include_year_as_int() {
        let year = VEHICLE_FILTER_FIELDS
            .iter()
            .find(|f| f.name == "year")
            .expect("year filter");
        assert_eq!(year.kind, FieldKind::Int);
    }
}
