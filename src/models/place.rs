//! Place model module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppResult;
use crate::query::{FieldKind, FilterField, Identifiable};

/// Columns selected for every place query.
pub const PLACE_COLUMNS: &str = "id, public_id, name, street1, city, country, postal_code, \
     latitude, longitude, created_at, updated_at, deleted_at";

/// Fields accepted as list filters on `/v1/places`.
pub const PLACE_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("name", FieldKind::Text),
    FilterField::new("city", FieldKind::Text),
    FilterField::new("country", FieldKind::Text),
    FilterField::new("postal_code", FieldKind::Text),
    FilterField::new("latitude", FieldKind::Float),
    FilterField::new("longitude", FieldKind::Float),
    FilterField::new("created_at", FieldKind::Timestamp),
];

/// Place model struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Place {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    pub street1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identifiable for Place {
    fn internal_id(&self) -> i64 {
        self.id
    }
}

/// Struct for creating a new place record.
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub public_id: String,
    pub name: String,
    pub street1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Partial update applied by `PUT /v1/places/{id}`.
#[derive(Debug, Clone, Default)]
pub struct PlaceChanges {
    pub name: Option<String>,
    pub street1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Place repository for database operations.
pub struct PlaceRepository;

impl PlaceRepository {
    pub async fn create(pool: &sqlx::PgPool, new_place: &NewPlace) -> AppResult<Place> {
        let place = sqlx::query_as::<_, Place>(&format!(
            r"
            INSERT INTO places (public_id, name, street1, city, country, postal_code,
                                latitude, longitude, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {PLACE_COLUMNS}
            "
        ))
        .bind(&new_place.public_id)
        .bind(&new_place.name)
        .bind(&new_place.street1)
        .bind(&new_place.city)
        .bind(&new_place.country)
        .bind(&new_place.postal_code)
        .bind(new_place.latitude)
        .bind(new_place.longitude)
        .fetch_one(pool)
        .await?;

        Ok(place)
    }

    pub async fn find_by_public_id(
        pool: &sqlx::PgPool,
        public_id: &str,
    ) -> AppResult<Option<Place>> {
        let place = sqlx::query_as::<_, Place>(&format!(
            r"
            SELECT {PLACE_COLUMNS}
            FROM places
            WHERE public_id = $1 AND deleted_at IS NULL
            LIMIT 1
            "
        ))
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

        Ok(place)
    }

    pub async fn list(
        pool: &sqlx::PgPool,
        raw: &std::collections::HashMap<String, String>,
    ) -> AppResult<(Vec<Place>, crate::query::PageMeta)> {
        crate::query::fetch_page(pool, "places", PLACE_COLUMNS, PLACE_FILTER_FIELDS, raw).await
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        public_id: &str,
        changes: &PlaceChanges,
    ) -> AppResult<Option<Place>> {
        let place = sqlx::query_as::<_, Place>(&format!(
            r"
            UPDATE places
            SET name = COALESCE($2, name),
                street1 = COALESCE($3, street1),
                city = COALESCE($4, city),
                country = COALESCE($5, country),
                postal_code = COALESCE($6, postal_code),
                latitude = COALESCE($7, latitude),
                longitude = COALESCE($8, longitude),
                updated_at = NOW()
            WHERE public_id = $1 AND deleted_at IS NULL
            RETURNING {PLACE_COLUMNS}
            "
        ))
        .bind(public_id)
        .bind(&changes.name)
        .bind(&changes.street1)
        .bind(&changes.city)
        .bind(&changes.country)
        .bind(&changes.postal_code)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .fetch_optional(pool)
        .await?;

        Ok(place)
    }

    pub async fn soft_delete(pool: &sqlx::PgPool, public_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE places
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

    fn create_test_place() -> Place {
        Place {
            id: 11,
            public_id: "PLC-aaaa1111".to_string(),
            name: "Harbour Depot".to_string(),
            street1: Some("1 Wharf Rd".to_string()),
            city: Some("Sydney".to_string()),
            country: Some("AU".to_string()),
            postal_code: Some("2000".to_string()),
            latitude: Some(-33.8568),
            longitude: Some(151.2153),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_place_serializes_public_id_as_id() {
        let place = create_test_place();
        let json = serde_json::to_value(&place).unwrap();

        assert_eq!(json["id"], "PLC-aaaa1111");
        assert_eq!(json["name"], "Harbour Depot");
        assert_eq!(json["city"], "Sydney");
    }

    #[test]
    fn test_place_identifiable() {
        let place = create_test_place();
        assert_eq!(place.internal_id(), 11);
    }

    #[test]
    fn test_place_minimal_serialization() {
        let place = Place {
            id: 12,
            public_id: "PLC-bbbb2222".to_string(),
            name: "Pin only".to_string(),
            street1: None,
            city: None,
            country: None,
            postal_code: None,
            latitude: None,
            longitude: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&place).unwrap();
        assert!(json["street1"].is_null());
        assert!(json["latitude"].is_null());
    }

    #[test]
    fn test_place_changes_default_is_empty() {
        let changes = PlaceChanges::default();
        assert!(changes.name.is_none());
        assert!(changes.latitude.is_none());
    }

    #[test]
    fn test_filter_fields_include_coordinates_as_float() {
        let latitude = PLACE_FILTER_FIELDS
            .iter()
            .find(|f| f.name == "latitude")
            .expect("latitude filter");
        assert_eq!(latitude.kind, FieldKind::Float);
    }
}
