//! Request/response schema module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::query::PageMeta;

/// Success envelope: `{"data": ..., "meta": {...}}`.
///
/// `meta` is present on list responses only.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    /// Wraps a single record.
    pub const fn record(data: T) -> Self {
        Self { data, meta: None }
    }

    /// Wraps a page of records with its pagination metadata.
    pub const fn list(data: T, meta: PageMeta) -> Self {
        Self {
            data,
            meta: Some(meta),
        }
    }
}

// ============ auth ============

/// API key to token exchange request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthTokenRequest {
    #[validate(length(min = 1, message = "API key is required"))]
    pub api_key: String,

    /// Requested role; defaults to `admin`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Token exchange response.
#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub role: String,
    pub expires_in: i64,
}

// ============ orders ============

/// Order creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 24, message = "Pickup place is required"))]
    pub pickup_place: String,

    #[validate(length(min = 1, max = 24, message = "Dropoff place is required"))]
    pub dropoff_place: String,

    #[validate(length(max = 255, message = "Customer name must be at most 255 characters"))]
    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Order update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 24, message = "Invalid pickup place"))]
    #[serde(default)]
    pub pickup_place: Option<String>,

    #[validate(length(min = 1, max = 24, message = "Invalid dropoff place"))]
    #[serde(default)]
    pub dropoff_place: Option<String>,

    #[validate(length(max = 255, message = "Customer name must be at most 255 characters"))]
    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Driver assignment request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignDriverRequest {
    #[validate(length(min = 1, max = 24, message = "Driver public ID is required"))]
    pub driver: String,
}

/// Order status transition request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

// ============ drivers ============

/// Driver creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    #[serde(default)]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 24, message = "Invalid vehicle public ID"))]
    #[serde(default)]
    pub vehicle: Option<String>,
}

/// Driver update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 255, message = "Invalid name"))]
    #[serde(default)]
    pub name: Option<String>,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    #[serde(default)]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 24, message = "Invalid vehicle public ID"))]
    #[serde(default)]
    pub vehicle: Option<String>,
}

/// Driver duty status request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DriverStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

/// Driver position update request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DriverLocationRequest {
    #[validate(
        required(message = "Latitude is required"),
        range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90")
    )]
    pub latitude: Option<f64>,

    #[validate(
        required(message = "Longitude is required"),
        range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180")
    )]
    pub longitude: Option<f64>,

    #[validate(range(min = 0.0, max = 360.0, message = "Heading must be between 0 and 360"))]
    #[serde(default)]
    pub heading: Option<f64>,

    #[validate(range(min = 0.0, message = "Speed must be non-negative"))]
    #[serde(default)]
    pub speed: Option<f64>,
}

// ============ vehicles ============

/// Vehicle creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 16, message = "Plate number is required"))]
    pub plate_number: String,

    #[validate(length(max = 64, message = "Make must be at most 64 characters"))]
    #[serde(default)]
    pub make: Option<String>,

    #[validate(length(max = 64, message = "Model must be at most 64 characters"))]
    #[serde(default)]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2100, message = "Year is out of range"))]
    #[serde(default)]
    pub year: Option<i32>,
}

/// Vehicle update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 16, message = "Invalid plate number"))]
    #[serde(default)]
    pub plate_number: Option<String>,

    #[validate(length(max = 64, message = "Make must be at most 64 characters"))]
    #[serde(default)]
    pub make: Option<String>,

    #[validate(length(max = 64, message = "Model must be at most 64 characters"))]
    #[serde(default)]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2100, message = "Year is out of range"))]
    #[serde(default)]
    pub year: Option<i32>,

    /// Operational status; validated against the vehicle status set.
    #[serde(default)]
    pub status: Option<String>,
}

// ============ places ============

/// Place creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePlaceRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 255, message = "Street must be at most 255 characters"))]
    #[serde(default)]
    pub street1: Option<String>,

    #[validate(length(max = 128, message = "City must be at most 128 characters"))]
    #[serde(default)]
    pub city: Option<String>,

    #[validate(length(max = 64, message = "Country must be at most 64 characters"))]
    #[serde(default)]
    pub country: Option<String>,

    #[validate(length(max = 16, message = "Postal code must be at most 16 characters"))]
    #[serde(default)]
    pub postal_code: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[serde(default)]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Place update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePlaceRequest {
    #[validate(length(min = 1, max = 255, message = "Invalid name"))]
    #[serde(default)]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Street must be at most 255 characters"))]
    #[serde(default)]
    pub street1: Option<String>,

    #[validate(length(max = 128, message = "City must be at most 128 characters"))]
    #[serde(default)]
    pub city: Option<String>,

    #[validate(length(max = 64, message = "Country must be at most 64 characters"))]
    #[serde(default)]
    pub country: Option<String>,

    #[validate(length(max = 16, message = "Postal code must be at most 16 characters"))]
    #[serde(default)]
    pub postal_code: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[serde(default)]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    #[serde(default)]
    pub longitude: Option<f64>,
}

// ============ webhook endpoints ============

/// Webhook endpoint registration request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWebhookEndpointRequest {
    #[validate(url(message = "Invalid webhook URL"))]
    pub url: String,

    /// Subscribed event names; empty subscribes to all events.
    #[serde(default)]
    pub events: Vec<String>,
}

/// Webhook endpoint update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWebhookEndpointRequest {
    #[validate(url(message = "Invalid webhook URL"))]
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub events: Option<Vec<String>>,

    #[serde(default)]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    // ============ ApiResponse ============

    #[test]
    fn test_record_envelope_has_no_meta() {
        let response = ApiResponse::record(serde_json::json!({"id": "ORD-abc12345"}));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"]["id"], "ORD-abc12345");
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_list_envelope_carries_meta() {
        let response = ApiResponse::list(
            serde_json::json!([]),
            PageMeta::Offset {
                total: 0,
                page: 1,
                limit: 25,
            },
        );
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["data"].is_array());
        assert_eq!(json["meta"]["total"], 0);
        assert_eq!(json["meta"]["page"], 1);
    }

    // ============ auth ============

    #[test]
    fn test_auth_token_request_requires_key() {
        let req = AuthTokenRequest {
            api_key: String::new(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_auth_token_request_deserialize_without_role() {
        let req: AuthTokenRequest =
            serde_json::from_str(r#"{"api_key": "fleet-dev-key"}"#).unwrap();
        assert_eq!(req.api_key, "fleet-dev-key");
        assert!(req.role.is_none());
    }

    // ============ orders ============

    #[test]
    fn test_create_order_request_valid() {
        let req = CreateOrderRequest {
            pickup_place: "PLC-aaaa1111".to_string(),
            dropoff_place: "PLC-bbbb2222".to_string(),
            customer_name: Some("Acme".to_string()),
            scheduled_at: None,
            notes: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_order_request_missing_pickup() {
        let req = CreateOrderRequest {
            pickup_place: String::new(),
            dropoff_place: "PLC-bbbb2222".to_string(),
            customer_name: None,
            scheduled_at: None,
            notes: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_order_request_notes_too_long() {
        let req = CreateOrderRequest {
            pickup_place: "PLC-aaaa1111".to_string(),
            dropoff_place: "PLC-bbbb2222".to_string(),
            customer_name: None,
            scheduled_at: None,
            notes: Some("a".repeat(2001)),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_order_request_deserialize_minimal() {
        let json = r#"{"pickup_place": "PLC-aaaa1111", "dropoff_place": "PLC-bbbb2222"}"#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.pickup_place, "PLC-aaaa1111");
        assert!(req.customer_name.is_none());
        assert!(req.scheduled_at.is_none());
    }

    #[test]
    fn test_create_order_request_deserialize_scheduled_at() {
        let json = r#"{
            "pickup_place": "PLC-aaaa1111",
            "dropoff_place": "PLC-bbbb2222",
            "scheduled_at": "2026-08-10T09:00:00Z"
        }"#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert!(req.scheduled_at.is_some());
    }

    #[test]
    fn test_update_order_request_empty_is_valid() {
        let req = UpdateOrderRequest::default();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_assign_driver_request_requires_driver() {
        let req = AssignDriverRequest {
            driver: String::new(),
        };
        assert!(req.validate().is_err());
    }

    // ============ drivers ============

    #[test]
    fn test_create_driver_request_valid() {
        let req = CreateDriverRequest {
            name: "Sam Porter".to_string(),
            phone: Some("+61 400 000 000".to_string()),
            vehicle: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_driver_request_empty_name() {
        let req = CreateDriverRequest {
            name: String::new(),
            phone: None,
            vehicle: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_driver_location_request_valid() {
        let req = DriverLocationRequest {
            latitude: Some(-33.8688),
            longitude: Some(151.2093),
            heading: Some(270.0),
            speed: Some(16.7),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_driver_location_request_missing_coordinates() {
        let req = DriverLocationRequest {
            latitude: None,
            longitude: None,
            heading: None,
            speed: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_driver_location_request_latitude_out_of_range() {
        let req = DriverLocationRequest {
            latitude: Some(91.0),
            longitude: Some(0.0),
            heading: None,
            speed: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_driver_location_request_longitude_out_of_range() {
        let req = DriverLocationRequest {
            latitude: Some(0.0),
            longitude: Some(-180.5),
            heading: None,
            speed: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_driver_location_request_negative_speed() {
        let req = DriverLocationRequest {
            latitude: Some(0.0),
            longitude: Some(0.0),
            heading: None,
            speed: Some(-1.0),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_driver_location_request_boundary_values() {
        let req = DriverLocationRequest {
            latitude: Some(90.0),
            longitude: Some(-180.0),
            heading: Some(0.0),
            speed: Some(0.0),
        };
        assert!(req.validate().is_ok());
    }

    // ============ vehicles ============

    #[test]
    fn test_create_vehicle_request_valid() {
        let req = CreateVehicleRequest {
            plate_number: "XYZ-123".to_string(),
            make: Some("Volvo".to_string()),
            model: Some("FH16".to_string()),
            year: Some(2022),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_vehicle_request_year_out_of_range() {
        let req = CreateVehicleRequest {
            plate_number: "XYZ-123".to_string(),
            make: None,
            model: None,
            year: Some(1900),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_vehicle_request_plate_too_long() {
        let req = CreateVehicleRequest {
            plate_number: "X".repeat(17),
            make: None,
            model: None,
            year: None,
        };
        assert!(req.validate().is_err());
    }

    // ============ places ============

    #[test]
    fn test_create_place_request_valid() {
        let req = CreatePlaceRequest {
            name: "Harbour Depot".to_string(),
            street1: Some("1 Wharf Rd".to_string()),
            city: Some("Sydney".to_string()),
            country: Some("AU".to_string()),
            postal_code: Some("2000".to_string()),
            latitude: Some(-33.8568),
            longitude: Some(151.2153),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_place_request_latitude_out_of_range() {
        let req = CreatePlaceRequest {
            name: "Bad pin".to_string(),
            street1: None,
            city: None,
            country: None,
            postal_code: None,
            latitude: Some(-90.5),
            longitude: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_place_request_deserialize_name_only() {
        let req: CreatePlaceRequest = serde_json::from_str(r#"{"name": "Depot"}"#).unwrap();
        assert_eq!(req.name, "Depot");
        assert!(req.latitude.is_none());
    }

    // ============ webhook endpoints ============

    #[test]
    fn test_create_webhook_endpoint_request_valid() {
        let req = CreateWebhookEndpointRequest {
            url: "https://hooks.example.com/fleet".to_string(),
            events: vec!["order.created".to_string()],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_webhook_endpoint_request_invalid_url() {
        let req = CreateWebhookEndpointRequest {
            url: "not-a-url".to_string(),
            events: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_webhook_endpoint_request_deserialize_default_events() {
        let req: CreateWebhookEndpointRequest =
            serde_json::from_str(r#"{"url": "https://hooks.example.com"}"#).unwrap();
        assert!(req.events.is_empty());
    }

    #[test]
    fn test_update_webhook_endpoint_request_empty_is_valid() {
        let req = UpdateWebhookEndpointRequest::default();
        assert!(req.validate().is_ok());
    }
}
