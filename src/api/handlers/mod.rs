//! HTTP request handler module.

pub mod auth;
pub mod drivers;
pub mod health;
pub mod orders;
pub mod places;
pub mod vehicles;
pub mod webhooks;

pub use auth::auth_token_handler;
pub use drivers::{
    create_driver_handler, delete_driver_handler, driver_status_handler,
    get_driver_handler, get_driver_location_handler, list_drivers_handler,
    update_driver_handler, update_driver_location_handler,
};
pub use health::{health_handler, readiness_handler, HealthResponse, ReadinessResponse};
pub use orders::{
    assign_driver_handler, create_order_handler, delete_order_handler, get_order_handler,
    list_orders_handler, order_status_handler, update_order_handler,
};
pub use places::{
    create_place_handler, delete_place_handler, get_place_handler, list_places_handler,
    update_place_handler,
};
pub use vehicles::{
    create_vehicle_handler, delete_vehicle_handler, get_vehicle_handler, list_vehicles_handler,
    update_vehicle_handler,
};
pub use webhooks::{
    create_webhook_endpoint_handler, delete_webhook_endpoint_handler,
    get_webhook_endpoint_handler, list_webhook_endpoints_handler,
    update_webhook_endpoint_handler,
};
