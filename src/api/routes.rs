//! Route configuration module.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::handlers::{
    assign_driver_handler, auth_token_handler, create_driver_handler, create_order_handler,
    create_place_handler, create_vehicle_handler, create_webhook_endpoint_handler,
    delete_driver_handler, delete_order_handler, delete_place_handler, delete_vehicle_handler,
    delete_webhook_endpoint_handler, driver_status_handler, get_driver_handler,
    get_driver_location_handler, get_order_handler, get_place_handler, get_vehicle_handler,
    get_webhook_endpoint_handler, health_handler, list_drivers_handler, list_orders_handler,
    list_places_handler, list_vehicles_handler, list_webhook_endpoints_handler,
    order_status_handler, readiness_handler, update_driver_handler,
    update_driver_location_handler, update_order_handler, update_place_handler,
    update_vehicle_handler, update_webhook_endpoint_handler,
};
use crate::api::middlewares::jwt_auth;
use crate::api::state::AppState;
use crate::realtime::socket_handler;

/// Creates and configures all application routes.
///
/// # Routes
///
/// ## Health Check Routes
/// - `GET /health` - Liveness probe
/// - `GET /ready` - Readiness probe
///
/// ## Public Routes
/// - `POST /auth/token` - API key to JWT exchange
/// - `GET /socket` - WebSocket relay (token via query or cookie)
///
/// ## API Routes (v1, bearer JWT)
/// CRUD for orders, drivers, vehicles, places and webhook endpoints,
/// plus order assignment/status and driver status/location operations.
pub fn create_routes(state: AppState) -> Router {
    // API v1 routes with JWT authentication
    let v1_routes = Router::new()
        .route("/orders", post(create_order_handler).get(list_orders_handler))
        .route(
            "/orders/{public_id}",
            get(get_order_handler)
                .put(update_order_handler)
                .delete(delete_order_handler),
        )
        .route("/orders/{public_id}/assign", post(assign_driver_handler))
        .route("/orders/{public_id}/status", post(order_status_handler))
        .route(
            "/drivers",
            post(create_driver_handler).get(list_drivers_handler),
        )
        .route(
            "/drivers/{public_id}",
            get(get_driver_handler)
                .put(update_driver_handler)
                .delete(delete_driver_handler),
        )
        .route("/drivers/{public_id}/status", post(driver_status_handler))
        .route(
            "/drivers/{public_id}/location",
            post(update_driver_location_handler).get(get_driver_location_handler),
        )
        .route(
            "/vehicles",
            post(create_vehicle_handler).get(list_vehicles_handler),
        )
        .route(
            "/vehicles/{public_id}",
            get(get_vehicle_handler)
                .put(update_vehicle_handler)
                .delete(delete_vehicle_handler),
        )
        .route(
            "/places",
            post(create_place_handler).get(list_places_handler),
        )
        .route(
            "/places/{public_id}",
            get(get_place_handler)
                .put(update_place_handler)
                .delete(delete_place_handler),
        )
        .route(
            "/webhook-endpoints",
            post(create_webhook_endpoint_handler).get(list_webhook_endpoints_handler),
        )
        .route(
            "/webhook-endpoints/{public_id}",
            get(get_webhook_endpoint_handler)
                .put(update_webhook_endpoint_handler)
                .delete(delete_webhook_endpoint_handler),
        )
        .route_layer(middleware::from_fn(jwt_auth));

    // Main router
    Router::new()
        // Health check routes (no auth required)
        .route("/health", get(health_handler))
        .route("/ready", get(readiness_handler))
        // Token exchange
        .route("/auth/token", post(auth_token_handler))
        // WebSocket relay (authenticates inside the handler)
        .route("/socket", get(socket_handler))
        // API routes
        .nest("/v1", v1_routes)
        // Shared state
        .with_state(state)
}
