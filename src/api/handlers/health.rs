//! Health and readiness probe handlers.

use axum::{extract::State, Json};

use crate::api::state::AppState;

/// Health check response.
#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe handler.
///
/// Returns OK if the server is running. Used for Kubernetes liveness probe.
///
/// # Route
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(serde::Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub cache: &'static str,
}

/// Readiness probe handler.
///
/// Checks database and cache connectivity. Used for Kubernetes readiness probe.
///
/// # Route
///
/// `GET /ready`
pub async fn readiness_handler(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (axum::http::StatusCode, Json<ReadinessResponse>)> {
    // Check database connection
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.db).await.is_ok();

    // Check Redis connection
    let cache_ok = state.cache.get().await.is_ok();

    let response = ReadinessResponse {
        status: if db_ok && cache_ok { "ok" } else { "degraded" },
        database: if db_ok { "connected" } else { "disconnected" },
        cache: if cache_ok {
            "connected"
        } else {
            "disconnected"
        },
    };

    if db_ok && cache_ok {
        Ok(Json(response))
    } else {
        Err((axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let response = health_handler().await;
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn test_health_response_has_version() {
        let response = HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        };
        assert!(!response.version.is_empty());
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "ok",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ok"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_readiness_response_serialize() {
        let response = ReadinessResponse {
            status: "ok",
            database: "connected",
            cache: "connected",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ok"));
        assert!(json.contains("connected"));
    }

    #[test]
    fn test_readiness_response_degraded() {
        let response = ReadinessResponse {
            status: "degraded",
            database: "connected",
            cache: "disconnected",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("degraded"));
        assert!(json.contains("disconnected"));
    }
}
