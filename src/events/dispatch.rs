//! Webhook delivery.
//!
//! Events are POSTed to every active endpoint whose subscription matches.
//! Delivery runs on spawned tasks gated by a global semaphore; each
//! delivery retries transport failures and non-2xx responses with
//! exponential backoff before giving up.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::config::APP_CONFIG;
use crate::error::AppResult;
use crate::events::types::Event;
use crate::models::{WebhookEndpoint, WebhookEndpointRepository};

/// Global HTTP client with timeout, connection pooling, and pre-configured headers.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(Duration::from_secs(APP_CONFIG.webhook_timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(60))
        .default_headers(default_headers)
        .build()
        .expect("Failed to create HTTP client")
});

/// Semaphore to limit concurrent webhook deliveries.
static WEBHOOK_SEMAPHORE: Lazy<Arc<Semaphore>> =
    Lazy::new(|| Arc::new(Semaphore::new(APP_CONFIG.webhook_max_concurrent)));

/// Spawns delivery tasks for every matching endpoint.
///
/// Runs off the request path; failures are logged, never surfaced to the
/// API caller.
pub fn spawn_deliveries(db: PgPool, event: Event) {
    tokio::spawn(async move {
        let endpoints = match WebhookEndpointRepository::find_active(&db).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::error!(
                    event = %event.event,
                    error = %e,
                    "Failed to load webhook endpoints, dropping event deliveries"
                );
                return;
            }
        };

        for endpoint in endpoints {
            if !endpoint.subscribes_to(&event.event) {
                continue;
            }
            spawn_delivery(endpoint, event.clone());
        }
    });
}

/// Spawns one gated delivery task for a single endpoint.
fn spawn_delivery(endpoint: WebhookEndpoint, event: Event) {
    let semaphore = WEBHOOK_SEMAPHORE.clone();

    tokio::spawn(async move {
        // Try to acquire permit, skip if queue is full
        let Ok(permit) = semaphore.try_acquire() else {
            tracing::warn!(
                endpoint = %endpoint.public_id,
                event = %event.event,
                "Webhook queue full, skipping delivery"
            );
            return;
        };

        if let Err(e) = deliver_with_retry(&endpoint, &event).await {
            tracing::warn!(
                endpoint = %endpoint.public_id,
                event = %event.event,
                error = %e,
                "Webhook delivery failed after retries"
            );
        }

        drop(permit);
    });
}

/// POSTs the event payload, retrying with exponential backoff.
async fn deliver_with_retry(endpoint: &WebhookEndpoint, event: &Event) -> AppResult<()> {
    let max_attempts = APP_CONFIG.webhook_max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let backoff = Duration::from_millis(
                APP_CONFIG.webhook_backoff_base_ms.saturating_mul(1 << (attempt - 1)),
            );
            tokio::time::sleep(backoff).await;
        }

        match HTTP_CLIENT.post(&endpoint.url).json(event).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(
                    endpoint = %endpoint.public_id,
                    event = %event.event,
                    attempt = attempt + 1,
                    "Webhook delivered"
                );
                return Ok(());
            }
            Ok(response) => {
                tracing::warn!(
                    endpoint = %endpoint.public_id,
                    event = %event.event,
                    status = %response.status().as_u16(),
                    attempt = attempt + 1,
                    "Webhook returned non-success status"
                );
                last_error = Some(crate::error::AppError::Internal(format!(
                    "endpoint returned status {}",
                    response.status().as_u16()
                )));
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint.public_id,
                    event = %event.event,
                    error = %e,
                    attempt = attempt + 1,
                    "Webhook request error"
                );
                last_error = Some(e.into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| crate::error::AppError::Internal("no delivery attempted".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule_doubles() {
        // attempt 1 waits base, attempt 2 waits 2*base, ...
        let base = APP_CONFIG.webhook_backoff_base_ms;
        let waits: Vec<u64> = (1..4).map(|attempt| base * (1 << (attempt - 1))).collect();
        assert_eq!(waits, vec![base, base * 2, base * 4]);
    }

    #[test]
    fn test_http_client_initializes() {
        // Force the Lazy so a bad builder chain would fail tests
        let _client = &*HTTP_CLIENT;
    }

    #[tokio::test]
    async fn test_semaphore_respects_capacity() {
        let semaphore = WEBHOOK_SEMAPHORE.clone();
        let available = semaphore.available_permits();
        let permit = semaphore.try_acquire().expect("permit available");
        assert_eq!(semaphore.available_permits(), available - 1);
        drop(permit);
        assert_eq!(semaphore.available_permits(), available);
    }
}
