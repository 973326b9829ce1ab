//! WebSocket relay module.
//!
//! Consoles connect to `GET /socket`, authenticate with the same JWT as
//! the REST API, and manage their subscriptions with
//! `{"action": "subscribe"|"unsubscribe", "channel": "..."}` frames.
//! Events published on the bus are fanned out to every session
//! subscribed to one of the event's channels.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use crate::api::state::AppState;
use crate::error::{AppError, AppResult};
use crate::events::Event;
use crate::utils::parse_token;

/// Longest accepted channel name; public ids and resource feeds are far
/// shorter.
const MAX_CHANNEL_LEN: usize = 64;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// A client control frame.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    action: String,
    channel: String,
}

/// WebSocket upgrade handler.
///
/// # Route
///
/// `GET /socket`
pub async fn socket_handler(
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    // Browsers cannot set Authorization headers on upgrade requests, so
    // the token travels as a query parameter or cookie
    let token = params
        .token
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let claims = parse_token(&token)?;
    let rx = state.events.subscribe();

    tracing::debug!(subject = %claims.sub, "WebSocket session opened");

    Ok(ws.on_upgrade(move |socket| relay_session(socket, rx)))
}

/// Applies one client control frame to the session's subscription set
/// and returns the reply frame.
fn apply_frame(text: &str, channels: &mut HashSet<String>) -> String {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            return json!({"error": "expected {\"action\", \"channel\"}"}).to_string();
        }
    };

    if frame.channel.is_empty() || frame.channel.len() > MAX_CHANNEL_LEN {
        return json!({"error": "invalid channel name"}).to_string();
    }

    match frame.action.as_str() {
        "subscribe" => {
            channels.insert(frame.channel.clone());
            json!({"action": "subscribe", "channel": frame.channel, "ok": true}).to_string()
        }
        "unsubscribe" => {
            channels.remove(&frame.channel);
            json!({"action": "unsubscribe", "channel": frame.channel, "ok": true}).to_string()
        }
        other => json!({"error": format!("unknown action '{other}'")}).to_string(),
    }
}

/// Builds the outbound frames for one event, one per subscribed channel.
fn event_frames(event: &Event, channels: &HashSet<String>) -> Vec<String> {
    let Ok(base) = serde_json::to_value(event) else {
        return Vec::new();
    };

    event
        .channels
        .iter()
        .filter(|channel| channels.contains(*channel))
        .map(|channel| {
            let mut frame = base.clone();
            frame["channel"] = json!(channel);
            frame.to_string()
        })
        .collect()
}

/// Drives one relay session until the client disconnects or falls behind
/// the bus.
async fn relay_session(mut socket: WebSocket, mut rx: broadcast::Receiver<Event>) {
    let mut channels: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = apply_frame(text.as_str(), &mut channels);
                        if socket.send(Message::Text(reply.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Ping/pong is handled by the protocol layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        for frame in event_frames(&event, &channels) {
                            if socket.send(Message::Text(frame.into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket session lagged, closing");
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("WebSocket session closed");
}
