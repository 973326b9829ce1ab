//! Realtime module.
//!
//! WebSocket relay pushing state-change events to connected consoles.

pub mod ws;

pub use ws::socket_handler;
