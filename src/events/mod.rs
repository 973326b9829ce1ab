//! Event module.
//!
//! State-change notifications: the event types, the in-process bus, and
//! webhook delivery.

pub mod bus;
pub mod dispatch;
pub mod types;

pub use bus::EventBus;
pub use types::{names, Event, DRIVERS_CHANNEL, ORDERS_CHANNEL};
