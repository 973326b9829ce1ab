//! Utility module.

pub mod jwt;
pub mod public_id;

pub use jwt::{gen_token, parse_token, Claims, ROLE_ADMIN, ROLE_VIEWER};
pub use public_id::{generate_public_id, validate_public_id};
