//! Public identifier generation module.
//!
//! Every API resource is addressed by a human-readable public ID
//! (e.g. `ORD-3hK9dQwP`) that is distinct from its internal record id.

use rand::Rng;

/// Number of Base62 characters in the random suffix.
pub const SUFFIX_LEN: usize = 8;

/// Public ID prefix for orders.
pub const ORDER_PREFIX: &str = "ORD";
/// Public ID prefix for drivers.
pub const DRIVER_PREFIX: &str = "DRV";
/// Public ID prefix for vehicles.
pub const VEHICLE_PREFIX: &str = "VEH";
/// Public ID prefix for places.
pub const PLACE_PREFIX: &str = "PLC";
/// Public ID prefix for webhook endpoints.
pub const WEBHOOK_PREFIX: &str = "WHK";
/// Public ID prefix for emitted events.
pub const EVENT_PREFIX: &str = "EVT";

/// Generates a public ID with the given resource prefix.
///
/// The suffix is a fixed-width Base62 encoding of a random value, so
/// every ID has the shape `<PREFIX>-<8 base62 chars>`.
#[must_use]
pub fn generate_public_id(prefix: &str) -> String {
    // Range chosen so the Base62 encoding is exactly SUFFIX_LEN chars
    let lo = 62u64.pow(u32::try_from(SUFFIX_LEN).unwrap_or(8) - 1);
    let hi = 62u64.pow(u32::try_from(SUFFIX_LEN).unwrap_or(8));
    let n = rand::thread_rng().gen_range(lo..hi);
    format!("{prefix}-{}", base62::encode(n))
}

/// Validates the shape of a public ID path parameter.
///
/// # Validation Rules
///
/// - Must be `<PREFIX>-<suffix>` with a non-empty alphanumeric suffix
/// - Total length is bounded to keep the value index-friendly
pub fn validate_public_id(public_id: &str) -> Result<(), crate::error::AppError> {
    const MAX_LEN: usize = 24;

    if public_id.len() > MAX_LEN {
        return Err(crate::error::AppError::BadRequest(format!(
            "public id must be at most {MAX_LEN} characters long"
        )));
    }

    let Some((prefix, suffix)) = public_id.split_once('-') else {
        return Err(crate::error::AppError::BadRequest(
            "public id must have the form PREFIX-suffix".to_string(),
        ));
    };

    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(crate::error::AppError::BadRequest(
            "public id prefix must be uppercase letters".to_string(),
        ));
    }

    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(crate::error::AppError::BadRequest(
            "public id suffix must be alphanumeric".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_public_id_shape() {
        let id = generate_public_id(ORDER_PREFIX);
        assert!(id.starts_with("ORD-"));
        assert_eq!(id.len(), ORDER_PREFIX.len() + 1 + SUFFIX_LEN);
    }

    #[test]
    fn test_generate_public_id_suffix_is_base62() {
        let id = generate_public_id(DRIVER_PREFIX);
        let suffix = id.split_once('-').unwrap().1;
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_public_id_uniqueness() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| generate_public_id(PLACE_PREFIX))
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generate_public_id_all_prefixes() {
        for prefix in [
            ORDER_PREFIX,
            DRIVER_PREFIX,
            VEHICLE_PREFIX,
            PLACE_PREFIX,
            WEBHOOK_PREFIX,
            EVENT_PREFIX,
        ] {
            let id = generate_public_id(prefix);
            assert!(validate_public_id(&id).is_ok(), "invalid id: {id}");
        }
    }

    // ============ validate_public_id ============

    #[test]
    fn test_validate_public_id_valid() {
        assert!(validate_public_id("ORD-3hK9dQwP").is_ok());
        assert!(validate_public_id("DRV-a1B2c3D4").is_ok());
    }

    #[test]
    fn test_validate_public_id_missing_separator() {
        assert!(validate_public_id("ORD3hK9dQwP").is_err());
    }

    #[test]
    fn test_validate_public_id_empty() {
        assert!(validate_public_id("").is_err());
    }

    #[test]
    fn test_validate_public_id_empty_suffix() {
        assert!(validate_public_id("ORD-").is_err());
    }

    #[test]
    fn test_validate_public_id_lowercase_prefix() {
        assert!(validate_public_id("ord-3hK9dQwP").is_err());
    }

    #[test]
    fn test_validate_public_id_special_chars() {
        assert!(validate_public_id("ORD-abc!def").is_err());
        assert!(validate_public_id("ORD-abc def").is_err());
        assert!(validate_public_id("ORD-abc/def").is_err());
    }

    #[test]
    fn test_validate_public_id_too_long() {
        let long = format!("ORD-{}", "a".repeat(40));
        assert!(validate_public_id(&long).is_err());
    }

    #[test]
    fn test_validate_public_id_unicode() {
        assert!(validate_public_id("ORD-한글").is_err());
    }
}
