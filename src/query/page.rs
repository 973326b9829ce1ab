//! Pagination parameter parsing and response metadata.
//!
//! Two modes are supported on every list endpoint:
//!
//! - offset mode: `page` (1-based) and `limit`, with a `total` count in
//!   the response meta;
//! - cursor mode: an opaque `cursor` switches the query to keyset
//!   pagination ordered by internal id, and the response meta carries
//!   `next_cursor` (null once the collection is exhausted).

use std::collections::HashMap;

use serde::Serialize;

use crate::config::APP_CONFIG;
use crate::error::{AppError, AppResult};

/// Parsed pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    /// Internal id decoded from the `cursor` parameter, when present.
    pub after: Option<i64>,
}

impl ListParams {
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// List response metadata, matching the pagination mode.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PageMeta {
    Offset { total: i64, page: i64, limit: i64 },
    Cursor { next_cursor: Option<String>, limit: i64 },
}

/// Parses `page`, `limit` and `cursor` out of the raw query parameters.
///
/// `limit` is clamped to the configured maximum; `page` below 1 and
/// malformed cursors are rejected.
pub fn parse_list_params(params: &HashMap<String, String>) -> AppResult<ListParams> {
    let page = match params.get("page") {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| AppError::BadRequest(format!("invalid page '{raw}'")))?,
        None => 1,
    };

    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| AppError::BadRequest(format!("invalid limit '{raw}'")))?
            .min(APP_CONFIG.max_page_limit),
        None => APP_CONFIG.default_page_limit,
    };

    let after = match params.get("cursor") {
        Some(raw) => Some(decode_cursor(raw)?),
        None => None,
    };

    Ok(ListParams { page, limit, after })
}

/// Encodes an internal id as an opaque list cursor.
#[must_use]
pub fn encode_cursor(id: i64) -> String {
    base62::encode(id.unsigned_abs())
}

/// Decodes a list cursor back to an internal id.
pub fn decode_cursor(cursor: &str) -> AppResult<i64> {
    if cursor.is_empty() || !cursor.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(format!("invalid cursor '{cursor}'")));
    }

    base62::decode(cursor)
        .ok()
        .and_then(|n| i64::try_from(n).ok())
        .ok_or_else(|| AppError::BadRequest(format!("invalid cursor '{cursor}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ============ parse_list_params ============

    #[test]
    fn test_defaults() {
        let parsed = parse_list_params(&params(&[])).unwrap();
        assert_eq!(parsed.page, 1);
        assert_eq!(parsed.limit, APP_CONFIG.default_page_limit);
        assert!(parsed.after.is_none());
    }

    #[test]
    fn test_explicit_page_and_limit() {
        let parsed = parse_list_params(&params(&[("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(parsed.page, 3);
        assert_eq!(parsed.limit, 10);
        assert_eq!(parsed.offset(), 20);
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let parsed = parse_list_params(&params(&[("limit", "100000")])).unwrap();
        assert_eq!(parsed.limit, APP_CONFIG.max_page_limit);
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(parse_list_params(&params(&[("page", "0")])).is_err());
    }

    #[test]
    fn test_negative_page_rejected() {
        assert!(parse_list_params(&params(&[("page", "-2")])).is_err());
    }

    #[test]
    fn test_non_numeric_page_rejected() {
        assert!(parse_list_params(&params(&[("page", "two")])).is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(parse_list_params(&params(&[("limit", "0")])).is_err());
    }

    #[test]
    fn test_offset_first_page_is_zero() {
        let parsed = parse_list_params(&params(&[("page", "1"), ("limit", "25")])).unwrap();
        assert_eq!(parsed.offset(), 0);
    }

    // ============ cursors ============

    #[test]
    fn test_cursor_roundtrip() {
        for id in [1i64, 42, 1_000, 987_654_321] {
            let cursor = encode_cursor(id);
            assert_eq!(decode_cursor(&cursor).unwrap(), id);
        }
    }

    #[test]
    fn test_cursor_is_alphanumeric() {
        let cursor = encode_cursor(123_456);
        assert!(cursor.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_cursor_param_decoded() {
        let cursor = encode_cursor(77);
        let parsed = parse_list_params(&params(&[("cursor", cursor.as_str())])).unwrap();
        assert_eq!(parsed.after, Some(77));
    }

    #[test]
    fn test_empty_cursor_rejected() {
        assert!(decode_cursor("").is_err());
    }

    #[test]
    fn test_cursor_with_punctuation_rejected() {
        assert!(decode_cursor("ab-cd").is_err());
        assert!(decode_cursor("ab cd").is_err());
    }

    #[test]
    fn test_cursor_overflow_rejected() {
        // Larger than any i64 id
        let huge = "z".repeat(30);
        assert!(decode_cursor(&huge).is_err());
    }

    // ============ PageMeta serialization ============

    #[test]
    fn test_offset_meta_shape() {
        let meta = PageMeta::Offset {
            total: 120,
            page: 2,
            limit: 25,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["total"], 120);
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 25);
        assert!(json.get("next_cursor").is_none());
    }

    #[test]
    fn test_cursor_meta_shape_with_more() {
        let meta = PageMeta::Cursor {
            next_cursor: Some(encode_cursor(99)),
            limit: 25,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["limit"], 25);
        assert!(json["next_cursor"].is_string());
        assert!(json.get("total").is_none());
    }

    #[test]
    fn test_cursor_meta_shape_exhausted() {
        let meta = PageMeta::Cursor {
            next_cursor: None,
            limit: 25,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json["next_cursor"].is_null());
    }
}
