//! List filter parsing and SQL generation.
//!
//! List endpoints accept `field=op:value` query parameters with the
//! operator set `eq, ne, gt, gte, lt, lte, in, nin, contains, between`.
//! A bare `field=value` is shorthand for `eq`. Filterable fields are
//! whitelisted per resource together with their value kind, and every
//! condition compiles to a parameterized SQL fragment, so user input is
//! never interpolated into the statement text.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};

/// Query keys consumed by pagination rather than filtering.
pub const RESERVED_KEYS: &[&str] = &["page", "limit", "cursor"];

/// Value kind of a filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Int,
    Float,
    Timestamp,
    Bool,
}

/// A whitelisted filterable column.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FilterField {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    Between,
}

impl FilterOp {
    /// Parses an operator prefix; returns `None` for unknown names so the
    /// caller can fall back to treating the whole value as an `eq` operand.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            "nin" => Some(Self::Nin),
            "contains" => Some(Self::Contains),
            "between" => Some(Self::Between),
            _ => None,
        }
    }

    /// SQL comparison token for the scalar operators.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Ne => " <> ",
            Self::Gt => " > ",
            Self::Gte => " >= ",
            Self::Lt => " < ",
            Self::Lte => " <= ",
            // Handled structurally, not via a single comparison token
            Self::In | Self::Nin | Self::Contains | Self::Between => "",
        }
    }
}

/// A parsed filter operand, typed according to the field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

/// One compiled filter condition.
#[derive(Debug, Clone)]
pub struct Condition {
    pub column: &'static str,
    pub op: FilterOp,
    pub values: Vec<FilterValue>,
}

/// Parses all non-reserved query parameters into filter conditions.
///
/// Unknown fields, unparseable values, and operator/kind mismatches are
/// rejected with a 400.
pub fn parse_filters(
    params: &HashMap<String, String>,
    fields: &[FilterField],
) -> AppResult<Vec<Condition>> {
    let mut conditions = Vec::new();

    for (key, raw) in params {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let field = fields
            .iter()
            .find(|f| f.name == key)
            .ok_or_else(|| AppError::BadRequest(format!("unknown filter field '{key}'")))?;

        let (op, operand) = split_operator(raw);
        conditions.push(build_condition(field, op, operand)?);
    }

    // Deterministic condition order regardless of HashMap iteration
    conditions.sort_by_key(|c| c.column);

    Ok(conditions)
}

/// Splits `op:value` into its operator and operand.
///
/// Values may themselves contain colons (RFC 3339 timestamps), so only a
/// recognized operator prefix is treated as one.
fn split_operator(raw: &str) -> (FilterOp, &str) {
    if let Some((prefix, rest)) = raw.split_once(':') {
        if let Some(op) = FilterOp::parse(prefix) {
            return (op, rest);
        }
    }
    (FilterOp::Eq, raw)
}

fn build_condition(field: &FilterField, op: FilterOp, operand: &str) -> AppResult<Condition> {
    let values = match op {
        FilterOp::Contains => {
            if field.kind != FieldKind::Text {
                return Err(AppError::BadRequest(format!(
                    "'contains' is only valid on text fields, not '{}'",
                    field.name
                )));
            }
            vec![FilterValue::Text(operand.to_string())]
        }
        FilterOp::In | FilterOp::Nin => {
            let values: Vec<FilterValue> = operand
                .split(',')
                .filter(|v| !v.is_empty())
                .map(|v| parse_value(field, v))
                .collect::<AppResult<_>>()?;
            if values.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "'in'/'nin' on '{}' requires at least one value",
                    field.name
                )));
            }
            values
        }
        FilterOp::Between => {
            let bounds: Vec<&str> = operand.split(',').collect();
            if bounds.len() != 2 {
                return Err(AppError::BadRequest(format!(
                    "'between' on '{}' requires exactly two comma-separated bounds",
                    field.name
                )));
            }
            vec![parse_value(field, bounds[0])?, parse_value(field, bounds[1])?]
        }
        _ => vec![parse_value(field, operand)?],
    };

    Ok(Condition {
        column: field.name,
        op,
        values,
    })
}

/// Parses a single operand according to the field kind.
fn parse_value(field: &FilterField, raw: &str) -> AppResult<FilterValue> {
    let invalid = || {
        AppError::BadRequest(format!(
            "invalid value '{raw}' for filter field '{}'",
            field.name
        ))
    };

    match field.kind {
        FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
        FieldKind::Int => raw.parse().map(FilterValue::Int).map_err(|_| invalid()),
        FieldKind::Float => raw.parse().map(FilterValue::Float).map_err(|_| invalid()),
        FieldKind::Bool => match raw {
            "true" => Ok(FilterValue::Bool(true)),
            "false" => Ok(FilterValue::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::Timestamp => parse_timestamp(raw).ok_or_else(invalid),
    }
}

/// Accepts RFC 3339 timestamps or bare dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<FilterValue> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(FilterValue::Timestamp(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| FilterValue::Timestamp(DateTime::from_naive_utc_and_offset(dt, Utc)))
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FilterValue::Int(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Float(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Timestamp(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Bool(v) => {
            qb.push_bind(*v);
        }
    }
}

/// Escapes LIKE pattern metacharacters in a `contains` operand.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends `AND <condition>` fragments for every compiled condition.
///
/// Column names come from the per-resource whitelist, values are always
/// bound parameters.
pub fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
    for cond in conditions {
        match cond.op {
            FilterOp::Eq
            | FilterOp::Ne
            | FilterOp::Gt
            | FilterOp::Gte
            | FilterOp::Lt
            | FilterOp::Lte => {
                qb.push(" AND ").push(cond.column).push(cond.op.sql());
                push_value(qb, &cond.values[0]);
            }
            FilterOp::In | FilterOp::Nin => {
                qb.push(" AND ").push(cond.column);
                qb.push(if cond.op == FilterOp::In {
                    " IN ("
                } else {
                    " NOT IN ("
                });
                for (i, value) in cond.values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_value(qb, value);
                }
                qb.push(")");
            }
            FilterOp::Contains => {
                if let FilterValue::Text(v) = &cond.values[0] {
                    qb.push(" AND ").push(cond.column).push(" ILIKE ");
                    qb.push_bind(format!("%{}%", escape_like(v)));
                }
            }
            FilterOp::Between => {
                qb.push(" AND ").push(cond.column).push(" BETWEEN ");
                push_value(qb, &cond.values[0]);
                qb.push(" AND ");
                push_value(qb, &cond.values[1]);
            }
        }
    }
}
