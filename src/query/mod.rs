//! List query module.
//!
//! Combines filter compilation and pagination into one helper that every
//! resource repository uses for its list endpoint.

pub mod filter;
pub mod page;

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

pub use filter::{parse_filters, push_conditions, FieldKind, FilterField};
pub use page::{encode_cursor, parse_list_params, ListParams, PageMeta};

use crate::error::AppResult;

/// Implemented by models so cursor pagination can read the internal id
/// of the last row on a page.
pub trait Identifiable {
    fn internal_id(&self) -> i64;
}

/// Runs a filtered, paginated list query against a resource table.
///
/// Soft-deleted rows are always excluded. In offset mode a second count
/// query with the same conditions produces `meta.total`; in cursor mode
/// rows after the decoded id are fetched in ascending id order and
/// `meta.next_cursor` points past the last returned row.
pub async fn fetch_page<T>(
    pool: &PgPool,
    table: &str,
    columns: &str,
    fields: &[FilterField],
    raw: &HashMap<String, String>,
) -> AppResult<(Vec<T>, PageMeta)>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Identifiable + Send + Unpin,
{
    let params = parse_list_params(raw)?;
    let conditions = parse_filters(raw, fields)?;

    if let Some(after) = params.after {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {columns} FROM {table} WHERE deleted_at IS NULL"
        ));
        push_conditions(&mut qb, &conditions);
        qb.push(" AND id > ").push_bind(after);
        qb.push(" ORDER BY id ASC LIMIT ").push_bind(params.limit);

        let rows: Vec<T> = qb.build_query_as().fetch_all(pool).await?;

        let next_cursor = if rows.len() == usize::try_from(params.limit).unwrap_or(usize::MAX) {
            rows.last().map(|r| encode_cursor(r.internal_id()))
        } else {
            None
        };

        let meta = PageMeta::Cursor {
            next_cursor,
            limit: params.limit,
        };
        return Ok((rows, meta));
    }

    let mut count_qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT COUNT(*) FROM {table} WHERE deleted_at IS NULL"
    ));
    push_conditions(&mut count_qb, &conditions);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {columns} FROM {table} WHERE deleted_at IS NULL"
    ));
    push_conditions(&mut qb, &conditions);
    qb.push(" ORDER BY id DESC LIMIT ").push_bind(params.limit);
    qb.push(" OFFSET ").push_bind(params.offset());

    let rows: Vec<T> = qb.build_query_as().fetch_all(pool).await?;

    let meta = PageMeta::Offset {
        total,
        page: params.page,
        limit: params.limit,
    };

    Ok((rows, meta))
}
