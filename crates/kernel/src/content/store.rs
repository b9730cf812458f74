//! Content storage backends.
//!
//! Provides the query-execution trait consumed by content handlers and
//! its PostgreSQL implementation.

use anyhow::anyhow;
use async_trait::async_trait;
use sea_query::{Value, Values};
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};
use tracing::debug;

use super::model::Content;
use crate::criteria::{CONTENT_TABLE, ConditionSet, ContentQueryBuilder};
use crate::error::{HandlerError, HandlerResult};

/// Query-execution capability for content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch every record matching the criteria.
    async fn fetch(&self, criteria: &ConditionSet) -> HandlerResult<Vec<Content>>;

    /// Count records matching the criteria, ignoring limit and offset.
    async fn count(&self, criteria: &ConditionSet) -> HandlerResult<i64>;

    /// Fetch `(id, title)` pairs matching the criteria.
    async fn fetch_list(&self, criteria: &ConditionSet) -> HandlerResult<Vec<(i64, String)>>;

    /// Distinct values of the type column.
    async fn distinct_types(&self) -> HandlerResult<Vec<String>>;

    /// Increment a record's view counter. Returns false if no record matched.
    async fn increment_counter(&self, id: i64) -> HandlerResult<bool>;

    /// Flip a record's online status. Returns false if no record matched.
    async fn toggle_online_status(&self, id: i64) -> HandlerResult<bool>;
}

/// PostgreSQL content store.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn fetch(&self, criteria: &ConditionSet) -> HandlerResult<Vec<Content>> {
        let builder = ContentQueryBuilder::new(criteria);
        let (sql, values) = builder.build();
        debug!(sql = %sql, params = values.0.len(), "fetching content");

        let rows = sqlx::query_as_with::<_, Content, _>(&sql, pg_arguments(values)?)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count(&self, criteria: &ConditionSet) -> HandlerResult<i64> {
        let (sql, values) = ContentQueryBuilder::new(criteria).build_count();
        debug!(sql = %sql, params = values.0.len(), "counting content");

        let total: i64 = sqlx::query_scalar_with(&sql, pg_arguments(values)?)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn fetch_list(&self, criteria: &ConditionSet) -> HandlerResult<Vec<(i64, String)>> {
        let (sql, values) = ContentQueryBuilder::new(criteria).build_columns(&["id", "title"]);
        debug!(sql = %sql, params = values.0.len(), "fetching content list");

        let rows = sqlx::query_as_with::<_, (i64, String), _>(&sql, pg_arguments(values)?)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn distinct_types(&self) -> HandlerResult<Vec<String>> {
        let types = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT type FROM {CONTENT_TABLE} ORDER BY type"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    async fn increment_counter(&self, id: i64) -> HandlerResult<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {CONTENT_TABLE} SET counter = counter + 1 WHERE id = $1"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_online_status(&self, id: i64) -> HandlerResult<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(&format!(
            "UPDATE {CONTENT_TABLE} SET online_status = 1 - online_status, last_updated = $1 WHERE id = $2"
        ))
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Convert SeaQuery bind values into sqlx arguments.
///
/// PostgreSQL has no unsigned types, so unsigned values are widened to the
/// next signed type. `u64` values (limit and offset) must fit in `i64`.
pub fn pg_arguments(values: Values) -> HandlerResult<PgArguments> {
    let mut args = PgArguments::default();

    for value in values.0 {
        let added = match value {
            Value::Bool(v) => args.add(v),
            Value::TinyInt(v) => args.add(v.map(i16::from)),
            Value::SmallInt(v) => args.add(v),
            Value::Int(v) => args.add(v),
            Value::BigInt(v) => args.add(v),
            Value::TinyUnsigned(v) => args.add(v.map(i16::from)),
            Value::SmallUnsigned(v) => args.add(v.map(i32::from)),
            Value::Unsigned(v) => args.add(v.map(i64::from)),
            Value::BigUnsigned(v) => {
                let v = v
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|_| anyhow!("unsigned bind value exceeds i64 range"))?;
                args.add(v)
            }
            Value::Float(v) => args.add(v),
            Value::Double(v) => args.add(v),
            Value::String(v) => args.add(v.map(|s| *s)),
            Value::Char(v) => args.add(v.map(String::from)),
            Value::Bytes(v) => args.add(v.map(|b| *b)),
            #[allow(unreachable_patterns)]
            other => return Err(HandlerError::Internal(anyhow!("unsupported bind value: {other:?}"))),
        };
        added.map_err(sqlx::Error::Encode)?;
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::ConditionItem;

    #[test]
    fn arguments_cover_compiled_values() {
        let mut set = ConditionSet::new();
        set.set_type("video").unwrap();
        set.add(ConditionItem::new("id", vec![1, 2], "IN").unwrap());
        set.add(ConditionItem::new("counter", 2.5, ">").unwrap());
        set.set_limit(10).unwrap();
        set.set_offset(5).unwrap();

        let (_, values) = ContentQueryBuilder::new(&set).build();
        let args = pg_arguments(values).unwrap();
        assert_eq!(args.len(), 6);
    }

    #[test]
    fn oversized_unsigned_is_rejected() {
        let values = Values(vec![Value::BigUnsigned(Some(u64::MAX))]);
        assert!(matches!(
            pg_arguments(values),
            Err(HandlerError::Internal(_))
        ));
    }
}
