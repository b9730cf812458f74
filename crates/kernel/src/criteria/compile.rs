//! Condition set compilation using SeaQuery.
//!
//! Turns a [`ConditionSet`] into parameterised PostgreSQL:
//! - OR-separated groups of AND-joined predicates
//! - Type restriction and tag membership ANDed around those groups
//! - Grouping as `DISTINCT ON`, one row per group value
//! - Primary and secondary ORDER BY
//! - LIMIT/OFFSET (omitted when zero)
//!
//! Values are always bound as parameters; `to_string` rendering is only
//! used for logging and tests.

use sea_query::{
    Alias, Asterisk, Cond, Expr, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
    Value, Values,
};

use super::item::{ConditionItem, ConditionValue, Operator};
use super::set::{ConditionSet, OrderBy, SortDirection, TYPE_COLUMN};

/// Table holding every content row.
pub const CONTENT_TABLE: &str = "content";

/// Join table linking content to tags.
pub const TAGLINK_TABLE: &str = "taglink";

/// Query builder over the content table.
pub struct ContentQueryBuilder<'a> {
    criteria: &'a ConditionSet,
}

impl<'a> ContentQueryBuilder<'a> {
    pub fn new(criteria: &'a ConditionSet) -> Self {
        Self { criteria }
    }

    /// Build the row query selecting every column.
    pub fn build(&self) -> (String, Values) {
        self.select(&[]).build(PostgresQueryBuilder)
    }

    /// Build the row query selecting only `columns`.
    pub fn build_columns(&self, columns: &[&str]) -> (String, Values) {
        self.select(columns).build(PostgresQueryBuilder)
    }

    /// Build a COUNT query. Ordering and pagination are not applied.
    pub fn build_count(&self) -> (String, Values) {
        self.count().build(PostgresQueryBuilder)
    }

    /// Render the row query with inlined values, for logging.
    pub fn to_sql_string(&self) -> String {
        self.select(&[]).to_string(PostgresQueryBuilder)
    }

    /// Render the count query with inlined values, for logging.
    pub fn to_count_sql_string(&self) -> String {
        self.count().to_string(PostgresQueryBuilder)
    }

    /// Render a column-list query with inlined values, for logging.
    pub fn to_columns_sql_string(&self, columns: &[&str]) -> String {
        self.select(columns).to_string(PostgresQueryBuilder)
    }

    /// Row SELECT statement.
    ///
    /// A grouped set returns the first row of each group under the set's
    /// ordering.
    pub fn select(&self, columns: &[&str]) -> SelectStatement {
        let mut query = Query::select();

        if let Some(column) = self.criteria.group_by() {
            query.distinct_on([content_col(column)]);
        }

        if columns.is_empty() {
            query.column((Alias::new(CONTENT_TABLE), Asterisk));
        } else {
            for column in columns {
                query.column(content_col(column));
            }
        }

        query.from(Alias::new(CONTENT_TABLE));
        self.add_conditions(&mut query);
        self.add_sorts(&mut query);

        if self.criteria.limit() > 0 {
            query.limit(self.criteria.limit());
        }
        if self.criteria.offset() > 0 {
            query.offset(self.criteria.offset());
        }

        query
    }

    /// COUNT statement over the same conditions.
    ///
    /// A grouped set counts groups, matching the rows [`Self::select`] returns.
    pub fn count(&self) -> SelectStatement {
        let mut query = Query::select();

        match self.criteria.group_by() {
            Some(column) => query.expr(Expr::cust(format!(
                "COUNT(DISTINCT \"{CONTENT_TABLE}\".\"{}\")",
                column.replace('"', "\"\"")
            ))),
            None => query.expr(Expr::cust("COUNT(*)")),
        };

        query.from(Alias::new(CONTENT_TABLE));
        self.add_conditions(&mut query);

        query
    }

    /// Keep rows linked to any of the requested tags.
    fn tag_filter(&self) -> Option<SimpleExpr> {
        let tags = self.criteria.tags();
        if tags.is_empty() {
            return None;
        }

        let linked = Query::select()
            .column(Alias::new("content_id"))
            .from(Alias::new(TAGLINK_TABLE))
            .and_where(Expr::col(Alias::new("tag_id")).is_in(tags.to_vec()))
            .to_owned();
        Some(Expr::col(content_col("id")).in_subquery(linked))
    }

    /// Add the WHERE clause: type restriction AND tag membership AND the
    /// set's OR groups.
    fn add_conditions(&self, query: &mut SelectStatement) {
        let mut parts: Vec<Cond> = Vec::new();

        if let Some(kind) = self.criteria.type_filter() {
            parts.push(Cond::all().add(Expr::col(content_col(TYPE_COLUMN)).eq(kind)));
        }
        if let Some(tags) = self.tag_filter() {
            parts.push(Cond::all().add(tags));
        }

        let groups = self.criteria.or_groups();
        if !groups.is_empty() {
            let mut any = Cond::any();
            for group in groups {
                let mut all = Cond::all();
                for item in group {
                    all = all.add(self.build_condition(item));
                }
                any = any.add(all);
            }
            parts.push(any);
        }

        match parts.len() {
            0 => {}
            1 => {
                query.cond_where(parts.remove(0));
            }
            _ => {
                query.cond_where(parts.into_iter().fold(Cond::all(), |all, part| all.add(part)));
            }
        }
    }

    /// Build a single predicate.
    fn build_condition(&self, item: &ConditionItem) -> SimpleExpr {
        let column = Expr::col(content_col(item.column()));
        let value = item.value();

        match item.operator() {
            Operator::Equals if *value == ConditionValue::Null => column.is_null(),
            Operator::NotEquals if *value == ConditionValue::Null => column.is_not_null(),
            Operator::Equals => column.eq(bind_value(value)),
            Operator::NotEquals => column.ne(bind_value(value)),
            Operator::LessThan => column.lt(bind_value(value)),
            Operator::LessOrEqual => column.lte(bind_value(value)),
            Operator::GreaterThan => column.gt(bind_value(value)),
            Operator::GreaterOrEqual => column.gte(bind_value(value)),
            Operator::Like => column.like(value.as_str().unwrap_or_default()),
            Operator::NotLike => column.not_like(value.as_str().unwrap_or_default()),
            Operator::In => column.is_in(value.elements().iter().map(bind_value)),
            Operator::NotIn => column.is_not_in(value.elements().iter().map(bind_value)),
            Operator::IsNull => column.is_null(),
            Operator::IsNotNull => column.is_not_null(),
            Operator::Between => match value.elements() {
                [low, high] => column.between(bind_value(low), bind_value(high)),
                // Construction guarantees two bounds; anything else matches nothing.
                _ => Expr::cust("FALSE"),
            },
        }
    }

    /// Add ORDER BY clauses.
    ///
    /// `DISTINCT ON` requires the group column to lead the ordering; it takes
    /// the primary direction when the primary order is on that column.
    fn add_sorts(&self, query: &mut SelectStatement) {
        let mut sorts: Vec<OrderBy> = Vec::new();

        if let Some(column) = self.criteria.group_by() {
            let direction = self
                .criteria
                .order()
                .filter(|o| o.column == column)
                .map(|o| o.direction)
                .unwrap_or_default();
            sorts.push(OrderBy {
                column: column.to_string(),
                direction,
            });
        }

        for sort in [self.criteria.order(), self.criteria.secondary_order()]
            .into_iter()
            .flatten()
        {
            if !sorts.iter().any(|s| s.column == sort.column) {
                sorts.push(sort.clone());
            }
        }

        for sort in &sorts {
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            query.order_by(content_col(&sort.column), order);
        }
    }
}

fn content_col(column: &str) -> (Alias, Alias) {
    (Alias::new(CONTENT_TABLE), Alias::new(column))
}

/// Convert a scalar condition value into a SeaQuery value.
fn bind_value(value: &ConditionValue) -> Value {
    match value {
        ConditionValue::Null | ConditionValue::List(_) => Value::String(None),
        ConditionValue::Bool(b) => (*b).into(),
        ConditionValue::Int(i) => (*i).into(),
        ConditionValue::Float(f) => (*f).into(),
        ConditionValue::Text(s) => s.clone().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::item::ConditionItem;
    use crate::criteria::set::Joiner;

    fn text(s: &str) -> Value {
        Value::String(Some(Box::new(s.to_string())))
    }

    #[test]
    fn empty_set_with_order_and_limit_has_no_where() {
        let mut set = ConditionSet::new();
        set.set_limit(5).unwrap();
        set.set_order("submission_time", "DESC").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_sql_string();
        assert!(sql.starts_with("SELECT \"content\".* FROM \"content\""), "{sql}");
        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(
            sql.contains("ORDER BY \"content\".\"submission_time\" DESC LIMIT 5"),
            "{sql}"
        );
        assert!(!sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn values_are_bound_not_inlined() {
        let mut set = ConditionSet::new();
        set.set_type("video").unwrap();
        set.add(ConditionItem::new("title", "O'Brien", "LIKE").unwrap());

        let (sql, values) = ContentQueryBuilder::new(&set).build();
        assert!(sql.contains("\"content\".\"type\" = $1"), "{sql}");
        assert!(sql.contains("\"content\".\"title\" LIKE $2"), "{sql}");
        assert!(!sql.contains("O'Brien"), "{sql}");
        assert_eq!(values.0, vec![text("video"), text("O'Brien")]);
    }

    #[test]
    fn limit_and_offset_are_parameters() {
        let mut set = ConditionSet::new();
        set.set_limit(10).unwrap();
        set.set_offset(20).unwrap();

        let (sql, values) = ContentQueryBuilder::new(&set).build();
        assert!(sql.contains("LIMIT $1 OFFSET $2"), "{sql}");
        assert_eq!(
            values.0,
            vec![Value::BigUnsigned(Some(10)), Value::BigUnsigned(Some(20))]
        );
    }

    #[test]
    fn list_and_null_operators() {
        let mut set = ConditionSet::new();
        set.add(ConditionItem::new("id", vec![1, 2, 3], "IN").unwrap());
        set.add(ConditionItem::new("counter", vec![10, 20], "BETWEEN").unwrap());
        set.add(ConditionItem::new("media", ConditionValue::Null, "IS NOT NULL").unwrap());
        set.add(ConditionItem::new("expires_on", ConditionValue::Null, "=").unwrap());
        set.add(ConditionItem::new("language", vec!["de", "fr"], "NOT IN").unwrap());

        let (sql, values) = ContentQueryBuilder::new(&set).build();
        assert!(sql.contains("\"content\".\"id\" IN ($1, $2, $3)"), "{sql}");
        assert!(sql.contains("\"content\".\"counter\" BETWEEN $4 AND $5"), "{sql}");
        assert!(sql.contains("\"content\".\"media\" IS NOT NULL"), "{sql}");
        assert!(sql.contains("\"content\".\"expires_on\" IS NULL"), "{sql}");
        assert!(sql.contains("\"content\".\"language\" NOT IN ($6, $7)"), "{sql}");
        assert_eq!(values.0.len(), 7);
        assert_eq!(values.0[0], Value::BigInt(Some(1)));
    }

    #[test]
    fn or_joiner_splits_groups() {
        let mut set = ConditionSet::new();
        set.add(ConditionItem::equals("type", "article").unwrap());
        set.add_joined(ConditionItem::equals("online_status", 1).unwrap(), Joiner::And);
        set.add_joined(ConditionItem::equals("type", "video").unwrap(), Joiner::Or);

        let sql = ContentQueryBuilder::new(&set).to_sql_string();
        assert!(sql.contains(" OR "), "{sql}");
        assert!(
            sql.contains("\"content\".\"type\" = 'article' AND \"content\".\"online_status\" = 1"),
            "{sql}"
        );
    }

    #[test]
    fn tag_filter_is_a_membership_subquery() {
        let mut set = ConditionSet::new();
        set.set_tags(&[4, 8]).unwrap();
        set.set_type("article").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_sql_string();
        assert!(sql.starts_with("SELECT \"content\".* FROM \"content\""), "{sql}");
        assert!(!sql.contains("DISTINCT"), "{sql}");
        assert!(!sql.contains("JOIN"), "{sql}");
        assert!(
            sql.contains(
                "\"content\".\"id\" IN (SELECT \"content_id\" FROM \"taglink\" WHERE \"tag_id\" IN (4, 8))"
            ),
            "{sql}"
        );
        assert!(sql.contains("\"content\".\"type\" = 'article'"), "{sql}");

        let count = ContentQueryBuilder::new(&set).to_count_sql_string();
        assert!(count.starts_with("SELECT COUNT(*) FROM \"content\""), "{count}");
        assert!(count.contains("\"taglink\""), "{count}");
    }

    #[test]
    fn tagged_column_list_can_order_by_unselected_columns() {
        let mut set = ConditionSet::new();
        set.add_tag(3).unwrap();
        set.set_order("date", "DESC").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_columns_sql_string(&["id", "title"]);
        assert!(
            sql.starts_with("SELECT \"content\".\"id\", \"content\".\"title\" FROM \"content\""),
            "{sql}"
        );
        assert!(!sql.contains("DISTINCT"), "{sql}");
        assert!(sql.ends_with("ORDER BY \"content\".\"date\" DESC"), "{sql}");
    }

    #[test]
    fn type_restriction_wraps_or_groups() {
        let mut set = ConditionSet::new();
        set.add(ConditionItem::equals("id", 1).unwrap());
        set.add_joined(ConditionItem::equals("id", 2).unwrap(), Joiner::Or);
        set.restrict_type("video").unwrap();

        let (sql, values) = ContentQueryBuilder::new(&set).build();
        assert!(
            sql.contains(
                "WHERE \"content\".\"type\" = $1 AND (\"content\".\"id\" = $2 OR \"content\".\"id\" = $3)"
            ),
            "{sql}"
        );
        assert_eq!(values.0[0], text("video"));

        let count = ContentQueryBuilder::new(&set).to_count_sql_string();
        assert!(count.contains("\"content\".\"type\" = 'video' AND ("), "{count}");
    }

    #[test]
    fn count_skips_order_and_pagination() {
        let mut set = ConditionSet::new();
        set.set_type("image").unwrap();
        set.set_limit(5).unwrap();
        set.set_offset(5).unwrap();
        set.set_order("title", "ASC").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_count_sql_string();
        assert!(sql.contains("COUNT(*)"), "{sql}");
        assert!(sql.contains("WHERE \"content\".\"type\" = 'image'"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn grouping_selects_one_row_per_group() {
        let mut set = ConditionSet::new();
        set.set_group_by("type").unwrap();
        set.set_order("date", "DESC").unwrap();
        set.set_secondary_order("submission_time", "DESC").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_sql_string();
        assert!(
            sql.starts_with("SELECT DISTINCT ON (\"content\".\"type\") \"content\".* FROM"),
            "{sql}"
        );
        assert!(!sql.contains("GROUP BY"), "{sql}");
        assert!(
            sql.ends_with(
                "ORDER BY \"content\".\"type\" ASC, \"content\".\"date\" DESC, \"content\".\"submission_time\" DESC"
            ),
            "{sql}"
        );
    }

    #[test]
    fn grouping_on_the_order_column_keeps_its_direction() {
        let mut set = ConditionSet::new();
        set.set_group_by("type").unwrap();
        set.set_order("type", "DESC").unwrap();

        let sql = ContentQueryBuilder::new(&set).to_sql_string();
        assert!(sql.ends_with("ORDER BY \"content\".\"type\" DESC"), "{sql}");
    }

    #[test]
    fn grouped_count_counts_groups() {
        let mut set = ConditionSet::new();
        set.set_group_by("type").unwrap();
        set.push("online_status", 1, Operator::Equals).unwrap();
        set.set_limit(3).unwrap();

        let sql = ContentQueryBuilder::new(&set).to_count_sql_string();
        assert!(
            sql.starts_with("SELECT COUNT(DISTINCT \"content\".\"type\") FROM \"content\""),
            "{sql}"
        );
        assert!(sql.contains("WHERE \"content\".\"online_status\" = 1"), "{sql}");
        assert!(!sql.contains("DISTINCT ON"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
    }

    #[test]
    fn selected_columns() {
        let set = ConditionSet::new();
        let (sql, _) = ContentQueryBuilder::new(&set).build_columns(&["id", "title"]);
        assert!(
            sql.starts_with("SELECT \"content\".\"id\", \"content\".\"title\" FROM"),
            "{sql}"
        );
    }
}
