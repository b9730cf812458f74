//! Ordered condition sets with ordering, grouping and pagination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CriteriaError, CriteriaResult};
use super::item::{ConditionItem, ConditionValue, Operator};
use super::validator::SharedValidator;

/// Column holding the content type discriminator.
pub const TYPE_COLUMN: &str = "type";

/// Boolean connective placed between two consecutive items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Joiner {
    #[default]
    And,
    Or,
}

impl FromStr for Joiner {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Joiner::And),
            "OR" => Ok(Joiner::Or),
            _ => Err(CriteriaError::InvalidJoiner(s.to_string())),
        }
    }
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(CriteriaError::InvalidArgument(format!(
                "sort direction '{s}' must be ASC or DESC"
            ))),
        }
    }
}

/// Column plus direction for an ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// A query's conditions and shaping options.
///
/// Items are kept in insertion order. `joiners[i]` connects `items[i]` and
/// `items[i + 1]`, so there is always one joiner fewer than there are items.
#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    validator: SharedValidator,
    items: Vec<ConditionItem>,
    joiners: Vec<Joiner>,
    group_by: Option<String>,
    order: Option<OrderBy>,
    secondary_order: Option<OrderBy>,
    limit: u64,
    offset: u64,
    tags: Vec<i64>,
    /// Type every result must have, ANDed with all items.
    type_filter: Option<String>,
}

impl ConditionSet {
    /// Create an empty set using the default validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set bound to a shared validator.
    pub fn with_validator(validator: SharedValidator) -> Self {
        Self {
            validator,
            ..Self::default()
        }
    }

    /// Append an item joined to the previous one with AND.
    pub fn add(&mut self, item: ConditionItem) {
        self.add_joined(item, Joiner::And);
    }

    /// Append an item with an explicit joiner.
    ///
    /// The first item has no preceding joiner, so `joiner` is dropped for it.
    pub fn add_joined(&mut self, item: ConditionItem, joiner: Joiner) {
        if !self.items.is_empty() {
            self.joiners.push(joiner);
        }
        self.items.push(item);
    }

    /// Append an item with a joiner given as text (`"AND"` / `"OR"`).
    pub fn add_with(&mut self, item: ConditionItem, joiner: &str) -> CriteriaResult<()> {
        let joiner = joiner.parse()?;
        self.add_joined(item, joiner);
        Ok(())
    }

    /// Build an item with this set's validator and append it with AND.
    pub fn push(
        &mut self,
        column: &str,
        value: impl Into<ConditionValue>,
        operator: Operator,
    ) -> CriteriaResult<()> {
        let item = ConditionItem::validated(&*self.validator, column, value.into(), operator)?;
        self.add(item);
        Ok(())
    }

    /// Add a `type = name` predicate.
    ///
    /// Existing type predicates are left alone; see [`Self::find_type_index`]
    /// and [`Self::kill_type`] for replacing them.
    pub fn set_type(&mut self, type_name: &str) -> CriteriaResult<()> {
        self.push(TYPE_COLUMN, type_name, Operator::Equals)
    }

    /// Position of the first predicate on the type column.
    pub fn find_type_index(&self) -> Option<usize> {
        self.items.iter().position(ConditionItem::is_type_predicate)
    }

    /// Remove the item at `index` together with its joiner.
    ///
    /// Does nothing when `index` is out of range.
    pub fn kill_type(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.items.remove(index);
        if !self.joiners.is_empty() {
            // The first item owns the joiner after it; every other item
            // owns the joiner before it.
            self.joiners.remove(index.saturating_sub(1));
        }
    }

    /// Require every result to have type `type_name`, whatever the items say.
    ///
    /// Unlike [`Self::set_type`] this is not an item: it is ANDed with the
    /// whole item expression, so OR groups cannot escape it.
    pub fn restrict_type(&mut self, type_name: &str) -> CriteriaResult<()> {
        if type_name.is_empty() {
            return Err(CriteriaError::InvalidArgument(
                "type restriction must not be empty".to_string(),
            ));
        }
        self.type_filter = Some(type_name.to_string());
        Ok(())
    }

    pub fn type_filter(&self) -> Option<&str> {
        self.type_filter.as_deref()
    }

    /// The type results are limited to.
    ///
    /// The restriction wins; otherwise the value of the first type item, if
    /// it is an equality on text.
    pub fn content_type(&self) -> Option<&str> {
        self.type_filter().or_else(|| {
            self.find_type_index()
                .map(|i| &self.items[i])
                .filter(|item| item.operator() == Operator::Equals)
                .and_then(|item| item.value().as_str())
        })
    }

    /// Maximum rows to return; 0 means no limit.
    pub fn set_limit(&mut self, limit: i64) -> CriteriaResult<()> {
        self.limit = self.non_negative("limit", limit)?;
        Ok(())
    }

    /// Rows to skip; 0 means no offset.
    pub fn set_offset(&mut self, offset: i64) -> CriteriaResult<()> {
        self.offset = self.non_negative("offset", offset)?;
        Ok(())
    }

    /// Primary sort column and direction (`"ASC"` / `"DESC"`).
    pub fn set_order(&mut self, column: &str, direction: &str) -> CriteriaResult<()> {
        self.order = Some(self.order_by(column, direction)?);
        Ok(())
    }

    /// Tie-breaking sort applied after the primary order.
    pub fn set_secondary_order(&mut self, column: &str, direction: &str) -> CriteriaResult<()> {
        self.secondary_order = Some(self.order_by(column, direction)?);
        Ok(())
    }

    pub fn set_group_by(&mut self, column: &str) -> CriteriaResult<()> {
        self.group_by = Some(self.column("group by", column)?);
        Ok(())
    }

    /// Restrict results to content linked to any of these tags.
    pub fn set_tags(&mut self, tags: &[i64]) -> CriteriaResult<()> {
        for &tag in tags {
            self.non_negative("tag id", tag)?;
        }
        self.tags = tags.to_vec();
        Ok(())
    }

    pub fn add_tag(&mut self, tag: i64) -> CriteriaResult<()> {
        self.non_negative("tag id", tag)?;
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        Ok(())
    }

    pub fn items(&self) -> &[ConditionItem] {
        &self.items
    }

    pub fn joiners(&self) -> &[Joiner] {
        &self.joiners
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn secondary_order(&self) -> Option<&OrderBy> {
        self.secondary_order.as_ref()
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn tags(&self) -> &[i64] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Split items into OR-separated runs of AND-joined items.
    ///
    /// This mirrors SQL precedence: `a AND b OR c` is `(a AND b) OR c`.
    pub fn or_groups(&self) -> Vec<Vec<&ConditionItem>> {
        let mut groups: Vec<Vec<&ConditionItem>> = Vec::new();
        let mut current: Vec<&ConditionItem> = Vec::new();

        for (i, item) in self.items.iter().enumerate() {
            if i > 0 && self.joiners[i - 1] == Joiner::Or {
                groups.push(std::mem::take(&mut current));
            }
            current.push(item);
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    fn non_negative(&self, what: &str, value: i64) -> CriteriaResult<u64> {
        if !self.validator.validate_non_negative_int(value) {
            return Err(CriteriaError::InvalidArgument(format!(
                "{what} must be a non-negative integer, got {value}"
            )));
        }
        u64::try_from(value).map_err(|_| {
            CriteriaError::InvalidArgument(format!("{what} must be a non-negative integer"))
        })
    }

    fn column(&self, what: &str, column: &str) -> CriteriaResult<String> {
        if !self.validator.validate_column_name(column) {
            return Err(CriteriaError::InvalidArgument(format!(
                "unrecognized {what} column '{column}'"
            )));
        }
        Ok(column.to_string())
    }

    fn order_by(&self, column: &str, direction: &str) -> CriteriaResult<OrderBy> {
        Ok(OrderBy {
            column: self.column("order", column)?,
            direction: direction.parse()?,
        })
    }
}
