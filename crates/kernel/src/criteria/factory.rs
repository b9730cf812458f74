//! Factories that bind a shared validator into new items and sets.

use super::error::{CriteriaError, CriteriaResult};
use super::item::{ConditionItem, ConditionValue};
use super::set::ConditionSet;
use super::validator::SharedValidator;

/// Builds condition items against a shared validator.
#[derive(Debug, Clone, Default)]
pub struct ItemFactory {
    validator: SharedValidator,
}

impl ItemFactory {
    pub fn new(validator: SharedValidator) -> Self {
        Self { validator }
    }

    /// Build a factory from a validator that may not have been provided.
    pub fn from_optional(validator: Option<SharedValidator>) -> CriteriaResult<Self> {
        validator
            .map(Self::new)
            .ok_or_else(|| CriteriaError::Validation("item factory requires a validator".into()))
    }

    /// Create an item; `operator` is the SQL spelling (`"="`, `"IN"`, ...).
    pub fn item(
        &self,
        column: &str,
        value: impl Into<ConditionValue>,
        operator: &str,
    ) -> CriteriaResult<ConditionItem> {
        ConditionItem::validated(&*self.validator, column, value.into(), operator.parse()?)
    }

    /// Create an equality item.
    pub fn create(
        &self,
        column: &str,
        value: impl Into<ConditionValue>,
    ) -> CriteriaResult<ConditionItem> {
        self.item(column, value, "=")
    }

    pub fn validator(&self) -> &SharedValidator {
        &self.validator
    }
}

/// Builds condition sets and items that share one validator.
#[derive(Debug, Clone, Default)]
pub struct CriteriaFactory {
    items: ItemFactory,
}

impl CriteriaFactory {
    pub fn new(validator: SharedValidator) -> Self {
        Self {
            items: ItemFactory::new(validator),
        }
    }

    /// Build a factory from a validator that may not have been provided.
    pub fn from_optional(validator: Option<SharedValidator>) -> CriteriaResult<Self> {
        Ok(Self {
            items: ItemFactory::from_optional(validator)?,
        })
    }

    /// A fresh, empty condition set.
    pub fn criteria(&self) -> ConditionSet {
        ConditionSet::with_validator(self.items.validator().clone())
    }

    /// Create an item with the shared validator.
    pub fn item(
        &self,
        column: &str,
        value: impl Into<ConditionValue>,
        operator: &str,
    ) -> CriteriaResult<ConditionItem> {
        self.items.item(column, value, operator)
    }

    pub fn item_factory(&self) -> &ItemFactory {
        &self.items
    }
}
