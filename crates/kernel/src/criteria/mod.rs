//! Criteria composition module.
//!
//! This module provides:
//! - ConditionItem: one column/operator/value predicate
//! - ConditionSet: ordered predicates plus ordering, grouping and paging
//! - ItemFactory / CriteriaFactory: constructors sharing one validator
//! - ContentQueryBuilder: SeaQuery-based SQL generation

mod compile;
mod error;
mod factory;
mod item;
mod set;
mod validator;

pub use compile::{CONTENT_TABLE, ContentQueryBuilder, TAGLINK_TABLE};
pub use error::{CriteriaError, CriteriaResult};
pub use factory::{CriteriaFactory, ItemFactory};
pub use item::{ConditionItem, ConditionValue, Operator, ValueType};
pub use set::{ConditionSet, Joiner, OrderBy, SortDirection, TYPE_COLUMN};
pub use validator::{ColumnValidator, SharedValidator, Validator};
