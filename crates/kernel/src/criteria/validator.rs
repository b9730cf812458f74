//! Validation capability injected into items and sets.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::item::Operator;

/// Column names are plain identifiers: letters, digits and underscores.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static COLUMN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex literal"));

/// Checks applied to every column, operator and numeric setter argument.
pub trait Validator: Send + Sync {
    /// Whether `name` is an acceptable column identifier.
    fn validate_column_name(&self, name: &str) -> bool;

    /// Whether `operator` may be used in a condition.
    fn validate_operator(&self, operator: Operator) -> bool;

    /// Whether `value` is a non-negative integer.
    fn validate_non_negative_int(&self, value: i64) -> bool {
        value >= 0
    }
}

/// Default validator: identifier whitelist and the full operator set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnValidator;

impl Validator for ColumnValidator {
    fn validate_column_name(&self, name: &str) -> bool {
        COLUMN_NAME.is_match(name)
    }

    fn validate_operator(&self, _operator: Operator) -> bool {
        true
    }
}

/// Shared handle to a validator.
#[derive(Clone)]
pub struct SharedValidator(Arc<dyn Validator>);

impl SharedValidator {
    /// Wrap a validator for sharing between factories and sets.
    pub fn new<V: Validator + 'static>(validator: V) -> Self {
        Self(Arc::new(validator))
    }

    /// Wrap an already shared validator.
    pub fn from_arc(validator: Arc<dyn Validator>) -> Self {
        Self(validator)
    }
}

impl Default for SharedValidator {
    fn default() -> Self {
        Self::new(ColumnValidator)
    }
}

impl std::ops::Deref for SharedValidator {
    type Target = dyn Validator;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for SharedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedValidator")
    }
}
