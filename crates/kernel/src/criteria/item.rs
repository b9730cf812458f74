//! Single column/operator/value predicates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CriteriaError, CriteriaResult};
use super::validator::{ColumnValidator, Validator};

/// Comparison operators permitted in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    NotEquals,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
}

impl Operator {
    /// Every permitted operator.
    pub const ALL: [Operator; 13] = [
        Operator::Equals,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::NotEquals,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Between,
    ];

    /// Canonical SQL spelling.
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::NotEquals => "!=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Collapse runs of whitespace so "NOT  IN" and "not in" both parse.
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "=" | "==" => Ok(Operator::Equals),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterOrEqual),
            "!=" | "<>" => Ok(Operator::NotEquals),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "IS NULL" => Ok(Operator::IsNull),
            "IS NOT NULL" => Ok(Operator::IsNotNull),
            "BETWEEN" => Ok(Operator::Between),
            _ => Err(CriteriaError::InvalidOperator(s.to_string())),
        }
    }
}

/// SQL binding type inferred from a condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    Text,
}

/// Value compared against a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Operands for IN, NOT IN and BETWEEN.
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    /// Whether this is a list rather than a scalar.
    pub fn is_list(&self) -> bool {
        matches!(self, ConditionValue::List(_))
    }

    /// Text content, if this is a text scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConditionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List elements; a scalar is treated as a one-element list.
    pub fn elements(&self) -> &[ConditionValue] {
        match self {
            ConditionValue::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }

    /// Infer the binding type.
    ///
    /// Lists bind as the type of their elements. Mixed integer and float
    /// elements widen to float; any other mix is rejected.
    pub fn value_type(&self) -> CriteriaResult<ValueType> {
        match self {
            ConditionValue::Null => Ok(ValueType::Null),
            ConditionValue::Bool(_) => Ok(ValueType::Bool),
            ConditionValue::Int(_) => Ok(ValueType::Int),
            ConditionValue::Float(_) => Ok(ValueType::Float),
            ConditionValue::Text(_) => Ok(ValueType::Text),
            ConditionValue::List(items) => {
                let mut inferred: Option<ValueType> = None;
                for item in items {
                    if item.is_list() {
                        return Err(CriteriaError::InvalidArgument(
                            "nested lists are not allowed".to_string(),
                        ));
                    }
                    let ty = item.value_type()?;
                    inferred = Some(match (inferred, ty) {
                        (None, ty) => ty,
                        (Some(a), b) if a == b => a,
                        (Some(ValueType::Int), ValueType::Float)
                        | (Some(ValueType::Float), ValueType::Int) => ValueType::Float,
                        (Some(a), b) => {
                            return Err(CriteriaError::InvalidArgument(format!(
                                "list mixes {a:?} and {b:?} values"
                            )));
                        }
                    });
                }
                Ok(inferred.unwrap_or(ValueType::Null))
            }
        }
    }
}

impl From<i64> for ConditionValue {
    fn from(v: i64) -> Self {
        ConditionValue::Int(v)
    }
}

impl From<i32> for ConditionValue {
    fn from(v: i32) -> Self {
        ConditionValue::Int(i64::from(v))
    }
}

impl From<i16> for ConditionValue {
    fn from(v: i16) -> Self {
        ConditionValue::Int(i64::from(v))
    }
}

impl From<f64> for ConditionValue {
    fn from(v: f64) -> Self {
        ConditionValue::Float(v)
    }
}

impl From<bool> for ConditionValue {
    fn from(v: bool) -> Self {
        ConditionValue::Bool(v)
    }
}

impl From<&str> for ConditionValue {
    fn from(v: &str) -> Self {
        ConditionValue::Text(v.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(v: String) -> Self {
        ConditionValue::Text(v)
    }
}

impl<T: Into<ConditionValue>> From<Option<T>> for ConditionValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ConditionValue::Null, Into::into)
    }
}

impl<T: Into<ConditionValue>> From<Vec<T>> for ConditionValue {
    fn from(v: Vec<T>) -> Self {
        ConditionValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// One predicate: `column operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionItem {
    column: String,
    operator: Operator,
    value: ConditionValue,
    value_type: ValueType,
}

impl ConditionItem {
    /// Build an item with the default validator.
    ///
    /// `operator` is parsed from its SQL spelling (`"="`, `"IN"`, ...).
    pub fn new(
        column: &str,
        value: impl Into<ConditionValue>,
        operator: &str,
    ) -> CriteriaResult<Self> {
        Self::validated(&ColumnValidator, column, value.into(), operator.parse()?)
    }

    /// Build an equality item with the default validator.
    pub fn equals(column: &str, value: impl Into<ConditionValue>) -> CriteriaResult<Self> {
        Self::validated(&ColumnValidator, column, value.into(), Operator::Equals)
    }

    /// Build an item, checking column, operator and value shape.
    pub fn validated(
        validator: &dyn Validator,
        column: &str,
        value: ConditionValue,
        operator: Operator,
    ) -> CriteriaResult<Self> {
        if !validator.validate_column_name(column) {
            return Err(CriteriaError::InvalidColumnName(column.to_string()));
        }
        if !validator.validate_operator(operator) {
            return Err(CriteriaError::InvalidOperator(operator.to_string()));
        }

        check_shape(operator, &value)?;
        let value_type = value.value_type()?;

        Ok(Self {
            column: column.to_string(),
            operator,
            value,
            value_type,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    /// Binding type inferred at construction.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether this item filters on the content type discriminator.
    pub fn is_type_predicate(&self) -> bool {
        self.column.eq_ignore_ascii_case("type")
    }
}

/// Reject values whose shape does not suit the operator.
fn check_shape(operator: Operator, value: &ConditionValue) -> CriteriaResult<()> {
    let fail = |msg: &str| Err(CriteriaError::InvalidArgument(format!("{operator}: {msg}")));

    match operator {
        Operator::In | Operator::NotIn => match value {
            ConditionValue::List(items) if items.is_empty() => fail("list must not be empty"),
            ConditionValue::List(items) if items.contains(&ConditionValue::Null) => {
                fail("list must not contain NULL")
            }
            ConditionValue::List(_) => Ok(()),
            _ => fail("expects a list"),
        },
        Operator::Between => match value {
            ConditionValue::List(items)
                if items.len() == 2 && !items.contains(&ConditionValue::Null) =>
            {
                Ok(())
            }
            _ => fail("expects a list of exactly two bounds"),
        },
        Operator::IsNull | Operator::IsNotNull => match value {
            ConditionValue::Null => Ok(()),
            _ => fail("takes no value"),
        },
        Operator::Equals | Operator::NotEquals => match value {
            ConditionValue::List(_) => fail("expects a scalar"),
            _ => Ok(()),
        },
        Operator::Like | Operator::NotLike => match value {
            ConditionValue::Text(_) => Ok(()),
            _ => fail("expects a text pattern"),
        },
        Operator::LessThan
        | Operator::LessOrEqual
        | Operator::GreaterThan
        | Operator::GreaterOrEqual => match value {
            ConditionValue::List(_) => fail("expects a scalar"),
            ConditionValue::Null => fail("cannot compare against NULL"),
            _ => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operator_spellings() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEquals);
        assert_eq!("not  in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("is not null".parse::<Operator>().unwrap(), Operator::IsNotNull);
        assert_eq!(" between ".parse::<Operator>().unwrap(), Operator::Between);
    }

    #[test]
    fn operator_display_round_trips() {
        for op in Operator::ALL {
            assert_eq!(op.as_sql().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operator_rejected() {
        let err = ConditionItem::new("title", "x", "~=").unwrap_err();
        assert_eq!(err, CriteriaError::InvalidOperator("~=".to_string()));
    }

    #[test]
    fn stores_exact_fields() {
        let item = ConditionItem::new("counter", 10, ">=").unwrap();
        assert_eq!(item.column(), "counter");
        assert_eq!(item.operator(), Operator::GreaterOrEqual);
        assert_eq!(item.value(), &ConditionValue::Int(10));
        assert_eq!(item.value_type(), ValueType::Int);
    }

    #[test]
    fn infers_binding_types() {
        let cases: Vec<(ConditionValue, ValueType)> = vec![
            ("rust".into(), ValueType::Text),
            (1.5.into(), ValueType::Float),
            (true.into(), ValueType::Bool),
            (ConditionValue::Null, ValueType::Null),
        ];
        for (value, expected) in cases {
            let item = ConditionItem::validated(&ColumnValidator, "c", value, Operator::Equals)
                .unwrap();
            assert_eq!(item.value_type(), expected);
        }
    }

    #[test]
    fn list_types_and_widening() {
        let item = ConditionItem::new("id", vec![1, 2, 3], "IN").unwrap();
        assert_eq!(item.value_type(), ValueType::Int);

        let mixed = ConditionValue::List(vec![ConditionValue::Int(1), ConditionValue::Float(2.5)]);
        let item = ConditionItem::validated(&ColumnValidator, "score", mixed, Operator::Between)
            .unwrap();
        assert_eq!(item.value_type(), ValueType::Float);

        let bad = ConditionValue::List(vec![ConditionValue::Int(1), "a".into()]);
        assert!(matches!(
            ConditionItem::validated(&ColumnValidator, "id", bad, Operator::In),
            Err(CriteriaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_bad_column_names() {
        for column in ["", "title OR 1=1", "content.title", "`type`", "tit le"] {
            let err = ConditionItem::new(column, "x", "=").unwrap_err();
            assert_eq!(err, CriteriaError::InvalidColumnName(column.to_string()));
        }
    }

    #[test]
    fn value_shape_must_fit_operator() {
        assert!(ConditionItem::new("id", 1, "IN").is_err());
        assert!(ConditionItem::new("id", Vec::<i64>::new(), "IN").is_err());
        assert!(ConditionItem::new("id", vec![1, 2, 3], "BETWEEN").is_err());
        assert!(ConditionItem::new("id", vec![1, 2], "BETWEEN").is_ok());
        assert!(ConditionItem::new("media", "x", "IS NULL").is_err());
        assert!(ConditionItem::new("media", ConditionValue::Null, "IS NULL").is_ok());
        assert!(ConditionItem::new("title", 3, "LIKE").is_err());
        assert!(ConditionItem::new("counter", ConditionValue::Null, ">").is_err());
        assert!(ConditionItem::new("id", vec![1], "=").is_err());
    }

    #[test]
    fn type_predicate_detection_ignores_case() {
        assert!(ConditionItem::equals("type", "video").unwrap().is_type_predicate());
        assert!(ConditionItem::equals("TYPE", "video").unwrap().is_type_predicate());
        assert!(!ConditionItem::equals("types", "video").unwrap().is_type_predicate());
    }

    #[test]
    fn value_deserializes_untagged() {
        let value: ConditionValue = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(value, ConditionValue::List(vec![1.into(), 2.into()]));

        let value: ConditionValue = serde_json::from_str("null").unwrap();
        assert_eq!(value, ConditionValue::Null);
    }
}
