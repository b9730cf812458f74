//! Type discriminator normalisation.
//!
//! A typed query must match exactly one type. Type items supplied by the
//! caller are removed and the type becomes a restriction ANDed with the
//! remaining items, so an OR among them cannot widen the result.

use super::model::ContentType;
use crate::criteria::{ConditionSet, CriteriaResult};

/// Remove every type predicate from `criteria`.
///
/// Returns how many were removed.
pub fn clear_type(criteria: &mut ConditionSet) -> usize {
    let mut removed = 0;
    while let Some(index) = criteria.find_type_index() {
        criteria.kill_type(index);
        removed += 1;
    }
    removed
}

/// Replace any type predicates in `criteria` with a restriction to `kind`.
pub fn normalize_type(mut criteria: ConditionSet, kind: ContentType) -> CriteriaResult<ConditionSet> {
    clear_type(&mut criteria);
    criteria.restrict_type(kind.as_str())?;
    Ok(criteria)
}
