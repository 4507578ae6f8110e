//! Bounded-depth change detection.
//!
//! Bindings only re-render when their projection changed, and "changed" is
//! decided here. Values are compared field by field for the first two levels
//! of nesting; anything deeper is compared by reference. A typical state tree
//! is `domain key -> flat record of fields`, so two levels cover the fields a
//! component actually reads while the cost stays proportional to the branches
//! being compared rather than to the whole store.
//!
//! Comparison rules, in order:
//!
//! 1. If either side is null or absent, both must be the same primitive
//!    (`absent == absent`, `null == null`, `absent != null`).
//! 2. At depth 2 or less, two records (or two arrays) are equal when every
//!    key of each side maps to an equal value on the other side, one level
//!    deeper. Checking both directions is what catches keys that only exist
//!    on the new side.
//! 3. Two dates are equal when they denote the same instant.
//! 4. Anything else is reference or primitive equality.

use portable_atomic_util::Arc;

use crate::value::{Record, Value};

/// Depth at which comparisons start.
pub const DEFAULT_DEPTH: usize = 1;

/// Deepest level that is still compared field by field.
pub const MAX_DEPTH: usize = 2;

/// Compare two values the way bindings do: starting at depth 1.
///
/// ```rust
/// use global_states::{equality, Value};
/// use serde_json::json;
///
/// let old = Value::from(json!({"user": {"name": "x"}}));
/// let new = Value::from(json!({"user": {"name": "x"}}));
/// assert!(equality::two_level_eq(&old, &new));
///
/// let renamed = Value::from(json!({"user": {"name": "y"}}));
/// assert!(!equality::two_level_eq(&old, &renamed));
/// ```
pub fn two_level_eq(old: &Value, new: &Value) -> bool {
    eq_at_depth(old, new, DEFAULT_DEPTH)
}

/// Compare two values as if they were found `depth` levels into the tree.
pub fn eq_at_depth(old: &Value, new: &Value, depth: usize) -> bool {
    slot_eq(Some(old), Some(new), depth)
}

/// Compare two records that are not wrapped in a [`Value`], such as two
/// snapshots or two projections.
pub fn records_eq(old: &Record, new: &Record, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return core::ptr::eq(old, new);
    }
    fields_eq(old, new, depth)
}

/// Compare two possibly-absent values. `None` stands for a missing key.
pub fn slot_eq(old: Option<&Value>, new: Option<&Value>, depth: usize) -> bool {
    let (old, new) = match (old, new) {
        (None, None) => return true,
        (None, Some(_)) | (Some(_), None) => return false,
        (Some(old), Some(new)) => (old, new),
    };

    match (old, new) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Record(a), Value::Record(b)) if depth <= MAX_DEPTH => fields_eq(a, b, depth),
        (Value::Array(a), Value::Array(b)) if depth <= MAX_DEPTH => items_eq(a, b, depth),
        (Value::Date(a), Value::Date(b)) => a == b,
        _ => identical(old, new),
    }
}

fn fields_eq(old: &Record, new: &Record, depth: usize) -> bool {
    let next = depth + 1;
    old.iter()
        .all(|(key, value)| slot_eq(Some(value), new.get(key), next))
        && new
            .iter()
            .all(|(key, value)| slot_eq(old.get(key), Some(value), next))
}

fn items_eq(old: &[Value], new: &[Value], depth: usize) -> bool {
    let next = depth + 1;
    old.iter()
        .enumerate()
        .all(|(index, value)| slot_eq(Some(value), new.get(index), next))
        && new
            .iter()
            .enumerate()
            .all(|(index, value)| slot_eq(old.get(index), Some(value), next))
}

/// Reference equality for shared values, primitive equality for scalars.
fn identical(old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
        (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
        (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
        _ => false,
    }
}
