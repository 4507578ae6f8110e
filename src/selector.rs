//! What a binding reads from a snapshot, and how it decides the read changed.

use core::fmt;
use core::ops::Deref;

use crate::equality;
use crate::value::{Record, Value};

/// Derives a binding's output from a snapshot.
///
/// Implementations must be pure: the same snapshot always selects the same
/// output. [`cache_key`](Self::cache_key) identifies the selection so a
/// binding can tell whether a new selector actually selects something
/// different.
pub trait Selector: Send + Sync + 'static {
    type Output: Clone + Send + 'static;

    fn select(&self, state: &Record) -> Self::Output;

    /// Whether `old` and `new` are the same for re-render purposes.
    fn same(&self, old: &Self::Output, new: &Self::Output) -> bool;

    fn cache_key(&self) -> String;
}

/// The subset of a snapshot selected by [`Fields`].
///
/// Only requested fields that exist in the store are present; a missing
/// field is omitted rather than stored as null.
#[derive(Clone, Default, PartialEq)]
pub struct Projection(Record);

impl Projection {
    pub fn into_record(self) -> Record {
        self.0
    }
}

impl Deref for Projection {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl From<Record> for Projection {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Projection").field(&self.0).finish()
    }
}

/// Selects a set of top-level fields.
///
/// The requested order is kept for iteration over [`names`](Self::names),
/// but it does not matter for identity: the cache key is the sorted, deduplicated
/// names joined with `|`.
///
/// ```rust
/// use global_states::{Fields, Selector};
///
/// assert_eq!(
///     Fields::new(["user", "cart"]).cache_key(),
///     Fields::new(["cart", "user"]).cache_key(),
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fields {
    names: Vec<String>,
}

impl Fields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Selector for Fields {
    type Output = Projection;

    fn select(&self, state: &Record) -> Projection {
        let mut projection = Record::new();
        for name in &self.names {
            if let Some(value) = state.get(name) {
                projection.insert(name.clone(), value.clone());
            }
        }
        Projection(projection)
    }

    fn same(&self, old: &Projection, new: &Projection) -> bool {
        equality::records_eq(old, new, equality::DEFAULT_DEPTH)
    }

    fn cache_key(&self) -> String {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names.join("|")
    }
}

/// Selects a single top-level field. The output is the field's value, or
/// `None` when the store has no such field.
///
/// Comparison matches what a one-field [`Fields`] selection would do: the
/// value is compared as a second-level entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Selector for Field {
    type Output = Option<Value>;

    fn select(&self, state: &Record) -> Option<Value> {
        state.get(&self.name).cloned()
    }

    fn same(&self, old: &Option<Value>, new: &Option<Value>) -> bool {
        equality::slot_eq(old.as_ref(), new.as_ref(), equality::DEFAULT_DEPTH + 1)
    }

    fn cache_key(&self) -> String {
        self.name.clone()
    }
}
