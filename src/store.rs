//! The state container.

use core::fmt;
use core::ops::Deref;

use portable_atomic_util::{Arc, Weak};
use spin::Mutex;

use crate::registry::{Registry, Subscriber};
use crate::value::{Record, Value};

/// An immutable view of the whole store state at one point in time.
///
/// Every mutation installs a new snapshot; existing snapshots never change.
/// Cloning is cheap and shares the underlying record.
#[derive(Clone)]
pub struct Snapshot(Arc<Record>);

impl Snapshot {
    pub fn new(record: Record) -> Self {
        Self(Arc::new(record))
    }

    /// A shallow copy of the state: top-level fields are cloned, nested
    /// records and arrays stay shared.
    pub fn to_record(&self) -> Record {
        (*self.0).clone()
    }

    /// Whether both snapshots are the same installed state.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Snapshot {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Construction options for a [`Store`].
///
/// ```rust
/// use global_states::{Record, Store};
///
/// let store = Store::builder()
///     .label("cart")
///     .initial(Record::new().with("qty", 1))
///     .build();
///
/// assert_eq!(store.label(), Some("cart"));
/// ```
#[derive(Debug, Default)]
pub struct StoreBuilder {
    label: Option<String>,
    initial: Record,
}

impl StoreBuilder {
    /// Name reported in log events for this store.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Initial state. Defaults to an empty record.
    pub fn initial(mut self, initial: Record) -> Self {
        self.initial = initial;
        self
    }

    pub fn build(self) -> Store {
        tracing::debug!(
            label = self.label.as_deref().unwrap_or("<unlabelled>"),
            fields = self.initial.len(),
            "creating store"
        );
        Store {
            inner: Arc::new(StoreInner {
                label: self.label,
                state: Mutex::new(Snapshot::new(self.initial)),
                registry: Registry::new(),
            }),
        }
    }
}

struct StoreInner {
    label: Option<String>,
    state: Mutex<Snapshot>,
    registry: Registry,
}

/// A global state container.
///
/// A `Store` is a handle: clones share the same state and subscribers, while
/// stores built separately are fully isolated from each other. Every mutation
/// installs a new [`Snapshot`] and then synchronously notifies all
/// subscribers before returning. No lock is held while subscribers run, so
/// they may read or mutate the store themselves.
///
/// # Example
///
/// ```rust
/// use global_states::{Record, Store};
/// use serde_json::json;
///
/// let store = Store::new(Record::from_json(json!({
///     "user": {"name": "me"},
///     "cart": {"qty": 1, "items": ["Item 1"]},
/// })).unwrap());
///
/// store.update_states(Record::from_json(json!({"cart": {"qty": 2}})).unwrap());
///
/// let cart = store.get_states().get("cart").cloned().unwrap();
/// assert_eq!(cart.to_json(), json!({"qty": 2.0, "items": ["Item 1"]}));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store holding `initial`.
    pub fn new(initial: Record) -> Self {
        Self::builder().initial(initial).build()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// The process-wide default store.
    ///
    /// It starts out empty and shares nothing with stores created through
    /// [`Store::new`]. Every call returns a handle to the same store.
    pub fn global() -> Store {
        static DEFAULT: spin::Lazy<Store> =
            spin::Lazy::new(|| Store::builder().label("global").build());
        DEFAULT.clone()
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Shallow copy of the current state. Mutating the copy does not affect
    /// the store.
    pub fn get_states(&self) -> Record {
        self.snapshot().to_record()
    }

    /// The currently installed snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.lock().clone()
    }

    /// Merge `partial` into the state.
    ///
    /// For every key of `partial`: when both the current value and the new
    /// value are plain records, their fields are merged one level deep (new
    /// fields win, other old fields are kept). Anything else, including
    /// arrays and opaque values, replaces the current value wholesale. Keys
    /// not present in `partial` are left untouched.
    pub fn update_states(&self, partial: Record) {
        tracing::trace!(store = self.label_for_log(), keys = partial.len(), "merging partial state");
        self.replace_with(|current| merge(current, partial));
    }

    /// Replace the whole state with `next`. No merging takes place.
    pub fn set_states(&self, next: Record) {
        tracing::trace!(store = self.label_for_log(), fields = next.len(), "replacing state");
        self.replace_with(|_| next);
    }

    /// Create an updater scoped to the top-level field `key`.
    ///
    /// `store.create_prop_updater("cart").update(partial)` has the same effect
    /// as `store.update_states({"cart": partial})`. The field does not need to
    /// exist yet.
    pub fn create_prop_updater(&self, key: impl Into<String>) -> PropUpdater {
        PropUpdater {
            store: self.clone(),
            key: key.into(),
        }
    }

    pub fn subscribe(&self, handler: &Subscriber) {
        self.inner.registry.subscribe(handler);
    }

    pub fn unsubscribe(&self, handler: &Subscriber) {
        self.inner.registry.unsubscribe(handler);
    }

    pub fn is_subscribed(&self, handler: &Subscriber) -> bool {
        self.inner.registry.contains(handler)
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether both handles refer to the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn replace_with(&self, f: impl FnOnce(&Record) -> Record) {
        let snapshot = {
            let mut state = self.inner.state.lock();
            let next = Snapshot::new(f(&state));
            *state = next.clone();
            next
        };
        self.inner
            .registry
            .notify_while(&snapshot, |delivered| delivered.ptr_eq(&self.snapshot()));
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.inner))
    }

    fn label_for_log(&self) -> &str {
        self.label().unwrap_or("<unlabelled>")
    }
}

/// Non-owning handle to a store, held by subscribers that need to read the
/// latest state without keeping the store alive.
#[derive(Clone)]
pub(crate) struct WeakStore(Weak<StoreInner>);

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<Store> {
        self.0.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.label)
            .field("state", &self.snapshot())
            .field("registry", &self.inner.registry)
            .finish()
    }
}

fn merge(current: &Record, partial: Record) -> Record {
    let mut next = current.clone();
    for (key, incoming) in partial {
        let merged = match (next.get(&key), incoming) {
            (Some(Value::Record(old)), Value::Record(new)) => {
                let mut fields = (**old).clone();
                fields.extend(new.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::record(fields)
            }
            (_, incoming) => incoming,
        };
        next.insert(key, merged);
    }
    next
}

/// Updater bound to one top-level field of a store.
///
/// ```rust
/// use global_states::{Record, Store};
///
/// let store = Store::new(Record::new());
/// let update_cart = store.create_prop_updater("cart");
///
/// update_cart.update(Record::new().with("qty", 5));
/// update_cart.update(Record::new().with("open", true));
///
/// let cart = store.get_states().get("cart").and_then(|v| v.as_record().cloned()).unwrap();
/// assert_eq!(cart.len(), 2);
/// ```
#[derive(Clone)]
pub struct PropUpdater {
    store: Store,
    key: String,
}

impl PropUpdater {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Merge `partial` into the bound field.
    pub fn update(&self, partial: Record) {
        self.store
            .update_states(Record::new().with(self.key.clone(), partial));
    }

    /// Consume the updater into a plain closure.
    pub fn into_fn(self) -> impl Fn(Record) + Send + Sync + Clone + 'static {
        move |partial| self.update(partial)
    }
}

impl fmt::Debug for PropUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropUpdater").field("key", &self.key).finish()
    }
}

/// Free functions operating on [`Store::global`].
pub mod global {
    use super::{PropUpdater, Store};
    use crate::registry::Subscriber;
    use crate::value::Record;

    pub fn get_states() -> Record {
        Store::global().get_states()
    }

    pub fn update_states(partial: Record) {
        Store::global().update_states(partial);
    }

    pub fn set_states(next: Record) {
        Store::global().set_states(next);
    }

    pub fn create_prop_updater(key: impl Into<String>) -> PropUpdater {
        Store::global().create_prop_updater(key)
    }

    pub fn subscribe(handler: &Subscriber) {
        Store::global().subscribe(handler);
    }

    pub fn unsubscribe(handler: &Subscriber) {
        Store::global().unsubscribe(handler);
    }
}
