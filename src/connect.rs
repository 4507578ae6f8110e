//! Binding namespaced action creators to a store.
//!
//! Components often need a handful of store-aware callbacks ("add item to
//! cart", "rename user") rather than raw access to the store. An
//! [`ActionCatalog`] lists creators grouped by namespace; connecting it to a
//! store calls every creator once with that store and hands the component
//! the resulting [`BoundActions`] together with the store handle.

use core::fmt;
use std::collections::BTreeMap;

use portable_atomic_util::Arc;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::value::Value;

type ActionFn = Box<dyn Fn(Value) + Send + Sync + 'static>;
type CreatorFn = Box<dyn Fn(&Store) -> Action + Send + Sync + 'static>;

/// A callable bound to a store, taking a single payload.
pub struct Action(Arc<ActionFn>);

impl Action {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self(Arc::new(Box::new(action)))
    }

    pub fn call(&self, payload: impl Into<Value>) {
        (self.0)(payload.into());
    }
}

impl Clone for Action {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

/// Action creators grouped by namespace, not yet bound to a store.
///
/// # Example
///
/// ```rust
/// use global_states::{Action, ActionCatalog, Record, Store, Value};
///
/// let catalog = ActionCatalog::new().with("cart", "set_qty", |store: &Store| {
///     let update_cart = store.create_prop_updater("cart");
///     Action::new(move |qty: Value| update_cart.update(Record::new().with("qty", qty)))
/// });
///
/// let store = Store::new(Record::new());
/// let actions = catalog.bind(&store);
/// actions.call("cart", "set_qty", 3).unwrap();
///
/// let cart = store.get_states().get("cart").cloned().unwrap();
/// assert_eq!(cart.as_record().and_then(|c| c.get("qty")).and_then(Value::as_f64), Some(3.0));
/// ```
#[derive(Default)]
pub struct ActionCatalog {
    namespaces: BTreeMap<String, BTreeMap<String, CreatorFn>>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `creator` as `namespace.name`, replacing any earlier entry.
    pub fn register<F>(&mut self, namespace: impl Into<String>, name: impl Into<String>, creator: F)
    where
        F: Fn(&Store) -> Action + Send + Sync + 'static,
    {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(name.into(), Box::new(creator));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, namespace: impl Into<String>, name: impl Into<String>, creator: F) -> Self
    where
        F: Fn(&Store) -> Action + Send + Sync + 'static,
    {
        self.register(namespace, name, creator);
        self
    }

    /// Call every creator with `store`.
    pub fn bind(&self, store: &Store) -> BoundActions {
        let namespaces = self
            .namespaces
            .iter()
            .map(|(namespace, creators)| {
                let actions: BTreeMap<String, Action> = creators
                    .iter()
                    .map(|(name, creator)| (name.clone(), creator(store)))
                    .collect();
                (namespace.clone(), actions)
            })
            .collect();
        BoundActions { namespaces }
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

impl fmt::Debug for ActionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.namespaces
                    .iter()
                    .map(|(namespace, creators)| (namespace, creators.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}

/// Actions produced by [`ActionCatalog::bind`].
#[derive(Clone, Default)]
pub struct BoundActions {
    namespaces: BTreeMap<String, BTreeMap<String, Action>>,
}

impl BoundActions {
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Action> {
        self.namespaces.get(namespace)?.get(name)
    }

    /// All actions of one namespace.
    pub fn namespace(&self, namespace: &str) -> Option<&BTreeMap<String, Action>> {
        self.namespaces.get(namespace)
    }

    /// Invoke `namespace.name` with `payload`.
    pub fn call(&self, namespace: &str, name: &str, payload: impl Into<Value>) -> Result<()> {
        let action = self.get(namespace, name).ok_or_else(|| Error::UnknownAction {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        })?;
        action.call(payload);
        Ok(())
    }
}

impl fmt::Debug for BoundActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.namespaces
                    .iter()
                    .map(|(namespace, actions)| (namespace, actions.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}

/// What a connected component receives: its store and its bound actions.
#[derive(Clone, Debug)]
pub struct Connected {
    store: Store,
    actions: BoundActions,
}

impl Connected {
    pub fn new(store: Store, catalog: &ActionCatalog) -> Self {
        let actions = catalog.bind(&store);
        Self { store, actions }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn actions(&self) -> &BoundActions {
        &self.actions
    }
}
