//! Dependency-injection slot that makes a store reachable by bindings.

use core::fmt;

use portable_atomic_util::Arc;
use spin::RwLock;

use crate::binding::Binding;
use crate::connect::{ActionCatalog, Connected};
use crate::error::{Error, Result};
use crate::selector::{Field, Fields, Projection, Selector};
use crate::store::Store;
use crate::value::Value;
use crate::Renderer;

/// A slot through which components find their store.
///
/// Components that share a `Context` (clones share the slot) bind to
/// whichever store was last [`provide`](Self::provide)d. Binding through an
/// empty context fails with [`Error::NotConnected`].
///
/// Use [`Context::global`] for a context that always resolves to
/// [`Store::global`], or pass a [`Store`] to [`Binding::new`] directly when no
/// lookup is needed.
///
/// # Example
///
/// ```rust
/// use global_states::{Context, Error, Projection, Record, Store};
///
/// let context = Context::new();
/// assert_eq!(
///     context.bind(["user"], |_: Projection| {}).err(),
///     Some(Error::NotConnected)
/// );
///
/// let store = Store::new(Record::new().with("user", "me"));
/// let _provider = context.provide(store);
/// let binding = context.bind(["user"], |_: Projection| {}).unwrap();
/// assert_eq!(binding.current().get("user").and_then(|v| v.as_str()), Some("me"));
/// ```
#[derive(Clone)]
pub struct Context {
    slot: Arc<RwLock<Option<Store>>>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// A context already holding `store`.
    pub fn with_store(store: Store) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(store))),
        }
    }

    /// A context holding the process-wide default store.
    pub fn global() -> Self {
        Self::with_store(Store::global())
    }

    /// Install `store` in this context until the returned guard is dropped,
    /// at which point the previously provided store (if any) is restored.
    ///
    /// Nested providers must be dropped in reverse order of creation.
    #[must_use = "the store is only provided while the guard is alive"]
    pub fn provide(&self, store: Store) -> ProviderGuard {
        tracing::debug!(store = store.label().unwrap_or("<unlabelled>"), "providing store");
        let previous = self.slot.write().replace(store);
        ProviderGuard {
            slot: self.slot.clone(),
            previous,
        }
    }

    /// The store currently provided.
    pub fn store(&self) -> Result<Store> {
        (*self.slot.read()).clone().ok_or(Error::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Bind a set of fields of the provided store.
    pub fn bind<I, N, R>(&self, fields: I, renderer: R) -> Result<Binding<Fields, R>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        R: Renderer<Projection> + Send + 'static,
    {
        self.bind_with(Fields::new(fields), renderer)
    }

    /// Bind a single field of the provided store.
    pub fn bind_field<R>(&self, name: impl Into<String>, renderer: R) -> Result<Binding<Field, R>>
    where
        R: Renderer<Option<Value>> + Send + 'static,
    {
        self.bind_with(Field::new(name), renderer)
    }

    /// Bind an arbitrary selector to the provided store.
    pub fn bind_with<S, R>(&self, selector: S, renderer: R) -> Result<Binding<S, R>>
    where
        S: Selector,
        R: Renderer<S::Output> + Send + 'static,
    {
        let store = self.store()?;
        Ok(Binding::new(&store, selector, renderer))
    }

    /// Bind `catalog`'s actions to the provided store.
    pub fn connect(&self, catalog: &ActionCatalog) -> Result<Connected> {
        let store = self.store()?;
        Ok(Connected::new(store, catalog))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Keeps a store provided to a [`Context`]. Restores the previous store on drop.
pub struct ProviderGuard {
    slot: Arc<RwLock<Option<Store>>>,
    previous: Option<Store>,
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        *self.slot.write() = self.previous.take();
    }
}

impl fmt::Debug for ProviderGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderGuard")
            .field("restores", &self.previous.as_ref().and_then(Store::label))
            .finish()
    }
}
