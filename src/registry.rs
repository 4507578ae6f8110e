//! Publisher/subscriber list that fans snapshots out to bindings.

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::store::Snapshot;

type HandlerFn = Box<dyn Fn(&Snapshot) + Send + Sync + 'static>;

/// A snapshot handler with identity.
///
/// Clones of a `Subscriber` are the *same* handler: subscribing a clone of
/// an already registered handler is a no-op, and unsubscribing any clone
/// removes it. Two subscribers created separately are always distinct, even
/// if they wrap identical closures.
///
/// # Example
///
/// ```rust
/// use global_states::{Registry, Subscriber};
///
/// let registry = Registry::new();
/// let handler = Subscriber::new(|snapshot| println!("{} fields", snapshot.len()));
///
/// registry.subscribe(&handler);
/// registry.subscribe(&handler.clone());
/// assert_eq!(registry.len(), 1);
///
/// registry.unsubscribe(&handler);
/// assert!(registry.is_empty());
/// ```
pub struct Subscriber(Arc<HandlerFn>);

impl Subscriber {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        Self(Arc::new(Box::new(handler)))
    }

    /// Invoke the handler directly.
    pub fn call(&self, snapshot: &Snapshot) {
        (self.0)(snapshot);
    }

    /// Whether both handles refer to the same handler.
    pub fn same_as(&self, other: &Subscriber) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for Subscriber {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").finish_non_exhaustive()
    }
}

/// Ordered set of [`Subscriber`]s.
///
/// Notification is synchronous and follows registration order. The handler
/// list is copied before the fan-out starts, so handlers may subscribe,
/// unsubscribe or touch the owning store while being notified; such changes
/// apply from the next notification on.
#[derive(Default)]
pub struct Registry {
    handlers: Mutex<Vec<Subscriber>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler unless it is already registered.
    pub fn subscribe(&self, handler: &Subscriber) {
        let mut handlers = self.handlers.lock();
        if handlers.iter().any(|h| h.same_as(handler)) {
            tracing::trace!("handler already subscribed");
            return;
        }
        handlers.push(handler.clone());
        tracing::trace!(subscribers = handlers.len(), "subscribed");
    }

    /// Remove a handler. Unknown handlers are ignored.
    pub fn unsubscribe(&self, handler: &Subscriber) {
        let mut handlers = self.handlers.lock();
        if let Some(index) = handlers.iter().position(|h| h.same_as(handler)) {
            handlers.remove(index);
            tracing::trace!(subscribers = handlers.len(), "unsubscribed");
        }
    }

    /// Call every registered handler with `snapshot`, in registration order.
    pub fn notify(&self, snapshot: &Snapshot) {
        self.notify_while(snapshot, |_| true);
    }

    /// Like [`notify`](Self::notify), but checks `is_current` before each
    /// handler and stops the fan-out once `snapshot` has been superseded.
    ///
    /// A handler that mutates the owning store starts a nested fan-out of the
    /// newer snapshot to every handler; the remaining handlers of the outer
    /// fan-out must not receive the older one afterwards.
    pub fn notify_while(&self, snapshot: &Snapshot, is_current: impl Fn(&Snapshot) -> bool) {
        let handlers = self.handlers.lock().clone();
        tracing::trace!(subscribers = handlers.len(), "notifying");
        for handler in &handlers {
            if !is_current(snapshot) {
                tracing::trace!("snapshot superseded; stopping fan-out");
                return;
            }
            handler.call(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    pub fn contains(&self, handler: &Subscriber) -> bool {
        self.handlers.lock().iter().any(|h| h.same_as(handler))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.len())
            .finish()
    }
}
