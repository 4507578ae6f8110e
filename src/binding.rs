//! Per-component subscriptions that only fire when their selection changed.

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::registry::Subscriber;
use crate::selector::Selector;
use crate::store::Store;
use crate::Renderer;

/// Connects one component to a [`Store`].
///
/// On creation the binding selects its initial output from the current
/// snapshot; read it with [`current`](Self::current). It then subscribes to
/// the store. On every notification it selects again, compares the result
/// with the output it last delivered, and only when they differ stores the
/// new output and calls its [`Renderer`]. Creating a binding does not render.
///
/// Dropping the binding, or calling [`teardown`](Self::teardown),
/// unsubscribes it. A binding that is kept alive after its component is gone
/// keeps receiving every notification.
///
/// # Example
///
/// ```rust
/// use global_states::{Binding, Fields, Projection, Record, Store, TestRenderer};
/// use serde_json::json;
///
/// let store = Store::new(Record::from_json(json!({
///     "user": {"name": "me"},
///     "cart": {"qty": 1},
/// })).unwrap());
///
/// let renders = TestRenderer::<Projection>::new();
/// let binding = Binding::new(&store, Fields::new(["user"]), renders.clone());
///
/// store.update_states(Record::from_json(json!({"cart": {"qty": 2}})).unwrap());
/// assert_eq!(renders.count(), 0);
///
/// store.update_states(Record::from_json(json!({"user": {"name": "you"}})).unwrap());
/// assert_eq!(renders.count(), 1);
///
/// binding.teardown();
/// assert_eq!(store.subscriber_count(), 0);
/// ```
pub struct Binding<S, R>
where
    S: Selector,
{
    store: Store,
    selector: Arc<S>,
    slot: Arc<Slot<S::Output, R>>,
    subscriber: Subscriber,
}

/// State shared between a binding and its subscription handler.
struct Slot<P, R> {
    current: Mutex<P>,
    /// Latest render not yet handed to the renderer.
    pending: Mutex<Option<P>>,
    renderer: Mutex<R>,
}

impl<S, R> Binding<S, R>
where
    S: Selector,
    R: Renderer<S::Output> + Send + 'static,
{
    pub fn new(store: &Store, selector: S, renderer: R) -> Self {
        let selector = Arc::new(selector);
        let slot = Arc::new(Slot {
            current: Mutex::new(selector.select(&store.snapshot())),
            pending: Mutex::new(None),
            renderer: Mutex::new(renderer),
        });
        let subscriber = subscribe(store, &selector, &slot);

        tracing::trace!(key = %selector.cache_key(), "binding mounted");

        Self {
            store: store.clone(),
            selector,
            slot,
            subscriber,
        }
    }

    /// Switch to a different selection.
    ///
    /// When `selector` has the same cache key as the current one, nothing is
    /// resubscribed. Otherwise the old subscription is removed, the output is
    /// reselected from the current snapshot, and a new subscription is made.
    /// Rebinding never renders: the owner is the one asking.
    pub fn rebind(&mut self, selector: S) {
        if selector.cache_key() == self.selector.cache_key() {
            return;
        }
        tracing::trace!(
            from = %self.selector.cache_key(),
            to = %selector.cache_key(),
            "rebinding"
        );

        self.store.unsubscribe(&self.subscriber);
        self.selector = Arc::new(selector);
        let output = self.selector.select(&self.store.snapshot());
        *self.slot.current.lock() = output;
        self.subscriber = subscribe(&self.store, &self.selector, &self.slot);
    }
}

impl<S, R> Binding<S, R>
where
    S: Selector,
{
    /// The output delivered most recently (or selected at creation).
    pub fn current(&self) -> S::Output {
        self.slot.current.lock().clone()
    }

    /// Borrow the current output without cloning it.
    pub fn with_current<T>(&self, f: impl FnOnce(&S::Output) -> T) -> T {
        let current = self.slot.current.lock();
        f(&*current)
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }

    pub fn cache_key(&self) -> String {
        self.selector.cache_key()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether this binding is still registered with its store.
    pub fn is_subscribed(&self) -> bool {
        self.store.is_subscribed(&self.subscriber)
    }

    /// Unsubscribe and drop the binding.
    pub fn teardown(self) {
        drop(self);
    }
}

impl<S, R> Drop for Binding<S, R>
where
    S: Selector,
{
    fn drop(&mut self) {
        self.store.unsubscribe(&self.subscriber);
        tracing::debug!(key = %self.selector.cache_key(), "binding torn down");
    }
}

impl<S, R> fmt::Debug for Binding<S, R>
where
    S: Selector + fmt::Debug,
    S::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("selector", &*self.selector)
            .field("current", &*self.slot.current.lock())
            .finish_non_exhaustive()
    }
}

fn subscribe<S, R>(store: &Store, selector: &Arc<S>, slot: &Arc<Slot<S::Output, R>>) -> Subscriber
where
    S: Selector,
    R: Renderer<S::Output> + Send + 'static,
{
    let latest = store.downgrade();
    let selector = selector.clone();
    let slot = slot.clone();

    let subscriber = Subscriber::new(move |snapshot| {
        let changed = {
            let mut current = slot.current.lock();
            // Select from the newest installed state, read under the lock so
            // concurrent notifications never move `current` backwards.
            let newest = latest.upgrade().map(|store| store.snapshot());
            let next = selector.select(newest.as_ref().unwrap_or(snapshot));
            if selector.same(&current, &next) {
                false
            } else {
                *current = next.clone();
                *slot.pending.lock() = Some(next);
                true
            }
        };

        if changed {
            tracing::trace!(key = %selector.cache_key(), "selection changed; rendering");
            slot.deliver();
        } else {
            tracing::trace!(key = %selector.cache_key(), "selection unchanged");
        }
    });
    store.subscribe(&subscriber);
    subscriber
}

impl<P, R> Slot<P, R>
where
    R: Renderer<P>,
{
    /// Hand pending renders to the renderer.
    ///
    /// When the renderer is already running (a renderer that mutated the
    /// store re-entered its own binding, or another thread is rendering), the
    /// render stays pending and the running call picks it up once it returns.
    /// Pending renders coalesce: only the newest is delivered.
    fn deliver(&self) {
        while let Some(mut renderer) = self.renderer.try_lock() {
            let next = self.pending.lock().take();
            match next {
                Some(props) => renderer.render(props),
                None => {
                    drop(renderer);
                    if self.pending.lock().is_none() {
                        return;
                    }
                }
            }
        }
        tracing::trace!("renderer busy; render left pending");
    }
}
