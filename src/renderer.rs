//! The seam through which bindings ask the host framework to re-render.

#[cfg(any(test, feature = "testing"))]
use portable_atomic_util::Arc;
#[cfg(any(test, feature = "testing"))]
use spin::Mutex;

/// Receiver of re-render requests.
///
/// A [`Binding`](crate::Binding) calls [`render`](Self::render) whenever its
/// projection changed, passing the fresh projection. When and how the owning
/// component actually repaints is up to the host framework.
///
/// `render` runs synchronously inside the store's notification fan-out. It
/// must not mutate the store directly; hosts that need to do so should queue
/// the request, for instance through an [`Emitter`](crate::Emitter).
///
/// Closures taking the props by value implement this trait.
///
/// # Example
///
/// ```rust
/// use global_states::{Projection, Renderer};
///
/// struct ConsoleRenderer;
///
/// impl Renderer<Projection> for ConsoleRenderer {
///     fn render(&mut self, props: Projection) {
///         println!("re-render with {} fields", props.len());
///     }
/// }
/// ```
pub trait Renderer<Props> {
    /// Signal that the owner should re-render with `props`.
    fn render(&mut self, props: Props);
}

impl<Props, F> Renderer<Props> for F
where
    F: FnMut(Props),
{
    fn render(&mut self, props: Props) {
        self(props)
    }
}

#[cfg(any(test, feature = "testing"))]
/// Renderer that records every render request for later assertions.
///
/// Only available with the `testing` feature.
///
/// Clones share the same capture buffer, so hand one clone to the binding
/// and keep another to inspect.
///
/// # Example
///
/// ```rust
/// use global_states::{Binding, Fields, Projection, Record, Store, TestRenderer};
///
/// let store = Store::new(Record::new().with("count", 0));
/// let renders = TestRenderer::<Projection>::new();
/// let _binding = Binding::new(&store, Fields::new(["count"]), renders.clone());
///
/// store.update_states(Record::new().with("count", 1));
///
/// assert_eq!(renders.count(), 1);
/// renders.with_renders(|renders| {
///     assert_eq!(renders[0].get("count").and_then(|v| v.as_f64()), Some(1.0));
/// });
/// ```
pub struct TestRenderer<Props> {
    renders: Arc<Mutex<Vec<Props>>>,
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Clone for TestRenderer<Props> {
    fn clone(&self) -> Self {
        Self {
            renders: self.renders.clone(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Renderer<Props> for TestRenderer<Props> {
    fn render(&mut self, props: Props) {
        self.renders.lock().push(props);
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Default for TestRenderer<Props> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> TestRenderer<Props> {
    pub fn new() -> Self {
        Self {
            renders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of render requests received so far.
    pub fn count(&self) -> usize {
        self.renders.lock().len()
    }

    /// The most recent render request.
    pub fn last(&self) -> Option<Props>
    where
        Props: Clone,
    {
        self.renders.lock().last().cloned()
    }

    /// Access the captured render requests with a closure.
    pub fn with_renders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<Props>) -> R,
    {
        let renders = self.renders.lock();
        f(&renders)
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.renders.lock().clear();
    }
}
