//! Channel-backed renderer for hosts that repaint on their own loop.

use flume::{Receiver, Sender, TryRecvError};

use crate::Renderer;

/// A [`Renderer`] that queues render requests instead of handling them inline.
///
/// Create one with [`render_channel`]. The host keeps the [`RenderQueue`] and
/// drains it from its event loop, which makes it safe for the host to mutate
/// the store in response to a render: by then the notification fan-out that
/// produced the request has finished.
///
/// `Emitter` wraps an unbounded flume sender, so it is cheap to clone and can
/// be handed to bindings on any thread.
pub struct Emitter<Props>(Sender<Props>);

impl<Props> Clone for Emitter<Props> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Props> Emitter<Props> {
    /// Queue `props` for the host. Dropped silently when the queue is gone.
    pub fn emit(&self, props: Props) {
        if self.0.send(props).is_err() {
            tracing::debug!("render queue dropped; discarding render request");
        }
    }
}

impl<Props> Renderer<Props> for Emitter<Props> {
    fn render(&mut self, props: Props) {
        self.emit(props);
    }
}

/// The receiving end of a [`render_channel`].
pub struct RenderQueue<Props>(Receiver<Props>);

impl<Props> RenderQueue<Props> {
    /// Take the oldest pending request, if any.
    pub fn try_next(&self) -> Option<Props> {
        match self.0.try_recv() {
            Ok(props) => Some(props),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every pending request, oldest first.
    pub fn drain(&self) -> Vec<Props> {
        self.0.drain().collect()
    }

    /// Wait for the next request. Resolves to `None` once every [`Emitter`]
    /// has been dropped and the queue is empty.
    pub async fn next(&self) -> Option<Props> {
        self.0.recv_async().await.ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Create a connected [`Emitter`] / [`RenderQueue`] pair.
///
/// ```rust
/// use global_states::{render_channel, Binding, Field, Record, Store};
///
/// let store = Store::new(Record::new().with("theme", "light"));
/// let (emitter, queue) = render_channel();
/// let _binding = Binding::new(&store, Field::new("theme"), emitter);
///
/// store.update_states(Record::new().with("theme", "dark"));
///
/// let pending = queue.drain();
/// assert_eq!(pending.len(), 1);
/// assert_eq!(pending[0].as_ref().and_then(|v| v.as_str()), Some("dark"));
/// ```
pub fn render_channel<Props>() -> (Emitter<Props>, RenderQueue<Props>) {
    let (sender, receiver) = flume::unbounded();
    (Emitter(sender), RenderQueue(receiver))
}
