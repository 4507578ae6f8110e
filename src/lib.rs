//! A global state container for component-based UIs.
//!
//! A [`Store`] holds one record of application state. Components read a
//! subset of its fields through a [`Binding`], which subscribes to the store
//! and asks the host framework to re-render (through a [`Renderer`]) only
//! when the fields it selected actually changed. "Changed" is decided by a
//! two-level comparison (see [`equality`]): fields are compared by value two
//! levels deep and by reference below that.
//!
//! State is dynamic: a store holds [`Value`]s, where [`Value::Record`] is a
//! plain record that merges, [`Value::Array`] a sequence that is replaced
//! wholesale, and [`Value::Opaque`] a host object that is only ever compared
//! by identity.
//!
//! ## Example
//!
//! ```rust
//! use global_states::{Binding, Fields, Projection, Record, Store, TestRenderer};
//! use serde_json::json;
//!
//! let store = Store::new(Record::from_json(json!({
//!     "user": {"name": "me"},
//!     "cart": {"qty": 1, "items": ["Item 1"]},
//! })).unwrap());
//!
//! // A component showing the user name.
//! let renders = TestRenderer::<Projection>::new();
//! let header = Binding::new(&store, Fields::new(["user"]), renders.clone());
//!
//! // Only `cart` changes: the header is not re-rendered.
//! store.create_prop_updater("cart").update(Record::new().with("qty", 2));
//! assert_eq!(renders.count(), 0);
//!
//! // `user.name` changes: the header re-renders with the new projection.
//! store.update_states(Record::from_json(json!({"user": {"name": "you"}})).unwrap());
//! assert_eq!(renders.count(), 1);
//! assert_eq!(header.current().to_json(), json!({"user": {"name": "you"}}));
//!
//! // Unmounting the component unsubscribes it.
//! drop(header);
//! assert_eq!(store.subscriber_count(), 0);
//! ```
//!
//! Stores can be passed to bindings directly, or made reachable through a
//! [`Context`]. A process-wide default store is available as
//! [`Store::global`] and through the free functions in [`global`].

mod binding;
mod connect;
mod context;
mod emitter;
pub mod equality;
mod error;
mod registry;
mod renderer;
mod selector;
mod store;
mod value;

pub use binding::Binding;
pub use connect::{Action, ActionCatalog, BoundActions, Connected};
pub use context::{Context, ProviderGuard};
pub use emitter::{render_channel, Emitter, RenderQueue};
pub use error::{Error, Result};
pub use registry::{Registry, Subscriber};
pub use renderer::Renderer;
pub use selector::{Field, Fields, Projection, Selector};
pub use store::{global, PropUpdater, Snapshot, Store, StoreBuilder};
pub use value::{Opaque, Record, Value};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use renderer::TestRenderer;
