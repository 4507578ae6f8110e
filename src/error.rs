//! Error types surfaced by the store, context and action binding.

use thiserror::Error;

/// Errors raised when a caller misuses the store plumbing.
///
/// Merging, subscribing and notifying never fail; these variants cover
/// configuration mistakes that cannot be resolved by a fallback policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A binding or connection was requested through a [`Context`](crate::Context)
    /// that has no store provided.
    #[error(
        "cannot bind to the store: no store has been provided to this context \
         (provide one, or use Context::global())"
    )]
    NotConnected,

    /// A bound action was looked up by a namespace/name pair that was never registered.
    #[error("unknown action `{namespace}.{name}`")]
    UnknownAction { namespace: String, name: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
