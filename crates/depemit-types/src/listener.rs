//! The listener handle: an async callback with a stable identity.
//!
//! A [`Listener`] is what callers register, name as a dependency, and look
//! up in emission results. It is keyed purely by its [`ListenerId`], never
//! by the closure it wraps.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::identity::ListenerId;

/// The future produced by invoking a listener.
pub type ListenerFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

type Callback<A, T> = dyn Fn(A) -> ListenerFuture<T> + Send + Sync;

/// A cloneable, identity-compared handle around an async listener callback.
///
/// `A` is the argument payload handed to each invocation and `T` is the
/// value the listener resolves to.
pub struct Listener<A, T> {
    id: ListenerId,
    callback: Arc<Callback<A, T>>,
}

impl<A: 'static, T: 'static> Listener<A, T> {
    /// Wrap a closure returning a future.
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            id: ListenerId::next(),
            callback: Arc::new(move |args| -> ListenerFuture<T> { callback(args).boxed() }),
        }
    }

    /// Wrap a plain fallible closure. It is still invoked as a future, so
    /// synchronous and asynchronous listeners mix freely.
    pub fn sync<F>(callback: F) -> Self
    where
        F: Fn(A) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Send,
    {
        Self::new(move |args| future::ready(callback(args)))
    }
}

impl<A, T> Listener<A, T> {
    /// The identity this handle is registered under.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Start one invocation of the callback.
    pub fn call(&self, args: A) -> ListenerFuture<T> {
        (self.callback)(args)
    }
}

impl<A, T> Clone for Listener<A, T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<A, T> fmt::Debug for Listener<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.id)
    }
}

impl<A, T> PartialEq for Listener<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A, T> Eq for Listener<A, T> {}

impl<A, T> Hash for Listener<A, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<A, T> PartialOrd for Listener<A, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A, T> Ord for Listener<A, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
