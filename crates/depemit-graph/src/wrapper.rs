//! A listener's participation in one event.

use std::fmt;

use indexmap::IndexSet;

use depemit_types::{Listener, ListenerId, ListenerKind};

/// One listener registered for one event, with its graph edges.
///
/// Edges refer to other wrappers of the same registry by [`ListenerId`];
/// they never own the listener on the other end. The owning event is not
/// stored here: a wrapper is only reachable through its
/// [`Registry`](crate::Registry), which knows the event name.
pub struct Wrapper<A, T> {
    pub(crate) listener: Listener<A, T>,
    pub(crate) kind: ListenerKind,
    /// Listeners that must complete before this one runs.
    pub(crate) dependencies: IndexSet<ListenerId>,
    /// Listeners that declared a dependency on this one.
    pub(crate) consumers: IndexSet<ListenerId>,
}

impl<A, T> Wrapper<A, T> {
    pub(crate) fn new(listener: Listener<A, T>, kind: ListenerKind) -> Self {
        Self {
            listener,
            kind,
            dependencies: IndexSet::new(),
            consumers: IndexSet::new(),
        }
    }

    /// The wrapped listener handle.
    pub fn listener(&self) -> &Listener<A, T> {
        &self.listener
    }

    pub fn id(&self) -> ListenerId {
        self.listener.id()
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Returns `true` if this wrapper is an auto-inserted placeholder.
    pub fn is_placeholder(&self) -> bool {
        !self.kind.is_explicit()
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.dependencies.iter().copied()
    }

    /// Listeners depending on this one, in declaration order.
    pub fn consumers(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.consumers.iter().copied()
    }

    pub fn depends_on(&self, id: ListenerId) -> bool {
        self.dependencies.contains(&id)
    }
}

impl<A, T> fmt::Debug for Wrapper<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("listener", &self.listener.id())
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("consumers", &self.consumers)
            .finish()
    }
}
