//! The emitter handle: registration and introspection.
//!
//! [`EventEmitter`] owns one [`Registry`] per event name. Registries are
//! created on first registration and dropped as soon as their last
//! listener goes away. Emission is implemented in the `emission` module.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use depemit_graph::{group, sort, GraphResult, Registry};
use depemit_types::{
    validate_dependencies, Listener, ListenerId, ListenerKind, RegistrationResult,
};

use crate::config::EmitterConfig;

pub(crate) struct Inner<A, T> {
    pub(crate) events: Mutex<IndexMap<String, Registry<A, T>>>,
    pub(crate) config: EmitterConfig,
}

/// An event emitter whose listeners may depend on each other.
///
/// The handle is cheap to clone; clones share the same listeners.
/// Listeners may capture a clone and register or remove listeners while
/// an emission is running.
///
/// # Mutation during emission
///
/// An emission computes its execution order once, up front. Everything it
/// does afterwards goes through the live registry: `once` listeners remove
/// themselves as soon as they succeed, and any registration or removal made
/// by a listener (or by another task) is visible to the rest of that
/// emission's bookkeeping. A listener removed mid-emission still runs if it
/// was already part of the computed order, and a listener added
/// mid-emission waits for the next emission. This is part of the contract,
/// not a race to be guarded against, but results depend on timing.
pub struct EventEmitter<A, T> {
    pub(crate) inner: Arc<Inner<A, T>>,
}

impl<A, T> Clone for EventEmitter<A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T> fmt::Debug for EventEmitter<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<A, T> Default for EventEmitter<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> EventEmitter<A, T> {
    /// Create an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                events: Mutex::new(IndexMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.inner.config
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    /// Register `listener` for `event`, to run after every listener in
    /// `dependencies`.
    ///
    /// Dependencies that are not registered yet are inserted as
    /// placeholders and run like any other listener until nothing depends
    /// on them anymore. Registering the same listener again merges the new
    /// dependencies and turns a placeholder or `once` listener into a
    /// normal one.
    pub fn on(
        &self,
        event: impl Into<String>,
        listener: &Listener<A, T>,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<&Self> {
        self.register(event.into(), listener, ListenerKind::Normal, dependencies)
    }

    /// Alias of [`EventEmitter::on`].
    pub fn add_listener(
        &self,
        event: impl Into<String>,
        listener: &Listener<A, T>,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<&Self> {
        self.on(event, listener, dependencies)
    }

    /// Alias of [`EventEmitter::on`].
    pub fn add_event_listener(
        &self,
        event: impl Into<String>,
        listener: &Listener<A, T>,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<&Self> {
        self.on(event, listener, dependencies)
    }

    /// Like [`EventEmitter::on`], but the listener unregisters itself after
    /// its first successful run. A listener already registered with `on`
    /// stays a normal listener.
    pub fn once(
        &self,
        event: impl Into<String>,
        listener: &Listener<A, T>,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<&Self> {
        self.register(event.into(), listener, ListenerKind::OnceOnly, dependencies)
    }

    fn register(
        &self,
        event: String,
        listener: &Listener<A, T>,
        kind: ListenerKind,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<&Self> {
        validate_dependencies(listener, dependencies, self.inner.config.max_dependencies)?;

        let mut events = self.inner.events.lock();
        let registry = events
            .entry(event.clone())
            .or_insert_with(|| Registry::new(event.clone()));
        let outcome = registry.add(listener, kind, dependencies);
        if registry.is_empty() {
            events.shift_remove(&event);
        }
        outcome.map(|()| self)
    }

    /// Remove `listener` from `event`. Unknown events and listeners are
    /// ignored.
    pub fn off(&self, event: &str, listener: &Listener<A, T>) -> &Self {
        self.remove(event, listener.id());
        self
    }

    /// Alias of [`EventEmitter::off`].
    pub fn remove_listener(&self, event: &str, listener: &Listener<A, T>) -> &Self {
        self.off(event, listener)
    }

    /// Alias of [`EventEmitter::off`].
    pub fn remove_event_listener(&self, event: &str, listener: &Listener<A, T>) -> &Self {
        self.off(event, listener)
    }

    /// Drop every listener of `event`, or of every event when `event` is
    /// `None`. This discards registries wholesale without detaching edges.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> &Self {
        let mut events = self.inner.events.lock();
        match event {
            Some(event) => {
                if events.shift_remove(event).is_some() {
                    debug!(event, "removed all listeners of event");
                }
            }
            None => {
                debug!(events = events.len(), "removed all listeners");
                events.clear();
            }
        }
        self
    }

    pub(crate) fn remove(&self, event: &str, id: ListenerId) -> bool {
        let mut events = self.inner.events.lock();
        let Some(registry) = events.get_mut(event) else {
            return false;
        };
        let removed = registry.remove(id);
        if registry.is_empty() {
            events.shift_remove(event);
        }
        removed
    }

    /// Remove `id` from `event` only if it is still a `once` listener.
    ///
    /// The kind is read at completion time, so a `once` listener promoted
    /// with `on` while it was running stays registered.
    pub(crate) fn retire_once(&self, event: &str, id: ListenerId) {
        let mut events = self.inner.events.lock();
        let Some(registry) = events.get_mut(event) else {
            return;
        };
        if registry.get(id).is_some_and(|wrapper| wrapper.kind().is_once()) {
            registry.remove(id);
            if registry.is_empty() {
                events.shift_remove(event);
            }
        }
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    /// Returns `true` if any event has at least one listener.
    pub fn has_listeners(&self) -> bool {
        !self.inner.events.lock().is_empty()
    }

    /// Returns `true` if `event` has at least one listener.
    pub fn has_event(&self, event: &str) -> bool {
        self.inner.events.lock().contains_key(event)
    }

    /// Returns `true` if `listener` is registered for `event`, including as
    /// an auto-inserted placeholder.
    pub fn has_listener(&self, event: &str, listener: &Listener<A, T>) -> bool {
        self.inner
            .events
            .lock()
            .get(event)
            .is_some_and(|registry| registry.contains(listener.id()))
    }

    /// How `listener` currently participates in `event`.
    pub fn listener_kind(&self, event: &str, listener: &Listener<A, T>) -> Option<ListenerKind> {
        let events = self.inner.events.lock();
        events
            .get(event)
            .and_then(|registry| registry.get(listener.id()))
            .map(|wrapper| wrapper.kind())
    }

    /// Events with at least one listener, in order of first registration.
    pub fn event_names(&self) -> Vec<String> {
        self.inner.events.lock().keys().cloned().collect()
    }

    /// Listeners of `event` in the order [`EventEmitter::emit_series`]
    /// would run them right now.
    pub fn sorted_listener_list(&self, event: &str) -> GraphResult<Vec<Listener<A, T>>> {
        let events = self.inner.events.lock();
        let Some(registry) = events.get(event) else {
            return Ok(Vec::new());
        };
        Ok(sort(registry)?
            .into_iter()
            .map(|wrapper| wrapper.listener().clone())
            .collect())
    }

    /// Listeners of `event` in the layers [`EventEmitter::emit`] would run
    /// right now.
    pub fn grouped_listener_list(&self, event: &str) -> GraphResult<Vec<Vec<Listener<A, T>>>> {
        let events = self.inner.events.lock();
        let Some(registry) = events.get(event) else {
            return Ok(Vec::new());
        };
        Ok(group(registry)?
            .into_iter()
            .map(|layer| {
                layer
                    .into_iter()
                    .map(|wrapper| wrapper.listener().clone())
                    .collect()
            })
            .collect())
    }

    /// The dependencies declared for `listener` on `event`; empty if either
    /// is unknown.
    pub fn listener_dependency_list(&self, event: &str, listener: &Listener<A, T>) -> Vec<Listener<A, T>> {
        self.inner
            .events
            .lock()
            .get(event)
            .map(|registry| registry.dependencies_of(listener.id()))
            .unwrap_or_default()
    }
}
