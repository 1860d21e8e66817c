//! The per-event listener registry and its graph maintenance.
//!
//! [`Registry`] stores at most one [`Wrapper`] per listener identity, in
//! registration order. It owns the wrappers; the edges between them are
//! plain [`ListenerId`] sets kept symmetric by every mutation.
//!
//! # Invariants
//!
//! - `B ∈ A.dependencies` if and only if `A ∈ B.consumers`.
//! - No wrapper depends on itself.
//! - Every edge resolves to a wrapper in the same registry.
//! - An auto-inserted placeholder with no consumers is removed at once.

use indexmap::IndexMap;
use tracing::debug;

use depemit_types::{Listener, ListenerId, ListenerKind, RegistrationError, RegistrationResult};

use crate::error::{GraphError, GraphResult};
use crate::wrapper::Wrapper;

/// All listeners of a single event.
pub struct Registry<A, T> {
    event: String,
    wrappers: IndexMap<ListenerId, Wrapper<A, T>>,
}

impl<A, T> Registry<A, T> {
    /// Create an empty registry for `event`.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            wrappers: IndexMap::new(),
        }
    }

    /// The event this registry belongs to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Number of wrappers, placeholders included.
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    /// Returns `true` if the registry holds no wrappers.
    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.wrappers.contains_key(&id)
    }

    pub fn get(&self, id: ListenerId) -> Option<&Wrapper<A, T>> {
        self.wrappers.get(&id)
    }

    /// All wrappers in registration order.
    pub fn wrappers(&self) -> impl Iterator<Item = &Wrapper<A, T>> + '_ {
        self.wrappers.values()
    }

    /// The dependency handles declared by `id`, or an empty list if the
    /// listener is unknown.
    pub fn dependencies_of(&self, id: ListenerId) -> Vec<Listener<A, T>> {
        let Some(wrapper) = self.wrappers.get(&id) else {
            return Vec::new();
        };
        wrapper
            .dependencies
            .iter()
            .filter_map(|dependency| self.wrappers.get(dependency))
            .map(|dependency| dependency.listener.clone())
            .collect()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Register `listener` with the requested `kind` and merge `dependencies`
    /// into its edge set.
    ///
    /// An existing wrapper keeps its edges; its kind changes according to
    /// [`ListenerKind::promote`]. The dependency list is checked for
    /// self-reference before anything is touched.
    pub fn add(
        &mut self,
        listener: &Listener<A, T>,
        kind: ListenerKind,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<()> {
        let id = listener.id();
        if dependencies.iter().any(|dependency| dependency.id() == id) {
            return Err(RegistrationError::SelfReference { listener: id });
        }

        match self.wrappers.get_mut(&id) {
            Some(existing) => {
                let promoted = existing.kind.promote(kind);
                if promoted != existing.kind {
                    debug!(
                        event = %self.event,
                        listener = %id,
                        from = %existing.kind,
                        to = %promoted,
                        "promoted listener"
                    );
                    existing.kind = promoted;
                }
            }
            None => {
                debug!(event = %self.event, listener = %id, %kind, "registered listener");
                self.wrappers.insert(id, Wrapper::new(listener.clone(), kind));
            }
        }

        self.merge_dependencies(listener, dependencies)
    }

    /// Add `dependencies` to the edge set of the already registered
    /// `listener`.
    ///
    /// Dependencies that are not registered yet get an
    /// [`ListenerKind::AutoInsertedDependency`] placeholder. Dependencies
    /// already declared are skipped.
    pub fn merge_dependencies(
        &mut self,
        listener: &Listener<A, T>,
        dependencies: &[Listener<A, T>],
    ) -> RegistrationResult<()> {
        let id = listener.id();
        if !self.wrappers.contains_key(&id) {
            return Err(RegistrationError::InvalidArgument {
                reason: format!("{id} is not registered for event {:?}", self.event),
            });
        }
        if dependencies.iter().any(|dependency| dependency.id() == id) {
            return Err(RegistrationError::SelfReference { listener: id });
        }

        for dependency in dependencies {
            let dependency_id = dependency.id();
            if self
                .wrappers
                .get(&id)
                .is_some_and(|wrapper| wrapper.depends_on(dependency_id))
            {
                continue;
            }

            let event = &self.event;
            self.wrappers
                .entry(dependency_id)
                .or_insert_with(|| {
                    debug!(
                        event = %event,
                        listener = %dependency_id,
                        consumer = %id,
                        "auto-inserted dependency placeholder"
                    );
                    Wrapper::new(dependency.clone(), ListenerKind::AutoInsertedDependency)
                })
                .consumers
                .insert(id);

            if let Some(wrapper) = self.wrappers.get_mut(&id) {
                wrapper.dependencies.insert(dependency_id);
            }
        }

        Ok(())
    }

    /// Detach `id` from the graph and delete its wrapper.
    ///
    /// Consumers silently lose the dependency. Placeholders left without
    /// consumers are removed as well, cascading down placeholder chains.
    /// Returns `false` if the listener was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(wrapper) = self.wrappers.shift_remove(&id) else {
            return false;
        };

        for consumer in &wrapper.consumers {
            if let Some(consumer) = self.wrappers.get_mut(consumer) {
                consumer.dependencies.shift_remove(&id);
            }
        }

        for dependency in &wrapper.dependencies {
            let orphaned = match self.wrappers.get_mut(dependency) {
                Some(target) => {
                    target.consumers.shift_remove(&id);
                    target.is_placeholder() && target.consumers.is_empty()
                }
                None => false,
            };
            if orphaned {
                debug!(
                    event = %self.event,
                    listener = %dependency,
                    "removing orphaned dependency placeholder"
                );
                self.remove(*dependency);
            }
        }

        debug!(event = %self.event, listener = %id, "removed listener");
        true
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Check the registry's structural invariants.
    ///
    /// Checks that:
    /// - Every edge resolves to a wrapper in this registry.
    /// - Every dependency edge has a matching consumer edge and vice versa.
    /// - No wrapper depends on itself.
    /// - No placeholder is left without consumers.
    pub fn validate(&self) -> GraphResult<()> {
        for wrapper in self.wrappers.values() {
            let id = wrapper.id();
            if wrapper.depends_on(id) {
                return Err(GraphError::Inconsistent {
                    listener: id,
                    reason: "depends on itself".into(),
                });
            }
            for dependency in &wrapper.dependencies {
                match self.wrappers.get(dependency) {
                    Some(target) if target.consumers.contains(&id) => {}
                    Some(_) => {
                        return Err(GraphError::Inconsistent {
                            listener: id,
                            reason: format!("{dependency} does not list it as a consumer"),
                        })
                    }
                    None => {
                        return Err(GraphError::Inconsistent {
                            listener: id,
                            reason: format!("dangling dependency {dependency}"),
                        })
                    }
                }
            }
            for consumer in &wrapper.consumers {
                match self.wrappers.get(consumer) {
                    Some(source) if source.depends_on(id) => {}
                    _ => {
                        return Err(GraphError::Inconsistent {
                            listener: id,
                            reason: format!("consumer {consumer} does not depend on it"),
                        })
                    }
                }
            }
            if wrapper.is_placeholder() && wrapper.consumers.is_empty() {
                return Err(GraphError::Inconsistent {
                    listener: id,
                    reason: "placeholder without consumers".into(),
                });
            }
        }
        Ok(())
    }
}
