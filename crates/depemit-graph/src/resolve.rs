//! Topological resolution of a registry into an execution order.
//!
//! Both algorithms read the registry without mutating it and treat the edge
//! "A depends on B" as "B goes before A". Neither result stays valid once
//! the registry changes, so callers resolve again for every emission.

use std::collections::{HashMap, HashSet};

use depemit_types::ListenerId;

use crate::error::{GraphError, GraphResult};
use crate::registry::Registry;
use crate::wrapper::Wrapper;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unresolved,
    Resolved,
}

/// Flat dependency-first order of every wrapper in `registry`.
///
/// Depth-first: a wrapper is appended only after all of its dependencies.
/// Reaching a wrapper that is still being resolved means the graph has a
/// cycle and yields [`GraphError::CircularDependency`]. The relative order
/// of unconstrained wrappers is unspecified.
pub fn sort<A, T>(registry: &Registry<A, T>) -> GraphResult<Vec<&Wrapper<A, T>>> {
    let mut marks: HashMap<ListenerId, Mark> = HashMap::with_capacity(registry.len());
    let mut order = Vec::with_capacity(registry.len());

    for root in registry.wrappers() {
        if marks.contains_key(&root.id()) {
            continue;
        }

        // Explicit stack of (wrapper, index of the next dependency to visit).
        marks.insert(root.id(), Mark::Unresolved);
        let mut stack: Vec<(&Wrapper<A, T>, usize)> = vec![(root, 0)];

        while let Some(&(wrapper, next)) = stack.last() {
            let Some(dependency) = wrapper.dependencies.get_index(next).copied() else {
                marks.insert(wrapper.id(), Mark::Resolved);
                order.push(wrapper);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match marks.get(&dependency) {
                Some(Mark::Resolved) => {}
                Some(Mark::Unresolved) => {
                    return Err(GraphError::CircularDependency {
                        event: registry.event().to_string(),
                        listener: dependency,
                    });
                }
                None => {
                    if let Some(target) = registry.get(dependency) {
                        marks.insert(dependency, Mark::Unresolved);
                        stack.push((target, 0));
                    }
                }
            }
        }
    }

    Ok(order)
}

/// Layered order of every wrapper in `registry`.
///
/// Each round peels off every remaining wrapper whose dependencies all sit
/// in earlier layers, so a wrapper lands in layer `k` exactly when the
/// longest dependency chain ending at it has `k` edges. A round that makes
/// no progress means the remaining wrappers form or feed a cycle and yields
/// [`GraphError::CircularDependency`]. Order inside a layer is unspecified.
pub fn group<A, T>(registry: &Registry<A, T>) -> GraphResult<Vec<Vec<&Wrapper<A, T>>>> {
    let mut resolved: HashSet<ListenerId> = HashSet::with_capacity(registry.len());
    let mut remaining: Vec<&Wrapper<A, T>> = registry.wrappers().collect();
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|wrapper| {
            wrapper
                .dependencies()
                .all(|dependency| resolved.contains(&dependency))
        });

        if ready.is_empty() {
            return Err(GraphError::CircularDependency {
                event: registry.event().to_string(),
                listener: blocked[0].id(),
            });
        }

        resolved.extend(ready.iter().map(|wrapper| wrapper.id()));
        layers.push(ready);
        remaining = blocked;
    }

    Ok(layers)
}
