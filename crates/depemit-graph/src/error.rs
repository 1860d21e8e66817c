//! Error types for the listener graph.

use depemit_types::ListenerId;

/// Marker carried by every circular dependency failure.
pub const CIRCULAR_REFERENCE: &str = "CIRCULAR_REFERENCE";

/// Errors that can occur while resolving or checking a listener graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The dependency graph of an event contains a directed cycle.
    #[error("circular dependency detected while resolving listeners of event {event:?} (at {listener})")]
    CircularDependency {
        /// The event being resolved.
        event: String,
        /// A listener on the cycle.
        listener: ListenerId,
    },

    /// The `dependencies`/`consumers` edges disagree.
    #[error("inconsistent graph at {listener}: {reason}")]
    Inconsistent {
        /// The listener whose edges are broken.
        listener: ListenerId,
        /// What is wrong.
        reason: String,
    },
}

impl GraphError {
    /// Stable machine-readable marker for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircularDependency { .. } => CIRCULAR_REFERENCE,
            Self::Inconsistent { .. } => "INCONSISTENT_GRAPH",
        }
    }
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
