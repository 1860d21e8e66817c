use depemit_graph::GraphError;
use depemit_types::ListenerId;

/// Errors produced by an emission.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The listener graph could not be ordered; no listener ran.
    #[error(transparent)]
    Resolve(#[from] GraphError),

    /// A listener returned an error.
    #[error("listener {listener} failed while handling event {event:?}: {source}")]
    Listener {
        event: String,
        listener: ListenerId,
        #[source]
        source: anyhow::Error,
    },

    /// A listener task panicked or was aborted before producing a value.
    #[error("listener {listener} did not complete while handling event {event:?}: {reason}")]
    Join {
        event: String,
        listener: ListenerId,
        reason: String,
    },
}

impl EmitError {
    /// Returns `true` if the emission failed on a dependency cycle.
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::Resolve(GraphError::CircularDependency { .. }))
    }

    /// The listener the failure is attributed to.
    pub fn listener(&self) -> ListenerId {
        match self {
            Self::Resolve(GraphError::CircularDependency { listener, .. })
            | Self::Resolve(GraphError::Inconsistent { listener, .. })
            | Self::Listener { listener, .. }
            | Self::Join { listener, .. } => *listener,
        }
    }

    /// Stable machine-readable marker for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Resolve(err) => err.code(),
            Self::Listener { .. } => "LISTENER_FAILED",
            Self::Join { .. } => "LISTENER_ABORTED",
        }
    }
}

/// Convenience alias for emission results.
pub type EmitResult<T> = Result<T, EmitError>;

/// Errors produced while loading an [`EmitterConfig`](crate::EmitterConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid emitter configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
