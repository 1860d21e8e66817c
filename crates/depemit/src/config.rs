use serde::{Deserialize, Serialize};

use depemit_types::DEFAULT_MAX_DEPENDENCIES;

use crate::error::ConfigError;

/// What a parallel emission does when a listener in a layer fails.
///
/// Neither policy cancels or rolls back listeners that already started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFailurePolicy {
    /// Surface the first failure immediately; siblings keep running
    /// detached and their values are discarded.
    #[default]
    FailFast,
    /// Wait for every sibling in the failing layer to finish, then surface
    /// the first failure. Later layers never start.
    SettleLayer,
}

/// Configuration for an [`EventEmitter`](crate::EventEmitter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Longest dependency list accepted by a single registration call.
    pub max_dependencies: usize,
    /// Failure handling for [`EventEmitter::emit`](crate::EventEmitter::emit).
    pub layer_failure: LayerFailurePolicy,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_dependencies: DEFAULT_MAX_DEPENDENCIES,
            layer_failure: LayerFailurePolicy::FailFast,
        }
    }
}

impl EmitterConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}
