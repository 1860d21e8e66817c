use std::fmt;

use serde::{Deserialize, Serialize};

/// How a registered listener participates in its event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    /// Registered with `on`; runs on every emission.
    Normal,
    /// Registered with `once`; removed after its first successful run.
    OnceOnly,
    /// Placeholder created because another listener named it as a
    /// dependency before it was registered explicitly.
    AutoInsertedDependency,
}

impl ListenerKind {
    /// Returns `true` for kinds the caller asked for (`Normal` or `OnceOnly`).
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Self::AutoInsertedDependency)
    }

    /// Returns `true` if the listener unregisters itself after running.
    pub fn is_once(&self) -> bool {
        matches!(self, Self::OnceOnly)
    }

    /// The kind that results from registering `requested` over an existing
    /// listener of kind `self`.
    ///
    /// Placeholders take any explicit kind, a `OnceOnly` listener becomes
    /// `Normal` when registered with `on`, and a `Normal` listener is never
    /// demoted by `once`.
    pub fn promote(self, requested: ListenerKind) -> ListenerKind {
        match (self, requested) {
            (current, Self::AutoInsertedDependency) => current,
            (Self::AutoInsertedDependency, requested) => requested,
            (Self::OnceOnly, Self::Normal) => Self::Normal,
            (current, _) => current,
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::OnceOnly => write!(f, "OnceOnly"),
            Self::AutoInsertedDependency => write!(f, "AutoInsertedDependency"),
        }
    }
}
