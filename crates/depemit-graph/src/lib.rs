//! Listener dependency graph for depemit.
//!
//! Each event owns a [`Registry`] of [`Wrapper`]s keyed by listener
//! identity. The registry keeps the `dependencies`/`consumers` edges
//! symmetric as listeners are added, promoted, and removed, and the
//! [`resolve`] module turns a registry into an execution order: a flat
//! topological sort or a sequence of concurrently runnable layers.

pub mod error;
pub mod registry;
pub mod resolve;
pub mod wrapper;

pub use error::{GraphError, GraphResult};
pub use registry::Registry;
pub use resolve::{group, sort};
pub use wrapper::Wrapper;
