//! Foundation types for depemit.
//!
//! This crate provides the listener model shared by the graph and emitter
//! crates. Every other depemit crate depends on `depemit-types`.
//!
//! # Key Types
//!
//! - [`ListenerId`] — Process-unique identity of a listener handle
//! - [`Listener`] — Cloneable async callback handle, compared by identity
//! - [`ListenerKind`] — How a listener participates in an event (normal, once, placeholder)
//! - [`RegistrationError`] — Synchronous failures raised while registering listeners

pub mod error;
pub mod identity;
pub mod kind;
pub mod listener;
pub mod validate;

pub use error::{RegistrationError, RegistrationResult};
pub use identity::ListenerId;
pub use kind::ListenerKind;
pub use listener::{Listener, ListenerFuture};
pub use validate::{validate_dependencies, DEFAULT_MAX_DEPENDENCIES};
