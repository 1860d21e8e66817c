//! Async event emitter with declared listener dependencies.
//!
//! A listener can require that other listeners of the same event complete
//! before it runs. Emission computes a dependency-respecting order each
//! time and runs it either strictly one listener at a time
//! ([`EventEmitter::emit_series`]) or layer by layer with every listener of
//! a layer in flight at once ([`EventEmitter::emit`]).
//!
//! ```no_run
//! use depemit::{EventEmitter, Listener};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let emitter: EventEmitter<String, ()> = EventEmitter::new();
//! let load = Listener::sync(|name: String| {
//!     println!("loading {name}");
//!     Ok(())
//! });
//! let render = Listener::new(|name: String| async move {
//!     println!("rendering {name}");
//!     Ok(())
//! });
//!
//! emitter
//!     .on("page", &render, &[load.clone()])?
//!     .on("page", &load, &[])?;
//! emitter.emit("page", "index".to_string()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod emission;
pub mod emitter;
pub mod error;
pub mod results;

pub use config::{EmitterConfig, LayerFailurePolicy};
pub use emitter::EventEmitter;
pub use error::{ConfigError, EmitError, EmitResult};
pub use results::EmitResults;

// Re-export the types callers need to register listeners.
pub use depemit_graph::{GraphError, GraphResult};
pub use depemit_types::{Listener, ListenerId, ListenerKind, RegistrationError, RegistrationResult};
