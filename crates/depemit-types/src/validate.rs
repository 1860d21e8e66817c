//! Boundary validation for dependency lists.

use crate::error::{RegistrationError, RegistrationResult};
use crate::listener::Listener;

/// Default ceiling on the number of dependencies declared in one call.
///
/// Matches the largest element count a 32-bit indexed sequence can hold.
pub const DEFAULT_MAX_DEPENDENCIES: usize = u32::MAX as usize - 1;

/// Check a dependency list before any graph mutation happens.
///
/// Rejects lists longer than `max_dependencies` with
/// [`RegistrationError::InvalidArgument`] and lists naming `listener`
/// itself with [`RegistrationError::SelfReference`].
pub fn validate_dependencies<A, T>(
    listener: &Listener<A, T>,
    dependencies: &[Listener<A, T>],
    max_dependencies: usize,
) -> RegistrationResult<()> {
    if dependencies.len() > max_dependencies {
        return Err(RegistrationError::InvalidArgument {
            reason: format!(
                "dependency list has {} elements, at most {} are allowed",
                dependencies.len(),
                max_dependencies
            ),
        });
    }
    if dependencies.iter().any(|dependency| dependency == listener) {
        return Err(RegistrationError::SelfReference {
            listener: listener.id(),
        });
    }
    Ok(())
}
