//! Error types for guarded dereference.

use thiserror::Error;

/// Reasons a [`WeakPtr`](crate::WeakPtr) could not be dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WeakError {
	/// The object was destroyed, or the guard is empty.
	#[error("weak pointer expired: the object has been destroyed")]
	Expired,

	/// The guard holds a different factory's object alive.
	#[error("guard was not obtained from this weak pointer's factory")]
	ForeignGuard,
}
