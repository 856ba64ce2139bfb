//! Shared liveness record behind every factory.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::RawRwLock;
use parking_lot::lock_api::RawRwLock as _;

/// Flag-plus-lock recording whether the observed object is alive.
///
/// The lock does not protect the object's data. Readers hold it shared for
/// the span of a [`WeakGuard`](crate::WeakGuard), and invalidation takes it
/// exclusively, so the flag can only flip once every access window has
/// closed.
pub(crate) struct ValidityState {
	/// Blocks invalidation while guards are outstanding.
	lock: RawRwLock,
	valid: AtomicBool,
}

impl ValidityState {
	/// Creates a state in the valid phase.
	pub(crate) const fn new() -> Self {
		Self {
			lock: RawRwLock::INIT,
			valid: AtomicBool::new(true),
		}
	}

	/// Takes the shared lock, blocking while an invalidation holds or awaits it.
	pub(crate) fn acquire_read(&self) {
		self.lock.lock_shared();
	}

	/// Releases a shared lock taken by [`Self::acquire_read`].
	///
	/// # Safety
	///
	/// The caller must own one shared hold obtained from `acquire_read` that
	/// has not been released yet.
	pub(crate) unsafe fn release_read(&self) {
		// SAFETY: forwarded from the caller.
		unsafe { self.lock.unlock_shared() };
	}

	/// Flips the flag to invalid once every reader has left.
	pub(crate) fn invalidate(&self) {
		if !self.lock.try_lock_exclusive() {
			let started = Instant::now();
			self.lock.lock_exclusive();
			tracing::debug!(waited = ?started.elapsed(), "tether.state.invalidate.contended");
		}
		let was_valid = self.valid.swap(false, Ordering::Release);
		debug_assert!(was_valid, "validity state invalidated twice");
		// SAFETY: the exclusive lock was acquired above on this thread.
		unsafe { self.lock.unlock_exclusive() };
	}

	/// Non-blocking liveness check.
	pub(crate) fn is_valid(&self) -> bool {
		self.valid.load(Ordering::Acquire)
	}
}

impl fmt::Debug for ValidityState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValidityState").field("valid", &self.is_valid()).finish_non_exhaustive()
	}
}
