//! Scoped access windows over a validity state.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::state::ValidityState;

/// Scope guard for the object behind a [`WeakPtr`](crate::WeakPtr).
///
/// While a non-empty guard exists, the factory that minted the pointer cannot
/// finish tearing down, so the object is guaranteed to stay alive. An empty
/// guard means the object was already gone when [`lock`](crate::WeakPtr::lock)
/// was called.
///
/// Only one guard per factory may be alive on a thread at a time. The
/// underlying lock is task-fair: once a factory starts invalidating, new
/// readers queue behind it, so a thread that locks the same factory twice can
/// deadlock against a concurrent teardown. Debug builds (and the
/// `strict-guards` feature) panic on such a re-entrant `lock` instead.
///
/// Guards are not `Send`; the hold is released on the thread that took it.
#[must_use = "dropping the guard immediately closes the access window"]
pub struct WeakGuard {
	state: Option<Arc<ValidityState>>,
	_not_send: PhantomData<*const ()>,
}

impl WeakGuard {
	pub(crate) const fn empty() -> Self {
		Self {
			state: None,
			_not_send: PhantomData,
		}
	}

	/// Takes a read hold on `state`, returning an empty guard if it was
	/// invalidated in the meantime.
	pub(crate) fn acquire(state: Arc<ValidityState>) -> Self {
		held::enter(&state);
		state.acquire_read();
		if state.is_valid() {
			return Self {
				state: Some(state),
				_not_send: PhantomData,
			};
		}
		// SAFETY: the hold was acquired above and is not kept.
		unsafe { state.release_read() };
		held::leave(&state);
		Self::empty()
	}

	/// Returns `true` if this guard holds the object alive.
	pub fn is_locked(&self) -> bool {
		self.state.is_some()
	}

	/// Returns `true` if this guard holds `state`.
	pub(crate) fn holds(&self, state: *const ValidityState) -> bool {
		self.state.as_ref().is_some_and(|held| std::ptr::eq(Arc::as_ptr(held), state))
	}
}

impl Drop for WeakGuard {
	fn drop(&mut self) {
		if let Some(state) = self.state.take() {
			// SAFETY: a non-empty guard owns exactly one read hold on its state.
			unsafe { state.release_read() };
			held::leave(&state);
		}
	}
}

impl fmt::Debug for WeakGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakGuard").field("locked", &self.is_locked()).finish()
	}
}

/// Per-thread registry of validity states with a live guard.
#[cfg(any(debug_assertions, feature = "strict-guards"))]
mod held {
	use std::cell::RefCell;

	use crate::state::ValidityState;

	thread_local! {
		static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
	}

	/// Records a guard about to be taken, panicking before any lock is touched
	/// if this thread already holds one for `state`.
	///
	/// Tracking is skipped once the registry has been torn down, which happens
	/// when `lock()` runs from another thread-local's destructor.
	pub(super) fn enter(state: &ValidityState) {
		let key = std::ptr::from_ref(state) as usize;
		let _ = HELD.try_with(|held| {
			let mut held = held.borrow_mut();
			assert!(
				!held.contains(&key),
				"lock() called while this thread already holds a guard for the same factory"
			);
			held.push(key);
		});
	}

	pub(super) fn leave(state: &ValidityState) {
		let key = std::ptr::from_ref(state) as usize;
		// Thread-local storage may already be gone when a guard drops during thread teardown.
		let _ = HELD.try_with(|held| {
			let mut held = held.borrow_mut();
			if let Some(pos) = held.iter().rposition(|k| *k == key) {
				held.swap_remove(pos);
			}
		});
	}

	/// Returns `true` if the current thread holds a guard for `state`.
	pub(crate) fn is_held(state: &ValidityState) -> bool {
		let key = std::ptr::from_ref(state) as usize;
		HELD.try_with(|held| held.borrow().contains(&key)).unwrap_or(false)
	}
}

#[cfg(not(any(debug_assertions, feature = "strict-guards")))]
mod held {
	use crate::state::ValidityState;

	pub(super) fn enter(_state: &ValidityState) {}

	pub(super) fn leave(_state: &ValidityState) {}

	pub(crate) fn is_held(_state: &ValidityState) -> bool {
		false
	}
}

pub(crate) use held::is_held;
