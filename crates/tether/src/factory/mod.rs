//! Owner side of the weak pointer mechanism.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::guard;
use crate::method::WeakMethod;
use crate::state::ValidityState;
use crate::weak_ptr::WeakPtr;
use crate::weak_ref::WeakRef;

/// Mints weak pointers to one object and invalidates them all on drop.
///
/// Dropping the factory blocks until every outstanding [`WeakGuard`] for it
/// has been released. Afterwards every pointer it minted reports expired.
///
/// The factory must be torn down before its object: when it sits inside the
/// object it wraps, declare it as the *first* field so it drops before the
/// rest, and make sure the object has no `Drop` impl of its own that runs
/// while weak pointers can still reach it. [`WeakBox`](crate::WeakBox) handles
/// all of this for heap-allocated objects.
///
/// [`WeakGuard`]: crate::WeakGuard
pub struct WeakPtrFactory<T: ?Sized> {
	state: Arc<ValidityState>,
	obj: NonNull<T>,
}

// SAFETY: the factory never dereferences `obj` itself; it only hands it to
// weak pointers, which require `T: Sync` to cross threads.
unsafe impl<T: ?Sized + Sync> Send for WeakPtrFactory<T> {}
// SAFETY: see above.
unsafe impl<T: ?Sized + Sync> Sync for WeakPtrFactory<T> {}

impl<T: ?Sized> WeakPtrFactory<T> {
	/// Creates a factory wrapping the already constructed object at `obj`.
	///
	/// # Safety
	///
	/// Until this factory has been dropped, `obj` must point to a live `T` that
	/// does not move, and nothing may access it through `&mut T` or otherwise
	/// invalidate shared references to it. Weak pointers on other threads may
	/// read it through `&T` at any point before the drop completes.
	pub unsafe fn new(obj: NonNull<T>) -> Self {
		let state = Arc::new(ValidityState::new());
		tracing::trace!("tether.factory.create");
		Self { state, obj }
	}

	/// Makes a weak pointer to the object.
	///
	/// The pointer can be used to reach the object safely without worrying
	/// about its lifetime.
	pub fn make_weak_ptr(&self) -> WeakPtr<T> {
		WeakPtr::from_core(WeakRef::new(Arc::downgrade(&self.state), self.obj))
	}

	/// Binds `method` to the object through a fresh weak pointer.
	///
	/// While the object exists, [`WeakMethod::call`] is equivalent to invoking
	/// `method` on it, and the object cannot be destroyed during the call. Once
	/// it is gone, calls are ignored.
	///
	/// ```
	/// use std::sync::atomic::{AtomicUsize, Ordering};
	///
	/// use tether::WeakBox;
	///
	/// let hits = WeakBox::new(AtomicUsize::new(0));
	/// let bump = hits.make_weak_method(|h: &AtomicUsize, n: usize| h.fetch_add(n, Ordering::SeqCst));
	///
	/// assert_eq!(bump.call(2), Some(0));
	/// assert_eq!(hits.load(Ordering::SeqCst), 2);
	///
	/// drop(hits);
	/// assert_eq!(bump.call(2), None);
	/// ```
	pub fn make_weak_method<F>(&self, method: F) -> WeakMethod<T, F> {
		WeakMethod::new(self.make_weak_ptr(), method)
	}

	/// Number of weak references currently linked to this factory.
	pub fn weak_count(&self) -> usize {
		Arc::weak_count(&self.state)
	}

	/// Invalidates every weak pointer now, blocking on outstanding guards.
	///
	/// Equivalent to dropping the factory.
	pub fn invalidate(self) {
		drop(self);
	}
}

impl<T: ?Sized> Drop for WeakPtrFactory<T> {
	fn drop(&mut self) {
		if guard::is_held(&self.state) {
			tracing::error!("tether.factory.invalidate.self_deadlock: dropping a factory while this thread holds one of its guards");
		}
		tracing::trace!(handles = self.weak_count(), "tether.factory.invalidate");
		self.state.invalidate();
	}
}

impl<T: ?Sized> fmt::Debug for WeakPtrFactory<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakPtrFactory")
			.field("state", &self.state)
			.field("weak_count", &self.weak_count())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests;
