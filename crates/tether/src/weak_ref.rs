//! Untyped-access core shared by every weak pointer flavour.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Weak;

use crate::guard::WeakGuard;
use crate::state::ValidityState;

/// Non-owning link to a factory's validity state plus a typed pointer.
///
/// A `WeakRef` can report liveness and open access windows, but cannot reach
/// the object on its own; [`WeakPtr`](crate::WeakPtr) adds the guarded
/// dereference on top.
pub struct WeakRef<T: ?Sized> {
	state: Weak<ValidityState>,
	ptr: NonNull<T>,
}

// SAFETY: the pointer is only turned into `&T`, and only while a guard pins
// the object, so sharing a `WeakRef` across threads shares `&T`.
unsafe impl<T: ?Sized + Sync> Send for WeakRef<T> {}
// SAFETY: see above.
unsafe impl<T: ?Sized + Sync> Sync for WeakRef<T> {}

impl<T: ?Sized> WeakRef<T> {
	pub(crate) const fn new(state: Weak<ValidityState>, ptr: NonNull<T>) -> Self {
		Self { state, ptr }
	}

	/// Opens an access window on the object.
	///
	/// The returned guard is empty if the object is gone. Otherwise the object
	/// is guaranteed not to be destroyed until the guard is dropped. This does
	/// not make the object thread-safe; it only keeps it in existence.
	///
	/// Only one guard referring to the same factory may be alive on a thread at
	/// a time.
	pub fn lock(&self) -> WeakGuard {
		match self.state.upgrade() {
			Some(strong) => WeakGuard::acquire(strong),
			None => WeakGuard::empty(),
		}
	}

	/// Quick non-blocking check that the object has been destroyed.
	///
	/// If the factory lives on another thread, a `false` result can be stale
	/// by the time it is observed. A `true` result is always correct, since
	/// invalidation is irreversible.
	pub fn expired(&self) -> bool {
		match self.state.upgrade() {
			Some(strong) => !strong.is_valid(),
			None => true,
		}
	}

	/// Negation of [`Self::expired`], with the same caveats.
	pub fn is_alive(&self) -> bool {
		!self.expired()
	}

	/// Returns `true` if both references observe the same factory.
	pub fn same_factory<U: ?Sized>(&self, other: &WeakRef<U>) -> bool {
		Weak::ptr_eq(&self.state, &other.state)
	}

	/// Pointer to the object, or `None` if it is gone.
	///
	/// Does not lock. The result is only meaningful while the caller holds a
	/// guard obtained from [`Self::lock`].
	pub(crate) fn object(&self) -> Option<NonNull<T>> {
		let strong = self.state.upgrade()?;
		strong.is_valid().then_some(self.ptr)
	}

	/// Address of the linked validity state, used to match guards.
	pub(crate) fn state_ptr(&self) -> *const ValidityState {
		self.state.as_ptr()
	}

	/// Maps the stored pointer while keeping the link to the same factory.
	///
	/// # Safety
	///
	/// `cast` must return a pointer into the same object (for example an
	/// unsizing coercion or a field projection), valid for as long as the
	/// original pointee. The [`upcast!`](crate::upcast) macro provides the
	/// coercion case without `unsafe`.
	pub unsafe fn cast_unchecked<U: ?Sized>(self, cast: impl FnOnce(NonNull<T>) -> NonNull<U>) -> WeakRef<U> {
		WeakRef {
			ptr: cast(self.ptr),
			state: self.state,
		}
	}
}

impl<T> WeakRef<T> {
	/// A reference never linked to a factory; permanently expired.
	pub(crate) const fn dangling() -> Self {
		Self {
			state: Weak::new(),
			ptr: NonNull::dangling(),
		}
	}
}

impl<T: ?Sized> Clone for WeakRef<T> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			ptr: self.ptr,
		}
	}
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakRef").field("expired", &self.expired()).finish_non_exhaustive()
	}
}
