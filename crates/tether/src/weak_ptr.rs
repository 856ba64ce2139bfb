//! Typed weak pointer with guard-scoped dereference.

use std::fmt;
use std::ptr::NonNull;

use crate::error::WeakError;
use crate::guard::WeakGuard;
use crate::weak_ref::WeakRef;

/// Weak pointer to an object owned elsewhere.
///
/// Safe to keep and query after the object is destroyed. Access goes through
/// a [`WeakGuard`]: the returned reference borrows the guard, so it cannot
/// outlive the window in which the object is guaranteed alive.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use tether::WeakBox;
///
/// let counter = WeakBox::new(AtomicUsize::new(0));
/// let weak = counter.make_weak_ptr();
///
/// let guard = weak.lock();
/// if let Ok(c) = weak.try_deref_with(&guard) {
/// 	c.fetch_add(1, Ordering::Relaxed);
/// }
/// drop(guard);
///
/// drop(counter);
/// assert!(weak.expired());
/// assert!(!weak.lock().is_locked());
/// ```
pub struct WeakPtr<T: ?Sized> {
	core: WeakRef<T>,
}

impl<T: ?Sized> WeakPtr<T> {
	pub(crate) const fn from_core(core: WeakRef<T>) -> Self {
		Self { core }
	}

	/// See [`WeakRef::lock`].
	pub fn lock(&self) -> WeakGuard {
		self.core.lock()
	}

	/// See [`WeakRef::expired`].
	pub fn expired(&self) -> bool {
		self.core.expired()
	}

	/// See [`WeakRef::is_alive`].
	pub fn is_alive(&self) -> bool {
		self.core.is_alive()
	}

	/// Returns `true` if both pointers observe the same factory.
	pub fn same_factory<U: ?Sized>(&self, other: &WeakPtr<U>) -> bool {
		self.core.same_factory(&other.core)
	}

	/// Dereferences within the access window opened by `guard`.
	///
	/// `guard` must come from [`Self::lock`] on this pointer, or on any pointer
	/// from the same factory.
	pub fn try_deref_with<'g>(&self, guard: &'g WeakGuard) -> Result<&'g T, WeakError> {
		if !guard.is_locked() {
			return Err(WeakError::Expired);
		}
		if !guard.holds(self.core.state_ptr()) {
			return Err(WeakError::ForeignGuard);
		}
		let ptr = self.core.object().ok_or(WeakError::Expired)?;
		// SAFETY: the guard holds this factory's state valid, so the factory has
		// not finished dropping and the pointee it vouched for is still alive.
		// The factory contract forbids `&mut` access to it meanwhile.
		Ok(unsafe { ptr.as_ref() })
	}

	/// Dereferences within the access window opened by `guard`.
	///
	/// # Panics
	///
	/// Panics if the object is gone or `guard` belongs to another factory.
	/// Check [`WeakGuard::is_locked`] first, or use [`Self::try_deref_with`].
	#[track_caller]
	pub fn deref_with<'g>(&self, guard: &'g WeakGuard) -> &'g T {
		match self.try_deref_with(guard) {
			Ok(obj) => obj,
			Err(err) => panic!("{err}"),
		}
	}

	/// Runs `f` on the object inside a fresh access window.
	///
	/// Returns `None` without calling `f` if the object is gone.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
		let guard = self.lock();
		let obj = self.try_deref_with(&guard).ok()?;
		Some(f(obj))
	}

	/// Borrows the untyped-access core.
	pub fn as_weak_ref(&self) -> &WeakRef<T> {
		&self.core
	}

	/// Maps the stored pointer while keeping the link to the same factory.
	///
	/// # Safety
	///
	/// Same contract as [`WeakRef::cast_unchecked`].
	pub unsafe fn cast_unchecked<U: ?Sized>(self, cast: impl FnOnce(NonNull<T>) -> NonNull<U>) -> WeakPtr<U> {
		// SAFETY: forwarded from the caller.
		WeakPtr::from_core(unsafe { self.core.cast_unchecked(cast) })
	}
}

impl<T> Default for WeakPtr<T> {
	/// A pointer never linked to a factory; permanently expired.
	fn default() -> Self {
		Self::from_core(WeakRef::dangling())
	}
}

impl<T: ?Sized> Clone for WeakPtr<T> {
	fn clone(&self) -> Self {
		Self { core: self.core.clone() }
	}
}

impl<T: ?Sized> From<WeakPtr<T>> for WeakRef<T> {
	fn from(ptr: WeakPtr<T>) -> Self {
		ptr.core
	}
}

impl<T: ?Sized> fmt::Debug for WeakPtr<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakPtr").field("expired", &self.expired()).finish_non_exhaustive()
	}
}

/// Converts a [`WeakPtr`] or [`WeakRef`] to a compatible unsized type,
/// sharing the same factory.
///
/// Only unsizing coercions the compiler accepts (concrete type to trait
/// object, array to slice) can be expressed.
///
/// ```
/// use std::fmt::Debug;
///
/// use tether::{WeakBox, WeakPtr, upcast};
///
/// let value = WeakBox::new(7u32);
/// let weak: WeakPtr<dyn Debug + Sync> = upcast!(value.make_weak_ptr() => dyn Debug + Sync);
/// assert_eq!(weak.with(|v| format!("{v:?}")), Some("7".to_owned()));
/// ```
#[macro_export]
macro_rules! upcast {
	($weak:expr => $target:ty) => {{
		let weak = $weak;
		let cast = $crate::__private::coercion(&weak, |ptr| -> ::std::ptr::NonNull<$target> { ptr });
		// SAFETY: `cast` is an unsizing coercion of the same pointer.
		unsafe { weak.cast_unchecked(cast) }
	}};
}

/// Support items for `upcast!`; not public API.
#[doc(hidden)]
pub mod __private {
	use std::ptr::NonNull;

	use crate::{WeakPtr, WeakRef};

	/// Names the pointee of a weak pointer so the coercion closure's argument
	/// type is known where the closure is written.
	pub trait Pointee {
		type Target: ?Sized;
	}

	impl<T: ?Sized> Pointee for WeakRef<T> {
		type Target = T;
	}

	impl<T: ?Sized> Pointee for WeakPtr<T> {
		type Target = T;
	}

	pub fn coercion<W, U, F>(_weak: &W, cast: F) -> F
	where
		W: Pointee,
		U: ?Sized,
		F: FnOnce(NonNull<W::Target>) -> NonNull<U>,
	{
		cast
	}
}
