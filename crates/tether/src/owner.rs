//! Heap owner that pairs a value with its factory.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::factory::WeakPtrFactory;
use crate::method::WeakMethod;
use crate::weak_ptr::WeakPtr;

/// Owns a heap value and the factory for weak pointers to it.
///
/// Dropping a `WeakBox` first invalidates every weak pointer (waiting for
/// outstanding guards) and only then frees the value. Only shared access to
/// the value is offered, so mutation goes through its own interior
/// synchronization, the same way weak pointer holders see it.
pub struct WeakBox<T: ?Sized> {
	factory: ManuallyDrop<WeakPtrFactory<T>>,
	/// Leaked from a `Box`; reclaimed once the factory is gone.
	value: NonNull<T>,
}

// SAFETY: moving the box moves ownership of `T` (needs `Send`) while weak
// pointers on other threads may keep reading it (needs `Sync`).
unsafe impl<T: ?Sized + Send + Sync> Send for WeakBox<T> {}
// SAFETY: `&WeakBox` only hands out `&T`.
unsafe impl<T: ?Sized + Sync> Sync for WeakBox<T> {}

impl<T> WeakBox<T> {
	/// Moves `value` to the heap and creates its factory.
	pub fn new(value: T) -> Self {
		Self::from_box(Box::new(value))
	}

	/// Invalidates every weak pointer, then returns the value.
	///
	/// Blocks until outstanding guards are released.
	pub fn into_inner(self) -> T {
		let mut this = ManuallyDrop::new(self);
		// SAFETY: `this` is never dropped, so the factory is taken exactly once.
		unsafe { ManuallyDrop::drop(&mut this.factory) };
		// SAFETY: the factory is gone, so no weak pointer can reach the value,
		// and `value` came from `Box::leak` in `from_box`.
		*unsafe { Box::from_raw(this.value.as_ptr()) }
	}
}

impl<T: ?Sized> WeakBox<T> {
	/// Takes ownership of a boxed value and creates its factory.
	pub fn from_box(value: Box<T>) -> Self {
		let value = NonNull::from(Box::leak(value));
		// SAFETY: the allocation stays put until `Drop`/`into_inner`, which tear
		// the factory down first, and `WeakBox` never exposes `&mut T`.
		let factory = unsafe { WeakPtrFactory::new(value) };
		Self {
			factory: ManuallyDrop::new(factory),
			value,
		}
	}

	/// The factory for weak pointers to the value.
	pub fn factory(&self) -> &WeakPtrFactory<T> {
		&self.factory
	}

	/// See [`WeakPtrFactory::make_weak_ptr`].
	pub fn make_weak_ptr(&self) -> WeakPtr<T> {
		self.factory.make_weak_ptr()
	}

	/// See [`WeakPtrFactory::make_weak_method`].
	pub fn make_weak_method<F>(&self, method: F) -> WeakMethod<T, F> {
		self.factory.make_weak_method(method)
	}
}

impl<T: ?Sized> Deref for WeakBox<T> {
	type Target = T;

	fn deref(&self) -> &T {
		// SAFETY: the value lives until `self` is dropped and is only shared.
		unsafe { self.value.as_ref() }
	}
}

impl<T: ?Sized> Drop for WeakBox<T> {
	fn drop(&mut self) {
		// SAFETY: dropped exactly once, here.
		unsafe { ManuallyDrop::drop(&mut self.factory) };
		// SAFETY: no weak pointer can reach the value any more, and it was
		// leaked from a `Box` in `from_box`.
		drop(unsafe { Box::from_raw(self.value.as_ptr()) });
	}
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for WeakBox<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakBox")
			.field("value", &&**self)
			.field("weak_count", &self.factory.weak_count())
			.finish()
	}
}
