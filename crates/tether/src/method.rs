use std::fmt;

use crate::weak_ptr::WeakPtr;

/// Method bound to a weakly referenced object.
///
/// Created by [`WeakPtrFactory::make_weak_method`](crate::WeakPtrFactory::make_weak_method).
/// While the object exists, calling it runs the method on the object, and the
/// object cannot be destroyed until the call returns. Once the object is gone,
/// calls are ignored.
///
/// Methods take their arguments as a single value; use a tuple for several.
pub struct WeakMethod<T: ?Sized, F> {
	ptr: WeakPtr<T>,
	method: F,
}

impl<T: ?Sized, F> WeakMethod<T, F> {
	pub(crate) const fn new(ptr: WeakPtr<T>, method: F) -> Self {
		Self { ptr, method }
	}

	/// Invokes the method with `args`, or does nothing if the object is gone.
	pub fn call<A, R>(&self, args: A) -> Option<R>
	where
		F: Fn(&T, A) -> R,
	{
		let guard = self.ptr.lock();
		let obj = self.ptr.try_deref_with(&guard).ok()?;
		Some((self.method)(obj, args))
	}

	/// Like [`Self::call`], for methods that carry mutable state of their own.
	pub fn call_mut<A, R>(&mut self, args: A) -> Option<R>
	where
		F: FnMut(&T, A) -> R,
	{
		let guard = self.ptr.lock();
		let obj = self.ptr.try_deref_with(&guard).ok()?;
		Some((self.method)(obj, args))
	}

	/// See [`WeakPtr::expired`].
	pub fn expired(&self) -> bool {
		self.ptr.expired()
	}

	/// The weak pointer captured by this method.
	pub fn weak_ptr(&self) -> &WeakPtr<T> {
		&self.ptr
	}
}

impl<T: ?Sized, F: Clone> Clone for WeakMethod<T, F> {
	fn clone(&self) -> Self {
		Self {
			ptr: self.ptr.clone(),
			method: self.method.clone(),
		}
	}
}

impl<T: ?Sized, F> fmt::Debug for WeakMethod<T, F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakMethod").field("expired", &self.expired()).finish_non_exhaustive()
	}
}
