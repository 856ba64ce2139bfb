//! Weak pointers to objects owned elsewhere, safe to query across threads.
//!
//! An object carries a [`WeakPtrFactory`] that mints [`WeakPtr`]s. A weak
//! pointer never keeps the object alive, but it can always tell whether the
//! object still exists, and [`WeakPtr::lock`] opens an access window during
//! which the object cannot be destroyed. Dropping the factory invalidates
//! every pointer it minted, waiting for open windows to close first.
//!
//! This keeps the object in existence; it does not make the object
//! thread-safe. Cross-thread use requires `T: Sync`, and mutation goes through
//! the object's own synchronization.
//!
//! [`WeakBox`] pairs a heap value with its factory and gets the teardown order
//! right without `unsafe`.

#![cfg_attr(test, allow(unused_crate_dependencies))]

mod error;
mod factory;
mod guard;
mod method;
mod owner;
mod state;
mod weak_ptr;
mod weak_ref;

pub use error::WeakError;
pub use factory::WeakPtrFactory;
pub use guard::WeakGuard;
pub use method::WeakMethod;
pub use owner::WeakBox;
pub use weak_ptr::WeakPtr;
#[doc(hidden)]
pub use weak_ptr::__private;
pub use weak_ref::WeakRef;
