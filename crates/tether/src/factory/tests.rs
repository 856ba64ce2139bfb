use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::WeakError;

struct Widget {
	value: usize,
}

fn widget_factory(widget: &Widget) -> WeakPtrFactory<Widget> {
	// SAFETY: every test drops the factory before the widget and never
	// borrows the widget mutably in between.
	unsafe { WeakPtrFactory::new(NonNull::from(widget)) }
}

#[test]
fn pointer_reaches_object_while_factory_lives() {
	let widget = Widget { value: 41 };
	let factory = widget_factory(&widget);
	let weak = factory.make_weak_ptr();

	assert!(weak.is_alive());
	assert!(!weak.expired());
	let guard = weak.lock();
	assert!(guard.is_locked());
	assert_eq!(weak.deref_with(&guard).value, 41);
	drop(guard);

	drop(factory);
}

#[test]
fn drop_expires_every_pointer() {
	let widget = Widget { value: 1 };
	let factory = widget_factory(&widget);
	let a = factory.make_weak_ptr();
	let b = a.clone();

	factory.invalidate();

	assert!(a.expired() && b.expired());
	let guard = a.lock();
	assert!(!guard.is_locked());
	assert_eq!(a.try_deref_with(&guard).err(), Some(WeakError::Expired));
}

#[test]
fn weak_count_tracks_live_pointers() {
	let widget = Widget { value: 0 };
	let factory = widget_factory(&widget);
	assert_eq!(factory.weak_count(), 0);

	let a = factory.make_weak_ptr();
	let b = a.clone();
	let m = factory.make_weak_method(|w: &Widget, (): ()| w.value);
	assert_eq!(factory.weak_count(), 3);

	drop(a);
	drop(m);
	assert_eq!(factory.weak_count(), 1);
	drop(b);
	assert_eq!(factory.weak_count(), 0);
}

#[test]
fn guard_from_other_factory_is_rejected() {
	let left = Widget { value: 1 };
	let right = Widget { value: 2 };
	let left_factory = widget_factory(&left);
	let right_factory = widget_factory(&right);
	let left_ptr = left_factory.make_weak_ptr();
	let right_ptr = right_factory.make_weak_ptr();

	let right_guard = right_ptr.lock();
	assert_eq!(left_ptr.try_deref_with(&right_guard).err(), Some(WeakError::ForeignGuard));
	assert!(!left_ptr.same_factory(&right_ptr));
	drop(right_guard);

	let left_guard = left_ptr.lock();
	let sibling = left_factory.make_weak_ptr();
	assert!(sibling.same_factory(&left_ptr));
	assert_eq!(sibling.deref_with(&left_guard).value, 1);
}

#[test]
#[should_panic(expected = "expired")]
fn deref_after_drop_panics() {
	let widget = Widget { value: 3 };
	let factory = widget_factory(&widget);
	let weak = factory.make_weak_ptr();
	drop(factory);

	let guard = weak.lock();
	let _ = weak.deref_with(&guard);
}

#[test]
fn weak_method_forwards_arguments_and_result() {
	let hits = AtomicUsize::new(10);
	// SAFETY: the factory drops before `hits`.
	let factory = unsafe { WeakPtrFactory::new(NonNull::from(&hits)) };
	let add = factory.make_weak_method(|h: &AtomicUsize, (a, b): (usize, usize)| h.fetch_add(a * b, Ordering::SeqCst));

	assert_eq!(add.call((2, 3)), Some(10));
	assert_eq!(hits.load(Ordering::SeqCst), 16);

	drop(factory);
	assert_eq!(add.call((100, 100)), None);
	assert_eq!(hits.load(Ordering::SeqCst), 16);
}

#[test]
fn weak_method_call_mut_keeps_its_own_state() {
	let widget = Widget { value: 5 };
	let factory = widget_factory(&widget);
	let mut calls = 0usize;
	let mut method = factory.make_weak_method(move |w: &Widget, step: usize| {
		calls += step;
		w.value + calls
	});

	assert_eq!(method.call_mut(1), Some(6));
	assert_eq!(method.call_mut(1), Some(7));
	drop(factory);
	assert_eq!(method.call_mut(1), None);
	assert!(method.expired());
}

#[test]
fn default_pointer_is_expired() {
	let weak = WeakPtr::<Widget>::default();
	assert!(weak.expired());
	assert!(!weak.lock().is_locked());
	assert_eq!(weak.with(|w| w.value), None);
}

#[test]
fn debug_output_omits_object() {
	let widget = Widget { value: 0 };
	let factory = widget_factory(&widget);
	let weak = factory.make_weak_ptr();
	assert_eq!(format!("{weak:?}"), "WeakPtr { expired: false, .. }");
	assert!(format!("{factory:?}").starts_with("WeakPtrFactory { state: ValidityState { valid: true, .. }, weak_count: 1"));
}
