#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use tether::{WeakBox, WeakMethod};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

/// Object with interior mutability, shared with weak pointer holders.
#[derive(Debug, Default)]
pub struct Counter {
	hits: AtomicUsize,
}

impl Counter {
	pub fn increment(&self, by: usize) -> usize {
		self.hits.fetch_add(by, Ordering::SeqCst) + by
	}

	pub fn get(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}
}

pub type IncrementFn = fn(&Counter, usize) -> usize;

pub fn bind_increment(counter: &WeakBox<Counter>) -> WeakMethod<Counter, IncrementFn> {
	counter.make_weak_method(Counter::increment as IncrementFn)
}

pub trait Shape: Sync {
	fn area(&self) -> f64;
}

#[derive(Debug)]
pub struct Square {
	pub side: f64,
}

impl Shape for Square {
	fn area(&self) -> f64 {
		self.side * self.side
	}
}
