//! Synchronous listener lists.
//!
//! Every collection exposes its lifecycle notifications (added, removed, moved, replaced) as an
//! [`Event`]. Dispatch is synchronous and ordered by subscription. Listeners are invoked from a
//! snapshot, so a listener may unsubscribe itself (or others) while an emit is in flight without
//! affecting the current dispatch.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listeners<E: ?Sized> {
	next_id: u64,
	entries: Vec<(u64, Listener<E>)>,
}

/// Ordered list of synchronous listeners for events of type `E`.
pub struct Event<E: ?Sized> {
	listeners: Arc<Mutex<Listeners<E>>>,
}

impl<E: ?Sized> Default for Event<E> {
	fn default() -> Self {
		Self {
			listeners: Arc::new(Mutex::new(Listeners {
				next_id: 0,
				entries: Vec::new(),
			})),
		}
	}
}

impl<E: ?Sized + 'static> std::fmt::Debug for Event<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Event").field("listeners", &self.listener_count()).finish()
	}
}

impl<E: ?Sized + 'static> Event<E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a listener and returns the handle that removes it again.
	pub fn add_listener<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&E) + Send + Sync + 'static,
	{
		let mut guard = self.listeners.lock();
		let id = guard.next_id;
		guard.next_id += 1;
		guard.entries.push((id, Arc::new(listener)));

		let weak: Weak<Mutex<Listeners<E>>> = Arc::downgrade(&self.listeners);
		Subscription {
			id,
			detach: Box::new(move |id| match weak.upgrade() {
				Some(listeners) => {
					let mut guard = listeners.lock();
					let before = guard.entries.len();
					guard.entries.retain(|(entry_id, _)| *entry_id != id);
					guard.entries.len() != before
				}
				None => false,
			}),
		}
	}

	/// Invokes every listener with `event`, in subscription order.
	pub fn emit(&self, event: &E) {
		let snapshot: Vec<Listener<E>> = self.listeners.lock().entries.iter().map(|(_, l)| Arc::clone(l)).collect();
		for listener in snapshot {
			listener(event);
		}
	}

	/// Detaches all listeners.
	pub fn clear(&self) {
		self.listeners.lock().entries.clear();
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().entries.len()
	}
}

/// Handle returned by [`Event::add_listener`].
///
/// Dropping the handle keeps the listener attached; call [`Subscription::unsubscribe`] to detach.
pub struct Subscription {
	id: u64,
	detach: Box<dyn Fn(u64) -> bool + Send + Sync>,
}

impl Subscription {
	/// Detaches the listener. Returns false if it was already gone.
	pub fn unsubscribe(self) -> bool {
		(self.detach)(self.id)
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn emits_in_subscription_order() {
		let event: Event<u32> = Event::new();
		let seen = Arc::new(Mutex::new(Vec::new()));

		let first = Arc::clone(&seen);
		event.add_listener(move |v| first.lock().push(("first", *v)));
		let second = Arc::clone(&seen);
		event.add_listener(move |v| second.lock().push(("second", *v)));

		event.emit(&7);
		assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);
	}

	#[test]
	fn unsubscribe_detaches_only_that_listener() {
		let event: Event<()> = Event::new();
		let count = Arc::new(AtomicUsize::new(0));

		let a = Arc::clone(&count);
		let sub_a = event.add_listener(move |_| {
			a.fetch_add(1, Ordering::SeqCst);
		});
		let b = Arc::clone(&count);
		event.add_listener(move |_| {
			b.fetch_add(10, Ordering::SeqCst);
		});

		assert!(sub_a.unsubscribe());
		event.emit(&());
		assert_eq!(count.load(Ordering::SeqCst), 10);
		assert_eq!(event.listener_count(), 1);
	}

	#[test]
	fn unsubscribe_after_clear_is_noop() {
		let event: Event<()> = Event::new();
		let sub = event.add_listener(|_| {});
		event.clear();
		assert!(!sub.unsubscribe());
	}

	#[test]
	fn unsubscribe_after_drop_is_noop() {
		let event: Event<()> = Event::new();
		let sub = event.add_listener(|_| {});
		drop(event);
		assert!(!sub.unsubscribe());
	}
}
