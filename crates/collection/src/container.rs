use std::sync::Arc;

use crate::event::Event;
use crate::key::UniqueKey;

/// Lifecycle notifications shared by every container.
pub struct CollectionEvents<T: ?Sized> {
	pub added: Event<Arc<T>>,
	pub removed: Event<Arc<T>>,
	/// Only raised by positional containers.
	pub moved: Event<Arc<T>>,
}

impl<T: ?Sized> Default for CollectionEvents<T> {
	fn default() -> Self {
		Self {
			added: Event::default(),
			removed: Event::default(),
			moved: Event::default(),
		}
	}
}

impl<T: ?Sized + 'static> CollectionEvents<T> {
	pub(crate) fn clear(&self) {
		self.added.clear();
		self.removed.clear();
		self.moved.clear();
	}
}

/// Ordered, optionally keyed storage of shared items.
///
/// Implemented by [`crate::Collection`] and [`crate::IndexedCollection`]; this is the seam
/// [`crate::OverrideCollection`] wraps.
pub trait Container<T: ?Sized + 'static> {
	/// Key enforcing uniqueness, or `None` if duplicates are allowed.
	fn unique_key(&self) -> Option<&UniqueKey<T>>;

	/// Adds `item`, returning its index, or `None` if it was rejected.
	///
	/// Positional containers insert at `index`; plain ones append regardless.
	fn add(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize>;

	/// Removes `item` by identity, returning the index it occupied.
	fn remove(&mut self, item: &Arc<T>) -> Option<usize>;

	fn has(&self, item: &Arc<T>) -> bool;

	fn has_key(&self, key: &str) -> bool;

	fn get_by_key(&self, key: &str) -> Option<&Arc<T>>;

	fn index_of(&self, item: &Arc<T>) -> Option<usize>;

	/// Items in collection order.
	fn items(&self) -> &[Arc<T>];

	fn events(&self) -> &CollectionEvents<T>;

	fn destroy(&mut self);

	fn is_destroyed(&self) -> bool;

	fn len(&self) -> usize {
		self.items().len()
	}

	fn is_empty(&self) -> bool {
		self.items().is_empty()
	}

	fn key_of(&self, item: &T) -> Option<String> {
		self.unique_key().and_then(|key| key.value_of(item))
	}
}
