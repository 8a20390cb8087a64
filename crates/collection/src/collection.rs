//! Ordered, uniquely keyed container.
//!
//! # Invariants
//!
//! - At most one item per unique key value, unless uniqueness is disabled.
//!   - Enforced in: [`Collection::insert`].
//!   - Tested by: `collection::tests::duplicate_key_is_rejected`
//! - The key index and the member set mirror `array` exactly.
//!   - Enforced in: [`Collection::insert`], [`Collection::remove`].
//!   - Tested by: `collection::tests::remove_releases_key`

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::container::{CollectionEvents, Container};
use crate::key::UniqueKey;
use crate::tags::identity;

/// Ordered container of shared items with O(1) lookup by key and by identity.
///
/// The collection never owns its items beyond the `Arc` it holds: removing or destroying drops
/// that reference and nothing else.
pub struct Collection<T: ?Sized + 'static> {
	array: Vec<Arc<T>>,
	by_key: FxHashMap<String, Arc<T>>,
	members: FxHashSet<usize>,
	unique_key: Option<UniqueKey<T>>,
	events: CollectionEvents<T>,
	destroyed: bool,
}

impl<T: ?Sized + 'static> Collection<T> {
	/// Creates an empty collection keyed by `unique_key`.
	pub fn new(unique_key: UniqueKey<T>) -> Self {
		Self::with_key(Some(unique_key))
	}

	/// Creates an empty collection that allows duplicate keys.
	pub fn unkeyed() -> Self {
		Self::with_key(None)
	}

	pub fn with_key(unique_key: Option<UniqueKey<T>>) -> Self {
		Self {
			array: Vec::new(),
			by_key: FxHashMap::default(),
			members: FxHashSet::default(),
			unique_key,
			events: CollectionEvents::default(),
			destroyed: false,
		}
	}

	/// Builds a collection from `items`, keeping the first occurrence of each key.
	pub fn from_iter_keyed<I>(items: I, unique_key: Option<UniqueKey<T>>) -> Self
	where
		I: IntoIterator<Item = Arc<T>>,
	{
		let mut collection = Self::with_key(unique_key);
		for item in items {
			collection.add(item);
		}
		collection
	}

	/// Appends `item`, returning its index, or `None` if it was rejected.
	pub fn add(&mut self, item: Arc<T>) -> Option<usize> {
		self.insert(item, None)
	}

	/// Inserts `item` at `index` (clamped to the length), or appends when `index` is `None`.
	pub(crate) fn insert(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
		if self.destroyed || self.has(&item) {
			return None;
		}

		let key = match &self.unique_key {
			Some(unique_key) => {
				let Some(value) = unique_key.value_of(&item) else {
					tracing::warn!(key = unique_key.name(), "item is missing its unique key");
					return None;
				};
				if self.by_key.contains_key(&value) {
					tracing::warn!(key = unique_key.name(), %value, "item with the same key already exists");
					return None;
				}
				Some(value)
			}
			None => None,
		};

		let index = index.map_or(self.array.len(), |i| i.min(self.array.len()));
		if let Some(key) = key {
			self.by_key.insert(key, Arc::clone(&item));
		}
		self.members.insert(identity(&item));
		self.array.insert(index, Arc::clone(&item));
		self.events.added.emit(&item);
		Some(index)
	}

	/// Removes `item` by identity, returning the index it occupied.
	pub fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
		let index = self.index_of(item)?;
		let removed = self.array.remove(index);
		self.members.remove(&identity(&removed));
		if let Some(key) = self.unique_key.as_ref().and_then(|k| k.value_of(&removed))
			&& self.by_key.get(&key).is_some_and(|owner| Arc::ptr_eq(owner, &removed))
		{
			self.by_key.remove(&key);
		}
		self.events.removed.emit(&removed);
		Some(index)
	}

	/// Repositions the item at `from` to `to` and emits `moved`.
	pub(crate) fn move_item(&mut self, from: usize, to: usize) {
		let item = self.array.remove(from);
		self.array.insert(to, Arc::clone(&item));
		self.events.moved.emit(&item);
	}

	#[inline]
	pub fn has(&self, item: &Arc<T>) -> bool {
		self.members.contains(&identity(item))
	}

	/// Always false when uniqueness is disabled.
	#[inline]
	pub fn has_key(&self, key: &str) -> bool {
		self.by_key.contains_key(key)
	}

	/// Always `None` when uniqueness is disabled.
	#[inline]
	pub fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
		self.by_key.get(key)
	}

	pub fn index_of(&self, item: &Arc<T>) -> Option<usize> {
		if !self.has(item) {
			return None;
		}
		self.array.iter().position(|candidate| Arc::ptr_eq(candidate, item))
	}

	pub(crate) fn get(&self, index: usize) -> Option<&Arc<T>> {
		self.array.get(index)
	}

	pub fn unique_key(&self) -> Option<&UniqueKey<T>> {
		self.unique_key.as_ref()
	}

	pub fn items(&self) -> &[Arc<T>] {
		&self.array
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
		self.array.iter()
	}

	pub fn len(&self) -> usize {
		self.array.len()
	}

	pub fn is_empty(&self) -> bool {
		self.array.is_empty()
	}

	pub fn events(&self) -> &CollectionEvents<T> {
		&self.events
	}

	/// Removes every item, emitting `removed` for each, last first.
	pub fn clear(&mut self) {
		while let Some(item) = self.array.last().cloned() {
			self.remove(&item);
		}
	}

	/// Releases all items and detaches all listeners. Idempotent.
	pub fn destroy(&mut self) {
		if self.destroyed {
			return;
		}
		self.destroyed = true;
		self.array.clear();
		self.by_key.clear();
		self.members.clear();
		self.events.clear();
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}
}

impl<T: ?Sized + 'static> Container<T> for Collection<T> {
	fn unique_key(&self) -> Option<&UniqueKey<T>> {
		Collection::unique_key(self)
	}

	fn add(&mut self, item: Arc<T>, _index: Option<usize>) -> Option<usize> {
		Collection::add(self, item)
	}

	fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
		Collection::remove(self, item)
	}

	fn has(&self, item: &Arc<T>) -> bool {
		Collection::has(self, item)
	}

	fn has_key(&self, key: &str) -> bool {
		Collection::has_key(self, key)
	}

	fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
		Collection::get_by_key(self, key)
	}

	fn index_of(&self, item: &Arc<T>) -> Option<usize> {
		Collection::index_of(self, item)
	}

	fn items(&self) -> &[Arc<T>] {
		Collection::items(self)
	}

	fn events(&self) -> &CollectionEvents<T> {
		Collection::events(self)
	}

	fn destroy(&mut self) {
		Collection::destroy(self);
	}

	fn is_destroyed(&self) -> bool {
		Collection::is_destroyed(self)
	}
}

#[cfg(test)]
mod tests;
