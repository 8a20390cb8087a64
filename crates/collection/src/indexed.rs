//! Positional container with move primitives.
//!
//! # Invariants
//!
//! - Positions are contiguous: every item has an index in `0..len`.
//!   - Enforced in: [`IndexedCollection::move_to`] (target clamped to bounds).
//!   - Tested by: `indexed::tests::move_to_clamps_target`
//! - Removal records the vacated index as a re-insertion hint.
//!   - Enforced in: [`IndexedCollection::remove`].
//!   - Tested by: `indexed::tests::remove_records_previous_index`

use std::sync::Arc;

use crate::collection::Collection;
use crate::container::{CollectionEvents, Container};
use crate::key::UniqueKey;
use crate::tags::ItemTable;

pub struct IndexedCollection<T: ?Sized + 'static> {
	collection: Collection<T>,
	previous_index: ItemTable<T, usize>,
}

impl<T: ?Sized + 'static> IndexedCollection<T> {
	pub fn new(unique_key: UniqueKey<T>) -> Self {
		Self::with_key(Some(unique_key))
	}

	pub fn unkeyed() -> Self {
		Self::with_key(None)
	}

	pub fn with_key(unique_key: Option<UniqueKey<T>>) -> Self {
		Self {
			collection: Collection::with_key(unique_key),
			previous_index: ItemTable::new(),
		}
	}

	/// Builds an indexed collection from `items`, keeping the first occurrence of each key.
	pub fn from_iter_keyed<I>(items: I, unique_key: Option<UniqueKey<T>>) -> Self
	where
		I: IntoIterator<Item = Arc<T>>,
	{
		Self {
			collection: Collection::from_iter_keyed(items, unique_key),
			previous_index: ItemTable::new(),
		}
	}

	/// Inserts `item` at `index` (clamped to the length) or appends when `index` is `None`.
	pub fn add(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
		self.collection.insert(item, index)
	}

	/// Removes `item`, remembering the index it occupied.
	pub fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
		let index = self.collection.remove(item)?;
		self.previous_index.insert(item, index);
		Some(index)
	}

	/// Index `item` occupied when it was last removed from this collection.
	pub fn previous_index(&self, item: &Arc<T>) -> Option<usize> {
		self.previous_index.get(item).copied()
	}

	pub fn get(&self, index: usize) -> Option<&Arc<T>> {
		self.collection.get(index)
	}

	pub fn index_of(&self, item: &Arc<T>) -> Option<usize> {
		self.collection.index_of(item)
	}

	/// Moves `item` towards the end by `steps`; negative steps lower it.
	pub fn raise(&mut self, item: &Arc<T>, steps: isize) -> Option<usize> {
		let index = self.index_of(item)?;
		self.move_to(item, index.saturating_add_signed(steps))
	}

	/// Moves `item` towards the start by `steps`; negative steps raise it.
	pub fn lower(&mut self, item: &Arc<T>, steps: isize) -> Option<usize> {
		let index = self.index_of(item)? as isize;
		let target = index.saturating_sub(steps).max(0) as usize;
		self.move_to(item, target)
	}

	/// Moves `item` to `target`, clamped to the collection bounds.
	///
	/// Emits `moved` only if the position actually changes. Returns the resulting index, or
	/// `None` if `item` is not a member.
	pub fn move_to(&mut self, item: &Arc<T>, target: usize) -> Option<usize> {
		let current = self.index_of(item)?;
		let target = target.min(self.len().saturating_sub(1));
		if target != current {
			self.collection.move_item(current, target);
		}
		Some(target)
	}

	pub fn has(&self, item: &Arc<T>) -> bool {
		self.collection.has(item)
	}

	pub fn has_key(&self, key: &str) -> bool {
		self.collection.has_key(key)
	}

	pub fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
		self.collection.get_by_key(key)
	}

	pub fn unique_key(&self) -> Option<&UniqueKey<T>> {
		self.collection.unique_key()
	}

	pub fn items(&self) -> &[Arc<T>] {
		self.collection.items()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
		self.collection.iter()
	}

	pub fn len(&self) -> usize {
		self.collection.len()
	}

	pub fn is_empty(&self) -> bool {
		self.collection.is_empty()
	}

	pub fn events(&self) -> &CollectionEvents<T> {
		self.collection.events()
	}

	pub fn destroy(&mut self) {
		self.collection.destroy();
		self.previous_index.clear();
	}

	pub fn is_destroyed(&self) -> bool {
		self.collection.is_destroyed()
	}
}

impl<T: ?Sized + 'static> Container<T> for IndexedCollection<T> {
	fn unique_key(&self) -> Option<&UniqueKey<T>> {
		IndexedCollection::unique_key(self)
	}

	fn add(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
		IndexedCollection::add(self, item, index)
	}

	fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
		IndexedCollection::remove(self, item)
	}

	fn has(&self, item: &Arc<T>) -> bool {
		IndexedCollection::has(self, item)
	}

	fn has_key(&self, key: &str) -> bool {
		IndexedCollection::has_key(self, key)
	}

	fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
		IndexedCollection::get_by_key(self, key)
	}

	fn index_of(&self, item: &Arc<T>) -> Option<usize> {
		IndexedCollection::index_of(self, item)
	}

	fn items(&self) -> &[Arc<T>] {
		IndexedCollection::items(self)
	}

	fn events(&self) -> &CollectionEvents<T> {
		IndexedCollection::events(self)
	}

	fn destroy(&mut self) {
		IndexedCollection::destroy(self);
	}

	fn is_destroyed(&self) -> bool {
		IndexedCollection::is_destroyed(self)
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;
	use crate::test_fixtures::{TestItem, item, name_key, names};

	fn abcd() -> (IndexedCollection<TestItem>, Vec<Arc<TestItem>>) {
		let items: Vec<_> = ["a", "b", "c", "d"].into_iter().map(|n| item(n, 0)).collect();
		let collection = IndexedCollection::from_iter_keyed(items.iter().cloned(), Some(name_key()));
		(collection, items)
	}

	#[test]
	fn add_inserts_at_index() {
		let (mut collection, _) = abcd();
		assert_eq!(collection.add(item("x", 0), Some(1)), Some(1));
		assert_eq!(names(collection.iter()), vec!["a", "x", "b", "c", "d"]);
	}

	#[test]
	fn add_past_end_appends() {
		let (mut collection, _) = abcd();
		assert_eq!(collection.add(item("x", 0), Some(99)), Some(4));
		assert_eq!(collection.get(4).and_then(|i| i.name.clone()), Some("x".into()));
	}

	#[test]
	fn index_of_non_member_is_none() {
		let (collection, _) = abcd();
		assert_eq!(collection.index_of(&item("a", 0)), None);
	}

	#[rstest]
	#[case::one_step(1, 2, vec!["a", "c", "b", "d"])]
	#[case::clamped(10, 3, vec!["a", "c", "d", "b"])]
	#[case::negative_lowers(-1, 0, vec!["b", "a", "c", "d"])]
	fn raise_moves_towards_end(#[case] steps: isize, #[case] expected_index: usize, #[case] expected: Vec<&str>) {
		let (mut collection, items) = abcd();
		assert_eq!(collection.raise(&items[1], steps), Some(expected_index));
		assert_eq!(names(collection.iter()), expected);
	}

	#[rstest]
	#[case::one_step(1, 1, vec!["a", "c", "b", "d"])]
	#[case::clamped(10, 0, vec!["c", "a", "b", "d"])]
	#[case::negative_raises(-1, 3, vec!["a", "b", "d", "c"])]
	fn lower_moves_towards_start(#[case] steps: isize, #[case] expected_index: usize, #[case] expected: Vec<&str>) {
		let (mut collection, items) = abcd();
		assert_eq!(collection.lower(&items[2], steps), Some(expected_index));
		assert_eq!(names(collection.iter()), expected);
	}

	#[test]
	fn raise_non_member_is_none() {
		let (mut collection, _) = abcd();
		assert_eq!(collection.raise(&item("z", 0), 1), None);
		assert_eq!(collection.lower(&item("z", 0), 1), None);
	}

	#[test]
	fn move_to_clamps_target() {
		let (mut collection, items) = abcd();
		assert_eq!(collection.move_to(&items[0], 42), Some(3));
		assert_eq!(names(collection.iter()), vec!["b", "c", "d", "a"]);
	}

	#[test]
	fn move_to_emits_moved_only_on_change() {
		let (mut collection, items) = abcd();
		let moved = Arc::new(Mutex::new(Vec::new()));
		let log = Arc::clone(&moved);
		collection.events().moved.add_listener(move |i: &Arc<TestItem>| log.lock().push(i.name.clone()));

		assert_eq!(collection.move_to(&items[1], 1), Some(1));
		assert!(moved.lock().is_empty());

		assert_eq!(collection.move_to(&items[1], 0), Some(0));
		assert_eq!(*moved.lock(), vec![Some("b".to_string())]);
	}

	#[test]
	fn move_does_not_emit_added_or_removed() {
		let (mut collection, items) = abcd();
		let count = Arc::new(Mutex::new(0));
		let added = Arc::clone(&count);
		collection.events().added.add_listener(move |_| *added.lock() += 1);
		let removed = Arc::clone(&count);
		collection.events().removed.add_listener(move |_| *removed.lock() += 1);

		collection.move_to(&items[3], 0);
		assert_eq!(*count.lock(), 0);
	}

	#[test]
	fn remove_records_previous_index() {
		let (mut collection, items) = abcd();
		assert_eq!(collection.remove(&items[2]), Some(2));
		assert_eq!(collection.previous_index(&items[2]), Some(2));
		assert_eq!(collection.previous_index(&items[0]), None);

		let hint = collection.previous_index(&items[2]);
		collection.add(Arc::clone(&items[2]), hint);
		assert_eq!(names(collection.iter()), vec!["a", "b", "c", "d"]);
	}

	#[test]
	fn positions_stay_contiguous() {
		let (mut collection, items) = abcd();
		collection.remove(&items[1]);
		collection.move_to(&items[3], 0);
		for (expected, item) in collection.items().to_vec().iter().enumerate() {
			assert_eq!(collection.index_of(item), Some(expected));
		}
	}

	#[test]
	fn destroy_twice_is_noop() {
		let (mut collection, _) = abcd();
		collection.destroy();
		collection.destroy();
		assert!(collection.is_destroyed());
		assert!(collection.is_empty());
	}
}
