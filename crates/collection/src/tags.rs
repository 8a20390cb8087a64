//! Identity-keyed side tables.
//!
//! Items are shared as `Arc<T>` and are owned by callers, so per-item metadata such as the
//! module tag or the previous position cannot live on the item itself. [`ItemTable`] maps the
//! allocation address of an `Arc` to a value. Each entry keeps a `Weak` to its item: the
//! allocation cannot be freed (and its address reused) while the entry exists, so an address
//! always identifies the item it was recorded for.

use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

const MIN_PRUNE_THRESHOLD: usize = 64;

#[inline]
pub(crate) fn identity<T: ?Sized>(item: &Arc<T>) -> usize {
	Arc::as_ptr(item).cast::<()>() as usize
}

pub struct ItemTable<T: ?Sized, V> {
	entries: FxHashMap<usize, (Weak<T>, V)>,
	prune_at: usize,
}

impl<T: ?Sized, V> Default for ItemTable<T, V> {
	fn default() -> Self {
		Self {
			entries: FxHashMap::default(),
			prune_at: MIN_PRUNE_THRESHOLD,
		}
	}
}

impl<T: ?Sized, V> ItemTable<T, V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, item: &Arc<T>) -> Option<&V> {
		self.entries.get(&identity(item)).map(|(_, value)| value)
	}

	pub fn insert(&mut self, item: &Arc<T>, value: V) -> Option<V> {
		if self.entries.len() >= self.prune_at {
			self.prune();
		}
		self.entries.insert(identity(item), (Arc::downgrade(item), value)).map(|(_, old)| old)
	}

	pub fn remove(&mut self, item: &Arc<T>) -> Option<V> {
		self.entries.remove(&identity(item)).map(|(_, value)| value)
	}

	/// Drops entries whose item has no strong owner left.
	pub fn prune(&mut self) {
		self.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
		self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.prune_at = MIN_PRUNE_THRESHOLD;
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn values_follow_identity_not_equality() {
		let a = Arc::new(String::from("same"));
		let b = Arc::new(String::from("same"));
		let mut table = ItemTable::new();

		table.insert(&a, 1);
		assert_eq!(table.get(&a), Some(&1));
		assert_eq!(table.get(&b), None);
		assert_eq!(table.get(&Arc::clone(&a)), Some(&1));
	}

	#[test]
	fn prune_drops_released_items() {
		let mut table = ItemTable::new();
		let kept = Arc::new(1u8);
		table.insert(&kept, "kept");
		{
			let released = Arc::new(2u8);
			table.insert(&released, "released");
		}
		assert_eq!(table.len(), 2);
		table.prune();
		assert_eq!(table.len(), 1);
		assert_eq!(table.get(&kept), Some(&"kept"));
	}

	#[test]
	fn works_for_unsized_items() {
		let item: Arc<dyn std::fmt::Debug + Send + Sync> = Arc::new(5u32);
		let mut table = ItemTable::new();
		table.insert(&item, 'x');
		assert_eq!(table.remove(&item), Some('x'));
		assert!(table.is_empty());
	}
}
