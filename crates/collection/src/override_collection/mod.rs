//! Override semantics over a keyed container.
//!
//! # Purpose
//!
//! Configuration modules contribute items to shared collections. A module loaded later may
//! provide an item under a key that is already live; the new item takes over the key and the old
//! one is kept, serialized, on a per-key shadow stack. Removing the newer item (directly or by
//! unloading its module) brings the previous one back by deserializing it again.
//!
//! # Mental Model
//!
//! Per unique key value there is a two-tier state:
//!
//! ```text
//! ABSENT --add/override--> LIVE --override--> LIVE + shadow[..n]
//!                           |                      |
//!                        remove               remove (pop newest shadow, reincarnate)
//!                           v                      v
//!                         ABSENT          LIVE(reincarnated) + shadow[..n-1]
//! ```
//!
//! # Invariants
//!
//! - At most one live item per key; shadows are configs, never live objects.
//!   - Enforced in: [`OverrideCollection::override_item`].
//!   - Tested by: `override_collection::tests::repeated_override_stacks_shadows`
//! - An override keeps the replaced item's position.
//!   - Enforced in: [`OverrideCollection::override_item`].
//!   - Tested by: `override_collection::tests::override_keeps_index`
//! - After `remove_module(m)` no live item and no shadow entry is tagged `m`.
//!   - Enforced in: [`OverrideCollection::remove_module`] (shadows stripped before live items go).
//!   - Tested by: `override_collection::tests::remove_module_is_complete`
//!
//! # Concurrency
//!
//! Mutations take `&mut self`. The async operations keep that borrow across their awaits, so a
//! reincarnation in flight cannot interleave with another mutation of the same collection.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::codec::ItemCodec;
use crate::container::{CollectionEvents, Container};
use crate::error::OverrideError;
use crate::event::Event;
use crate::module::{ModuleId, ModuleIdProvider};
use crate::tags::ItemTable;

/// Payload of the `replaced` event.
pub struct Replaced<T: ?Sized> {
	pub old: Arc<T>,
	pub new: Arc<T>,
}

/// A shadowed item: its serialized config and the module that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowEntry {
	pub module_id: ModuleId,
	pub config: Value,
}

/// Outcome of [`OverrideCollection::parse_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
	/// Items that became live.
	pub parsed: usize,
	/// Configs dropped by the item check, the deserializer, or the container.
	pub skipped: usize,
}

/// Validates a raw config before deserialization is attempted.
pub type ItemCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Chooses the index of an overriding item from `(new, shadowed, shadowed_index)`.
pub type ShadowIndex<T> = Arc<dyn Fn(&T, &T, usize) -> Option<usize> + Send + Sync>;

pub struct OverrideCollection<T: ?Sized + 'static, C> {
	inner: C,
	shadow_map: FxHashMap<String, Vec<ShadowEntry>>,
	module_ids: ItemTable<T, ModuleId>,
	module_id_provider: ModuleIdProvider,
	codec: Arc<dyn ItemCodec<T>>,
	item_check: Option<ItemCheck>,
	shadow_index: Option<ShadowIndex<T>>,
	replaced: Event<Replaced<T>>,
	destroyed: bool,
}

impl<T, C> OverrideCollection<T, C>
where
	T: ?Sized + Send + Sync + 'static,
	C: Container<T>,
{
	/// Wraps `inner`. Fails if the container has no unique key or is already destroyed.
	///
	/// An override collection is not a [`Container`], so it cannot be wrapped twice:
	///
	/// ```compile_fail
	/// use std::sync::Arc;
	///
	/// use serde_json::Value;
	/// use vcmap_collection::{Collection, Deserialized, FnCodec, ItemCodec, ItemError, ModuleIdProvider, OverrideCollection, UniqueKey};
	///
	/// let codec: Arc<dyn ItemCodec<String>> = Arc::new(FnCodec::new(
	/// 	|name: &String| Value::from(name.as_str()),
	/// 	|config: Value| Deserialized::Ready(config.as_str().map(|name| Arc::new(name.to_owned())).ok_or_else(|| ItemError::Invalid("not a string".into()))),
	/// ));
	/// let inner = Collection::new(UniqueKey::new("name", |name: &String| Some(name.clone())));
	/// let once = OverrideCollection::new(inner, ModuleIdProvider::fixed("m"), Arc::clone(&codec)).unwrap();
	/// let _twice = OverrideCollection::new(once, ModuleIdProvider::fixed("m"), codec);
	/// ```
	pub fn new(inner: C, module_id_provider: ModuleIdProvider, codec: Arc<dyn ItemCodec<T>>) -> Result<Self, OverrideError> {
		if inner.is_destroyed() {
			return Err(OverrideError::Destroyed);
		}
		if inner.unique_key().is_none() {
			return Err(OverrideError::MissingUniqueKey);
		}
		Ok(Self {
			inner,
			shadow_map: FxHashMap::default(),
			module_ids: ItemTable::new(),
			module_id_provider,
			codec,
			item_check: None,
			shadow_index: None,
			replaced: Event::new(),
			destroyed: false,
		})
	}

	/// Rejects bulk-parsed configs for which `check` returns false.
	pub fn with_item_check<F>(mut self, check: F) -> Self
	where
		F: Fn(&Value) -> bool + Send + Sync + 'static,
	{
		self.item_check = Some(Arc::new(check));
		self
	}

	/// Places overriding items at the index chosen by `hint` instead of the shadow's index.
	pub fn with_shadow_index<F>(mut self, hint: F) -> Self
	where
		F: Fn(&T, &T, usize) -> Option<usize> + Send + Sync + 'static,
	{
		self.shadow_index = Some(Arc::new(hint));
		self
	}

	/// Module that produced `item`, if it was tagged by this collection.
	pub fn module_id(&self, item: &Arc<T>) -> Option<&ModuleId> {
		self.module_ids.get(item)
	}

	/// Tags `item` with `module_id` ahead of adding it.
	pub fn set_module_id(&mut self, item: &Arc<T>, module_id: ModuleId) {
		self.module_ids.insert(item, module_id);
	}

	fn ensure_module_id(&mut self, item: &Arc<T>) {
		if self.module_ids.get(item).is_none() {
			let module_id = self.module_id_provider.current();
			self.module_ids.insert(item, module_id);
		}
	}

	/// Adds `item` without override semantics; an existing key rejects it.
	pub fn add(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
		self.ensure_module_id(&item);
		self.inner.add(item, index)
	}

	/// Makes `item` the live item for its key.
	///
	/// If another item is live under the same key, its config is pushed onto the key's shadow
	/// stack, `item` takes its position, and `replaced` is emitted. Returns `None` if `item`
	/// could not be added at all.
	pub fn override_item(&mut self, item: Arc<T>) -> Option<Arc<T>> {
		self.ensure_module_id(&item);
		let Some(key) = self.inner.key_of(&item) else {
			tracing::warn!("cannot override an item without a unique key");
			return None;
		};

		let Some(shadow) = self.inner.get_by_key(&key).cloned() else {
			return self.inner.add(Arc::clone(&item), None).map(|_| item);
		};
		if Arc::ptr_eq(&shadow, &item) {
			return Some(item);
		}

		let module_id = self.module_ids.get(&shadow).cloned().unwrap_or_else(|| self.module_id_provider.current());
		let config = self.codec.serialize(&shadow);
		let index = self.inner.remove(&shadow)?;
		let target = self.shadow_index.as_ref().and_then(|hint| hint(&*item, &*shadow, index)).unwrap_or(index);
		if self.inner.add(Arc::clone(&item), Some(target)).is_none() {
			self.inner.add(shadow, Some(index));
			return None;
		}

		tracing::debug!(%key, shadowed = %module_id, module = ?self.module_ids.get(&item), "item overridden");
		self.shadow_map.entry(key).or_default().push(ShadowEntry { module_id, config });
		self.replaced.emit(&Replaced {
			old: shadow,
			new: Arc::clone(&item),
		});
		Some(item)
	}

	/// Removes `item`, reincarnating the newest shadow of its key at the same position.
	///
	/// With an async deserializer the key has no live item until the reincarnation resolves.
	/// Returns the index `item` occupied, or `None` if it was not a member.
	pub async fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
		let key = self.inner.key_of(item);
		let index = self.inner.remove(item)?;
		if let Some(shadow) = key.as_deref().and_then(|key| self.pop_shadow(key)) {
			self.reincarnate(shadow, index, item).await;
		}
		Some(index)
	}

	fn pop_shadow(&mut self, key: &str) -> Option<ShadowEntry> {
		let stack = self.shadow_map.get_mut(key)?;
		let shadow = stack.pop();
		if stack.is_empty() {
			self.shadow_map.remove(key);
		}
		shadow
	}

	async fn reincarnate(&mut self, shadow: ShadowEntry, index: usize, old: &Arc<T>) {
		let ShadowEntry { module_id, config } = shadow;
		let codec = Arc::clone(&self.codec);
		match codec.deserialize(config).resolve().await {
			Ok(reincarnation) => {
				self.module_ids.insert(&reincarnation, module_id.clone());
				if self.inner.add(Arc::clone(&reincarnation), Some(index)).is_some() {
					tracing::debug!(module = %module_id, index, "shadow reincarnated");
					self.replaced.emit(&Replaced {
						old: Arc::clone(old),
						new: reincarnation,
					});
				} else {
					tracing::warn!(module = %module_id, "reincarnated item was rejected by the collection");
				}
			}
			Err(error) => {
				tracing::error!(module = %module_id, %error, "failed to reincarnate shadowed item");
			}
		}
	}

	/// Removes every trace of `module_id`.
	///
	/// Shadow entries of the module are dropped first, so removing its live items only ever
	/// reincarnates shadows that belong to other modules.
	pub async fn remove_module(&mut self, module_id: &ModuleId) {
		self.shadow_map.retain(|_, stack| {
			stack.retain(|shadow| &shadow.module_id != module_id);
			!stack.is_empty()
		});

		let owned: Vec<Arc<T>> = self
			.inner
			.items()
			.iter()
			.filter(|item| self.module_ids.get(item) == Some(module_id))
			.cloned()
			.collect();
		tracing::debug!(module = %module_id, count = owned.len(), "removing module items");
		for item in owned {
			self.remove(&item).await;
		}
	}

	/// Deserializes `configs` as items of `module_id` and overrides them in input order.
	///
	/// Configs rejected by the item check or the deserializer are logged and skipped; the rest of
	/// the batch continues. A key repeated within the batch overrides its earlier occurrence.
	pub async fn parse_items(&mut self, configs: Vec<Value>, module_id: &ModuleId) -> ParseReport {
		let mut report = ParseReport::default();
		let codec = Arc::clone(&self.codec);
		let mut produced = Vec::with_capacity(configs.len());

		for (index, config) in configs.into_iter().enumerate() {
			if let Some(check) = &self.item_check
				&& !check(&config)
			{
				tracing::warn!(module = %module_id, index, "skipping config rejected by item check");
				report.skipped += 1;
				continue;
			}
			match codec.deserialize(config).resolve().await {
				Ok(item) => produced.push(item),
				Err(error) => {
					tracing::warn!(module = %module_id, index, %error, "skipping config that failed to deserialize");
					report.skipped += 1;
				}
			}
		}

		for item in produced {
			self.module_ids.insert(&item, module_id.clone());
			if self.override_item(item).is_some() {
				report.parsed += 1;
			} else {
				report.skipped += 1;
			}
		}

		tracing::debug!(module = %module_id, parsed = report.parsed, skipped = report.skipped, "parsed module items");
		report
	}

	/// Serialized configs of the live items of `module_id`, in collection order.
	pub fn serialize_module(&self, module_id: &ModuleId) -> Vec<Value> {
		self.inner
			.items()
			.iter()
			.filter(|item| self.module_ids.get(item) == Some(module_id))
			.map(|item| self.codec.serialize(item))
			.collect()
	}

	/// Shadow stack of `key`, oldest first.
	pub fn shadows(&self, key: &str) -> &[ShadowEntry] {
		self.shadow_map.get(key).map_or(&[], Vec::as_slice)
	}

	/// Keys that currently have at least one shadow.
	pub fn shadow_keys(&self) -> impl Iterator<Item = &str> + '_ {
		self.shadow_map.keys().map(String::as_str)
	}

	pub fn replaced(&self) -> &Event<Replaced<T>> {
		&self.replaced
	}

	pub fn codec(&self) -> &Arc<dyn ItemCodec<T>> {
		&self.codec
	}

	pub fn inner(&self) -> &C {
		&self.inner
	}

	/// Direct access to the wrapped container, bypassing module tagging.
	pub fn inner_mut(&mut self) -> &mut C {
		&mut self.inner
	}

	pub fn has(&self, item: &Arc<T>) -> bool {
		self.inner.has(item)
	}

	pub fn has_key(&self, key: &str) -> bool {
		self.inner.has_key(key)
	}

	pub fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
		self.inner.get_by_key(key)
	}

	pub fn index_of(&self, item: &Arc<T>) -> Option<usize> {
		self.inner.index_of(item)
	}

	pub fn items(&self) -> &[Arc<T>] {
		self.inner.items()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn events(&self) -> &CollectionEvents<T> {
		self.inner.events()
	}

	/// Destroys the wrapped container and forgets all shadows. Idempotent.
	pub fn destroy(&mut self) {
		if self.destroyed {
			return;
		}
		self.destroyed = true;
		self.inner.destroy();
		self.shadow_map.clear();
		self.module_ids.clear();
		self.replaced.clear();
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}
}
