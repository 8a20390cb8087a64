//! Named, module-fed item groups.
//!
//! # Purpose
//!
//! A [`Category`] is the unit modules contribute items to. It owns an override collection keyed by
//! its key property, remembers presentation options merged from every contributing module, and
//! mirrors its live items into an optional [`CategoryLayer`].
//!
//! # Invariants
//!
//! - The collection's unique key is always the category's key property.
//!   - Enforced in: [`Category::set_override_collection`].
//!   - Tested by: `category::tests::set_collection_rejects_foreign_key`
//! - Identity options never change after creation; merges that would change them fail as a whole.
//!   - Enforced in: `CategoryEntry::merge_options` for [`Category`].
//!   - Tested by: `category::tests::merge_rejects_conflicting_identity`
//! - The layer shows exactly the live items of the current collection.
//!   - Enforced in: [`Category::set_override_collection`], `attach_layer`.
//!   - Tested by: `category::tests::layer_follows_collection_swap`, `category::tests::set_override_collection_keeps_shadows_and_module_tags`

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use vcmap_collection::{
	IndexedCollection, ItemCodec, ModuleId, ModuleIdProvider, OverrideCollection, OverrideError, ParseReport, Properties, Replaced,
	Subscription, UniqueKey,
};

use crate::entry::CategoryEntry;
use crate::error::CategoryError;
use crate::item::{PlainCodec, PlainItem};
use crate::layer::CategoryLayer;
use crate::options::{CategoryConfig, CategoryOptions, DEFAULT_CATEGORY_TYPE, DEFAULT_KEY_PROPERTY, LayerOptions};

/// Bounds every category item type satisfies.
pub trait CategoryItem: Properties + Send + Sync + 'static {}

impl<T: Properties + Send + Sync + 'static> CategoryItem for T {}

/// The collection type a category manages.
pub type CategoryItems<T> = OverrideCollection<T, IndexedCollection<T>>;

struct Presentation {
	title: String,
	layer_options: LayerOptions,
}

pub struct Category<T: CategoryItem> {
	name: String,
	type_name: String,
	key_property: String,
	class_registry_name: Option<String>,
	feature_property: Option<String>,
	presentation: RwLock<Presentation>,
	module_ids: ModuleIdProvider,
	codec: Arc<dyn ItemCodec<T>>,
	layer: Option<Arc<dyn CategoryLayer<T>>>,
	items: AsyncMutex<CategoryItems<T>>,
	subscriptions: Mutex<Vec<Subscription>>,
	destroyed: AtomicBool,
}

impl<T: CategoryItem> Category<T> {
	/// Creates an empty category from `options`. A name is required.
	pub fn new(options: CategoryOptions, codec: Arc<dyn ItemCodec<T>>, module_ids: ModuleIdProvider) -> Result<Self, CategoryError> {
		let CategoryOptions {
			name,
			type_name,
			title,
			class_registry_name,
			feature_property,
			key_property,
			layer_options,
		} = options;
		let name = name.ok_or(CategoryError::MissingName)?;
		let key_property = key_property.unwrap_or_else(|| DEFAULT_KEY_PROPERTY.to_owned());
		let items = OverrideCollection::new(
			IndexedCollection::new(UniqueKey::property(key_property.as_str())),
			module_ids.clone(),
			Arc::clone(&codec),
		)?;

		Ok(Self {
			presentation: RwLock::new(Presentation {
				title: title.unwrap_or_else(|| name.clone()),
				layer_options: layer_options.unwrap_or_default(),
			}),
			name,
			type_name: type_name.unwrap_or_else(|| DEFAULT_CATEGORY_TYPE.to_owned()),
			key_property,
			class_registry_name,
			feature_property,
			module_ids,
			codec,
			layer: None,
			items: AsyncMutex::new(items),
			subscriptions: Mutex::new(Vec::new()),
			destroyed: AtomicBool::new(false),
		})
	}

	/// Attaches `layer`, replaying the current items and options to it.
	pub fn with_layer(mut self, layer: Arc<dyn CategoryLayer<T>>) -> Self {
		self.detach_layer();
		let items = self.items.get_mut();
		for item in items.items() {
			layer.item_added(item);
		}
		layer.apply_options(&self.presentation.get_mut().layer_options);
		*self.subscriptions.get_mut() = attach_layer(&layer, items);
		self.layer = Some(layer);
		self
	}

	pub fn key_property(&self) -> &str {
		&self.key_property
	}

	pub fn class_registry_name(&self) -> Option<&str> {
		self.class_registry_name.as_deref()
	}

	pub fn feature_property(&self) -> Option<&str> {
		self.feature_property.as_deref()
	}

	pub fn title(&self) -> String {
		self.presentation.read().title.clone()
	}

	pub fn layer_options(&self) -> LayerOptions {
		self.presentation.read().layer_options.clone()
	}

	pub fn layer(&self) -> Option<&Arc<dyn CategoryLayer<T>>> {
		self.layer.as_ref()
	}

	/// Locks the item collection.
	pub async fn collection(&self) -> MutexGuard<'_, CategoryItems<T>> {
		self.items.lock().await
	}

	/// Adds `item` under the current dynamic module, overriding any item with the same key.
	pub async fn add_item(&self, item: Arc<T>) -> Option<Arc<T>> {
		self.items.lock().await.override_item(item)
	}

	/// Replaces the item collection with a fresh wrapper around `collection`.
	///
	/// `collection` must be keyed by this category's key property.
	pub async fn set_collection(&self, collection: IndexedCollection<T>) -> Result<(), CategoryError> {
		self.check_key(collection.unique_key().map(UniqueKey::name))?;
		let wrapped = OverrideCollection::new(collection, self.module_ids.clone(), Arc::clone(&self.codec))?;
		self.set_override_collection(wrapped).await
	}

	/// Replaces the item collection.
	///
	/// The previous collection is destroyed, the layer is cleared and receives the new items.
	pub async fn set_override_collection(&self, collection: CategoryItems<T>) -> Result<(), CategoryError> {
		self.check_key(collection.inner().unique_key().map(UniqueKey::name))?;
		if collection.is_destroyed() {
			return Err(OverrideError::Destroyed.into());
		}

		let mut items = self.items.lock().await;
		self.detach_layer();
		items.destroy();
		*items = collection;

		if let Some(layer) = &self.layer {
			layer.clear();
			for item in items.items() {
				layer.item_added(item);
			}
			*self.subscriptions.lock() = attach_layer(layer, &items);
		}
		tracing::debug!(category = %self.name, count = items.len(), "category collection replaced");
		Ok(())
	}

	fn check_key(&self, found: Option<&str>) -> Result<(), CategoryError> {
		if found == Some(self.key_property.as_str()) {
			return Ok(());
		}
		Err(CategoryError::KeyMismatch {
			expected: self.key_property.clone(),
			found: found.map(str::to_owned),
		})
	}

	fn detach_layer(&self) {
		for subscription in std::mem::take(&mut *self.subscriptions.lock()) {
			subscription.unsubscribe();
		}
	}
}

impl Category<PlainItem> {
	/// Category of untyped JSON items.
	pub fn plain(options: CategoryOptions, module_ids: ModuleIdProvider) -> Result<Self, CategoryError> {
		Self::new(options, Arc::new(PlainCodec), module_ids)
	}
}

impl<T: CategoryItem> std::fmt::Debug for Category<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Category")
			.field("name", &self.name)
			.field("type_name", &self.type_name)
			.field("key_property", &self.key_property)
			.field("destroyed", &self.destroyed.load(Ordering::Acquire))
			.finish_non_exhaustive()
	}
}

fn attach_layer<T: CategoryItem>(layer: &Arc<dyn CategoryLayer<T>>, items: &CategoryItems<T>) -> Vec<Subscription> {
	let events = items.events();
	let added = Arc::clone(layer);
	let removed = Arc::clone(layer);
	let moved = Arc::clone(layer);
	let replaced = Arc::clone(layer);
	vec![
		events.added.add_listener(move |item| added.item_added(item)),
		events.removed.add_listener(move |item| removed.item_removed(item)),
		events.moved.add_listener(move |item| moved.item_moved(item)),
		items
			.replaced()
			.add_listener(move |event: &Replaced<T>| replaced.item_replaced(&event.old, &event.new)),
	]
}

fn check_identity(field: &'static str, existing: Option<&str>, incoming: Option<&str>) -> Result<(), CategoryError> {
	match incoming {
		Some(incoming) if Some(incoming) != existing => Err(CategoryError::MergeConflict {
			field,
			existing: existing.map(str::to_owned),
			incoming: incoming.to_owned(),
		}),
		_ => Ok(()),
	}
}

#[async_trait]
impl<T: CategoryItem> CategoryEntry for Category<T> {
	fn name(&self) -> &str {
		&self.name
	}

	fn type_name(&self) -> &str {
		&self.type_name
	}

	fn options(&self) -> CategoryOptions {
		let presentation = self.presentation.read();
		CategoryOptions {
			name: Some(self.name.clone()),
			type_name: Some(self.type_name.clone()),
			title: Some(presentation.title.clone()),
			class_registry_name: self.class_registry_name.clone(),
			feature_property: self.feature_property.clone(),
			key_property: Some(self.key_property.clone()),
			layer_options: Some(presentation.layer_options.clone()),
		}
	}

	fn merge_options(&self, options: &CategoryOptions) -> Result<(), CategoryError> {
		check_identity("classRegistryName", self.class_registry_name.as_deref(), options.class_registry_name.as_deref())?;
		check_identity("featureProperty", self.feature_property.as_deref(), options.feature_property.as_deref())?;
		check_identity("keyProperty", Some(self.key_property.as_str()), options.key_property.as_deref())?;

		let merged = {
			let mut presentation = self.presentation.write();
			if let Some(title) = &options.title {
				presentation.title = title.clone();
			}
			options.layer_options.as_ref().map(|layer_options| {
				presentation.layer_options.merge_from(layer_options);
				presentation.layer_options.clone()
			})
		};
		// Layers may read the category back from the callback.
		if let (Some(layer), Some(merged)) = (&self.layer, merged) {
			layer.apply_options(&merged);
		}
		Ok(())
	}

	async fn parse_items(&self, items: Vec<Value>, module_id: ModuleId) -> ParseReport {
		self.items.lock().await.parse_items(items, &module_id).await
	}

	async fn remove_module(&self, module_id: &ModuleId) {
		self.items.lock().await.remove_module(module_id).await;
	}

	async fn serialize_module(&self, module_id: &ModuleId) -> Option<CategoryConfig> {
		let items = self.items.lock().await.serialize_module(module_id);
		if items.is_empty() {
			return None;
		}
		let mut options = self.options();
		options.title = options.title.filter(|title| *title != self.name);
		options.key_property = options.key_property.filter(|key| key != DEFAULT_KEY_PROPERTY);
		options.layer_options = options.layer_options.filter(|layer_options| *layer_options != LayerOptions::default());
		Some(CategoryConfig { options, items })
	}

	async fn item_count(&self) -> usize {
		self.items.lock().await.len()
	}

	async fn destroy(&self) {
		if self.destroyed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.detach_layer();
		self.items.lock().await.destroy();
		if let Some(layer) = &self.layer {
			layer.destroy();
		}
		tracing::debug!(category = %self.name, "category destroyed");
	}

	fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::Acquire)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
