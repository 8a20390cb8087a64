//! The set of categories known to a host.
//!
//! # Purpose
//!
//! Modules may contribute items to a category before any module has created it. Such batches are
//! parked in a pending cache, keyed by category name and module, and flushed in arrival order as
//! soon as the category is added.
//!
//! # Invariants
//!
//! - Category names are unique.
//!   - Enforced in: [`CategoryCollection::add`].
//!   - Tested by: `category_collection::tests::duplicate_names_are_rejected`
//! - A removed module leaves nothing in the pending cache.
//!   - Enforced in: the `module_removed` listener installed by [`CategoryCollection::new`].
//!   - Tested by: `category_collection::tests::module_removal_strips_pending_items`
//! - Pending batches are applied in module arrival order.
//!   - Enforced in: [`CategoryCollection::add`].
//!   - Tested by: `category_collection::tests::pending_batches_flush_in_arrival_order`

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use vcmap_collection::{Event, IndexedCollection, ItemError, ModuleId, ModuleIdProvider, ParseReport, Subscription, UniqueKey};

use crate::category::Category;
use crate::entry::CategoryEntry;
use crate::error::CategoryError;
use crate::options::{CategoryConfig, CategoryOptions, DEFAULT_CATEGORY_TYPE};
use crate::registry::ClassRegistry;

/// Arguments handed to category factories.
#[derive(Debug, Clone)]
pub struct CategoryArgs {
	pub options: CategoryOptions,
	pub module_ids: ModuleIdProvider,
}

/// Factories creating categories by type name.
pub type CategoryFactories = ClassRegistry<dyn CategoryEntry, CategoryArgs>;

/// Factories with the plain `"Category"` type registered.
pub fn default_category_factories() -> CategoryFactories {
	let mut factories = CategoryFactories::new("categories");
	let registered = factories.register(DEFAULT_CATEGORY_TYPE, |args: CategoryArgs| {
		let category = Category::plain(args.options, args.module_ids).map_err(|error| ItemError::Invalid(error.to_string()))?;
		Ok(Arc::new(category) as Arc<dyn CategoryEntry>)
	});
	if let Err(error) = registered {
		tracing::error!(%error, "failed to register the default category type");
	}
	factories
}

type PendingItems = FxHashMap<String, IndexMap<ModuleId, Vec<Value>>>;

fn strip_module(pending: &mut PendingItems, module_id: &ModuleId) {
	pending.retain(|_, modules| {
		modules.shift_remove(module_id);
		!modules.is_empty()
	});
}

pub struct CategoryCollection {
	categories: IndexedCollection<dyn CategoryEntry>,
	pending: Arc<Mutex<PendingItems>>,
	factories: Arc<CategoryFactories>,
	module_ids: ModuleIdProvider,
	module_removed: Option<Subscription>,
}

impl CategoryCollection {
	/// Creates an empty collection whose pending cache follows `module_removed`.
	pub fn new(factories: Arc<CategoryFactories>, module_ids: ModuleIdProvider, module_removed: &Event<ModuleId>) -> Self {
		let pending: Arc<Mutex<PendingItems>> = Arc::default();
		let listener = Arc::clone(&pending);
		let subscription = module_removed.add_listener(move |module_id: &ModuleId| strip_module(&mut listener.lock(), module_id));

		Self {
			categories: IndexedCollection::new(UniqueKey::<dyn CategoryEntry>::new("name", |category| Some(category.name().to_owned()))),
			pending,
			factories,
			module_ids,
			module_removed: Some(subscription),
		}
	}

	/// Adds `category` and applies every batch parked for its name.
	///
	/// Returns `None` if a category of the same name exists.
	pub async fn add(&mut self, category: Arc<dyn CategoryEntry>) -> Option<usize> {
		let name = category.name().to_owned();
		if self.categories.has_key(&name) {
			tracing::warn!(category = %name, "a category with this name already exists");
			return None;
		}
		let index = self.categories.add(Arc::clone(&category), None)?;

		let parked = self.pending.lock().remove(&name);
		if let Some(parked) = parked {
			for (module_id, items) in parked {
				tracing::debug!(category = %name, module = %module_id, count = items.len(), "flushing pending items");
				category.parse_items(items, module_id).await;
			}
		}
		Some(index)
	}

	pub fn remove(&mut self, category: &Arc<dyn CategoryEntry>) -> Option<usize> {
		self.categories.remove(category)
	}

	/// Parses `items` into the category `name`, or parks them until it is added.
	///
	/// Returns `None` if the items were parked.
	pub async fn parse_category_items(&self, name: &str, items: Vec<Value>, module_id: ModuleId) -> Option<ParseReport> {
		if let Some(category) = self.categories.get_by_key(name).cloned() {
			return Some(category.parse_items(items, module_id).await);
		}
		tracing::debug!(category = %name, module = %module_id, count = items.len(), "parking items for missing category");
		self.pending
			.lock()
			.entry(name.to_owned())
			.or_default()
			.entry(module_id)
			.or_default()
			.extend(items);
		None
	}

	/// Returns the category named in `options`, creating it if needed.
	///
	/// An existing category merges `options`; a merge conflict is an error. Configs without a
	/// name or with an unknown type are logged and yield `Ok(None)`.
	pub async fn request_category(&mut self, options: CategoryOptions) -> Result<Option<Arc<dyn CategoryEntry>>, CategoryError> {
		let Some(name) = options.name.clone() else {
			tracing::error!("cannot request a category without a name");
			return Ok(None);
		};
		if let Some(existing) = self.categories.get_by_key(&name).cloned() {
			existing.merge_options(&options)?;
			return Ok(Some(existing));
		}

		let type_name = match &options.type_name {
			Some(type_name) => type_name.clone(),
			None => {
				tracing::warn!(category = %name, "category has no type, assuming {DEFAULT_CATEGORY_TYPE}");
				DEFAULT_CATEGORY_TYPE.to_owned()
			}
		};
		let args = CategoryArgs {
			options,
			module_ids: self.module_ids.clone(),
		};
		let category = match self.factories.create(&type_name, args) {
			Ok(category) => category,
			Err(error) => {
				tracing::error!(category = %name, %type_name, %error, "failed to create category");
				return Ok(None);
			}
		};
		if self.add(Arc::clone(&category)).await.is_none() {
			return Ok(None);
		}
		Ok(Some(category))
	}

	/// Removes the items of `module_id` from every category.
	pub async fn remove_module(&self, module_id: &ModuleId) {
		for category in self.categories.items().to_vec() {
			category.remove_module(module_id).await;
		}
	}

	/// Drops every parked batch of `module_id`.
	pub fn forget_pending(&self, module_id: &ModuleId) {
		strip_module(&mut self.pending.lock(), module_id);
	}

	/// The contributions of `module_id`, one config per category it has live items in.
	pub async fn serialize_module(&self, module_id: &ModuleId) -> Vec<CategoryConfig> {
		let mut configs = Vec::new();
		for category in self.categories.items().to_vec() {
			if let Some(config) = category.serialize_module(module_id).await {
				configs.push(config);
			}
		}
		configs
	}

	/// Modules with items parked for the category `name`, in arrival order.
	pub fn pending_modules(&self, name: &str) -> Vec<ModuleId> {
		self.pending
			.lock()
			.get(name)
			.map(|modules| modules.keys().cloned().collect())
			.unwrap_or_default()
	}

	pub fn get_by_key(&self, name: &str) -> Option<&Arc<dyn CategoryEntry>> {
		self.categories.get_by_key(name)
	}

	pub fn has_key(&self, name: &str) -> bool {
		self.categories.has_key(name)
	}

	pub fn items(&self) -> &[Arc<dyn CategoryEntry>] {
		self.categories.items()
	}

	pub fn len(&self) -> usize {
		self.categories.len()
	}

	pub fn is_empty(&self) -> bool {
		self.categories.is_empty()
	}

	pub fn factories(&self) -> &Arc<CategoryFactories> {
		&self.factories
	}

	/// Positional access, e.g. to reorder categories.
	pub fn inner_mut(&mut self) -> &mut IndexedCollection<dyn CategoryEntry> {
		&mut self.categories
	}

	/// Destroys every category and detaches from the host.
	pub async fn destroy(&mut self) {
		if let Some(subscription) = self.module_removed.take() {
			subscription.unsubscribe();
		}
		for category in self.categories.items().to_vec() {
			category.destroy().await;
		}
		self.categories.destroy();
		self.pending.lock().clear();
	}
}
