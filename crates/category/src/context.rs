//! Module host.
//!
//! # Purpose
//!
//! [`AppContext`] loads and unloads modules. Loading requests each category a module names and
//! feeds it the module's items under the module id; unloading removes every trace of the module
//! from every category and from the pending cache.
//!
//! Items added at runtime without a module are tagged with the dynamic module id, which the host
//! owns and every category reads through [`AppContext::module_id_provider`].

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use uuid::Uuid;
use vcmap_collection::{Event, ModuleId, ModuleIdProvider};

use crate::category_collection::{CategoryCollection, CategoryFactories, default_category_factories};
use crate::config::ModuleConfig;
use crate::error::{CategoryError, ConfigError, Result};

/// Module id of items added at runtime.
pub const DEFAULT_DYNAMIC_MODULE_ID: &str = "_defaultDynamicModule";

pub struct AppContext {
	dynamic_module_id: Arc<RwLock<ModuleId>>,
	modules: IndexMap<ModuleId, ModuleConfig>,
	module_added: Event<ModuleId>,
	module_removed: Event<ModuleId>,
	categories: CategoryCollection,
}

impl Default for AppContext {
	fn default() -> Self {
		Self::new()
	}
}

impl AppContext {
	pub fn new() -> Self {
		Self::with_category_factories(default_category_factories())
	}

	pub fn with_category_factories(factories: CategoryFactories) -> Self {
		let dynamic_module_id = Arc::new(RwLock::new(ModuleId::from(DEFAULT_DYNAMIC_MODULE_ID)));
		let module_removed = Event::new();
		let categories = CategoryCollection::new(Arc::new(factories), dynamic_provider(&dynamic_module_id), &module_removed);
		Self {
			dynamic_module_id,
			modules: IndexMap::new(),
			module_added: Event::new(),
			module_removed,
			categories,
		}
	}

	/// Provider reading the current dynamic module id at tagging time.
	pub fn module_id_provider(&self) -> ModuleIdProvider {
		dynamic_provider(&self.dynamic_module_id)
	}

	pub fn dynamic_module_id(&self) -> ModuleId {
		self.dynamic_module_id.read().clone()
	}

	pub fn set_dynamic_module_id(&self, module_id: ModuleId) {
		tracing::debug!(module = %module_id, "dynamic module changed");
		*self.dynamic_module_id.write() = module_id;
	}

	pub fn reset_dynamic_module_id(&self) {
		self.set_dynamic_module_id(ModuleId::from(DEFAULT_DYNAMIC_MODULE_ID));
	}

	/// Loads `config` as a module and returns its id.
	///
	/// Categories are requested in config order and receive the module's items. If a category
	/// rejects the module's options, everything already applied is rolled back.
	pub async fn add_module(&mut self, config: ModuleConfig) -> Result<ModuleId> {
		let module_id = config
			.id
			.clone()
			.map_or_else(|| ModuleId::from(Uuid::new_v4().to_string()), ModuleId::from);
		if self.modules.contains_key(&module_id) {
			return Err(ConfigError::DuplicateModule(module_id));
		}

		if let Err(error) = self.apply_categories(&config, &module_id).await {
			self.categories.remove_module(&module_id).await;
			self.categories.forget_pending(&module_id);
			return Err(error.into());
		}

		self.modules.insert(module_id.clone(), config);
		tracing::info!(module = %module_id, "module added");
		self.module_added.emit(&module_id);
		Ok(module_id)
	}

	async fn apply_categories(&mut self, config: &ModuleConfig, module_id: &ModuleId) -> Result<(), CategoryError> {
		for category in &config.categories {
			let Some(name) = category.options.name.clone() else {
				tracing::warn!(module = %module_id, "skipping category without a name");
				continue;
			};
			self.categories.request_category(category.options.clone()).await?;
			self.categories
				.parse_category_items(&name, category.items.clone(), module_id.clone())
				.await;
		}
		Ok(())
	}

	/// Unloads a module. Returns false for unknown ids.
	pub async fn remove_module(&mut self, module_id: &ModuleId) -> bool {
		if !self.modules.contains_key(module_id) {
			tracing::debug!(module = %module_id, "ignoring removal of unknown module");
			return false;
		}
		self.categories.remove_module(module_id).await;
		self.module_removed.emit(module_id);
		self.modules.shift_remove(module_id);
		tracing::info!(module = %module_id, "module removed");
		true
	}

	/// The current state of a loaded module: its live items, grouped by category.
	pub async fn serialize_module(&self, module_id: &ModuleId) -> Option<ModuleConfig> {
		let loaded = self.modules.get(module_id)?;
		Some(ModuleConfig {
			id: Some(module_id.to_string()),
			name: loaded.name.clone(),
			categories: self.categories.serialize_module(module_id).await,
		})
	}

	pub fn module(&self, module_id: &ModuleId) -> Option<&ModuleConfig> {
		self.modules.get(module_id)
	}

	/// Loaded module ids, in load order.
	pub fn module_ids(&self) -> impl Iterator<Item = &ModuleId> + '_ {
		self.modules.keys()
	}

	pub fn categories(&self) -> &CategoryCollection {
		&self.categories
	}

	pub fn categories_mut(&mut self) -> &mut CategoryCollection {
		&mut self.categories
	}

	pub fn module_added(&self) -> &Event<ModuleId> {
		&self.module_added
	}

	pub fn module_removed(&self) -> &Event<ModuleId> {
		&self.module_removed
	}

	/// Destroys all categories and forgets every module.
	pub async fn destroy(&mut self) {
		self.categories.destroy().await;
		self.modules.clear();
		self.module_added.clear();
		self.module_removed.clear();
	}
}

fn dynamic_provider(cell: &Arc<RwLock<ModuleId>>) -> ModuleIdProvider {
	let cell = Arc::clone(cell);
	ModuleIdProvider::from_fn(move || cell.read().clone())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn dynamic_module_id_is_read_at_tagging_time() {
		let context = AppContext::new();
		let provider = context.module_id_provider();
		assert_eq!(provider.current(), ModuleId::from(DEFAULT_DYNAMIC_MODULE_ID));

		context.set_dynamic_module_id(ModuleId::from("editing"));
		assert_eq!(provider.current(), ModuleId::from("editing"));

		context.reset_dynamic_module_id();
		assert_eq!(context.dynamic_module_id(), ModuleId::from(DEFAULT_DYNAMIC_MODULE_ID));
	}

	#[tokio::test]
	async fn modules_without_id_get_a_random_one() {
		let mut context = AppContext::new();
		let first = context.add_module(ModuleConfig::default()).await.unwrap();
		let second = context.add_module(ModuleConfig::default()).await.unwrap();
		assert_ne!(first, second);
		assert_eq!(context.module_ids().count(), 2);
	}

	#[tokio::test]
	async fn duplicate_module_ids_are_rejected() {
		let mut context = AppContext::new();
		let config = ModuleConfig {
			id: Some("base".into()),
			..ModuleConfig::default()
		};
		context.add_module(config.clone()).await.unwrap();
		assert!(matches!(context.add_module(config).await, Err(ConfigError::DuplicateModule(id)) if id.as_str() == "base"));
	}

	#[tokio::test]
	async fn failed_merge_rolls_the_module_back() {
		let mut context = AppContext::new();
		context
			.add_module(
				ModuleConfig::from_json_str(r#"{ "_id": "base", "categories": [{ "name": "poi", "type": "Category" }] }"#).unwrap(),
			)
			.await
			.unwrap();

		let conflicting = ModuleConfig::from_json_str(
			r#"{
				"_id": "bad",
				"categories": [
					{ "name": "roads", "items": [{ "name": "r" }] },
					{ "name": "poi", "keyProperty": "id", "items": [{ "id": "p" }] }
				]
			}"#,
		)
		.unwrap();
		let err = context.add_module(conflicting).await.unwrap_err();

		assert!(matches!(err, ConfigError::Category(_)));
		assert!(context.module(&ModuleId::from("bad")).is_none());
		let roads = context.categories().get_by_key("roads").unwrap();
		assert_eq!(roads.item_count().await, 0);
	}

	#[tokio::test]
	async fn remove_module_of_unknown_id_is_noop() {
		let mut context = AppContext::new();
		let removed = Arc::new(parking_lot::Mutex::new(Vec::new()));
		let sink = Arc::clone(&removed);
		context.module_removed().add_listener(move |id: &ModuleId| sink.lock().push(id.clone()));

		assert!(!context.remove_module(&ModuleId::from("missing")).await);
		assert!(removed.lock().is_empty());
	}

	#[tokio::test]
	async fn serialize_module_reflects_live_items() {
		let mut context = AppContext::new();
		let id = context
			.add_module(ModuleConfig {
				id: Some("base".into()),
				name: Some("Base".into()),
				categories: vec![crate::options::CategoryConfig {
					options: crate::options::CategoryOptions::named("poi"),
					items: vec![json!({ "name": "a" })],
				}],
			})
			.await
			.unwrap();

		let serialized = context.serialize_module(&id).await.unwrap();
		assert_eq!(serialized.name.as_deref(), Some("Base"));
		assert_eq!(serialized.categories.len(), 1);
		assert_eq!(serialized.categories[0].items, vec![json!({ "name": "a" })]);

		assert!(context.serialize_module(&ModuleId::from("missing")).await.is_none());
	}
}
