use std::any::Any;

use async_trait::async_trait;
use serde_json::Value;
use vcmap_collection::{ModuleId, ParseReport};

use crate::category::{Category, CategoryItem};
use crate::error::CategoryError;
use crate::options::{CategoryConfig, CategoryOptions};

/// Type-erased view of a [`Category`], letting one collection hold categories of any item type.
#[async_trait]
pub trait CategoryEntry: Any + Send + Sync {
	fn name(&self) -> &str;

	/// Registered type name the category was created under.
	fn type_name(&self) -> &str;

	/// Current options, with the merged title and layer options.
	fn options(&self) -> CategoryOptions;

	/// Merges `options` from another module into this category.
	///
	/// Fails without changing anything if an identity field (`classRegistryName`,
	/// `featureProperty`, `keyProperty`) differs from the live value.
	fn merge_options(&self, options: &CategoryOptions) -> Result<(), CategoryError>;

	async fn parse_items(&self, items: Vec<Value>, module_id: ModuleId) -> ParseReport;

	async fn remove_module(&self, module_id: &ModuleId);

	/// The module's contribution to this category, or `None` if it has no live items here.
	async fn serialize_module(&self, module_id: &ModuleId) -> Option<CategoryConfig>;

	async fn item_count(&self) -> usize;

	/// Destroys the item collection and the layer. Idempotent.
	async fn destroy(&self);

	fn is_destroyed(&self) -> bool;

	fn as_any(&self) -> &dyn Any;
}

impl dyn CategoryEntry {
	/// Recovers the typed category, if it holds items of type `T`.
	pub fn downcast<T: CategoryItem>(&self) -> Option<&Category<T>> {
		self.as_any().downcast_ref()
	}
}
