use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category type used when a config names none.
pub const DEFAULT_CATEGORY_TYPE: &str = "Category";

/// Item property used as the unique key unless configured otherwise.
pub const DEFAULT_KEY_PROPERTY: &str = "name";

/// Presentation options forwarded to a category's layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub style: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub highlight_style: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub z_index: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vector_properties: Option<Value>,
	/// Layer-specific keys. Kept from the creating config, never merged.
	#[serde(flatten)]
	pub other: Map<String, Value>,
}

impl LayerOptions {
	/// Overwrites the mergeable fields set in `incoming`.
	pub fn merge_from(&mut self, incoming: &LayerOptions) {
		if let Some(style) = &incoming.style {
			self.style = Some(style.clone());
		}
		if let Some(highlight_style) = &incoming.highlight_style {
			self.highlight_style = Some(highlight_style.clone());
		}
		if let Some(z_index) = incoming.z_index {
			self.z_index = Some(z_index);
		}
		if let Some(vector_properties) = &incoming.vector_properties {
			self.vector_properties = Some(vector_properties.clone());
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryOptions {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub type_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub class_registry_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub feature_property: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub key_property: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub layer_options: Option<LayerOptions>,
}

impl CategoryOptions {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
		self.type_name = Some(type_name.into());
		self
	}
}

/// A category as it appears in a module: its options plus the item configs the module contributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
	#[serde(flatten)]
	pub options: CategoryOptions,
	#[serde(default)]
	pub items: Vec<Value>,
}
