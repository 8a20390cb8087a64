use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vcmap_collection::{Deserialized, ItemCodec, ItemError, Properties};

/// Untyped category item: the JSON object it was configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlainItem(Map<String, Value>);

impl PlainItem {
	pub fn new(properties: Map<String, Value>) -> Self {
		Self(properties)
	}

	/// Accepts JSON objects only.
	pub fn from_value(value: Value) -> Result<Self, ItemError> {
		match value {
			Value::Object(properties) => Ok(Self(properties)),
			other => Err(ItemError::Invalid(format!("expected an object, found {other}"))),
		}
	}

	pub fn get(&self, property: &str) -> Option<&Value> {
		self.0.get(property)
	}

	pub fn properties(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn to_value(&self) -> Value {
		Value::Object(self.0.clone())
	}
}

impl Properties for PlainItem {
	fn property(&self, name: &str) -> Option<Cow<'_, str>> {
		match self.0.get(name)? {
			Value::String(s) => Some(Cow::Borrowed(s.as_str())),
			Value::Number(n) => Some(Cow::Owned(n.to_string())),
			Value::Bool(b) => Some(Cow::Owned(b.to_string())),
			_ => None,
		}
	}
}

/// Codec for [`PlainItem`]: the config is the item.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl ItemCodec<PlainItem> for PlainCodec {
	fn serialize(&self, item: &PlainItem) -> Value {
		item.to_value()
	}

	fn deserialize(&self, config: Value) -> Deserialized<PlainItem> {
		Deserialized::Ready(PlainItem::from_value(config).map(Arc::new))
	}
}
