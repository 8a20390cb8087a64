use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::codec::{Deserialized, FnCodec, ItemCodec};
use crate::error::ItemError;
use crate::key::{Properties, UniqueKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestItem {
	pub name: Option<String>,
	pub value: u32,
}

impl Properties for TestItem {
	fn property(&self, name: &str) -> Option<Cow<'_, str>> {
		match name {
			"name" => self.name.as_deref().map(Cow::Borrowed),
			_ => None,
		}
	}
}

pub(crate) fn item(name: &str, value: u32) -> Arc<TestItem> {
	Arc::new(TestItem {
		name: Some(name.to_string()),
		value,
	})
}

pub(crate) fn unnamed(value: u32) -> Arc<TestItem> {
	Arc::new(TestItem { name: None, value })
}

pub(crate) fn name_key() -> UniqueKey<TestItem> {
	UniqueKey::property("name")
}

fn to_config(item: &TestItem) -> Value {
	json!({ "name": item.name, "value": item.value })
}

fn from_config(config: &Value) -> Result<Arc<TestItem>, ItemError> {
	let name = config.get("name").and_then(Value::as_str).ok_or_else(|| ItemError::Invalid("missing name".into()))?;
	let value = config.get("value").and_then(Value::as_u64).unwrap_or_default() as u32;
	Ok(item(name, value))
}

/// Synchronous JSON codec for [`TestItem`].
pub(crate) fn codec() -> Arc<dyn ItemCodec<TestItem>> {
	Arc::new(FnCodec::new(to_config, |config: Value| Deserialized::Ready(from_config(&config))))
}

/// Codec whose deserializer yields to the runtime before producing the item.
pub(crate) fn async_codec() -> Arc<dyn ItemCodec<TestItem>> {
	Arc::new(FnCodec::new(to_config, |config: Value| {
		Deserialized::pending(async move {
			tokio::time::sleep(Duration::from_millis(1)).await;
			from_config(&config)
		})
	}))
}

pub(crate) fn names<'a>(items: impl IntoIterator<Item = &'a Arc<TestItem>>) -> Vec<String> {
	items.into_iter().map(|i| i.name.clone().unwrap_or_default()).collect()
}
