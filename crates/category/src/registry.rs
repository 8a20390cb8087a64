//! Type-name dispatch tables.
//!
//! Configs name the concrete type they describe in a `type` field. A [`ClassRegistry`] maps those
//! names to factories; registries are plain values passed to whoever needs them, so independent
//! hosts (and tests) never share registrations.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use vcmap_collection::{Deserialized, ItemCodec, ItemError};

use crate::error::RegistryError;

/// Config field naming the type of the described object.
pub const TYPE_FIELD: &str = "type";

type Factory<T, A> = Arc<dyn Fn(A) -> Result<Arc<T>, ItemError> + Send + Sync>;

pub struct ClassRegistry<T: ?Sized, A = Value> {
	label: &'static str,
	factories: FxHashMap<String, Factory<T, A>>,
}

impl<T: ?Sized, A> ClassRegistry<T, A> {
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			factories: FxHashMap::default(),
		}
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Registers `factory` under `type_name`. A name can only be registered once.
	pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F) -> Result<(), RegistryError>
	where
		F: Fn(A) -> Result<Arc<T>, ItemError> + Send + Sync + 'static,
	{
		let type_name = type_name.into();
		if self.factories.contains_key(&type_name) {
			return Err(RegistryError::Duplicate {
				registry: self.label,
				type_name,
			});
		}
		self.factories.insert(type_name, Arc::new(factory));
		Ok(())
	}

	pub fn has_class(&self, type_name: &str) -> bool {
		self.factories.contains_key(type_name)
	}

	pub fn class_names(&self) -> impl Iterator<Item = &str> + '_ {
		self.factories.keys().map(String::as_str)
	}

	pub fn create(&self, type_name: &str, args: A) -> Result<Arc<T>, ItemError> {
		let factory = self.factories.get(type_name).ok_or_else(|| ItemError::UnknownType(type_name.to_owned()))?;
		factory(args)
	}
}

impl<T: ?Sized> ClassRegistry<T, Value> {
	/// Creates an object from `config`, dispatching on its `type` field.
	pub fn create_from_config(&self, config: Value) -> Result<Arc<T>, ItemError> {
		let type_name = config
			.get(TYPE_FIELD)
			.and_then(Value::as_str)
			.ok_or_else(|| ItemError::Invalid(format!("{}: config has no '{TYPE_FIELD}'", self.label)))?
			.to_owned();
		self.create(&type_name, config)
	}

	/// Returns true if `config` names a registered type.
	pub fn accepts(&self, config: &Value) -> bool {
		config.get(TYPE_FIELD).and_then(Value::as_str).is_some_and(|t| self.has_class(t))
	}
}

/// [`ItemCodec`] deserializing through a [`ClassRegistry`].
pub struct RegistryCodec<T: ?Sized> {
	registry: Arc<ClassRegistry<T>>,
	serialize: Arc<dyn Fn(&T) -> Value + Send + Sync>,
}

impl<T: ?Sized> RegistryCodec<T> {
	pub fn new<S>(registry: Arc<ClassRegistry<T>>, serialize: S) -> Self
	where
		S: Fn(&T) -> Value + Send + Sync + 'static,
	{
		Self {
			registry,
			serialize: Arc::new(serialize),
		}
	}

	pub fn registry(&self) -> &Arc<ClassRegistry<T>> {
		&self.registry
	}
}

impl<T: ?Sized> ItemCodec<T> for RegistryCodec<T> {
	fn serialize(&self, item: &T) -> Value {
		(self.serialize)(item)
	}

	fn deserialize(&self, config: Value) -> Deserialized<T> {
		Deserialized::Ready(self.registry.create_from_config(config))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn registry() -> ClassRegistry<String> {
		let mut registry = ClassRegistry::new("strings");
		registry
			.register("Upper", |config: Value| {
				let text = config.get("text").and_then(Value::as_str).unwrap_or_default();
				Ok(Arc::new(text.to_uppercase()))
			})
			.unwrap();
		registry
	}

	#[test]
	fn duplicate_registration_is_rejected() {
		let mut registry = registry();
		let err = registry.register("Upper", |_| Ok(Arc::new(String::new()))).unwrap_err();
		assert_eq!(
			err,
			RegistryError::Duplicate {
				registry: "strings",
				type_name: "Upper".into()
			}
		);
	}

	#[test]
	fn creates_by_type_field() {
		let item = registry().create_from_config(json!({ "type": "Upper", "text": "abc" })).unwrap();
		assert_eq!(*item, "ABC");
	}

	#[test]
	fn unknown_type_is_an_item_error() {
		let err = registry().create_from_config(json!({ "type": "Lower" })).unwrap_err();
		assert!(matches!(err, ItemError::UnknownType(name) if name == "Lower"));
	}

	#[test]
	fn missing_type_is_invalid() {
		let err = registry().create_from_config(json!({ "text": "abc" })).unwrap_err();
		assert!(matches!(err, ItemError::Invalid(_)));
	}

	#[test]
	fn accepts_only_registered_types() {
		let registry = registry();
		assert!(registry.accepts(&json!({ "type": "Upper" })));
		assert!(!registry.accepts(&json!({ "type": "Lower" })));
		assert!(!registry.accepts(&json!({})));
	}

	#[tokio::test]
	async fn codec_round_trips_through_registry() {
		let codec = RegistryCodec::new(Arc::new(registry()), |s: &String| json!({ "type": "Upper", "text": s }));
		let item = codec.deserialize(json!({ "type": "Upper", "text": "x" })).resolve().await.unwrap();
		assert_eq!(codec.serialize(&item), json!({ "type": "Upper", "text": "X" }));
	}
}
