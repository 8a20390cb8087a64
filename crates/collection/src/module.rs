use std::sync::Arc;

/// Identifier of a configuration module, the provenance tag carried by overridable items.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Debug for ModuleId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "ModuleId({:?})", &*self.0)
	}
}

impl std::fmt::Display for ModuleId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ModuleId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for ModuleId {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl AsRef<str> for ModuleId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Supplies the module id for items added without an explicit tag.
///
/// The provider is queried at the moment an item is tagged, never cached.
#[derive(Clone)]
pub struct ModuleIdProvider(Arc<dyn Fn() -> ModuleId + Send + Sync>);

impl ModuleIdProvider {
	pub fn from_fn<F>(f: F) -> Self
	where
		F: Fn() -> ModuleId + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Provider that always returns `id`.
	pub fn fixed(id: impl Into<ModuleId>) -> Self {
		let id = id.into();
		Self::from_fn(move || id.clone())
	}

	pub fn current(&self) -> ModuleId {
		(self.0)()
	}
}

impl std::fmt::Debug for ModuleIdProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("ModuleIdProvider").field(&self.current()).finish()
	}
}
