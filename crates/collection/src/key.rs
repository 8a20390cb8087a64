use std::borrow::Cow;
use std::sync::Arc;

/// Read access to named scalar properties of an item.
///
/// Used by [`UniqueKey::property`] to derive uniqueness from a configured property name such as
/// `"name"`.
pub trait Properties {
	fn property(&self, name: &str) -> Option<Cow<'_, str>>;
}

type Extract<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Named key extractor enforcing uniqueness within a collection.
pub struct UniqueKey<T: ?Sized> {
	name: Arc<str>,
	extract: Extract<T>,
}

impl<T: ?Sized> Clone for UniqueKey<T> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			extract: Arc::clone(&self.extract),
		}
	}
}

impl<T: ?Sized> std::fmt::Debug for UniqueKey<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("UniqueKey").field(&self.name).finish()
	}
}

impl<T: ?Sized> UniqueKey<T> {
	/// Creates a key named `name` whose value is computed by `extract`.
	pub fn new<F>(name: impl Into<Arc<str>>, extract: F) -> Self
	where
		F: Fn(&T) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			extract: Arc::new(extract),
		}
	}

	/// Creates a key reading the property `name` of the item.
	pub fn property(name: impl Into<Arc<str>>) -> Self
	where
		T: Properties,
	{
		let name = name.into();
		let property = Arc::clone(&name);
		Self::new(name, move |item: &T| item.property(&property).map(Cow::into_owned))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the key value of `item`, or `None` if the item does not carry it.
	#[inline]
	pub fn value_of(&self, item: &T) -> Option<String> {
		(self.extract)(item)
	}
}
