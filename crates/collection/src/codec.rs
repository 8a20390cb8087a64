//! Serialization contract between override collections and their item types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ItemError;

/// A pinned, boxed future that is required to be Send and 'static.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Outcome of deserializing one config: available now, or after an await.
pub enum Deserialized<T: ?Sized> {
	Ready(Result<Arc<T>, ItemError>),
	Pending(BoxFutureStatic<Result<Arc<T>, ItemError>>),
}

impl<T: ?Sized> Deserialized<T> {
	pub fn pending<F>(future: F) -> Self
	where
		F: Future<Output = Result<Arc<T>, ItemError>> + Send + 'static,
	{
		Self::Pending(Box::pin(future))
	}

	pub async fn resolve(self) -> Result<Arc<T>, ItemError> {
		match self {
			Self::Ready(result) => result,
			Self::Pending(future) => future.await,
		}
	}
}

impl<T: ?Sized> From<Result<Arc<T>, ItemError>> for Deserialized<T> {
	fn from(result: Result<Arc<T>, ItemError>) -> Self {
		Self::Ready(result)
	}
}

/// Converts items to plain JSON configs and back.
///
/// `deserialize(serialize(item))` must yield an equivalent, fresh item: override collections
/// rely on it to reincarnate shadowed items.
pub trait ItemCodec<T: ?Sized>: Send + Sync {
	fn serialize(&self, item: &T) -> Value;

	fn deserialize(&self, config: Value) -> Deserialized<T>;
}

/// [`ItemCodec`] assembled from a pair of closures.
pub struct FnCodec<S, D> {
	serialize: S,
	deserialize: D,
}

impl<S, D> FnCodec<S, D> {
	pub fn new(serialize: S, deserialize: D) -> Self {
		Self { serialize, deserialize }
	}
}

impl<T, S, D> ItemCodec<T> for FnCodec<S, D>
where
	T: ?Sized,
	S: Fn(&T) -> Value + Send + Sync,
	D: Fn(Value) -> Deserialized<T> + Send + Sync,
{
	fn serialize(&self, item: &T) -> Value {
		(self.serialize)(item)
	}

	fn deserialize(&self, config: Value) -> Deserialized<T> {
		(self.deserialize)(config)
	}
}
