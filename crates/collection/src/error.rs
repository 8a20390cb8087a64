/// Failure to produce a single item from its serialized config.
///
/// These are recoverable: bulk parsing logs and skips the offending config.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
	/// The config names a type no factory is registered for.
	#[error("unknown item type: {0}")]
	UnknownType(String),

	/// The config is structurally unusable.
	#[error("invalid item config: {0}")]
	Invalid(String),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Fatal misconfiguration when wrapping a collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
	/// Override semantics are defined per key; a collection with uniqueness disabled has none.
	#[error("override collections require a unique key")]
	MissingUniqueKey,

	#[error("cannot wrap a destroyed collection")]
	Destroyed,
}
