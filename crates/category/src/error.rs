use std::path::PathBuf;

use vcmap_collection::{ModuleId, OverrideError};

/// Class registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("{registry}: class '{type_name}' is already registered")]
	Duplicate { registry: &'static str, type_name: String },
}

/// Category misconfiguration. These indicate programmer or config errors and are never
/// tolerated silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
	#[error("category options are missing a name")]
	MissingName,

	/// The collection handed to a category is keyed by something other than its key property.
	#[error("collection key {found:?} does not match the category key property '{expected}'")]
	KeyMismatch { expected: String, found: Option<String> },

	/// Merging options would change an identity field of a live category.
	#[error("cannot merge options, values of {field} do not match (existing {existing:?}, incoming '{incoming}')")]
	MergeConflict {
		field: &'static str,
		existing: Option<String>,
		incoming: String,
	},

	#[error(transparent)]
	Override(#[from] OverrideError),
}

/// Module configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("JSON parse error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("unsupported module file format: {}", .0.display())]
	UnsupportedFormat(PathBuf),

	#[error("module '{0}' is already loaded")]
	DuplicateModule(ModuleId),

	#[error(transparent)]
	Category(#[from] CategoryError),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
