//! Module configuration files.
//!
//! A module is a named bundle of category contributions. Modules load from JSON or TOML; the
//! format is chosen by file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::options::CategoryConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
	/// Stable module id. A random one is assigned on load when absent.
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub categories: Vec<CategoryConfig>,
}

impl ModuleConfig {
	pub fn from_json_str(input: &str) -> Result<Self> {
		Ok(serde_json::from_str(input)?)
	}

	pub fn from_toml_str(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Reads a `.json` or `.toml` module file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		match path.extension().and_then(|ext| ext.to_str()) {
			Some("json") => Self::from_json_str(&content),
			Some("toml") => Self::from_toml_str(&content),
			_ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
		}
	}

	pub fn to_json_string(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}
