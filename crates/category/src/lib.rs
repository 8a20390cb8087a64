//! Categories fed by configuration modules, and the host that loads those modules.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Category`] | Named override collection of items, mirrored into an optional [`CategoryLayer`]. |
//! | [`CategoryEntry`] | Type-erased category, so one host can hold categories of any item type. |
//! | [`CategoryCollection`] | Categories by name, plus items parked for categories that do not exist yet. |
//! | [`AppContext`] | Loads and unloads [`ModuleConfig`]s and owns the dynamic module id. |
//! | [`ClassRegistry`] | Type-name dispatch for configs carrying a `type` field. |

mod category;
mod category_collection;
mod config;
mod context;
mod entry;
mod error;
mod item;
mod layer;
mod options;
mod registry;

#[cfg(test)]
mod test_fixtures;

pub use category::{Category, CategoryItem, CategoryItems};
pub use category_collection::{CategoryArgs, CategoryCollection, CategoryFactories, default_category_factories};
pub use config::ModuleConfig;
pub use context::{AppContext, DEFAULT_DYNAMIC_MODULE_ID};
pub use entry::CategoryEntry;
pub use error::{CategoryError, ConfigError, RegistryError, Result};
pub use item::{PlainCodec, PlainItem};
pub use layer::CategoryLayer;
pub use options::{CategoryConfig, CategoryOptions, DEFAULT_CATEGORY_TYPE, DEFAULT_KEY_PROPERTY, LayerOptions};
pub use registry::{ClassRegistry, RegistryCodec, TYPE_FIELD};
