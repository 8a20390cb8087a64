//! Keyed collections with module-scoped override semantics.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Collection`] | Ordered container, unique by a configurable key. |
//! | [`IndexedCollection`] | Adds explicit positions and move/raise/lower. |
//! | [`OverrideCollection`] | Wraps either container; later items shadow earlier ones per key and are restored when removed. |
//! | [`ItemCodec`] | Serialize/deserialize contract used to shadow and reincarnate items. |
//! | [`Event`] | Synchronous listener list behind every lifecycle notification. |
//!
//! Items are shared as `Arc<T>` and identified by allocation, never by value. Per-item metadata
//! (module tag, previous index) lives in identity-keyed side tables ([`ItemTable`]), not on the
//! items themselves.

mod codec;
mod collection;
mod container;
mod error;
mod event;
mod indexed;
mod key;
mod module;
mod override_collection;
mod tags;

#[cfg(test)]
mod test_fixtures;

pub use codec::{BoxFutureStatic, Deserialized, FnCodec, ItemCodec};
pub use collection::Collection;
pub use container::{CollectionEvents, Container};
pub use error::{ItemError, OverrideError};
pub use event::{Event, Subscription};
pub use indexed::IndexedCollection;
pub use key::{Properties, UniqueKey};
pub use module::{ModuleId, ModuleIdProvider};
pub use override_collection::{ItemCheck, OverrideCollection, ParseReport, Replaced, ShadowEntry, ShadowIndex};
pub use tags::ItemTable;
