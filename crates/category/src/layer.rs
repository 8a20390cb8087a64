use std::sync::Arc;

use crate::options::LayerOptions;

/// Visual sink mirroring a category's live items.
///
/// Item callbacks run synchronously from the collection's events, with the owning category's
/// collection locked. [`CategoryLayer::apply_options`] runs with no category lock held.
pub trait CategoryLayer<T: ?Sized>: Send + Sync {
	fn item_added(&self, item: &Arc<T>);

	fn item_removed(&self, item: &Arc<T>);

	/// An override or reincarnation swapped `old` for `new` under the same key.
	fn item_replaced(&self, _old: &Arc<T>, _new: &Arc<T>) {}

	fn item_moved(&self, _item: &Arc<T>) {}

	/// Drops everything the layer shows.
	fn clear(&self);

	fn apply_options(&self, _options: &LayerOptions) {}

	fn destroy(&self) {}
}
