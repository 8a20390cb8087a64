use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use vcmap_collection::{ModuleId, ModuleIdProvider, Properties};

use crate::category::{Category, CategoryItems};
use crate::item::PlainItem;
use crate::layer::CategoryLayer;
use crate::options::{CategoryOptions, LayerOptions};

pub(crate) fn module(id: &str) -> ModuleId {
	ModuleId::from(id)
}

pub(crate) fn plain_category(name: &str) -> Category<PlainItem> {
	Category::plain(CategoryOptions::named(name), ModuleIdProvider::fixed("dyn")).unwrap()
}

pub(crate) fn keys(items: &CategoryItems<PlainItem>) -> Vec<String> {
	items
		.items()
		.iter()
		.filter_map(|item| item.property("name").map(Cow::into_owned))
		.collect()
}

/// Item type distinct from [`PlainItem`].
pub(crate) struct Named(pub String);

impl Properties for Named {
	fn property(&self, name: &str) -> Option<Cow<'_, str>> {
		(name == "name").then(|| Cow::Borrowed(self.0.as_str()))
	}
}

/// Layer writing one line per callback.
#[derive(Default)]
pub(crate) struct RecordingLayer {
	log: Mutex<Vec<String>>,
}

impl RecordingLayer {
	pub(crate) fn take(&self) -> Vec<String> {
		std::mem::take(&mut *self.log.lock())
	}

	fn record(&self, line: String) {
		self.log.lock().push(line);
	}
}

fn label(item: &PlainItem) -> String {
	item.property("name").map(Cow::into_owned).unwrap_or_default()
}

impl CategoryLayer<PlainItem> for RecordingLayer {
	fn item_added(&self, item: &Arc<PlainItem>) {
		self.record(format!("added {}", label(item)));
	}

	fn item_removed(&self, item: &Arc<PlainItem>) {
		self.record(format!("removed {}", label(item)));
	}

	fn item_replaced(&self, _old: &Arc<PlainItem>, new: &Arc<PlainItem>) {
		self.record(format!("replaced {}", label(new)));
	}

	fn clear(&self) {
		self.record("clear".into());
	}

	fn apply_options(&self, _options: &LayerOptions) {
		self.record("options".into());
	}

	fn destroy(&self) {
		self.record("destroy".into());
	}
}
