use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::Collection;
use crate::test_fixtures::{TestItem, item, name_key, names, unnamed};

#[test]
fn add_returns_appended_index() {
	let mut collection = Collection::new(name_key());
	assert_eq!(collection.add(item("a", 0)), Some(0));
	assert_eq!(collection.add(item("b", 0)), Some(1));
	assert_eq!(collection.len(), 2);
}

#[test]
fn duplicate_key_is_rejected() {
	let mut collection = Collection::new(name_key());
	assert_eq!(collection.add(item("a", 1)), Some(0));
	assert_eq!(collection.add(item("a", 2)), None);
	assert_eq!(collection.len(), 1);
	assert_eq!(collection.get_by_key("a").map(|i| i.value), Some(1));
}

#[test]
fn missing_key_is_rejected() {
	let mut collection = Collection::new(name_key());
	assert_eq!(collection.add(unnamed(1)), None);
	assert!(collection.is_empty());
}

#[test]
fn same_instance_is_added_once() {
	let mut collection: Collection<TestItem> = Collection::unkeyed();
	let a = unnamed(1);
	assert_eq!(collection.add(Arc::clone(&a)), Some(0));
	assert_eq!(collection.add(a), None);
}

#[test]
fn unkeyed_allows_duplicates_but_not_lookup() {
	let mut collection = Collection::unkeyed();
	collection.add(item("a", 1));
	collection.add(item("a", 2));
	assert_eq!(collection.len(), 2);
	assert!(!collection.has_key("a"));
	assert!(collection.get_by_key("a").is_none());
}

#[test]
fn remove_releases_key() {
	let mut collection = Collection::new(name_key());
	let a = item("a", 1);
	collection.add(Arc::clone(&a));
	assert_eq!(collection.remove(&a), Some(0));
	assert!(!collection.has(&a));
	assert!(!collection.has_key("a"));
	assert_eq!(collection.add(item("a", 2)), Some(0));
}

#[test]
fn remove_of_non_member_is_noop() {
	let mut collection = Collection::new(name_key());
	collection.add(item("a", 1));
	let removed = Arc::new(Mutex::new(0));
	let counter = Arc::clone(&removed);
	collection.events().removed.add_listener(move |_| *counter.lock() += 1);

	assert_eq!(collection.remove(&item("a", 1)), None);
	assert_eq!(*removed.lock(), 0);
	assert_eq!(collection.len(), 1);
}

#[test]
fn events_carry_the_item() {
	let mut collection = Collection::new(name_key());
	let log = Arc::new(Mutex::new(Vec::new()));

	let added = Arc::clone(&log);
	collection.events().added.add_listener(move |i: &Arc<TestItem>| added.lock().push(format!("+{}", i.value)));
	let removed = Arc::clone(&log);
	collection.events().removed.add_listener(move |i: &Arc<TestItem>| removed.lock().push(format!("-{}", i.value)));

	let a = item("a", 1);
	collection.add(Arc::clone(&a));
	collection.add(item("b", 2));
	collection.remove(&a);

	assert_eq!(*log.lock(), vec!["+1", "+2", "-1"]);
}

#[test]
fn from_iter_keeps_first_duplicate() {
	let collection = Collection::from_iter_keyed([item("a", 1), item("b", 2), item("a", 3)], Some(name_key()));
	assert_eq!(names(collection.iter()), vec!["a", "b"]);
	assert_eq!(collection.get_by_key("a").map(|i| i.value), Some(1));
}

#[test]
fn from_iter_without_key_keeps_all() {
	let collection = Collection::from_iter_keyed([item("a", 1), item("a", 3)], None);
	assert_eq!(collection.len(), 2);
}

#[test]
fn clear_emits_removed_for_each_item() {
	let mut collection = Collection::new(name_key());
	collection.add(item("a", 1));
	collection.add(item("b", 2));
	let count = Arc::new(Mutex::new(0));
	let counter = Arc::clone(&count);
	collection.events().removed.add_listener(move |_| *counter.lock() += 1);

	collection.clear();
	assert!(collection.is_empty());
	assert_eq!(*count.lock(), 2);
}

#[test]
fn destroy_is_idempotent_and_detaches_listeners() {
	let mut collection = Collection::new(name_key());
	collection.add(item("a", 1));
	collection.events().added.add_listener(|_| {});

	collection.destroy();
	collection.destroy();

	assert!(collection.is_destroyed());
	assert!(collection.is_empty());
	assert_eq!(collection.events().added.listener_count(), 0);
	assert_eq!(collection.add(item("b", 1)), None);
}
