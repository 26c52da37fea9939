mod common;

use common::{Layer, layer};
use layerstack_collection::{IndexedCollection, ItemCollection, ItemKey};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn names(collection: &IndexedCollection<Layer>) -> Vec<String> {
    collection.iter().map(|l| l.name.clone()).collect()
}

/// A collection holding `a`, `b`, `c`, `d`, returned with its items.
fn abcd() -> (IndexedCollection<Layer>, Vec<Arc<Layer>>) {
    let mut collection: IndexedCollection<Layer> = IndexedCollection::default();
    let items: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| layer(n, n)).collect();
    for item in &items {
        collection.add(Arc::clone(item));
    }
    (collection, items)
}

fn record_moves(collection: &mut IndexedCollection<Layer>) -> Rc<RefCell<Vec<(String, usize, usize)>>> {
    let moves = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&moves);
    collection
        .moved()
        .add_listener(move |event| sink.borrow_mut().push((event.item.name.clone(), event.from, event.to)));
    moves
}

// ── Positional insertion ──────────────────────────────────────────

#[test]
fn get_reads_position() {
    let (collection, items) = abcd();
    assert!(Arc::ptr_eq(collection.get(2).unwrap(), &items[2]));
    assert!(collection.get(4).is_none());
}

#[test]
fn add_at_splices_within_bounds() {
    let (mut collection, _) = abcd();
    assert_eq!(collection.add_at(layer("x", "x"), Some(1)), Some(1));
    assert_eq!(names(&collection), vec!["a", "x", "b", "c", "d"]);
}

#[test]
fn add_at_zero_prepends() {
    let (mut collection, _) = abcd();
    assert_eq!(collection.add_at(layer("x", "x"), Some(0)), Some(0));
    assert_eq!(names(&collection), vec!["x", "a", "b", "c", "d"]);
}

#[test]
fn add_at_out_of_bounds_appends() {
    let (mut collection, _) = abcd();
    assert_eq!(collection.add_at(layer("x", "x"), Some(99)), Some(4));
    assert_eq!(collection.add_at(layer("y", "y"), None), Some(5));
    assert_eq!(names(&collection), vec!["a", "b", "c", "d", "x", "y"]);
}

#[test]
fn add_at_rejects_duplicate_key() {
    let (mut collection, _) = abcd();
    assert_eq!(collection.add_at(layer("b", "other"), Some(0)), None);
    assert_eq!(collection.len(), 4);
}

#[test]
fn index_of_and_index_of_key() {
    let (collection, items) = abcd();
    assert_eq!(collection.index_of(&items[3]), Some(3));
    assert_eq!(collection.index_of(&layer("a", "a")), None);
    assert_eq!(collection.index_of_key(&ItemKey::from("c")).unwrap(), Some(2));
    assert_eq!(collection.index_of_key(&ItemKey::from("z")).unwrap(), None);
}

#[test]
fn index_of_key_unsupported_without_unique_key() {
    let collection: IndexedCollection<Layer> = IndexedCollection::unkeyed();
    assert!(collection.index_of_key(&ItemKey::from("a")).is_err());
}

// ── Removal carries the previous index ────────────────────────────

#[test]
fn removed_event_carries_previous_index() {
    let (mut collection, items) = abcd();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    collection
        .removed()
        .add_listener(move |event| sink.borrow_mut().push((event.item.name.clone(), event.index)));

    assert_eq!(collection.remove(&items[2]), Some(2));
    assert_eq!(collection.remove(&items[0]), Some(0));
    assert_eq!(
        *seen.borrow(),
        vec![("c".to_owned(), 2), ("a".to_owned(), 0)]
    );
    assert_eq!(names(&collection), vec!["b", "d"]);
}

// ── Reordering ────────────────────────────────────────────────────

#[test]
fn move_to_relocates_and_fires_moved() {
    let (mut collection, items) = abcd();
    let moves = record_moves(&mut collection);

    assert_eq!(collection.move_to(&items[0], 2), Some(2));
    assert_eq!(names(&collection), vec!["b", "c", "a", "d"]);
    assert_eq!(*moves.borrow(), vec![("a".to_owned(), 0, 2)]);
}

#[test]
fn move_to_current_position_is_silent() {
    let (mut collection, items) = abcd();
    let moves = record_moves(&mut collection);

    assert_eq!(collection.move_to(&items[1], 1), Some(1));
    assert!(moves.borrow().is_empty());
    assert_eq!(names(&collection), vec!["a", "b", "c", "d"]);
}

#[test]
fn move_to_clamps_target() {
    let (mut collection, items) = abcd();
    assert_eq!(collection.move_to(&items[1], 100), Some(3));
    assert_eq!(names(&collection), vec!["a", "c", "d", "b"]);
}

#[test]
fn move_of_non_member_is_none() {
    let (mut collection, _) = abcd();
    let moves = record_moves(&mut collection);
    assert_eq!(collection.move_to(&layer("a", "a"), 0), None);
    assert_eq!(collection.raise(&layer("a", "a"), 1), None);
    assert_eq!(collection.lower(&layer("a", "a"), 1), None);
    assert!(moves.borrow().is_empty());
}

#[test]
fn raise_moves_toward_end() {
    let (mut collection, items) = abcd();
    assert_eq!(collection.raise(&items[0], 1), Some(1));
    assert_eq!(names(&collection), vec!["b", "a", "c", "d"]);
    assert_eq!(collection.raise(&items[0], 2), Some(3));
    assert_eq!(names(&collection), vec!["b", "c", "d", "a"]);
}

#[test]
fn raise_past_end_stops_at_last_position() {
    let (mut collection, items) = abcd();
    let moves = record_moves(&mut collection);
    assert_eq!(collection.raise(&items[2], usize::MAX), Some(3));
    // Already on top: nothing moves.
    assert_eq!(collection.raise(&items[2], 5), Some(3));
    assert_eq!(*moves.borrow(), vec![("c".to_owned(), 2, 3)]);
}

#[test]
fn lower_moves_toward_start() {
    let (mut collection, items) = abcd();
    assert_eq!(collection.lower(&items[3], 2), Some(1));
    assert_eq!(names(&collection), vec!["a", "d", "b", "c"]);
}

#[test]
fn lower_past_start_stops_at_zero() {
    let (mut collection, items) = abcd();
    let moves = record_moves(&mut collection);
    assert_eq!(collection.lower(&items[1], 10), Some(0));
    assert_eq!(collection.lower(&items[1], 1), Some(0));
    assert_eq!(*moves.borrow(), vec![("b".to_owned(), 1, 0)]);
}

#[test]
fn moving_fires_no_add_or_remove() {
    let (mut collection, items) = abcd();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    collection.added().add_listener(move |_| *sink.borrow_mut() += 1);
    let sink = Rc::clone(&count);
    collection.removed().add_listener(move |_| *sink.borrow_mut() += 1);

    collection.raise(&items[0], 3);
    collection.lower(&items[0], 3);
    assert_eq!(*count.borrow(), 0);
}

// ── Lifecycle ─────────────────────────────────────────────────────

#[test]
fn destroy_disables_moved() {
    let (mut collection, items) = abcd();
    collection.destroy();
    assert!(collection.is_empty());
    assert!(collection.moved().is_destroyed());
    assert_eq!(collection.move_to(&items[0], 1), None);
}

#[test]
fn indexed_collection_is_ordered() {
    let (mut collection, _) = abcd();
    let dynamic: &mut dyn ItemCollection<Layer> = &mut collection;
    assert!(dynamic.is_ordered());
    assert_eq!(dynamic.add_at(layer("x", "x"), Some(0)), Some(0));
    assert_eq!(dynamic.to_vec()[0].name, "x");
}
