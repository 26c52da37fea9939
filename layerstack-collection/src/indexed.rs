//! Order-preserving collection.
//!
//! Extends [`Collection`] with positional insertion and relative reordering.
//! Position 0 is the bottom of the stack: `raise` moves an item toward the
//! end, `lower` toward the start.
//!
//! Use cases:
//! - Map layers, where order is drawing order
//! - Any list the user can reorder

use crate::collection::Collection;
use crate::config::CollectionConfig;
use crate::error::CollectionResult;
use crate::event::{EventNotifier, ItemMoved, ItemRemoved};
use crate::item_collection::ItemCollection;
use crate::unique_key::UniqueKey;
use layerstack_types::ItemKey;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A [`Collection`] whose positions are meaningful.
///
/// The *removed* event carries the position the item occupied before it
/// was unlinked, so listeners know where it used to live.
pub struct IndexedCollection<T> {
    inner: Collection<T>,
    moved: EventNotifier<ItemMoved<T>>,
}

impl<T: Serialize + 'static> Default for IndexedCollection<T> {
    fn default() -> Self {
        Self::new(UniqueKey::default())
    }
}

impl<T> IndexedCollection<T> {
    /// Creates an empty indexed collection with the given key policy.
    #[must_use]
    pub fn new(unique_key: UniqueKey<T>) -> Self {
        Self {
            inner: Collection::new(unique_key),
            moved: EventNotifier::new(),
        }
    }

    /// Creates an empty indexed collection that accepts duplicate keys.
    #[must_use]
    pub fn unkeyed() -> Self {
        Self::new(UniqueKey::disabled())
    }

    /// Creates an empty indexed collection from declarative configuration.
    #[must_use]
    pub fn from_config(config: &CollectionConfig) -> Self
    where
        T: Serialize + 'static,
    {
        Self::new(config.unique_key())
    }

    /// Returns the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.inner.get(index)
    }

    /// Appends an item. See [`add_at`](Self::add_at).
    pub fn add(&mut self, item: impl Into<Arc<T>>) -> Option<usize> {
        self.inner.insert(item.into(), None)
    }

    /// Inserts an item at `index`, or appends it when `index` is `None` or
    /// past the end. Fires *added*.
    ///
    /// Returns the actual position, or `None` if the insertion was rejected.
    pub fn add_at(&mut self, item: impl Into<Arc<T>>, index: Option<usize>) -> Option<usize> {
        self.inner.insert(item.into(), index)
    }

    /// Removes an item and fires *removed* with its former position.
    pub fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        self.inner.remove(item)
    }

    #[must_use]
    pub fn index_of(&self, item: &Arc<T>) -> Option<usize> {
        self.inner.position_of(item)
    }

    /// Returns the position of the member with `key`.
    pub fn index_of_key(&self, key: &ItemKey) -> CollectionResult<Option<usize>> {
        self.inner.position_of_key(key)
    }

    /// Moves an item to `target`, clamped to the valid range.
    ///
    /// Fires *moved* only if the position actually changes. Returns the
    /// item's position afterwards, or `None` if it is not a member.
    pub fn move_to(&mut self, item: &Arc<T>, target: usize) -> Option<usize> {
        let from = self.inner.position_of(item)?;
        let to = target.min(self.inner.len() - 1);
        if to != from {
            self.inner.relocate(from, to);
            self.moved.raise(&ItemMoved {
                item: Arc::clone(item),
                from,
                to,
            });
        }
        Some(to)
    }

    /// Moves an item `steps` positions toward the end.
    pub fn raise(&mut self, item: &Arc<T>, steps: usize) -> Option<usize> {
        let from = self.inner.position_of(item)?;
        self.move_to(item, from.saturating_add(steps))
    }

    /// Moves an item `steps` positions toward the start.
    pub fn lower(&mut self, item: &Arc<T>, steps: usize) -> Option<usize> {
        let from = self.inner.position_of(item)?;
        self.move_to(item, from.saturating_sub(steps))
    }

    /// Notifier fired whenever an item changes position.
    pub fn moved(&mut self) -> &mut EventNotifier<ItemMoved<T>> {
        &mut self.moved
    }

    /// Empties the collection without events and disables all notifiers.
    pub fn destroy(&mut self) {
        self.inner.destroy();
        self.moved.destroy();
    }

    // Delegation to the unordered base.

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.inner.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.inner.to_vec()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<ItemKey> {
        self.inner.keys()
    }

    #[must_use]
    pub fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        self.inner.member_key(item)
    }

    #[must_use]
    pub fn has(&self, item: &Arc<T>) -> bool {
        self.inner.has(item)
    }

    pub fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        self.inner.has_key(key)
    }

    pub fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        self.inner.get_by_key(key)
    }

    pub fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize> {
        self.inner.remove_silently(item)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    pub fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        self.inner.added()
    }

    pub fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        self.inner.removed()
    }
}

impl<T> ItemCollection<T> for IndexedCollection<T> {
    fn unique_key(&self) -> &UniqueKey<T> {
        self.inner.unique_key()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn to_vec(&self) -> Vec<Arc<T>> {
        self.inner.to_vec()
    }

    fn keys(&self) -> Vec<ItemKey> {
        self.inner.keys()
    }

    fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        self.inner.member_key(item)
    }

    fn has(&self, item: &Arc<T>) -> bool {
        self.inner.has(item)
    }

    fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        self.inner.has_key(key)
    }

    fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        self.inner.get_by_key(key)
    }

    fn add_at(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
        self.inner.insert(item, index)
    }

    fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        self.inner.remove(item)
    }

    fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize> {
        self.inner.remove_silently(item)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn destroy(&mut self) {
        IndexedCollection::destroy(self);
    }

    fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    fn is_ordered(&self) -> bool {
        true
    }

    fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        self.inner.added()
    }

    fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        self.inner.removed()
    }
}

impl<'a, T> IntoIterator for &'a IndexedCollection<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<T: Serialize + 'static> FromIterator<T> for IndexedCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::default();
        for item in iter {
            collection.add(item);
        }
        collection
    }
}

impl<T: fmt::Debug> fmt::Debug for IndexedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedCollection")
            .field("inner", &self.inner)
            .field("moved", &self.moved)
            .finish()
    }
}
