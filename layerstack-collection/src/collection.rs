//! Keyed collection.
//!
//! A sequence of shared items that optionally enforces uniqueness by key and
//! notifies listeners of every insertion and removal.
//!
//! Use cases:
//! - Styles or viewpoints registered by name
//! - Lists of hidden object ids (with uniqueness disabled)

use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::event::{EventNotifier, ItemRemoved};
use crate::item_collection::ItemCollection;
use crate::unique_key::UniqueKey;
use layerstack_types::ItemKey;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A sequence container with optional uniqueness-by-key.
///
/// Items keep their insertion order. Membership is decided by identity
/// (`Arc::ptr_eq`), uniqueness by key.
///
/// Each member's key is read once, on insertion. Items are immutable behind
/// their `Arc`, so the stored key stays valid for as long as they are members.
pub struct Collection<T> {
    items: Vec<Arc<T>>,
    /// Key of the member at the same position.
    keys: Vec<Option<ItemKey>>,
    by_key: HashMap<ItemKey, Arc<T>>,
    unique_key: UniqueKey<T>,
    added: EventNotifier<Arc<T>>,
    removed: EventNotifier<ItemRemoved<T>>,
    destroyed: bool,
}

impl<T: Serialize + 'static> Default for Collection<T> {
    fn default() -> Self {
        Self::new(UniqueKey::default())
    }
}

impl<T> Collection<T> {
    /// Creates an empty collection with the given key policy.
    #[must_use]
    pub fn new(unique_key: UniqueKey<T>) -> Self {
        Self {
            items: Vec::new(),
            keys: Vec::new(),
            by_key: HashMap::new(),
            unique_key,
            added: EventNotifier::new(),
            removed: EventNotifier::new(),
            destroyed: false,
        }
    }

    /// Creates an empty collection that accepts duplicate keys.
    #[must_use]
    pub fn unkeyed() -> Self {
        Self::new(UniqueKey::disabled())
    }

    /// Creates an empty collection from declarative configuration.
    #[must_use]
    pub fn from_config(config: &CollectionConfig) -> Self
    where
        T: Serialize + 'static,
    {
        Self::new(config.unique_key())
    }

    /// The key policy of this collection.
    #[must_use]
    pub fn unique_key(&self) -> &UniqueKey<T> {
        &self.unique_key
    }

    /// Reads the unique key of `item`, member or not.
    #[must_use]
    pub fn key_of(&self, item: &T) -> Option<ItemKey> {
        self.unique_key.key_of(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an iterator over the members, in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    /// Returns a snapshot of the members, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.items.clone()
    }

    /// Returns the keys of all members, in order. Empty when unkeyed.
    #[must_use]
    pub fn keys(&self) -> Vec<ItemKey> {
        self.keys.iter().flatten().cloned().collect()
    }

    /// Returns the key stored for a member, without reading the item again.
    #[must_use]
    pub fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        self.position_of(item)
            .and_then(|index| self.keys[index].clone())
    }

    /// Returns true if this exact item is a member.
    #[must_use]
    pub fn has(&self, item: &Arc<T>) -> bool {
        self.position_of(item).is_some()
    }

    /// Returns true if a member has `key`.
    pub fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        self.ensure_keyed()?;
        Ok(self.by_key.contains_key(key))
    }

    /// Returns the member with `key`.
    pub fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        self.ensure_keyed()?;
        Ok(self.by_key.get(key).cloned())
    }

    /// Appends an item and fires *added*.
    ///
    /// Returns the position of the item, or `None` if the collection enforces
    /// uniqueness and the item has no key or its key is already taken.
    pub fn add(&mut self, item: impl Into<Arc<T>>) -> Option<usize> {
        self.insert(item.into(), None)
    }

    /// Removes an item and fires *removed*.
    ///
    /// Returns the position it occupied, or `None` if it was not a member.
    pub fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        let index = self.remove_silently(item)?;
        self.removed.raise(&ItemRemoved {
            item: Arc::clone(item),
            index,
        });
        Some(index)
    }

    /// Removes an item without notifying listeners.
    pub fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize> {
        let index = self.position_of(item)?;
        self.items.remove(index);
        if let Some(key) = self.keys.remove(index) {
            self.by_key.remove(&key);
        }
        Some(index)
    }

    /// Fires *removed* for every member, in order, then empties the
    /// collection.
    pub fn clear(&mut self) {
        for (index, item) in self.items.iter().enumerate() {
            self.removed.raise(&ItemRemoved {
                item: Arc::clone(item),
                index,
            });
        }
        self.items.clear();
        self.keys.clear();
        self.by_key.clear();
    }

    /// Empties the collection without events and disables its notifiers.
    ///
    /// A destroyed collection rejects every later insertion.
    pub fn destroy(&mut self) {
        self.items.clear();
        self.keys.clear();
        self.by_key.clear();
        self.added.destroy();
        self.removed.destroy();
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Notifier fired with every inserted item.
    pub fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        &mut self.added
    }

    /// Notifier fired with every removed item and its former position.
    pub fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        &mut self.removed
    }

    /// Inserts at `index` (clamped to the end) or appends, then fires *added*.
    pub(crate) fn insert(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
        if self.destroyed {
            debug!("Rejected insertion into a destroyed collection");
            return None;
        }
        let key = self.unique_key.key_of(&item);
        if let Some(label) = self.unique_key.label() {
            let Some(key) = &key else {
                debug!(key_field = %label, "Rejected item without a key");
                return None;
            };
            if self.by_key.contains_key(key) {
                debug!(key_field = %label, key = %key, "Rejected item with a duplicate key");
                return None;
            }
        }

        let position = match index {
            Some(index) if index < self.items.len() => index,
            _ => self.items.len(),
        };
        self.items.insert(position, Arc::clone(&item));
        if let Some(key) = &key {
            self.by_key.insert(key.clone(), Arc::clone(&item));
        }
        self.keys.insert(position, key);
        self.added.raise(&item);
        Some(position)
    }

    /// Relocates the member at `from` to `to` without firing events.
    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        let item = self.items.remove(from);
        self.items.insert(to, item);
        let key = self.keys.remove(from);
        self.keys.insert(to, key);
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    pub(crate) fn position_of(&self, item: &Arc<T>) -> Option<usize> {
        self.items.iter().position(|member| Arc::ptr_eq(member, item))
    }

    pub(crate) fn position_of_key(&self, key: &ItemKey) -> CollectionResult<Option<usize>> {
        self.ensure_keyed()?;
        Ok(self
            .by_key
            .get(key)
            .and_then(|item| self.position_of(item)))
    }

    fn ensure_keyed(&self) -> CollectionResult<()> {
        if self.unique_key.is_enabled() {
            Ok(())
        } else {
            Err(CollectionError::KeyUnsupported)
        }
    }
}

impl<T> ItemCollection<T> for Collection<T> {
    fn unique_key(&self) -> &UniqueKey<T> {
        &self.unique_key
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn to_vec(&self) -> Vec<Arc<T>> {
        Collection::to_vec(self)
    }

    fn keys(&self) -> Vec<ItemKey> {
        Collection::keys(self)
    }

    fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        Collection::member_key(self, item)
    }

    fn has(&self, item: &Arc<T>) -> bool {
        Collection::has(self, item)
    }

    fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        Collection::has_key(self, key)
    }

    fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        Collection::get_by_key(self, key)
    }

    fn add_at(&mut self, item: Arc<T>, _index: Option<usize>) -> Option<usize> {
        self.insert(item, None)
    }

    fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        Collection::remove(self, item)
    }

    fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize> {
        Collection::remove_silently(self, item)
    }

    fn clear(&mut self) {
        Collection::clear(self);
    }

    fn destroy(&mut self) {
        Collection::destroy(self);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        &mut self.added
    }

    fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        &mut self.removed
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize + 'static> FromIterator<T> for Collection<T> {
    /// Collects items under the default key policy, dropping duplicates.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::default();
        for item in iter {
            collection.add(item);
        }
        collection
    }
}

impl<T: fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("items", &self.items)
            .field("keys", &self.keys)
            .field("unique_key", &self.unique_key)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
