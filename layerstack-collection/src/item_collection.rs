use crate::error::CollectionResult;
use crate::event::{EventNotifier, ItemRemoved};
use crate::unique_key::UniqueKey;
use layerstack_types::ItemKey;
use std::sync::Arc;

/// The contract shared by every collection in this crate.
///
/// [`OverrideCollection`](crate::OverrideCollection) is generic over this
/// trait, so it can wrap a plain [`Collection`](crate::Collection), an
/// [`IndexedCollection`](crate::IndexedCollection) or any host-provided
/// implementation.
///
/// Item identity is `Arc` pointer identity.
pub trait ItemCollection<T> {
    /// The key policy the collection was built with.
    fn unique_key(&self) -> &UniqueKey<T>;

    /// Reads the unique key of `item` under this collection's policy.
    fn key_of(&self, item: &T) -> Option<ItemKey> {
        self.unique_key().key_of(item)
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current members, in order.
    fn to_vec(&self) -> Vec<Arc<T>>;

    /// Returns the keys of the current members, in order.
    fn keys(&self) -> Vec<ItemKey> {
        self.to_vec()
            .iter()
            .filter_map(|item| self.key_of(item))
            .collect()
    }

    /// Returns the key of a member, or `None` if `item` is not one.
    fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        self.has(item).then(|| self.key_of(item)).flatten()
    }

    /// Returns true if this exact item is a member.
    fn has(&self, item: &Arc<T>) -> bool;

    /// Returns true if a member has `key`.
    fn has_key(&self, key: &ItemKey) -> CollectionResult<bool>;

    /// Returns the member with `key`.
    fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>>;

    /// Inserts an item, firing *added*.
    ///
    /// `index` is a placement hint that unordered collections ignore. Returns
    /// the position of the item, or `None` if the insertion was rejected.
    fn add_at(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize>;

    /// Removes an item, firing *removed*. Returns the position it occupied.
    fn remove(&mut self, item: &Arc<T>) -> Option<usize>;

    /// Removes an item without firing any event.
    fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize>;

    /// Removes every member, firing *removed* for each.
    fn clear(&mut self);

    /// Empties the collection without events and disables its notifiers.
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;

    /// Whether positions are meaningful and `add_at` honours its index.
    fn is_ordered(&self) -> bool {
        false
    }

    /// Whether the collection already carries override semantics.
    fn is_overridable(&self) -> bool {
        false
    }

    fn added(&mut self) -> &mut EventNotifier<Arc<T>>;

    fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>>;
}
