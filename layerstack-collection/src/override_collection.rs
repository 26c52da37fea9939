//! Module-overlay collection.
//!
//! Configuration modules are loaded and unloaded independently, and several of
//! them may contribute an item with the same key. An [`OverrideCollection`]
//! keeps exactly one live item per key and remembers, per key, a stack of the
//! items it displaced:
//!
//! - `override_item` pushes the live item (serialized, with its owning module)
//!   onto the key's shadow stack and inserts the new one
//! - removing a live item pops the newest shadow and brings it back
//! - `remove_module` drops a module's shadows and live items, so every key it
//!   touched returns to the state it would have without that module
//!
//! Within `override_item` and `replace`, the *replaced* event fires before the
//! *added* event of the new item, and the displaced item fires no *removed*.

use crate::codec::{ItemCodec, JsonCodec};
use crate::error::{CollectionError, CollectionResult};
use crate::event::{EventNotifier, ItemMoved, ItemRemoved, ItemReplaced};
use crate::indexed::IndexedCollection;
use crate::item_collection::ItemCollection;
use crate::unique_key::UniqueKey;
use futures::future::join_all;
use layerstack_types::{ItemKey, ModuleId, Record};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

type ModuleProvider = Box<dyn Fn() -> ModuleId>;

/// Decides where a resurfacing or replacing item goes:
/// `(shadow_item, new_item, known_index) -> index`.
type ShadowIndex<T> = Box<dyn Fn(&T, Option<&T>, Option<usize>) -> Option<usize>>;

/// A displaced item, kept as its record.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowEntry {
    /// Module that owned the item when it was displaced.
    pub module: ModuleId,
    /// Serialized item.
    pub record: Record,
}

/// A collection with module-scoped override semantics.
///
/// Wraps any [`ItemCollection`] that enforces a unique key. All mutation still
/// goes through the base collection, so its *added*/*removed* events keep
/// firing.
pub struct OverrideCollection<T, C = IndexedCollection<T>>
where
    T: Send + 'static,
{
    base: C,
    module_provider: ModuleProvider,
    codec: Arc<dyn ItemCodec<T>>,
    shadow_index: ShadowIndex<T>,
    /// Shadow stacks per key, newest last.
    shadows: BTreeMap<ItemKey, Vec<ShadowEntry>>,
    /// Owning module of each live item.
    owners: HashMap<ItemKey, ModuleId>,
    replaced: EventNotifier<ItemReplaced<T>>,
}

impl<T, C> OverrideCollection<T, C>
where
    T: Send + 'static,
    C: ItemCollection<T>,
{
    /// Wraps `base`.
    ///
    /// `module_provider` returns the currently active module; items inserted
    /// without an explicit module are owned by it.
    ///
    /// Fails if `base` is already an override collection or has no unique key.
    pub fn new<P, K>(base: C, module_provider: P, codec: K) -> CollectionResult<Self>
    where
        P: Fn() -> ModuleId + 'static,
        K: ItemCodec<T> + 'static,
    {
        if base.is_overridable() {
            return Err(CollectionError::AlreadyOverridable);
        }
        if !base.unique_key().is_enabled() {
            return Err(CollectionError::KeyUnsupported);
        }
        Ok(Self {
            base,
            module_provider: Box::new(module_provider),
            codec: Arc::new(codec),
            shadow_index: Box::new(|_: &T, _: Option<&T>, known_index: Option<usize>| known_index),
            shadows: BTreeMap::new(),
            owners: HashMap::new(),
            replaced: EventNotifier::new(),
        })
    }

    /// Sets the placement function for resurfacing shadows and replacements.
    ///
    /// It receives the shadowed (or displaced) item, the new item when there
    /// is one, and the position the key last occupied. The default keeps that
    /// position.
    #[must_use]
    pub fn with_shadow_index<F>(mut self, shadow_index: F) -> Self
    where
        F: Fn(&T, Option<&T>, Option<usize>) -> Option<usize> + 'static,
    {
        self.shadow_index = Box::new(shadow_index);
        self
    }

    /// The wrapped collection.
    #[must_use]
    pub fn base(&self) -> &C {
        &self.base
    }

    /// The currently active module, as reported by the provider.
    #[must_use]
    pub fn current_module(&self) -> ModuleId {
        (self.module_provider)()
    }

    // ================================================================
    // Insertion
    // ================================================================

    /// Inserts an item owned by the current module. Rejected (`None`) if its
    /// key is missing or taken.
    pub fn add(&mut self, item: impl Into<Arc<T>>) -> Option<usize> {
        let module = self.current_module();
        self.insert(item.into(), None, module)
    }

    /// Makes `item` the live item for its key, shadowing the previous one.
    ///
    /// Returns the inserted item, or `None` if it was rejected.
    pub fn override_item(&mut self, item: impl Into<Arc<T>>) -> Option<Arc<T>> {
        let module = self.current_module();
        self.override_as(item.into(), module)
    }

    /// Replaces the live item for `item`'s key in place.
    ///
    /// Only succeeds if that live item exists and belongs to the current
    /// module. The previous item is destroyed, not shadowed.
    pub fn replace(&mut self, item: impl Into<Arc<T>>) -> Option<Arc<T>> {
        let item = item.into();
        let module = self.current_module();
        let key = self.base.key_of(&item)?;
        let previous = self.base.get_by_key(&key).ok().flatten()?;
        if Arc::ptr_eq(&previous, &item) {
            return Some(item);
        }
        if self.owners.get(&key) != Some(&module) {
            debug!(key = %key, module = %module, "Refusing to replace an item owned by another module");
            return None;
        }

        let known_index = self.base.remove_silently(&previous);
        self.owners.remove(&key);
        self.replaced.raise(&ItemReplaced {
            old: Arc::clone(&previous),
            new: Arc::clone(&item),
        });
        self.destroy_item(&previous);

        let index = self.placement(&previous, Some(item.as_ref()), known_index);
        self.insert_keyed(key, Arc::clone(&item), index, module)?;
        Some(item)
    }

    fn override_as(&mut self, item: Arc<T>, module: ModuleId) -> Option<Arc<T>> {
        let Some(key) = self.base.key_of(&item) else {
            debug!("Rejected override of an item without a key");
            return None;
        };

        let mut index = None;
        if let Some(previous) = self.base.get_by_key(&key).ok().flatten() {
            if Arc::ptr_eq(&previous, &item) {
                debug!(key = %key, "Item is already live");
                return Some(item);
            }
            let known_index = self.base.remove_silently(&previous);
            let owner = self.owners.remove(&key).unwrap_or_default();
            match self.codec.serialize(&previous) {
                Ok(record) => self.shadows.entry(key.clone()).or_default().push(ShadowEntry {
                    module: owner,
                    record,
                }),
                Err(e) => {
                    error!(key = %key, module = %owner, error = %e, "Failed to shadow overridden item")
                }
            }
            self.replaced.raise(&ItemReplaced {
                old: Arc::clone(&previous),
                new: Arc::clone(&item),
            });
            self.destroy_item(&previous);
            index = self.placement(&previous, Some(item.as_ref()), known_index);
        }

        self.insert_keyed(key, Arc::clone(&item), index, module)?;
        Some(item)
    }

    fn insert(&mut self, item: Arc<T>, index: Option<usize>, module: ModuleId) -> Option<usize> {
        let key = self.base.key_of(&item)?;
        self.insert_keyed(key, item, index, module)
    }

    fn insert_keyed(
        &mut self,
        key: ItemKey,
        item: Arc<T>,
        index: Option<usize>,
        module: ModuleId,
    ) -> Option<usize> {
        let position = self.base.add_at(item, index)?;
        self.owners.insert(key, module);
        Some(position)
    }

    // ================================================================
    // Removal
    // ================================================================

    /// Removes a live item, firing *removed*, then brings back the newest
    /// shadow for its key (firing *added*).
    ///
    /// Returns the position the removed item occupied.
    pub fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        let key = self.base.member_key(item);
        let index = self.base.remove(item)?;
        if let Some(key) = key {
            self.owners.remove(&key);
            self.reincarnate(&key, index);
        }
        Some(index)
    }

    fn reincarnate(&mut self, key: &ItemKey, index: usize) {
        let Some(stack) = self.shadows.get_mut(key) else {
            return;
        };
        let Some(entry) = stack.pop() else {
            return;
        };
        if stack.is_empty() {
            self.shadows.remove(key);
        }

        let item = match self
            .codec
            .deserialize(entry.record)
            .and_then(|item| self.codec.validate(&item).map(|()| item))
        {
            Ok(item) => Arc::new(item),
            Err(e) => {
                error!(key = %key, module = %entry.module, error = %e, "Failed to restore shadowed item");
                return;
            }
        };

        let known_index = self.base.is_ordered().then_some(index);
        let target = (self.shadow_index)(item.as_ref(), None, known_index);
        if self.insert(item, target, entry.module.clone()).is_none() {
            warn!(key = %key, module = %entry.module, "Restored item was rejected by the collection");
        } else {
            debug!(key = %key, module = %entry.module, "Restored shadowed item");
        }
    }

    /// Removes every item, firing *removed* for each, and forgets all shadows.
    pub fn clear(&mut self) {
        self.base.clear();
        self.owners.clear();
        self.shadows.clear();
    }

    // ================================================================
    // Modules
    // ================================================================

    /// Loads one module's records.
    ///
    /// Records are resolved concurrently; invalid ones are logged and
    /// skipped. The valid items are then overridden in input order, owned by
    /// `module`. Returns the items that were inserted.
    pub async fn parse_items(&mut self, records: Vec<Record>, module: ModuleId) -> Vec<Arc<T>> {
        let codec = Arc::clone(&self.codec);
        let resolved = join_all(records.into_iter().map(|record| {
            let codec = &codec;
            async move {
                if record.is_null() {
                    return Err(CollectionError::InvalidItem("record is null".into()));
                }
                let item = codec.resolve(record).await?;
                codec.validate(&item)?;
                Ok::<T, CollectionError>(item)
            }
        }))
        .await;

        let mut inserted = Vec::new();
        for (position, result) in resolved.into_iter().enumerate() {
            match result {
                Ok(item) => match self.override_as(Arc::new(item), module.clone()) {
                    Some(item) => inserted.push(item),
                    None => {
                        warn!(module = %module, position, "Configuration item was rejected by the collection")
                    }
                },
                Err(e) => {
                    warn!(module = %module, position, error = %e, "Skipping invalid configuration record")
                }
            }
        }
        debug!(module = %module, count = inserted.len(), "Parsed module items");
        inserted
    }

    /// Retracts everything `module` contributed.
    ///
    /// Its shadows are dropped, then each of its live items is removed (older
    /// shadows of other modules resurface) and destroyed.
    pub fn remove_module(&mut self, module: &ModuleId) {
        self.shadows.retain(|_, stack| {
            stack.retain(|entry| entry.module != *module);
            !stack.is_empty()
        });

        let owned: Vec<Arc<T>> = self
            .base
            .keys()
            .into_iter()
            .filter(|key| self.owners.get(key) == Some(module))
            .filter_map(|key| self.base.get_by_key(&key).ok().flatten())
            .collect();
        for item in &owned {
            if self.remove(item).is_some() {
                self.destroy_item(item);
            }
        }
        debug!(module = %module, removed = owned.len(), "Removed module items");
    }

    /// Exports what `module` contributes to the current state.
    ///
    /// That is the records of its live items, in collection order, followed
    /// by its newest shadow record for every key whose live item it does not
    /// own.
    #[must_use]
    pub fn serialize_module(&self, module: &ModuleId) -> Vec<Record> {
        let mut records = Vec::new();
        for key in self.base.keys() {
            if self.owners.get(&key) != Some(module) {
                continue;
            }
            let Some(item) = self.base.get_by_key(&key).ok().flatten() else {
                continue;
            };
            match self.codec.serialize(&item) {
                Ok(record) => records.push(record),
                Err(e) => warn!(module = %module, error = %e, "Failed to serialize module item"),
            }
        }

        for (key, stack) in &self.shadows {
            if self.owners.get(key) == Some(module) {
                continue;
            }
            if let Some(entry) = stack.iter().rev().find(|entry| entry.module == *module) {
                records.push(entry.record.clone());
            }
        }
        records
    }

    /// Serializes the live item for `key`.
    #[must_use]
    pub fn get_serialized_by_key(&self, key: &ItemKey) -> Option<Record> {
        let item = self.base.get_by_key(key).ok().flatten()?;
        match self.codec.serialize(&item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize item");
                None
            }
        }
    }

    /// The module owning a live item.
    #[must_use]
    pub fn module_of(&self, item: &Arc<T>) -> Option<&ModuleId> {
        let key = self.base.member_key(item)?;
        self.owners.get(&key)
    }

    /// Modules owning at least one live item or shadow, sorted.
    #[must_use]
    pub fn modules(&self) -> Vec<ModuleId> {
        let mut modules: Vec<ModuleId> = self
            .owners
            .values()
            .chain(self.shadows.values().flatten().map(|entry| &entry.module))
            .cloned()
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }

    /// Number of shadows kept for `key`.
    #[must_use]
    pub fn shadow_depth(&self, key: &ItemKey) -> usize {
        self.shadows.get(key).map_or(0, Vec::len)
    }

    /// The shadow stack for `key`, oldest first.
    #[must_use]
    pub fn shadows(&self, key: &ItemKey) -> &[ShadowEntry] {
        self.shadows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owners of the shadows for `key`, oldest first.
    #[must_use]
    pub fn shadow_modules(&self, key: &ItemKey) -> Vec<ModuleId> {
        self.shadows(key)
            .iter()
            .map(|entry| entry.module.clone())
            .collect()
    }

    // ================================================================
    // Lifecycle and events
    // ================================================================

    /// Drops all shadows, disables *replaced* and destroys the base.
    pub fn destroy(&mut self) {
        self.shadows.clear();
        self.owners.clear();
        self.replaced.destroy();
        self.base.destroy();
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.base.is_destroyed()
    }

    pub fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        self.base.added()
    }

    pub fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        self.base.removed()
    }

    /// Notifier fired with `{old, new}` whenever an item is displaced.
    pub fn replaced(&mut self) -> &mut EventNotifier<ItemReplaced<T>> {
        &mut self.replaced
    }

    // Lookups forwarded to the base.

    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.base.to_vec()
    }

    #[must_use]
    pub fn has(&self, item: &Arc<T>) -> bool {
        self.base.has(item)
    }

    pub fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        self.base.has_key(key)
    }

    pub fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        self.base.get_by_key(key)
    }

    fn placement(&self, item: &T, new_item: Option<&T>, known_index: Option<usize>) -> Option<usize> {
        let known_index = known_index.filter(|_| self.base.is_ordered());
        (self.shadow_index)(item, new_item, known_index)
    }

    fn destroy_item(&self, item: &T) {
        if let Err(e) = self.codec.destroy(item) {
            warn!(error = %e, "Item destroy hook failed");
        }
    }
}

impl<T, C> OverrideCollection<T, C>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    C: ItemCollection<T>,
{
    /// Wraps `base` with a [`JsonCodec`].
    pub fn with_json_codec<P>(base: C, module_provider: P) -> CollectionResult<Self>
    where
        P: Fn() -> ModuleId + 'static,
    {
        Self::new(base, module_provider, JsonCodec::new())
    }
}

impl<T> OverrideCollection<T, IndexedCollection<T>>
where
    T: Send + 'static,
{
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.base.get(index)
    }

    #[must_use]
    pub fn index_of(&self, item: &Arc<T>) -> Option<usize> {
        self.base.index_of(item)
    }

    pub fn index_of_key(&self, key: &ItemKey) -> CollectionResult<Option<usize>> {
        self.base.index_of_key(key)
    }

    /// Inserts an item owned by the current module at `index`.
    pub fn add_at(&mut self, item: impl Into<Arc<T>>, index: Option<usize>) -> Option<usize> {
        let module = self.current_module();
        self.insert(item.into(), index, module)
    }

    pub fn move_to(&mut self, item: &Arc<T>, target: usize) -> Option<usize> {
        self.base.move_to(item, target)
    }

    pub fn raise(&mut self, item: &Arc<T>, steps: usize) -> Option<usize> {
        self.base.raise(item, steps)
    }

    pub fn lower(&mut self, item: &Arc<T>, steps: usize) -> Option<usize> {
        self.base.lower(item, steps)
    }

    pub fn moved(&mut self) -> &mut EventNotifier<ItemMoved<T>> {
        self.base.moved()
    }
}

impl<T, C> ItemCollection<T> for OverrideCollection<T, C>
where
    T: Send + 'static,
    C: ItemCollection<T>,
{
    fn unique_key(&self) -> &UniqueKey<T> {
        self.base.unique_key()
    }

    fn len(&self) -> usize {
        self.base.len()
    }

    fn to_vec(&self) -> Vec<Arc<T>> {
        self.base.to_vec()
    }

    fn keys(&self) -> Vec<ItemKey> {
        self.base.keys()
    }

    fn member_key(&self, item: &Arc<T>) -> Option<ItemKey> {
        self.base.member_key(item)
    }

    fn has(&self, item: &Arc<T>) -> bool {
        self.base.has(item)
    }

    fn has_key(&self, key: &ItemKey) -> CollectionResult<bool> {
        self.base.has_key(key)
    }

    fn get_by_key(&self, key: &ItemKey) -> CollectionResult<Option<Arc<T>>> {
        self.base.get_by_key(key)
    }

    fn add_at(&mut self, item: Arc<T>, index: Option<usize>) -> Option<usize> {
        let module = self.current_module();
        self.insert(item, index, module)
    }

    fn remove(&mut self, item: &Arc<T>) -> Option<usize> {
        OverrideCollection::remove(self, item)
    }

    fn remove_silently(&mut self, item: &Arc<T>) -> Option<usize> {
        let key = self.base.member_key(item);
        let index = self.base.remove_silently(item)?;
        if let Some(key) = key {
            self.owners.remove(&key);
        }
        Some(index)
    }

    fn clear(&mut self) {
        OverrideCollection::clear(self);
    }

    fn destroy(&mut self) {
        OverrideCollection::destroy(self);
    }

    fn is_destroyed(&self) -> bool {
        self.base.is_destroyed()
    }

    fn is_ordered(&self) -> bool {
        self.base.is_ordered()
    }

    fn is_overridable(&self) -> bool {
        true
    }

    fn added(&mut self) -> &mut EventNotifier<Arc<T>> {
        self.base.added()
    }

    fn removed(&mut self) -> &mut EventNotifier<ItemRemoved<T>> {
        self.base.removed()
    }
}

impl<T, C> fmt::Debug for OverrideCollection<T, C>
where
    T: Send + 'static,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideCollection")
            .field("base", &self.base)
            .field("shadows", &self.shadows)
            .field("owners", &self.owners)
            .finish_non_exhaustive()
    }
}
