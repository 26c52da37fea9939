//! Item codecs.
//!
//! An override collection never stores shadowed items alive: it keeps their
//! serialized [`Record`] and turns it back into an item when the shadow
//! resurfaces. The conversion is supplied by the host through [`ItemCodec`].

use crate::error::{CollectionError, CollectionResult};
use async_trait::async_trait;
use layerstack_types::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Converts items to and from their plain-data records.
///
/// Only `serialize` and `deserialize` are required. Implement the others when
/// you need:
/// - Asynchronous resolution of referenced resources while loading
///   (`resolve`)
/// - A type guard rejecting records that deserialize into unusable items
///   (`validate`)
/// - Cleanup of items that leave the live collection for good (`destroy`)
#[async_trait]
pub trait ItemCodec<T: Send + 'static>: Send + Sync {
    /// Serializes a live item.
    fn serialize(&self, item: &T) -> CollectionResult<Record>;

    /// Deserializes a record synchronously. Used when a shadow resurfaces.
    fn deserialize(&self, record: Record) -> CollectionResult<T>;

    /// Deserializes a record while bulk loading a module.
    async fn resolve(&self, record: Record) -> CollectionResult<T> {
        self.deserialize(record)
    }

    /// Checks that a deserialized item is usable.
    fn validate(&self, item: &T) -> CollectionResult<()> {
        let _ = item;
        Ok(())
    }

    /// Releases an item that is no longer live.
    fn destroy(&self, item: &T) -> CollectionResult<()> {
        let _ = item;
        Ok(())
    }
}

/// Codec for any serde type, using its JSON representation as the record.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

#[async_trait]
impl<T> ItemCodec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn serialize(&self, item: &T) -> CollectionResult<Record> {
        Ok(serde_json::to_value(item)?)
    }

    fn deserialize(&self, record: Record) -> CollectionResult<T> {
        if record.is_null() {
            return Err(CollectionError::InvalidItem("record is null".into()));
        }
        Ok(serde_json::from_value(record)?)
    }
}
