//! Unique key policies.
//!
//! A collection decides at construction how (and whether) it reads a key from
//! its items. Two members never share a key value.

use layerstack_types::ItemKey;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Name of the key field used when none is configured.
pub const DEFAULT_KEY_FIELD: &str = "name";

/// Items that know their own key.
pub trait Keyed {
    /// Returns the item's key, or `None` if it has none.
    fn item_key(&self) -> Option<ItemKey>;
}

type Extractor<T> = Arc<dyn Fn(&T) -> Option<ItemKey>>;

/// How a collection reads the unique key of an item.
pub struct UniqueKey<T> {
    /// Field name (or other label) for diagnostics, plus the extractor.
    inner: Option<(String, Extractor<T>)>,
}

impl<T> UniqueKey<T> {
    /// No uniqueness: any item is accepted and key lookups are unsupported.
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Reads keys with a custom extractor. `label` names the key in logs.
    pub fn by<F>(label: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&T) -> Option<ItemKey> + 'static,
    {
        Self {
            inner: Some((label.into(), Arc::new(extract))),
        }
    }

    /// Reads the key from the named field of the item's serde representation.
    pub fn field(name: impl Into<String>) -> Self
    where
        T: Serialize + 'static,
    {
        let name = name.into();
        let field = name.clone();
        Self::by(name, move |item: &T| {
            serde_json::to_value(item)
                .ok()
                .and_then(|value| ItemKey::from_field(&value, &field))
        })
    }

    /// Uses the item's [`Keyed`] implementation.
    #[must_use]
    pub fn keyed() -> Self
    where
        T: Keyed + 'static,
    {
        Self::by("key", |item: &T| item.item_key())
    }

    /// Returns true if the policy enforces uniqueness.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the configured key label, if uniqueness is enabled.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.inner.as_ref().map(|(label, _)| label.as_str())
    }

    /// Reads the key of `item`. Always `None` when uniqueness is disabled.
    #[must_use]
    pub fn key_of(&self, item: &T) -> Option<ItemKey> {
        self.inner.as_ref().and_then(|(_, extract)| extract(item))
    }
}

impl<T: Serialize + 'static> Default for UniqueKey<T> {
    fn default() -> Self {
        Self::field(DEFAULT_KEY_FIELD)
    }
}

impl<T> Clone for UniqueKey<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self
                .inner
                .as_ref()
                .map(|(label, extract)| (label.clone(), Arc::clone(extract))),
        }
    }
}

impl<T> fmt::Debug for UniqueKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "UniqueKey({label})"),
            None => f.write_str("UniqueKey(disabled)"),
        }
    }
}
