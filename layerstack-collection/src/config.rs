//! Declarative collection configuration.
//!
//! Hosts describe their collections in JSON (or any serde format):
//!
//! ```json
//! { "unique_key": "id" }
//! ```
//!
//! A missing `unique_key` means the default field `"name"`; `null` or `false`
//! disables uniqueness.

use crate::error::CollectionResult;
use crate::unique_key::{DEFAULT_KEY_FIELD, UniqueKey};
use serde::{Deserialize, Deserializer, Serialize};

/// Construction options shared by all collection types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Field holding the unique key, or `None` for no uniqueness.
    #[serde(deserialize_with = "deserialize_unique_key")]
    pub unique_key: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            unique_key: Some(DEFAULT_KEY_FIELD.to_owned()),
        }
    }
}

impl CollectionConfig {
    /// Configuration keyed by `field`.
    #[must_use]
    pub fn keyed(field: impl Into<String>) -> Self {
        Self {
            unique_key: Some(field.into()),
        }
    }

    /// Configuration without uniqueness.
    #[must_use]
    pub fn unkeyed() -> Self {
        Self { unique_key: None }
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> CollectionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the key policy this configuration describes.
    #[must_use]
    pub fn unique_key<T: Serialize + 'static>(&self) -> UniqueKey<T> {
        match &self.unique_key {
            Some(field) => UniqueKey::field(field.clone()),
            None => UniqueKey::disabled(),
        }
    }
}

fn deserialize_unique_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Field(String),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Field(field)) => Some(field),
        Some(Raw::Flag(true)) => Some(DEFAULT_KEY_FIELD.to_owned()),
        Some(Raw::Flag(false)) | None => None,
    })
}
